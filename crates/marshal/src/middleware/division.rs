//! Division scope middleware.
//!
//! Every resource route lives under `/api/events/{division_id}`. This
//! middleware resolves the division from the path, rejects requests for
//! divisions that do not exist, and checks that the caller belongs to
//! the division. Admins bypass the membership check.

use std::collections::HashMap;

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub async fn division_scope_middleware(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let division_id: Uuid = params
        .get("division_id")
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| ApiError::Validation("invalid division id".to_string()))?;

    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(ApiError::Unauthorized)?;

    if !auth_user.is_admin() && auth_user.division_id != Some(division_id) {
        return Err(ApiError::Forbidden);
    }

    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM divisions WHERE id = $1)")
        .bind(division_id)
        .fetch_one(&state.db)
        .await?;

    if !exists.0 {
        return Err(ApiError::NotFound("Division not found".to_string()));
    }

    Ok(next.run(request).await)
}
