//! Authentication middleware.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use podium_common::Role;
use uuid::Uuid;

use crate::domain::auth::JwtManager;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user information extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
    /// The division this user belongs to (admins have none)
    pub division_id: Option<Uuid>,
    /// The room, table, or category the role is bound to, if any
    pub association: Option<Uuid>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Authentication middleware.
///
/// Extracts and validates JWT token from Authorization header.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    // Extract bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    // Verify token
    let jwt_manager = JwtManager::new(&state.config.jwt_secret, state.config.jwt_access_expiration);
    let claims = jwt_manager.verify_access_token(token)?;

    // Add user info to request extensions
    let auth_user = AuthUser {
        id: claims.sub,
        role: claims.role,
        division_id: claims.division_id,
        association: claims.association,
    };
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}
