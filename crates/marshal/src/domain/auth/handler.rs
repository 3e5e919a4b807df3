//! Authentication handlers.

use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use axum::{
    extract::{Extension, State},
    Json,
};
use podium_common::Role;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{
    jwt::JwtManager,
    request::LoginRequest,
    response::{LoginResponse, UserResponse},
};
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// User row from database
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    role: String,
    division_id: Option<Uuid>,
    association: Option<Uuid>,
}

impl UserRow {
    fn role(&self) -> Result<Role, ApiError> {
        self.role
            .parse()
            .map_err(|e: String| ApiError::Internal(format!("corrupt role column: {e}")))
    }
}

/// POST /api/auth/login
///
/// Login with username and password.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let user: UserRow = sqlx::query_as(
        r#"
        SELECT id, username, password_hash, role, division_id, association
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(&payload.username)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::InvalidCredentials)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| ApiError::Internal("Invalid password hash".to_string()))?;

    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::InvalidCredentials)?;

    let role = user.role()?;
    let jwt_manager = JwtManager::new(&state.config.jwt_secret, state.config.jwt_access_expiration);
    let token =
        jwt_manager.generate_access_token(user.id, role, user.division_id, user.association)?;

    tracing::info!(user_id = %user.id, %role, "user logged in");

    Ok(Json(LoginResponse {
        user: UserResponse {
            id: user.id,
            username: user.username,
            role,
            division_id: user.division_id,
            association: user.association,
            is_admin: role == Role::Admin,
        },
        token,
        expires_in: state.config.jwt_access_expiration,
    }))
}

/// GET /api/auth/me
///
/// Get the current authenticated user's profile.
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<UserResponse>> {
    let row: UserRow = sqlx::query_as(
        r#"
        SELECT id, username, password_hash, role, division_id, association
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("User not found".to_string()))?;

    let role = row.role()?;
    Ok(Json(UserResponse {
        id: row.id,
        username: row.username,
        role,
        division_id: row.division_id,
        association: row.association,
        is_admin: role == Role::Admin,
    }))
}
