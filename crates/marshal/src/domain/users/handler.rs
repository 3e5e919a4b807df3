//! User handlers. All mutation is admin-only.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use podium_common::Role;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{
    request::{CreateUserRequest, UpdateUserRequest},
    response::{UserListResponse, UserSummary},
};
use crate::domain::authorization::{build_auth_context, require_admin};
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    role: String,
    division_id: Option<Uuid>,
    association: Option<Uuid>,
}

impl UserRow {
    fn into_summary(self) -> Result<UserSummary, ApiError> {
        let role: Role = self
            .role
            .parse()
            .map_err(|e: String| ApiError::Internal(format!("corrupt role column: {e}")))?;
        Ok(UserSummary {
            id: self.id,
            username: self.username,
            role,
            division_id: self.division_id,
            association: self.association,
        })
    }
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {e}")))
}

/// GET /api/events/{division_id}/users
pub async fn list_users(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
) -> ApiResult<Json<UserListResponse>> {
    let rows: Vec<UserRow> = sqlx::query_as(
        r#"
        SELECT id, username, role, division_id, association
        FROM users
        WHERE division_id = $1
        ORDER BY username
        "#,
    )
    .bind(division_id)
    .fetch_all(&state.db)
    .await?;

    let users = rows
        .into_iter()
        .map(UserRow::into_summary)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(UserListResponse { users }))
}

/// GET /api/events/{division_id}/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<UserSummary>> {
    let row: UserRow = sqlx::query_as(
        r#"
        SELECT id, username, role, division_id, association
        FROM users
        WHERE id = $1 AND division_id = $2
        "#,
    )
    .bind(id)
    .bind(division_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(row.into_summary()?))
}

/// POST /api/events/{division_id}/users
pub async fn create_user(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserSummary>)> {
    let ctx = build_auth_context(&state, &user);
    require_admin(&ctx).await?;

    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
        .bind(&payload.username)
        .fetch_one(&state.db)
        .await?;

    if exists.0 {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }

    let password_hash = hash_password(&payload.password)?;
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO users (id, username, password_hash, role, division_id, association)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(&payload.username)
    .bind(&password_hash)
    .bind(payload.role.to_string())
    .bind(division_id)
    .bind(payload.association)
    .execute(&state.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserSummary {
            id,
            username: payload.username,
            role: payload.role,
            division_id: Some(division_id),
            association: payload.association,
        }),
    ))
}

/// PUT /api/events/{division_id}/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserSummary>> {
    let ctx = build_auth_context(&state, &user);
    require_admin(&ctx).await?;

    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let row: UserRow = sqlx::query_as(
        r#"
        SELECT id, username, role, division_id, association
        FROM users
        WHERE id = $1 AND division_id = $2
        "#,
    )
    .bind(id)
    .bind(division_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("User not found".to_string()))?;

    let mut summary = row.into_summary()?;
    if let Some(role) = payload.role {
        summary.role = role;
    }
    if let Some(association) = payload.association {
        summary.association = Some(association);
    }

    if let Some(password) = payload.password {
        let password_hash = hash_password(&password)?;
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(&password_hash)
            .bind(id)
            .execute(&state.db)
            .await?;
    }

    sqlx::query(
        "UPDATE users SET role = $1, association = $2, updated_at = NOW() WHERE id = $3",
    )
    .bind(summary.role.to_string())
    .bind(summary.association)
    .bind(id)
    .execute(&state.db)
    .await?;

    Ok(Json(summary))
}

/// DELETE /api/events/{division_id}/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<StatusCode> {
    let ctx = build_auth_context(&state, &user);
    require_admin(&ctx).await?;

    if id == user.id {
        return Err(ApiError::Validation(
            "users cannot delete themselves".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = $1 AND division_id = $2")
        .bind(id)
        .bind(division_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
