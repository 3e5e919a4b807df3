//! Judging room domain module.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::domain::authorization::{build_auth_context, require_tournament_manager};
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_rooms).post(create_room))
        .route(
            "/{id}",
            get(get_room).put(update_room).delete(delete_room),
        )
}

#[derive(Debug, Deserialize, Validate)]
pub struct RoomBody {
    #[validate(length(min = 1, max = 255, message = "Room name is required"))]
    pub name: String,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    pub id: Uuid,
    pub division_id: Uuid,
    pub name: String,
}

/// GET /api/events/{division_id}/rooms
pub async fn list_rooms(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
) -> ApiResult<Json<Vec<RoomResponse>>> {
    let rows: Vec<RoomResponse> = sqlx::query_as(
        "SELECT id, division_id, name FROM rooms WHERE division_id = $1 ORDER BY name",
    )
    .bind(division_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

/// GET /api/events/{division_id}/rooms/{id}
pub async fn get_room(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<RoomResponse>> {
    let row: RoomResponse = sqlx::query_as(
        "SELECT id, division_id, name FROM rooms WHERE id = $1 AND division_id = $2",
    )
    .bind(id)
    .bind(division_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("Room not found".to_string()))?;

    Ok(Json(row))
}

/// POST /api/events/{division_id}/rooms
pub async fn create_room(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RoomBody>,
) -> ApiResult<(StatusCode, Json<RoomResponse>)> {
    let ctx = build_auth_context(&state, &user);
    require_tournament_manager(&ctx).await?;

    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO rooms (id, division_id, name) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(division_id)
        .bind(&payload.name)
        .execute(&state.db)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RoomResponse {
            id,
            division_id,
            name: payload.name,
        }),
    ))
}

/// PUT /api/events/{division_id}/rooms/{id}
pub async fn update_room(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RoomBody>,
) -> ApiResult<Json<RoomResponse>> {
    let ctx = build_auth_context(&state, &user);
    require_tournament_manager(&ctx).await?;

    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let result = sqlx::query("UPDATE rooms SET name = $1 WHERE id = $2 AND division_id = $3")
        .bind(&payload.name)
        .bind(id)
        .bind(division_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Room not found".to_string()));
    }

    Ok(Json(RoomResponse {
        id,
        division_id,
        name: payload.name,
    }))
}

/// DELETE /api/events/{division_id}/rooms/{id}
pub async fn delete_room(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<StatusCode> {
    let ctx = build_auth_context(&state, &user);
    require_tournament_manager(&ctx).await?;

    let result = sqlx::query("DELETE FROM rooms WHERE id = $1 AND division_id = $2")
        .bind(id)
        .bind(division_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Room not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
