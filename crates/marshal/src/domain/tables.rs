//! Robot game table domain module.

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
        .route("/", get(list_tables).post(create_table))
        .route(
            "/{id}",
            get(get_table).put(update_table).delete(delete_table),
        )
}

#[derive(Debug, Deserialize, Validate)]
pub struct TableBody {
    #[validate(length(min = 1, max = 255, message = "Table name is required"))]
    pub name: String,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TableResponse {
    pub id: Uuid,
    pub division_id: Uuid,
    pub name: String,
}

/// GET /api/events/{division_id}/tables
pub async fn list_tables(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TableResponse>>> {
    let rows: Vec<TableResponse> = sqlx::query_as(
        "SELECT id, division_id, name FROM game_tables WHERE division_id = $1 ORDER BY name",
    )
    .bind(division_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

/// GET /api/events/{division_id}/tables/{id}
pub async fn get_table(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<TableResponse>> {
    let row: TableResponse = sqlx::query_as(
        "SELECT id, division_id, name FROM game_tables WHERE id = $1 AND division_id = $2",
    )
    .bind(id)
    .bind(division_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("Table not found".to_string()))?;

    Ok(Json(row))
}

/// POST /api/events/{division_id}/tables
pub async fn create_table(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<TableBody>,
) -> ApiResult<(StatusCode, Json<TableResponse>)> {
    let ctx = build_auth_context(&state, &user);
    require_tournament_manager(&ctx).await?;

    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO game_tables (id, division_id, name) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(division_id)
        .bind(&payload.name)
        .execute(&state.db)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TableResponse {
            id,
            division_id,
            name: payload.name,
        }),
    ))
}

/// PUT /api/events/{division_id}/tables/{id}
pub async fn update_table(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<TableBody>,
) -> ApiResult<Json<TableResponse>> {
    let ctx = build_auth_context(&state, &user);
    require_tournament_manager(&ctx).await?;

    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let result = sqlx::query("UPDATE game_tables SET name = $1 WHERE id = $2 AND division_id = $3")
        .bind(&payload.name)
        .bind(id)
        .bind(division_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Table not found".to_string()));
    }

    Ok(Json(TableResponse {
        id,
        division_id,
        name: payload.name,
    }))
}

/// DELETE /api/events/{division_id}/tables/{id}
pub async fn delete_table(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<StatusCode> {
    let ctx = build_auth_context(&state, &user);
    require_tournament_manager(&ctx).await?;

    let result = sqlx::query("DELETE FROM game_tables WHERE id = $1 AND division_id = $2")
        .bind(id)
        .bind(division_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Table not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
