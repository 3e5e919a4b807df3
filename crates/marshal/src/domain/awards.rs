//! Award domain module.

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

use crate::domain::authorization::{build_auth_context, require_rubric_review_access};
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_awards).post(create_award))
        .route(
            "/{id}",
            get(get_award).put(update_award).delete(delete_award),
        )
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAwardRequest {
    #[validate(length(min = 1, max = 255, message = "Award name is required"))]
    pub name: String,
    pub index: i32,
    #[validate(range(min = 1, message = "Place must be positive"))]
    pub place: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAwardRequest {
    pub name: Option<String>,
    pub index: Option<i32>,
    pub place: Option<i32>,
    pub winner_team_id: Option<Uuid>,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AwardResponse {
    pub id: Uuid,
    pub division_id: Uuid,
    pub name: String,
    pub index: i32,
    pub place: i32,
    pub winner_team_id: Option<Uuid>,
}

/// GET /api/events/{division_id}/awards
pub async fn list_awards(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
) -> ApiResult<Json<Vec<AwardResponse>>> {
    let rows: Vec<AwardResponse> = sqlx::query_as(
        r#"
        SELECT id, division_id, name, index, place, winner_team_id
        FROM awards
        WHERE division_id = $1
        ORDER BY index, place
        "#,
    )
    .bind(division_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

/// GET /api/events/{division_id}/awards/{id}
pub async fn get_award(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<AwardResponse>> {
    let row: AwardResponse = sqlx::query_as(
        r#"
        SELECT id, division_id, name, index, place, winner_team_id
        FROM awards
        WHERE id = $1 AND division_id = $2
        "#,
    )
    .bind(id)
    .bind(division_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("Award not found".to_string()))?;

    Ok(Json(row))
}

/// POST /api/events/{division_id}/awards
pub async fn create_award(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateAwardRequest>,
) -> ApiResult<(StatusCode, Json<AwardResponse>)> {
    let ctx = build_auth_context(&state, &user);
    require_rubric_review_access(&ctx).await?;

    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO awards (id, division_id, name, index, place) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(division_id)
    .bind(&payload.name)
    .bind(payload.index)
    .bind(payload.place)
    .execute(&state.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(AwardResponse {
            id,
            division_id,
            name: payload.name,
            index: payload.index,
            place: payload.place,
            winner_team_id: None,
        }),
    ))
}

/// PUT /api/events/{division_id}/awards/{id}
pub async fn update_award(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateAwardRequest>,
) -> ApiResult<Json<AwardResponse>> {
    let ctx = build_auth_context(&state, &user);
    require_rubric_review_access(&ctx).await?;

    let mut row: AwardResponse = sqlx::query_as(
        r#"
        SELECT id, division_id, name, index, place, winner_team_id
        FROM awards
        WHERE id = $1 AND division_id = $2
        "#,
    )
    .bind(id)
    .bind(division_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("Award not found".to_string()))?;

    if let Some(name) = payload.name {
        row.name = name;
    }
    if let Some(index) = payload.index {
        row.index = index;
    }
    if let Some(place) = payload.place {
        row.place = place;
    }
    if let Some(winner) = payload.winner_team_id {
        row.winner_team_id = Some(winner);
    }

    sqlx::query(
        r#"
        UPDATE awards SET name = $1, index = $2, place = $3, winner_team_id = $4
        WHERE id = $5 AND division_id = $6
        "#,
    )
    .bind(&row.name)
    .bind(row.index)
    .bind(row.place)
    .bind(row.winner_team_id)
    .bind(id)
    .bind(division_id)
    .execute(&state.db)
    .await?;

    Ok(Json(row))
}

/// DELETE /api/events/{division_id}/awards/{id}
pub async fn delete_award(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<StatusCode> {
    let ctx = build_auth_context(&state, &user);
    require_rubric_review_access(&ctx).await?;

    let result = sqlx::query("DELETE FROM awards WHERE id = $1 AND division_id = $2")
        .bind(id)
        .bind(division_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Award not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
