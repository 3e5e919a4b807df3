//! Scoresheet domain module.
//!
//! Scoresheets are created alongside matches and filled in by referees;
//! the scorekeeper dashboard listens for status changes.

use axum::{
    extract::{Extension, Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{types::Json as SqlJson, FromRow};
use uuid::Uuid;

use crate::domain::authorization::{build_auth_context, require_field_role};
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::notifier::{Channel, LifecycleEvent};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_scoresheets))
        .route("/{id}", get(get_scoresheet).put(update_scoresheet))
}

const SCORESHEET_STATUSES: &[&str] =
    &["empty", "in-progress", "completed", "waiting-for-gp", "ready"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScoresheetRequest {
    pub status: Option<String>,
    pub data: Option<serde_json::Value>,
    pub score: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoresheetResponse {
    pub id: Uuid,
    pub division_id: Uuid,
    pub team_id: Uuid,
    pub match_id: Uuid,
    pub stage: String,
    pub round: i32,
    pub status: String,
    pub data: serde_json::Value,
    pub score: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ScoresheetRow {
    id: Uuid,
    division_id: Uuid,
    team_id: Uuid,
    match_id: Uuid,
    stage: String,
    round: i32,
    status: String,
    data: SqlJson<serde_json::Value>,
    score: Option<i32>,
    updated_at: DateTime<Utc>,
}

impl From<ScoresheetRow> for ScoresheetResponse {
    fn from(row: ScoresheetRow) -> Self {
        ScoresheetResponse {
            id: row.id,
            division_id: row.division_id,
            team_id: row.team_id,
            match_id: row.match_id,
            stage: row.stage,
            round: row.round,
            status: row.status,
            data: row.data.0,
            score: row.score,
            updated_at: row.updated_at,
        }
    }
}

/// GET /api/events/{division_id}/scoresheets
pub async fn list_scoresheets(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ScoresheetResponse>>> {
    let rows: Vec<ScoresheetRow> = sqlx::query_as(
        r#"
        SELECT id, division_id, team_id, match_id, stage, round, status, data, score, updated_at
        FROM scoresheets
        WHERE division_id = $1
        ORDER BY round, stage
        "#,
    )
    .bind(division_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /api/events/{division_id}/scoresheets/{id}
pub async fn get_scoresheet(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ScoresheetResponse>> {
    let row: ScoresheetRow = sqlx::query_as(
        r#"
        SELECT id, division_id, team_id, match_id, stage, round, status, data, score, updated_at
        FROM scoresheets
        WHERE id = $1 AND division_id = $2
        "#,
    )
    .bind(id)
    .bind(division_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("Scoresheet not found".to_string()))?;

    Ok(Json(row.into()))
}

/// PUT /api/events/{division_id}/scoresheets/{id}
pub async fn update_scoresheet(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateScoresheetRequest>,
) -> ApiResult<Json<ScoresheetResponse>> {
    let ctx = build_auth_context(&state, &user);
    require_field_role(&ctx).await?;

    if let Some(status) = &payload.status {
        if !SCORESHEET_STATUSES.contains(&status.as_str()) {
            return Err(ApiError::Validation(format!(
                "unknown scoresheet status: {status}"
            )));
        }
    }

    let mut row: ScoresheetRow = sqlx::query_as(
        r#"
        SELECT id, division_id, team_id, match_id, stage, round, status, data, score, updated_at
        FROM scoresheets
        WHERE id = $1 AND division_id = $2
        "#,
    )
    .bind(id)
    .bind(division_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("Scoresheet not found".to_string()))?;

    let status_changed = payload
        .status
        .as_ref()
        .is_some_and(|s| *s != row.status);

    if let Some(status) = payload.status {
        row.status = status;
    }
    if let Some(data) = payload.data {
        row.data = SqlJson(data);
    }
    if let Some(score) = payload.score {
        row.score = Some(score);
    }

    sqlx::query(
        r#"
        UPDATE scoresheets SET status = $1, data = $2, score = $3, updated_at = NOW()
        WHERE id = $4 AND division_id = $5
        "#,
    )
    .bind(&row.status)
    .bind(&row.data)
    .bind(row.score)
    .bind(id)
    .bind(division_id)
    .execute(&state.db)
    .await?;

    if status_changed {
        state.notifier.publish(LifecycleEvent::new(
            division_id,
            Channel::Field,
            "scoresheetStatusChanged",
            json!({"scoresheetId": id, "teamId": row.team_id, "status": row.status}),
        ));
    }

    Ok(Json(row.into()))
}
