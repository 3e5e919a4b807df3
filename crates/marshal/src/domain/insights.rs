//! Dashboard insight aggregates.

use axum::{extract::{Path, State}, routing::get, Json, Router};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/judging/status", get(judging_status))
        .route("/field/status", get(field_status))
}

#[derive(Debug, FromRow)]
struct StatusCountRow {
    status: String,
    count: i64,
}

#[derive(Debug, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInsightResponse {
    pub total: i64,
    pub counts: Vec<StatusCount>,
}

fn summarize(rows: Vec<StatusCountRow>) -> StatusInsightResponse {
    let total = rows.iter().map(|r| r.count).sum();
    StatusInsightResponse {
        total,
        counts: rows
            .into_iter()
            .map(|r| StatusCount {
                status: r.status,
                count: r.count,
            })
            .collect(),
    }
}

/// GET /api/events/{division_id}/insights/judging/status
pub async fn judging_status(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
) -> ApiResult<Json<StatusInsightResponse>> {
    let rows: Vec<StatusCountRow> = sqlx::query_as(
        r#"
        SELECT status, COUNT(*) AS count
        FROM judging_sessions
        WHERE division_id = $1
        GROUP BY status
        ORDER BY status
        "#,
    )
    .bind(division_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(summarize(rows)))
}

/// GET /api/events/{division_id}/insights/field/status
pub async fn field_status(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
) -> ApiResult<Json<StatusInsightResponse>> {
    let rows: Vec<StatusCountRow> = sqlx::query_as(
        r#"
        SELECT status, COUNT(*) AS count
        FROM matches
        WHERE division_id = $1
        GROUP BY status
        ORDER BY status
        "#,
    )
    .bind(division_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(summarize(rows)))
}
