//! Division and event-state handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::FromRow;
use uuid::Uuid;

use super::{
    request::{EventStateBody, GetDivisionQuery},
    response::{DivisionResponse, EventStateResponse},
};
use crate::error::{ApiError, ApiResult};
use crate::notifier::{Channel, LifecycleEvent};
use crate::state::AppState;

#[derive(Debug, FromRow)]
struct DivisionRow {
    id: Uuid,
    event_id: Uuid,
    name: String,
    color: String,
    event_name: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    has_state: bool,
    schedule: Option<serde_json::Value>,
}

#[derive(Debug, FromRow)]
struct EventStateRow {
    division_id: Uuid,
    active_session: Option<i32>,
    loaded_match: Option<Uuid>,
    active_match: Option<Uuid>,
    current_stage: String,
    completed: bool,
    audience_display: serde_json::Value,
    presentations: serde_json::Value,
    updated_at: DateTime<Utc>,
}

/// GET /api/events/{division_id}
///
/// Fetch the division document. The event schedule blocks are stripped
/// unless `withSchedule=true`.
pub async fn get_division(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
    Query(query): Query<GetDivisionQuery>,
) -> ApiResult<Json<DivisionResponse>> {
    let row: DivisionRow = sqlx::query_as(
        r#"
        SELECT d.id, d.event_id, d.name, d.color,
               e.name AS event_name, e.start_date, e.end_date, e.has_state,
               e.schedule
        FROM divisions d
        JOIN events e ON e.id = d.event_id
        WHERE d.id = $1
        "#,
    )
    .bind(division_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("Division not found".to_string()))?;

    Ok(Json(DivisionResponse {
        id: row.id,
        event_id: row.event_id,
        name: row.name,
        color: row.color,
        event_name: row.event_name,
        start_date: row.start_date,
        end_date: row.end_date,
        has_state: row.has_state,
        schedule: if query.with_schedule {
            row.schedule
        } else {
            None
        },
    }))
}

/// GET /api/events/{division_id}/state
pub async fn get_state(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
) -> ApiResult<Json<EventStateResponse>> {
    let row: EventStateRow = sqlx::query_as(
        r#"
        SELECT division_id, active_session, loaded_match, active_match,
               current_stage, completed, audience_display, presentations, updated_at
        FROM event_states
        WHERE division_id = $1
        "#,
    )
    .bind(division_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("Event state not found".to_string()))?;

    Ok(Json(EventStateResponse {
        division_id: row.division_id,
        active_session: row.active_session,
        loaded_match: row.loaded_match,
        active_match: row.active_match,
        current_stage: row.current_stage,
        completed: row.completed,
        audience_display: row.audience_display,
        presentations: row.presentations,
        updated_at: row.updated_at,
    }))
}

/// PUT /api/events/{division_id}/state
///
/// Upsert the whole event-state document. This endpoint keeps the
/// original wire contract: `{ok: true, id}` on success, 400 `{ok: false}`
/// on a malformed body, 500 `{ok: false}` when the write fails.
pub async fn put_state(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
    body: Result<Json<EventStateBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return (StatusCode::BAD_REQUEST, Json(json!({"ok": false}))).into_response();
    };

    let result = sqlx::query(
        r#"
        INSERT INTO event_states
            (division_id, active_session, loaded_match, active_match,
             current_stage, completed, audience_display, presentations, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
        ON CONFLICT (division_id) DO UPDATE SET
            active_session = EXCLUDED.active_session,
            loaded_match = EXCLUDED.loaded_match,
            active_match = EXCLUDED.active_match,
            current_stage = EXCLUDED.current_stage,
            completed = EXCLUDED.completed,
            audience_display = EXCLUDED.audience_display,
            presentations = EXCLUDED.presentations,
            updated_at = NOW()
        "#,
    )
    .bind(division_id)
    .bind(body.active_session)
    .bind(body.loaded_match)
    .bind(body.active_match)
    .bind(&body.current_stage)
    .bind(body.completed)
    .bind(&body.audience_display)
    .bind(&body.presentations)
    .execute(&state.db)
    .await;

    match result {
        Ok(_) => {
            state.notifier.publish(LifecycleEvent::new(
                division_id,
                Channel::AudienceDisplay,
                "stateUpdated",
                json!({"divisionId": division_id}),
            ));
            (
                StatusCode::OK,
                Json(json!({"ok": true, "id": division_id})),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("event state upsert failed: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"ok": false})),
            )
                .into_response()
        }
    }
}
