//! Judging session handlers.
//!
//! Lifecycle transitions are validated by the pure state machine in
//! podium-common before the row is written; the completion gate reads
//! the three rubric indicator columns carried on the session row.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use podium_common::{
    lifecycle::{validate_session_completion, validate_transition, SessionIndicators},
    RubricStatus, Status,
};
use serde_json::json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{
    request::{AbortRequest, UpdateSessionRequest},
    response::{SessionListResponse, SessionResponse},
};
use crate::domain::authorization::{
    build_auth_context, build_division_context, require_session_access,
    require_team_in_division, require_tournament_manager,
};
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::notifier::{Channel, LifecycleEvent};
use crate::state::AppState;

#[derive(Debug, FromRow)]
struct SessionRow {
    id: Uuid,
    division_id: Uuid,
    number: i32,
    team_id: Option<Uuid>,
    room_id: Uuid,
    status: String,
    scheduled_time: DateTime<Utc>,
    start_time: Option<DateTime<Utc>>,
    core_values: String,
    innovation_project: String,
    robot_design: String,
    abort_reason: Option<String>,
}

impl SessionRow {
    fn status(&self) -> Result<Status, ApiError> {
        self.status
            .parse()
            .map_err(|e: String| ApiError::Internal(format!("corrupt status column: {e}")))
    }

    fn indicators(&self) -> Result<SessionIndicators, ApiError> {
        let parse = |s: &str| -> Result<RubricStatus, ApiError> {
            s.parse()
                .map_err(|e: String| ApiError::Internal(format!("corrupt indicator column: {e}")))
        };
        Ok(SessionIndicators {
            core_values: parse(&self.core_values)?,
            innovation_project: parse(&self.innovation_project)?,
            robot_design: parse(&self.robot_design)?,
        })
    }

    fn into_response(self) -> Result<SessionResponse, ApiError> {
        let status = self.status()?;
        let indicators = self.indicators()?;
        Ok(SessionResponse {
            id: self.id,
            division_id: self.division_id,
            number: self.number,
            team_id: self.team_id,
            room_id: self.room_id,
            status,
            scheduled_time: self.scheduled_time,
            start_time: self.start_time,
            indicators,
            abort_reason: self.abort_reason,
        })
    }
}

const SESSION_COLUMNS: &str = r#"
    id, division_id, number, team_id, room_id, status, scheduled_time,
    start_time, core_values, innovation_project, robot_design, abort_reason
"#;

async fn fetch_session(state: &AppState, division_id: Uuid, id: Uuid) -> ApiResult<SessionRow> {
    let query = format!(
        "SELECT {SESSION_COLUMNS} FROM judging_sessions WHERE id = $1 AND division_id = $2"
    );
    sqlx::query_as(&query)
        .bind(id)
        .bind(division_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("Session not found".to_string()))
}

/// GET /api/events/{division_id}/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
) -> ApiResult<Json<SessionListResponse>> {
    let query = format!(
        "SELECT {SESSION_COLUMNS} FROM judging_sessions WHERE division_id = $1 ORDER BY number, scheduled_time"
    );
    let rows: Vec<SessionRow> = sqlx::query_as(&query)
        .bind(division_id)
        .fetch_all(&state.db)
        .await?;

    let sessions = rows
        .into_iter()
        .map(SessionRow::into_response)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(SessionListResponse { sessions }))
}

/// GET /api/events/{division_id}/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<SessionResponse>> {
    let row = fetch_session(&state, division_id, id).await?;
    Ok(Json(row.into_response()?))
}

/// PUT /api/events/{division_id}/sessions/{id}
///
/// Edit scheduling fields. Rejected once the session has left
/// `not-started`.
pub async fn update_session(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateSessionRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let ctx = build_auth_context(&state, &user);
    require_tournament_manager(&ctx).await?;

    let mut row = fetch_session(&state, division_id, id).await?;
    if row.status()? != Status::NotStarted {
        return Err(ApiError::Validation(
            "only scheduled sessions can be edited".to_string(),
        ));
    }

    if let Some(team_id) = payload.team_id {
        // A session may only point at a registered team in its own division.
        if let Some(new_team) = team_id {
            let team_ctx =
                build_division_context(&state, &user, division_id).with_team(new_team);
            require_team_in_division(&team_ctx).await?;

            let (registered,): (bool,) =
                sqlx::query_as("SELECT registered FROM teams WHERE id = $1")
                    .bind(new_team)
                    .fetch_one(&state.db)
                    .await?;
            if !registered {
                return Err(ApiError::Validation(
                    "only registered teams can be assigned to a session".to_string(),
                ));
            }
        }
        row.team_id = team_id;
    }
    if let Some(room_id) = payload.room_id {
        row.room_id = room_id;
    }
    if let Some(scheduled_time) = payload.scheduled_time {
        row.scheduled_time = scheduled_time;
    }

    sqlx::query(
        r#"
        UPDATE judging_sessions
        SET team_id = $1, room_id = $2, scheduled_time = $3, updated_at = NOW()
        WHERE id = $4 AND division_id = $5
        "#,
    )
    .bind(row.team_id)
    .bind(row.room_id)
    .bind(row.scheduled_time)
    .bind(id)
    .bind(division_id)
    .execute(&state.db)
    .await?;

    Ok(Json(row.into_response()?))
}

/// POST /api/events/{division_id}/sessions/{id}/start
pub async fn start_session(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<SessionResponse>> {
    let ctx = build_division_context(&state, &user, division_id).with_session(id);
    require_session_access(&ctx).await?;

    let row = fetch_session(&state, division_id, id).await?;
    validate_transition(row.status()?, Status::InProgress)?;

    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE judging_sessions
        SET status = 'in-progress', start_time = $1, updated_at = NOW()
        WHERE id = $2 AND division_id = $3
        "#,
    )
    .bind(now)
    .bind(id)
    .bind(division_id)
    .execute(&state.db)
    .await?;

    state.notifier.publish(LifecycleEvent::new(
        division_id,
        Channel::Judging,
        "sessionStarted",
        json!({"sessionId": id, "number": row.number, "startTime": now}),
    ));

    let row = fetch_session(&state, division_id, id).await?;
    Ok(Json(row.into_response()?))
}

/// POST /api/events/{division_id}/sessions/{id}/complete
///
/// Completion requires all three rubric indicators to be completed.
pub async fn complete_session(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<SessionResponse>> {
    let ctx = build_division_context(&state, &user, division_id).with_session(id);
    require_session_access(&ctx).await?;

    let row = fetch_session(&state, division_id, id).await?;
    validate_session_completion(row.status()?, row.indicators()?)?;

    sqlx::query(
        r#"
        UPDATE judging_sessions
        SET status = 'completed', updated_at = NOW()
        WHERE id = $1 AND division_id = $2
        "#,
    )
    .bind(id)
    .bind(division_id)
    .execute(&state.db)
    .await?;

    state.notifier.publish(LifecycleEvent::new(
        division_id,
        Channel::Judging,
        "sessionCompleted",
        json!({"sessionId": id, "number": row.number}),
    ));

    let row = fetch_session(&state, division_id, id).await?;
    Ok(Json(row.into_response()?))
}

/// POST /api/events/{division_id}/sessions/{id}/abort
pub async fn abort_session(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<AbortRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let ctx = build_division_context(&state, &user, division_id).with_session(id);
    require_session_access(&ctx).await?;

    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let row = fetch_session(&state, division_id, id).await?;
    validate_transition(row.status()?, Status::Aborted)?;

    sqlx::query(
        r#"
        UPDATE judging_sessions
        SET status = 'aborted', abort_reason = $1, updated_at = NOW()
        WHERE id = $2 AND division_id = $3
        "#,
    )
    .bind(&payload.reason)
    .bind(id)
    .bind(division_id)
    .execute(&state.db)
    .await?;

    state.notifier.publish(LifecycleEvent::new(
        division_id,
        Channel::Judging,
        "sessionAborted",
        json!({"sessionId": id, "number": row.number, "reason": payload.reason}),
    ));

    let row = fetch_session(&state, division_id, id).await?;
    Ok(Json(row.into_response()?))
}

/// POST /api/events/{division_id}/sessions/{id}/reset
///
/// Administrative reset back to `not-started`, clearing the start time
/// and abort reason. Not a lifecycle transition, so no event is published.
pub async fn reset_session(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<SessionResponse>> {
    let ctx = build_auth_context(&state, &user);
    require_tournament_manager(&ctx).await?;

    let result = sqlx::query(
        r#"
        UPDATE judging_sessions
        SET status = 'not-started', start_time = NULL, abort_reason = NULL, updated_at = NOW()
        WHERE id = $1 AND division_id = $2
        "#,
    )
    .bind(id)
    .bind(division_id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Session not found".to_string()));
    }

    tracing::info!(session_id = %id, user_id = %user.id, "judging session reset");

    let row = fetch_session(&state, division_id, id).await?;
    Ok(Json(row.into_response()?))
}
