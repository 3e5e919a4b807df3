//! Robot game match handlers.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use podium_common::{
    lifecycle::validate_transition, MatchParticipant, MatchStage, Status,
};
use serde_json::json;
use sqlx::{types::Json as SqlJson, FromRow};
use uuid::Uuid;
use validator::Validate;

use super::{
    request::UpdateMatchRequest,
    response::{MatchListResponse, MatchResponse},
};
use crate::domain::authorization::{
    build_auth_context, require_field_role, require_tournament_manager,
};
use crate::domain::sessions::AbortRequest;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::notifier::{Channel, LifecycleEvent};
use crate::state::AppState;

#[derive(Debug, FromRow)]
struct MatchRow {
    id: Uuid,
    division_id: Uuid,
    number: i32,
    stage: String,
    round: i32,
    status: String,
    scheduled_time: DateTime<Utc>,
    start_time: Option<DateTime<Utc>>,
    participants: SqlJson<Vec<MatchParticipant>>,
    abort_reason: Option<String>,
}

impl MatchRow {
    fn status(&self) -> Result<Status, ApiError> {
        self.status
            .parse()
            .map_err(|e: String| ApiError::Internal(format!("corrupt status column: {e}")))
    }

    fn stage(&self) -> Result<MatchStage, ApiError> {
        self.stage
            .parse()
            .map_err(|e: String| ApiError::Internal(format!("corrupt stage column: {e}")))
    }

    fn into_response(self) -> Result<MatchResponse, ApiError> {
        let status = self.status()?;
        let stage = self.stage()?;
        Ok(MatchResponse {
            id: self.id,
            division_id: self.division_id,
            number: self.number,
            stage,
            round: self.round,
            status,
            scheduled_time: self.scheduled_time,
            start_time: self.start_time,
            participants: self.participants.0,
            abort_reason: self.abort_reason,
        })
    }
}

const MATCH_COLUMNS: &str = r#"
    id, division_id, number, stage, round, status, scheduled_time,
    start_time, participants, abort_reason
"#;

async fn fetch_match(state: &AppState, division_id: Uuid, id: Uuid) -> ApiResult<MatchRow> {
    let query =
        format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1 AND division_id = $2");
    sqlx::query_as(&query)
        .bind(id)
        .bind(division_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("Match not found".to_string()))
}

/// GET /api/events/{division_id}/matches
pub async fn list_matches(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
) -> ApiResult<Json<MatchListResponse>> {
    let query =
        format!("SELECT {MATCH_COLUMNS} FROM matches WHERE division_id = $1 ORDER BY number");
    let rows: Vec<MatchRow> = sqlx::query_as(&query)
        .bind(division_id)
        .fetch_all(&state.db)
        .await?;

    let matches = rows
        .into_iter()
        .map(MatchRow::into_response)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(MatchListResponse { matches }))
}

/// GET /api/events/{division_id}/matches/{id}
pub async fn get_match(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MatchResponse>> {
    let row = fetch_match(&state, division_id, id).await?;
    Ok(Json(row.into_response()?))
}

/// PUT /api/events/{division_id}/matches/{id}
///
/// Edit the participant list or the scheduled time. Participant edits
/// publish `matchUpdated` so referee and scorekeeper screens refresh.
pub async fn update_match(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateMatchRequest>,
) -> ApiResult<Json<MatchResponse>> {
    let ctx = build_auth_context(&state, &user);
    require_field_role(&ctx).await?;

    let mut row = fetch_match(&state, division_id, id).await?;
    let status = row.status()?;

    if status.is_terminal() {
        return Err(ApiError::Validation(
            "completed or aborted matches cannot be edited".to_string(),
        ));
    }
    if payload.scheduled_time.is_some() && status != Status::NotStarted {
        return Err(ApiError::Validation(
            "the scheduled time can only change before the match starts".to_string(),
        ));
    }

    let participants_changed = payload.participants.is_some();
    if let Some(participants) = payload.participants {
        row.participants = SqlJson(participants);
    }
    if let Some(scheduled_time) = payload.scheduled_time {
        row.scheduled_time = scheduled_time;
    }

    sqlx::query(
        r#"
        UPDATE matches SET participants = $1, scheduled_time = $2, updated_at = NOW()
        WHERE id = $3 AND division_id = $4
        "#,
    )
    .bind(&row.participants)
    .bind(row.scheduled_time)
    .bind(id)
    .bind(division_id)
    .execute(&state.db)
    .await?;

    if participants_changed {
        state.notifier.publish(LifecycleEvent::new(
            division_id,
            Channel::Field,
            "matchUpdated",
            json!({"matchId": id, "number": row.number}),
        ));
    }

    Ok(Json(row.into_response()?))
}

/// POST /api/events/{division_id}/matches/{id}/start
pub async fn start_match(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<MatchResponse>> {
    let ctx = build_auth_context(&state, &user);
    require_field_role(&ctx).await?;

    let row = fetch_match(&state, division_id, id).await?;
    validate_transition(row.status()?, Status::InProgress)?;

    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE matches SET status = 'in-progress', start_time = $1, updated_at = NOW()
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
        Channel::Field,
        "matchStarted",
        json!({"matchId": id, "number": row.number, "startTime": now}),
    ));

    let row = fetch_match(&state, division_id, id).await?;
    Ok(Json(row.into_response()?))
}

/// POST /api/events/{division_id}/matches/{id}/complete
pub async fn complete_match(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<MatchResponse>> {
    let ctx = build_auth_context(&state, &user);
    require_field_role(&ctx).await?;

    let row = fetch_match(&state, division_id, id).await?;
    validate_transition(row.status()?, Status::Completed)?;

    sqlx::query(
        r#"
        UPDATE matches SET status = 'completed', updated_at = NOW()
        WHERE id = $1 AND division_id = $2
        "#,
    )
    .bind(id)
    .bind(division_id)
    .execute(&state.db)
    .await?;

    state.notifier.publish(LifecycleEvent::new(
        division_id,
        Channel::Field,
        "matchCompleted",
        json!({"matchId": id, "number": row.number}),
    ));

    let row = fetch_match(&state, division_id, id).await?;
    Ok(Json(row.into_response()?))
}

/// POST /api/events/{division_id}/matches/{id}/abort
pub async fn abort_match(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<AbortRequest>,
) -> ApiResult<Json<MatchResponse>> {
    let ctx = build_auth_context(&state, &user);
    require_field_role(&ctx).await?;

    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let row = fetch_match(&state, division_id, id).await?;
    validate_transition(row.status()?, Status::Aborted)?;

    sqlx::query(
        r#"
        UPDATE matches SET status = 'aborted', abort_reason = $1, updated_at = NOW()
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
        Channel::Field,
        "matchAborted",
        json!({"matchId": id, "number": row.number, "reason": payload.reason}),
    ));

    let row = fetch_match(&state, division_id, id).await?;
    Ok(Json(row.into_response()?))
}

/// POST /api/events/{division_id}/matches/{id}/reset
///
/// Administrative reset back to `not-started`. No event is published.
pub async fn reset_match(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<MatchResponse>> {
    let ctx = build_auth_context(&state, &user);
    require_tournament_manager(&ctx).await?;

    let result = sqlx::query(
        r#"
        UPDATE matches
        SET status = 'not-started', start_time = NULL, abort_reason = NULL, updated_at = NOW()
        WHERE id = $1 AND division_id = $2
        "#,
    )
    .bind(id)
    .bind(division_id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Match not found".to_string()));
    }

    tracing::info!(match_id = %id, user_id = %user.id, "match reset");

    let row = fetch_match(&state, division_id, id).await?;
    Ok(Json(row.into_response()?))
}
