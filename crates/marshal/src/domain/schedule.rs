//! Schedule generation.
//!
//! Derives the division timetable from the roster and the venue layout,
//! then seeds judging sessions, robot game matches, scoresheets, and
//! empty rubrics. Regeneration is refused once any session or match has
//! left `not-started`.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use podium_common::{
    schedule::{build_schedule, BreakBlock, ScheduleConfig},
    MatchParticipant,
};
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use uuid::Uuid;
use validator::Validate;

use crate::domain::authorization::{build_auth_context, require_tournament_manager};
use crate::domain::rubrics::seed_rubrics;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/generate", post(generate))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateScheduleRequest {
    #[validate(range(min = 60, message = "Session length must be at least a minute"))]
    pub session_length_seconds: i64,

    #[validate(range(min = 60, message = "Match length must be at least a minute"))]
    pub match_length_seconds: i64,

    pub practice_rounds: usize,
    pub ranking_rounds: usize,

    pub judging_start: DateTime<Utc>,
    pub field_start: DateTime<Utc>,
    pub event_end: DateTime<Utc>,

    #[serde(default)]
    pub breaks: Vec<BreakBlock>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateScheduleResponse {
    pub sessions: usize,
    pub matches: usize,
    pub rubrics_seeded: u64,
}

/// POST /api/events/{division_id}/schedule/generate
pub async fn generate(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<GenerateScheduleRequest>,
) -> ApiResult<(StatusCode, Json<GenerateScheduleResponse>)> {
    let ctx = build_auth_context(&state, &user);
    require_tournament_manager(&ctx).await?;

    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let started: (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM judging_sessions
            WHERE division_id = $1 AND status <> 'not-started'
            UNION ALL
            SELECT 1 FROM matches
            WHERE division_id = $1 AND status <> 'not-started'
        )
        "#,
    )
    .bind(division_id)
    .fetch_one(&state.db)
    .await?;

    if started.0 {
        return Err(ApiError::Conflict(
            "the schedule cannot be regenerated once the event has started".to_string(),
        ));
    }

    let team_ids: Vec<(Uuid,)> =
        sqlx::query_as("SELECT id FROM teams WHERE division_id = $1 ORDER BY number")
            .bind(division_id)
            .fetch_all(&state.db)
            .await?;
    let room_ids: Vec<(Uuid,)> =
        sqlx::query_as("SELECT id FROM rooms WHERE division_id = $1 ORDER BY name")
            .bind(division_id)
            .fetch_all(&state.db)
            .await?;
    let table_ids: Vec<(Uuid,)> =
        sqlx::query_as("SELECT id FROM game_tables WHERE division_id = $1 ORDER BY name")
            .bind(division_id)
            .fetch_all(&state.db)
            .await?;

    let teams: Vec<Uuid> = team_ids.into_iter().map(|(id,)| id).collect();
    let rooms: Vec<Uuid> = room_ids.into_iter().map(|(id,)| id).collect();
    let tables: Vec<Uuid> = table_ids.into_iter().map(|(id,)| id).collect();

    if teams.is_empty() {
        return Err(ApiError::Validation(
            "the division has no teams to schedule".to_string(),
        ));
    }

    let config = ScheduleConfig {
        team_count: teams.len(),
        room_count: rooms.len(),
        table_count: tables.len(),
        session_length_seconds: payload.session_length_seconds,
        match_length_seconds: payload.match_length_seconds,
        practice_rounds: payload.practice_rounds,
        ranking_rounds: payload.ranking_rounds,
        judging_start: payload.judging_start,
        field_start: payload.field_start,
        event_end: payload.event_end,
        breaks: payload.breaks,
    };

    // Infeasible configurations map to 422; nothing is written.
    let timetable = build_schedule(&config)?;

    let mut tx = state.db.begin().await?;

    sqlx::query("DELETE FROM scoresheets WHERE division_id = $1")
        .bind(division_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM judging_sessions WHERE division_id = $1")
        .bind(division_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM matches WHERE division_id = $1")
        .bind(division_id)
        .execute(&mut *tx)
        .await?;

    for slot in &timetable.sessions {
        sqlx::query(
            r#"
            INSERT INTO judging_sessions
                (id, division_id, number, team_id, room_id, status, scheduled_time)
            VALUES ($1, $2, $3, $4, $5, 'not-started', $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(division_id)
        .bind(slot.number as i32)
        .bind(slot.team_index.map(|t| teams[t]))
        .bind(rooms[slot.room_index])
        .bind(slot.scheduled_time)
        .execute(&mut *tx)
        .await?;
    }

    for slot in &timetable.matches {
        let match_id = Uuid::new_v4();
        let participants: Vec<MatchParticipant> = slot
            .team_indices
            .iter()
            .enumerate()
            .map(|(table, team)| MatchParticipant {
                table_id: tables[table],
                team_id: team.map(|t| teams[t]),
            })
            .collect();

        sqlx::query(
            r#"
            INSERT INTO matches
                (id, division_id, number, stage, round, status, scheduled_time, participants)
            VALUES ($1, $2, $3, $4, $5, 'not-started', $6, $7)
            "#,
        )
        .bind(match_id)
        .bind(division_id)
        .bind(slot.number as i32)
        .bind(slot.stage.to_string())
        .bind(slot.round as i32)
        .bind(slot.scheduled_time)
        .bind(SqlJson(&participants))
        .execute(&mut *tx)
        .await?;

        // One empty scoresheet per occupied table.
        for participant in participants.iter().filter(|p| p.team_id.is_some()) {
            sqlx::query(
                r#"
                INSERT INTO scoresheets
                    (id, division_id, team_id, match_id, stage, round, status, data)
                VALUES ($1, $2, $3, $4, $5, $6, 'empty', '{}'::jsonb)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(division_id)
            .bind(participant.team_id)
            .bind(match_id)
            .bind(slot.stage.to_string())
            .bind(slot.round as i32)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    let rubrics_seeded = seed_rubrics(&state.db, division_id, &teams).await?;

    tracing::info!(
        %division_id,
        sessions = timetable.sessions.len(),
        matches = timetable.matches.len(),
        rubrics_seeded,
        "schedule generated"
    );

    Ok((
        StatusCode::CREATED,
        Json(GenerateScheduleResponse {
            sessions: timetable.sessions.len(),
            matches: timetable.matches.len(),
            rubrics_seeded,
        }),
    ))
}
