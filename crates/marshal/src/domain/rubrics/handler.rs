//! Rubric handlers.
//!
//! Rubrics are seeded empty at event setup (one per team and category)
//! and upserted whole by judges. A rubric cannot be marked completed
//! until its owning judging session has completed; past that gate the
//! update is last-write-wins.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use podium_common::{JudgingCategory, RubricStatus, Status};
use serde_json::json;
use sqlx::{types::Json as SqlJson, FromRow};
use uuid::Uuid;

use super::{request::UpsertRubricRequest, response::{RubricListResponse, RubricResponse}};
use crate::domain::authorization::{
    build_auth_context, build_division_context, require_judging_role,
    require_team_in_division, require_tournament_manager,
};
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::notifier::{Channel, LifecycleEvent};
use crate::state::AppState;

#[derive(Debug, FromRow)]
struct RubricRow {
    id: Uuid,
    division_id: Uuid,
    team_id: Uuid,
    category: String,
    status: String,
    data: SqlJson<serde_json::Value>,
    updated_at: DateTime<Utc>,
}

impl RubricRow {
    fn into_response(self) -> Result<RubricResponse, ApiError> {
        let category: JudgingCategory = self
            .category
            .parse()
            .map_err(|e: String| ApiError::Internal(format!("corrupt category column: {e}")))?;
        let status: RubricStatus = self
            .status
            .parse()
            .map_err(|e: String| ApiError::Internal(format!("corrupt status column: {e}")))?;
        Ok(RubricResponse {
            id: self.id,
            division_id: self.division_id,
            team_id: self.team_id,
            category,
            status,
            data: self.data.0,
            updated_at: self.updated_at,
        })
    }
}

fn parse_category(raw: &str) -> Result<JudgingCategory, ApiError> {
    raw.parse().map_err(ApiError::Validation)
}

fn indicator_column(category: JudgingCategory) -> &'static str {
    match category {
        JudgingCategory::CoreValues => "core_values",
        JudgingCategory::InnovationProject => "innovation_project",
        JudgingCategory::RobotDesign => "robot_design",
    }
}

/// Seed one empty rubric per (team, category) pair. Existing rubrics are
/// left untouched.
pub async fn seed_rubrics(
    db: &sqlx::PgPool,
    division_id: Uuid,
    team_ids: &[Uuid],
) -> Result<u64, sqlx::Error> {
    let mut seeded = 0;
    for &team_id in team_ids {
        for category in JudgingCategory::ALL {
            let result = sqlx::query(
                r#"
                INSERT INTO rubrics (id, division_id, team_id, category, status, data)
                VALUES ($1, $2, $3, $4, 'empty', '{}'::jsonb)
                ON CONFLICT (team_id, category) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(division_id)
            .bind(team_id)
            .bind(category.to_string())
            .execute(db)
            .await?;
            seeded += result.rows_affected();
        }
    }
    Ok(seeded)
}

/// GET /api/events/{division_id}/rubrics/team/{team_id}
pub async fn list_team_rubrics(
    State(state): State<AppState>,
    Path((division_id, team_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<RubricListResponse>> {
    let rows: Vec<RubricRow> = sqlx::query_as(
        r#"
        SELECT id, division_id, team_id, category, status, data, updated_at
        FROM rubrics
        WHERE division_id = $1 AND team_id = $2
        ORDER BY category
        "#,
    )
    .bind(division_id)
    .bind(team_id)
    .fetch_all(&state.db)
    .await?;

    let rubrics = rows
        .into_iter()
        .map(RubricRow::into_response)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(RubricListResponse { rubrics }))
}

/// GET /api/events/{division_id}/rubrics/team/{team_id}/{category}
pub async fn get_rubric(
    State(state): State<AppState>,
    Path((division_id, team_id, category)): Path<(Uuid, Uuid, String)>,
) -> ApiResult<Json<RubricResponse>> {
    let category = parse_category(&category)?;

    let row: RubricRow = sqlx::query_as(
        r#"
        SELECT id, division_id, team_id, category, status, data, updated_at
        FROM rubrics
        WHERE division_id = $1 AND team_id = $2 AND category = $3
        "#,
    )
    .bind(division_id)
    .bind(team_id)
    .bind(category.to_string())
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("Rubric not found".to_string()))?;

    Ok(Json(row.into_response()?))
}

/// PUT /api/events/{division_id}/rubrics/team/{team_id}/{category}
///
/// Whole-document upsert. Marking the rubric completed (or beyond) is
/// rejected until the team's judging session has completed. The matching
/// session indicator column is kept in sync on every status change.
pub async fn upsert_rubric(
    State(state): State<AppState>,
    Path((division_id, team_id, category)): Path<(Uuid, Uuid, String)>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpsertRubricRequest>,
) -> ApiResult<Json<RubricResponse>> {
    let ctx = build_division_context(&state, &user, division_id).with_team(team_id);
    require_judging_role(&ctx).await?;
    require_team_in_division(&ctx).await?;

    let category = parse_category(&category)?;

    if payload.status.is_completed() {
        let session_status: Option<(String,)> = sqlx::query_as(
            "SELECT status FROM judging_sessions WHERE division_id = $1 AND team_id = $2",
        )
        .bind(division_id)
        .bind(team_id)
        .fetch_optional(&state.db)
        .await?;

        let completed = session_status
            .and_then(|(s,)| s.parse::<Status>().ok())
            .map(|s| s == Status::Completed)
            .unwrap_or(false);

        if !completed {
            return Err(ApiError::Validation(
                "rubric cannot be completed before the judging session completes".to_string(),
            ));
        }
    }

    let previous: Option<(String,)> = sqlx::query_as(
        "SELECT status FROM rubrics WHERE division_id = $1 AND team_id = $2 AND category = $3",
    )
    .bind(division_id)
    .bind(team_id)
    .bind(category.to_string())
    .fetch_optional(&state.db)
    .await?;

    let row: RubricRow = sqlx::query_as(
        r#"
        INSERT INTO rubrics (id, division_id, team_id, category, status, data, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, NOW())
        ON CONFLICT (team_id, category) DO UPDATE SET
            status = EXCLUDED.status,
            data = EXCLUDED.data,
            updated_at = NOW()
        RETURNING id, division_id, team_id, category, status, data, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(division_id)
    .bind(team_id)
    .bind(category.to_string())
    .bind(payload.status.to_string())
    .bind(SqlJson(&payload.data))
    .fetch_one(&state.db)
    .await?;

    let status_changed = previous.map(|(s,)| s) != Some(payload.status.to_string());
    if status_changed {
        // Mirror the new status onto the session indicator column.
        let query = format!(
            "UPDATE judging_sessions SET {} = $1, updated_at = NOW() \
             WHERE division_id = $2 AND team_id = $3",
            indicator_column(category)
        );
        sqlx::query(&query)
            .bind(payload.status.to_string())
            .bind(division_id)
            .bind(team_id)
            .execute(&state.db)
            .await?;

        state.notifier.publish(LifecycleEvent::new(
            division_id,
            Channel::Judging,
            "rubricStatusChanged",
            json!({
                "teamId": team_id,
                "category": category,
                "status": payload.status,
            }),
        ));
    }

    state.notifier.publish(LifecycleEvent::new(
        division_id,
        Channel::Judging,
        "rubricUpdated",
        json!({"teamId": team_id, "category": category}),
    ));

    Ok(Json(row.into_response()?))
}

/// DELETE /api/events/{division_id}/rubrics/team/{team_id}/{category}
pub async fn delete_rubric(
    State(state): State<AppState>,
    Path((division_id, team_id, category)): Path<(Uuid, Uuid, String)>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<StatusCode> {
    let ctx = build_auth_context(&state, &user);
    require_tournament_manager(&ctx).await?;

    let category = parse_category(&category)?;

    let result = sqlx::query(
        "DELETE FROM rubrics WHERE division_id = $1 AND team_id = $2 AND category = $3",
    )
    .bind(division_id)
    .bind(team_id)
    .bind(category.to_string())
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Rubric not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/events/{division_id}/rubrics/team/{team_id}
///
/// Remove every rubric for a team, used when a team leaves the division.
pub async fn delete_team_rubrics(
    State(state): State<AppState>,
    Path((division_id, team_id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<serde_json::Value>> {
    let ctx = build_auth_context(&state, &user);
    require_tournament_manager(&ctx).await?;

    let result = sqlx::query("DELETE FROM rubrics WHERE division_id = $1 AND team_id = $2")
        .bind(division_id)
        .bind(team_id)
        .execute(&state.db)
        .await?;

    Ok(Json(json!({"deleted": result.rows_affected()})))
}
