//! Team handlers.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use podium_common::Affiliation;
use serde_json::json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{
    request::{CreateTeamRequest, UpdateTeamRequest},
    response::{TeamListResponse, TeamResponse},
};
use crate::domain::authorization::{build_auth_context, require_tournament_manager};
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::notifier::{Channel, LifecycleEvent};
use crate::state::AppState;

#[derive(Debug, FromRow)]
struct TeamRow {
    id: Uuid,
    division_id: Uuid,
    number: i32,
    name: String,
    institution: String,
    city: String,
    registered: bool,
}

impl From<TeamRow> for TeamResponse {
    fn from(row: TeamRow) -> Self {
        TeamResponse {
            id: row.id,
            division_id: row.division_id,
            number: row.number,
            name: row.name,
            affiliation: Affiliation {
                institution: row.institution,
                city: row.city,
            },
            registered: row.registered,
        }
    }
}

async fn fetch_team(state: &AppState, division_id: Uuid, id: Uuid) -> ApiResult<TeamRow> {
    sqlx::query_as(
        r#"
        SELECT id, division_id, number, name, institution, city, registered
        FROM teams
        WHERE id = $1 AND division_id = $2
        "#,
    )
    .bind(id)
    .bind(division_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("Team not found".to_string()))
}

/// GET /api/events/{division_id}/teams
pub async fn list_teams(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
) -> ApiResult<Json<TeamListResponse>> {
    let rows: Vec<TeamRow> = sqlx::query_as(
        r#"
        SELECT id, division_id, number, name, institution, city, registered
        FROM teams
        WHERE division_id = $1
        ORDER BY number
        "#,
    )
    .bind(division_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(TeamListResponse {
        teams: rows.into_iter().map(TeamResponse::from).collect(),
    }))
}

/// GET /api/events/{division_id}/teams/{id}
pub async fn get_team(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<TeamResponse>> {
    let row = fetch_team(&state, division_id, id).await?;
    Ok(Json(row.into()))
}

/// POST /api/events/{division_id}/teams
pub async fn create_team(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateTeamRequest>,
) -> ApiResult<(StatusCode, Json<TeamResponse>)> {
    let ctx = build_auth_context(&state, &user);
    require_tournament_manager(&ctx).await?;

    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let exists: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM teams WHERE division_id = $1 AND number = $2)",
    )
    .bind(division_id)
    .bind(payload.number)
    .fetch_one(&state.db)
    .await?;

    if exists.0 {
        return Err(ApiError::Conflict(format!(
            "Team number {} already exists in this division",
            payload.number
        )));
    }

    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO teams (id, division_id, number, name, institution, city, registered)
        VALUES ($1, $2, $3, $4, $5, $6, FALSE)
        "#,
    )
    .bind(id)
    .bind(division_id)
    .bind(payload.number)
    .bind(&payload.name)
    .bind(&payload.affiliation.institution)
    .bind(&payload.affiliation.city)
    .execute(&state.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(TeamResponse {
            id,
            division_id,
            number: payload.number,
            name: payload.name,
            affiliation: payload.affiliation,
            registered: false,
        }),
    ))
}

/// PUT /api/events/{division_id}/teams/{id}
pub async fn update_team(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateTeamRequest>,
) -> ApiResult<Json<TeamResponse>> {
    let ctx = build_auth_context(&state, &user);
    require_tournament_manager(&ctx).await?;

    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let mut row = fetch_team(&state, division_id, id).await?;

    if let Some(name) = payload.name {
        row.name = name;
    }
    if let Some(affiliation) = payload.affiliation {
        row.institution = affiliation.institution;
        row.city = affiliation.city;
    }

    sqlx::query(
        r#"
        UPDATE teams SET name = $1, institution = $2, city = $3, updated_at = NOW()
        WHERE id = $4 AND division_id = $5
        "#,
    )
    .bind(&row.name)
    .bind(&row.institution)
    .bind(&row.city)
    .bind(id)
    .bind(division_id)
    .execute(&state.db)
    .await?;

    Ok(Json(row.into()))
}

/// DELETE /api/events/{division_id}/teams/{id}
pub async fn delete_team(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<StatusCode> {
    let ctx = build_auth_context(&state, &user);
    require_tournament_manager(&ctx).await?;

    let result = sqlx::query("DELETE FROM teams WHERE id = $1 AND division_id = $2")
        .bind(id)
        .bind(division_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Team not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/events/{division_id}/teams/{id}/register
///
/// Pit-admin check-in. Idempotent: registering an already-registered team
/// succeeds without a second event.
pub async fn register_team(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<TeamResponse>> {
    let row = fetch_team(&state, division_id, id).await?;

    if row.registered {
        return Ok(Json(row.into()));
    }

    sqlx::query(
        "UPDATE teams SET registered = TRUE, updated_at = NOW() WHERE id = $1 AND division_id = $2",
    )
    .bind(id)
    .bind(division_id)
    .execute(&state.db)
    .await?;

    state.notifier.publish(LifecycleEvent::new(
        division_id,
        Channel::PitAdmin,
        "teamRegistered",
        json!({"teamId": id, "number": row.number}),
    ));

    let mut row = row;
    row.registered = true;
    Ok(Json(row.into()))
}
