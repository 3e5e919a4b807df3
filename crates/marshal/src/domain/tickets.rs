//! Pit-admin ticket domain module.
//!
//! Tickets track team requests and incidents raised at the pit. Creation
//! notifies the pit-admin channel so the desk picks them up immediately.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::notifier::{Channel, LifecycleEvent};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tickets).post(create_ticket))
        .route("/{id}", get(get_ticket).put(update_ticket))
}

const TICKET_TYPES: &[&str] = &["general", "schedule", "utilities", "incident"];

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub team_id: Option<Uuid>,

    #[validate(length(min = 1, max = 255, message = "Ticket title is required"))]
    pub title: String,

    #[validate(length(min = 1, max = 4000, message = "Ticket content is required"))]
    pub content: String,

    #[serde(rename = "type")]
    pub ticket_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Setting this closes the ticket.
    pub closed: Option<bool>,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub id: Uuid,
    pub division_id: Uuid,
    pub team_id: Option<Uuid>,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub ticket_type: String,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// GET /api/events/{division_id}/tickets
pub async fn list_tickets(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TicketResponse>>> {
    let rows: Vec<TicketResponse> = sqlx::query_as(
        r#"
        SELECT id, division_id, team_id, title, content, ticket_type, created_at, closed_at
        FROM tickets
        WHERE division_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(division_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

/// GET /api/events/{division_id}/tickets/{id}
pub async fn get_ticket(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<TicketResponse>> {
    let row: TicketResponse = sqlx::query_as(
        r#"
        SELECT id, division_id, team_id, title, content, ticket_type, created_at, closed_at
        FROM tickets
        WHERE id = $1 AND division_id = $2
        "#,
    )
    .bind(id)
    .bind(division_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("Ticket not found".to_string()))?;

    Ok(Json(row))
}

/// POST /api/events/{division_id}/tickets
pub async fn create_ticket(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
    Json(payload): Json<CreateTicketRequest>,
) -> ApiResult<(StatusCode, Json<TicketResponse>)> {
    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    if !TICKET_TYPES.contains(&payload.ticket_type.as_str()) {
        return Err(ApiError::Validation(format!(
            "unknown ticket type: {}",
            payload.ticket_type
        )));
    }

    let id = Uuid::new_v4();
    let row: TicketResponse = sqlx::query_as(
        r#"
        INSERT INTO tickets (id, division_id, team_id, title, content, ticket_type)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, division_id, team_id, title, content, ticket_type, created_at, closed_at
        "#,
    )
    .bind(id)
    .bind(division_id)
    .bind(payload.team_id)
    .bind(&payload.title)
    .bind(&payload.content)
    .bind(&payload.ticket_type)
    .fetch_one(&state.db)
    .await?;

    state.notifier.publish(LifecycleEvent::new(
        division_id,
        Channel::PitAdmin,
        "ticketCreated",
        json!({"ticketId": id, "title": row.title}),
    ));

    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /api/events/{division_id}/tickets/{id}
pub async fn update_ticket(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateTicketRequest>,
) -> ApiResult<Json<TicketResponse>> {
    let mut row: TicketResponse = sqlx::query_as(
        r#"
        SELECT id, division_id, team_id, title, content, ticket_type, created_at, closed_at
        FROM tickets
        WHERE id = $1 AND division_id = $2
        "#,
    )
    .bind(id)
    .bind(division_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("Ticket not found".to_string()))?;

    if let Some(title) = payload.title {
        row.title = title;
    }
    if let Some(content) = payload.content {
        row.content = content;
    }
    if payload.closed == Some(true) && row.closed_at.is_none() {
        row.closed_at = Some(Utc::now());
    }

    sqlx::query(
        r#"
        UPDATE tickets SET title = $1, content = $2, closed_at = $3
        WHERE id = $4 AND division_id = $5
        "#,
    )
    .bind(&row.title)
    .bind(&row.content)
    .bind(row.closed_at)
    .bind(id)
    .bind(division_id)
    .execute(&state.db)
    .await?;

    state.notifier.publish(LifecycleEvent::new(
        division_id,
        Channel::PitAdmin,
        "ticketUpdated",
        json!({"ticketId": id}),
    ));

    Ok(Json(row))
}
