//! Division response DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Division document, with the owning event folded in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DivisionResponse {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub color: String,
    pub event_name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub has_state: bool,
    /// Only present when requested with `withSchedule=true`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<serde_json::Value>,
}

/// Event state document
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStateResponse {
    pub division_id: Uuid,
    pub active_session: Option<i32>,
    pub loaded_match: Option<Uuid>,
    pub active_match: Option<Uuid>,
    pub current_stage: String,
    pub completed: bool,
    pub audience_display: serde_json::Value,
    pub presentations: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}
