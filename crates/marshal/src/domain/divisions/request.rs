//! Division request DTOs.

use serde::Deserialize;
use uuid::Uuid;

/// GET division query parameters
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDivisionQuery {
    /// Include the event schedule blocks in the response
    #[serde(default)]
    pub with_schedule: bool,
}

/// Event state upsert body. The whole document is replaced on PUT.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStateBody {
    pub active_session: Option<i32>,
    pub loaded_match: Option<Uuid>,
    pub active_match: Option<Uuid>,
    pub current_stage: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub audience_display: serde_json::Value,
    #[serde(default)]
    pub presentations: serde_json::Value,
}
