//! Robot game match request DTOs.

use chrono::{DateTime, Utc};
use podium_common::MatchParticipant;
use serde::Deserialize;

/// Update match request. Participant edits are allowed up until the match
/// completes; the scheduled time only while it has not started.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMatchRequest {
    pub participants: Option<Vec<MatchParticipant>>,
    pub scheduled_time: Option<DateTime<Utc>>,
}
