//! Robot game match response DTOs.

use chrono::{DateTime, Utc};
use podium_common::{MatchParticipant, MatchStage, Status};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub id: Uuid,
    pub division_id: Uuid,
    pub number: i32,
    pub stage: MatchStage,
    pub round: i32,
    pub status: Status,
    pub scheduled_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub participants: Vec<MatchParticipant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchListResponse {
    pub matches: Vec<MatchResponse>,
}
