//! Judging session response DTOs.

use chrono::{DateTime, Utc};
use podium_common::{lifecycle::SessionIndicators, Status};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: Uuid,
    pub division_id: Uuid,
    pub number: i32,
    pub team_id: Option<Uuid>,
    pub room_id: Uuid,
    pub status: Status,
    pub scheduled_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub indicators: SessionIndicators,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionListResponse {
    pub sessions: Vec<SessionResponse>,
}
