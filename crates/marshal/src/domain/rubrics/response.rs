//! Rubric response DTOs.

use chrono::{DateTime, Utc};
use podium_common::{JudgingCategory, RubricStatus};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricResponse {
    pub id: Uuid,
    pub division_id: Uuid,
    pub team_id: Uuid,
    pub category: JudgingCategory,
    pub status: RubricStatus,
    pub data: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricListResponse {
    pub rubrics: Vec<RubricResponse>,
}
