//! Rubric request DTOs.

use podium_common::RubricStatus;
use serde::Deserialize;

/// Rubric upsert body. The whole document is replaced: last write wins,
/// there is no concurrency token.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRubricRequest {
    pub status: RubricStatus,
    #[serde(default)]
    pub data: serde_json::Value,
}
