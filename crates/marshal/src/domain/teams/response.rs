//! Team response DTOs.

use podium_common::Affiliation;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamResponse {
    pub id: Uuid,
    pub division_id: Uuid,
    pub number: i32,
    pub name: String,
    pub affiliation: Affiliation,
    pub registered: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamListResponse {
    pub teams: Vec<TeamResponse>,
}
