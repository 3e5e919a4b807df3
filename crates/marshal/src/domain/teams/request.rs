//! Team request DTOs.

use podium_common::Affiliation;
use serde::Deserialize;
use validator::Validate;

/// Create team request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    #[validate(range(min = 1, message = "Team number must be positive"))]
    pub number: i32,

    #[validate(length(min = 1, max = 255, message = "Team name is required"))]
    pub name: String,

    pub affiliation: Affiliation,
}

/// Update team request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamRequest {
    #[validate(length(min = 1, max = 255, message = "Team name must not be empty"))]
    pub name: Option<String>,

    pub affiliation: Option<Affiliation>,
}
