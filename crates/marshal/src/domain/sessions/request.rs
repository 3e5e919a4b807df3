//! Judging session request DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;
use validator::Validate;

/// Update session request. Only scheduling fields are editable, and only
/// while the session has not started.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionRequest {
    /// Absent leaves the team untouched; an explicit `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub team_id: Option<Option<Uuid>>,
    pub room_id: Option<Uuid>,
    pub scheduled_time: Option<DateTime<Utc>>,
}

// serde has no built-in absent-vs-null distinction for Option fields.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Abort request
#[derive(Debug, Deserialize, Validate)]
pub struct AbortRequest {
    #[validate(length(min = 1, max = 1000, message = "Abort reason is required"))]
    pub reason: String,
}
