//! Auth response DTOs.

use podium_common::Role;
use serde::Serialize;
use uuid::Uuid;

/// Current user profile
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub division_id: Option<Uuid>,
    pub association: Option<Uuid>,
    pub is_admin: bool,
}

/// Login response: the user plus a bearer token
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub token: String,
    pub expires_in: i64,
}
