//! Core-values observation form domain module.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{types::Json as SqlJson, FromRow};
use uuid::Uuid;
use validator::Validate;

use crate::domain::authorization::{build_auth_context, require_judging_role};
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::notifier::{Channel, LifecycleEvent};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cv_forms).post(create_cv_form))
        .route("/{id}", get(get_cv_form).put(update_cv_form))
}

const SEVERITIES: &[&str] = &["low", "medium", "high"];
const FORM_STATUSES: &[&str] = &["open", "in-review", "resolved"];

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCvFormRequest {
    pub severity: String,

    /// Free-form observers/demonstrators payload
    #[serde(default)]
    pub data: serde_json::Value,

    #[validate(length(min = 1, max = 255, message = "Completed-by is required"))]
    pub completed_by: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCvFormRequest {
    pub severity: Option<String>,
    pub data: Option<serde_json::Value>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CvFormResponse {
    pub id: Uuid,
    pub division_id: Uuid,
    pub severity: String,
    pub data: serde_json::Value,
    pub completed_by: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct CvFormRow {
    id: Uuid,
    division_id: Uuid,
    severity: String,
    data: SqlJson<serde_json::Value>,
    completed_by: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<CvFormRow> for CvFormResponse {
    fn from(row: CvFormRow) -> Self {
        CvFormResponse {
            id: row.id,
            division_id: row.division_id,
            severity: row.severity,
            data: row.data.0,
            completed_by: row.completed_by,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

/// GET /api/events/{division_id}/cv-forms
pub async fn list_cv_forms(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<CvFormResponse>>> {
    let ctx = build_auth_context(&state, &user);
    require_judging_role(&ctx).await?;

    let rows: Vec<CvFormRow> = sqlx::query_as(
        r#"
        SELECT id, division_id, severity, data, completed_by, status, created_at
        FROM cv_forms
        WHERE division_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(division_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /api/events/{division_id}/cv-forms/{id}
pub async fn get_cv_form(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<CvFormResponse>> {
    let ctx = build_auth_context(&state, &user);
    require_judging_role(&ctx).await?;

    let row: CvFormRow = sqlx::query_as(
        r#"
        SELECT id, division_id, severity, data, completed_by, status, created_at
        FROM cv_forms
        WHERE id = $1 AND division_id = $2
        "#,
    )
    .bind(id)
    .bind(division_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("CV form not found".to_string()))?;

    Ok(Json(row.into()))
}

/// POST /api/events/{division_id}/cv-forms
pub async fn create_cv_form(
    State(state): State<AppState>,
    Path(division_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateCvFormRequest>,
) -> ApiResult<(StatusCode, Json<CvFormResponse>)> {
    let ctx = build_auth_context(&state, &user);
    require_judging_role(&ctx).await?;

    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    if !SEVERITIES.contains(&payload.severity.as_str()) {
        return Err(ApiError::Validation(format!(
            "unknown severity: {}",
            payload.severity
        )));
    }

    let id = Uuid::new_v4();
    let row: CvFormRow = sqlx::query_as(
        r#"
        INSERT INTO cv_forms (id, division_id, severity, data, completed_by, status)
        VALUES ($1, $2, $3, $4, $5, 'open')
        RETURNING id, division_id, severity, data, completed_by, status, created_at
        "#,
    )
    .bind(id)
    .bind(division_id)
    .bind(&payload.severity)
    .bind(SqlJson(&payload.data))
    .bind(&payload.completed_by)
    .fetch_one(&state.db)
    .await?;

    state.notifier.publish(LifecycleEvent::new(
        division_id,
        Channel::Judging,
        "cvFormCreated",
        json!({"cvFormId": id, "severity": row.severity}),
    ));

    Ok((StatusCode::CREATED, Json(row.into())))
}

/// PUT /api/events/{division_id}/cv-forms/{id}
pub async fn update_cv_form(
    State(state): State<AppState>,
    Path((division_id, id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateCvFormRequest>,
) -> ApiResult<Json<CvFormResponse>> {
    let ctx = build_auth_context(&state, &user);
    require_judging_role(&ctx).await?;

    if let Some(severity) = &payload.severity {
        if !SEVERITIES.contains(&severity.as_str()) {
            return Err(ApiError::Validation(format!("unknown severity: {severity}")));
        }
    }
    if let Some(status) = &payload.status {
        if !FORM_STATUSES.contains(&status.as_str()) {
            return Err(ApiError::Validation(format!("unknown form status: {status}")));
        }
    }

    let mut row: CvFormRow = sqlx::query_as(
        r#"
        SELECT id, division_id, severity, data, completed_by, status, created_at
        FROM cv_forms
        WHERE id = $1 AND division_id = $2
        "#,
    )
    .bind(id)
    .bind(division_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("CV form not found".to_string()))?;

    if let Some(severity) = payload.severity {
        row.severity = severity;
    }
    if let Some(data) = payload.data {
        row.data = SqlJson(data);
    }
    if let Some(status) = payload.status {
        row.status = status;
    }

    sqlx::query(
        r#"
        UPDATE cv_forms SET severity = $1, data = $2, status = $3
        WHERE id = $4 AND division_id = $5
        "#,
    )
    .bind(&row.severity)
    .bind(&row.data)
    .bind(&row.status)
    .bind(id)
    .bind(division_id)
    .execute(&state.db)
    .await?;

    Ok(Json(row.into()))
}
