//! Health check handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
///
/// Basic health check.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "marshal",
    }))
}

/// GET /health/live
///
/// Liveness probe: the process is up.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Readiness probe: database and redis are reachable.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let db_ok = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();

    let redis_ok = match state.redis.get().await {
        Ok(mut conn) => redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok(),
        Err(_) => false,
    };

    let status = if db_ok && redis_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "database": if db_ok { "ok" } else { "unavailable" },
            "redis": if redis_ok { "ok" } else { "unavailable" },
        })),
    )
}
