//! Marshal - API gateway for Podium
//!
//! The main entry point for the Podium tournament-management backend.

mod config;
mod domain;
mod error;
mod middleware;
mod notifier;
mod state;

#[cfg(test)]
mod test_utils;

use std::net::SocketAddr;

use axum::http::{header, Method};
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{create_db_pool, create_redis_pool, Config, RateLimitConfig};
use crate::domain::{
    auth, awards, cv_forms, divisions, health, insights, matches, rooms, rubrics, schedule,
    scoresheets, sessions, tables, teams, tickets, users,
};
use crate::middleware::auth::auth_middleware;
use crate::middleware::division::division_scope_middleware;
use crate::middleware::rate_limit::{api_rate_limit_middleware, login_rate_limit_middleware};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marshal=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    let rate_limit_config = RateLimitConfig::default();

    tracing::info!("Starting Marshal API Gateway");
    tracing::info!("Environment: {}", config.environment);

    // Create database pool
    tracing::info!("Connecting to database...");
    let db_pool = create_db_pool(&config.database_url).await?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&db_pool).await?;
    tracing::info!("Migrations complete");

    // Create Redis pool
    tracing::info!("Connecting to Redis...");
    let redis_pool = create_redis_pool(&config.redis_url)?;
    tracing::info!("Redis connected");

    // Create app state
    let state = AppState::new(db_pool, redis_pool, config.clone(), rate_limit_config);

    // Build router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Create the application router with all routes and middleware.
fn create_router(state: AppState) -> Router {
    // Health routes (no auth required)
    let health_routes = Router::new()
        .route("/", get(health::health_check))
        .route("/live", get(health::liveness))
        .route("/ready", get(health::readiness));

    // Auth routes: login is public but rate limited, /me requires a token
    let auth_routes = Router::new()
        .route(
            "/login",
            post(auth::login).layer(axum_middleware::from_fn_with_state(
                state.clone(),
                login_rate_limit_middleware,
            )),
        )
        .route(
            "/me",
            get(auth::me).layer(axum_middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        );

    // Everything under /api/events/{division_id} requires a token and
    // membership in the division (admins bypass the membership check).
    let division_routes = Router::new()
        .route("/", get(divisions::get_division))
        .route(
            "/state",
            get(divisions::get_state).put(divisions::put_state),
        )
        .route("/ws", get(notifier::ws_handler))
        .nest("/teams", teams::routes())
        .nest("/rooms", rooms::routes())
        .nest("/tables", tables::routes())
        .nest("/users", users::routes())
        .nest("/sessions", sessions::routes())
        .nest("/matches", matches::routes())
        .nest("/rubrics", rubrics::routes())
        .nest("/scoresheets", scoresheets::routes())
        .nest("/awards", awards::routes())
        .nest("/tickets", tickets::routes())
        .nest("/cv-forms", cv_forms::routes())
        .nest("/insights", insights::routes())
        .nest("/schedule", schedule::routes())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            division_scope_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // API routes
    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/events/{division_id}", division_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            api_rate_limit_middleware,
        ));

    // CORS configuration - permissive for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::PATCH,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ORIGIN,
        ])
        .expose_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    // Main router
    // Note: Layers are applied bottom-up, so CORS must be last to wrap everything
    Router::new()
        .nest("/health", health_routes)
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use podium_common::Role;
    use serde_json::{json, Value};
    use sqlx::PgPool;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::domain::auth::JwtManager;
    use crate::test_utils::test_app::create_test_app;

    async fn seed_division(db: &PgPool) -> Uuid {
        let event_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO events (id, name, start_date, end_date) \
             VALUES ($1, 'Scrimmage', NOW(), NOW() + INTERVAL '1 day')",
        )
        .bind(event_id)
        .execute(db)
        .await
        .unwrap();

        let division_id = Uuid::new_v4();
        sqlx::query("INSERT INTO divisions (id, event_id, name) VALUES ($1, $2, 'Main')")
            .bind(division_id)
            .bind(event_id)
            .execute(db)
            .await
            .unwrap();
        division_id
    }

    async fn seed_team(db: &PgPool, division_id: Uuid, number: i32, registered: bool) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO teams (id, division_id, number, name, institution, city, registered) \
             VALUES ($1, $2, $3, 'Gearheads', 'Lincoln Middle School', 'Springfield', $4)",
        )
        .bind(id)
        .bind(division_id)
        .bind(number)
        .bind(registered)
        .execute(db)
        .await
        .unwrap();
        id
    }

    async fn seed_session(db: &PgPool, division_id: Uuid, team_id: Uuid, status: &str) -> Uuid {
        let room_id = Uuid::new_v4();
        sqlx::query("INSERT INTO rooms (id, division_id, name) VALUES ($1, $2, 'Room 1')")
            .bind(room_id)
            .bind(division_id)
            .execute(db)
            .await
            .unwrap();

        let session_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO judging_sessions \
                 (id, division_id, number, team_id, room_id, status, scheduled_time) \
             VALUES ($1, $2, 1, $3, $4, $5, NOW())",
        )
        .bind(session_id)
        .bind(division_id)
        .bind(team_id)
        .bind(room_id)
        .bind(status)
        .execute(db)
        .await
        .unwrap();
        session_id
    }

    fn admin_token() -> String {
        JwtManager::new("test_secret_key_for_testing_only", 900)
            .generate_access_token(Uuid::new_v4(), Role::Admin, None, None)
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn health_check_returns_ok() {
        let (app, _state) = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn division_routes_require_a_token() {
        let (app, _state) = create_test_app().await;

        let division_id = uuid::Uuid::new_v4();
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/events/{division_id}/teams"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn login_with_unknown_user_is_rejected() {
        let (app, _state) = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"username":"nobody","password":"wrong-password"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn state_put_with_malformed_body_writes_nothing() {
        let (app, state) = create_test_app().await;
        let division_id = seed_division(&state.db).await;
        let token = admin_token();

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/api/events/{division_id}/state"))
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"ok": false}));

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM event_states WHERE division_id = $1")
                .bind(division_id)
                .fetch_one(&state.db)
                .await
                .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn rubric_cannot_complete_while_session_in_progress() {
        let (app, state) = create_test_app().await;
        let division_id = seed_division(&state.db).await;
        let team_id = seed_team(&state.db, division_id, 1, true).await;
        seed_session(&state.db, division_id, team_id, "in-progress").await;
        let token = admin_token();

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!(
                        "/api/events/{division_id}/rubrics/team/{team_id}/core-values"
                    ))
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"status": "completed", "data": {}}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn deleting_team_rubrics_leaves_other_teams_untouched() {
        let (app, state) = create_test_app().await;
        let division_id = seed_division(&state.db).await;
        let team_a = seed_team(&state.db, division_id, 1, true).await;
        let team_b = seed_team(&state.db, division_id, 2, true).await;
        crate::domain::rubrics::seed_rubrics(&state.db, division_id, &[team_a, team_b])
            .await
            .unwrap();
        let token = admin_token();

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/events/{division_id}/rubrics/team/{team_a}"))
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"deleted": 3}));

        let (for_a,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rubrics WHERE team_id = $1")
            .bind(team_a)
            .fetch_one(&state.db)
            .await
            .unwrap();
        assert_eq!(for_a, 0);

        let (for_b,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rubrics WHERE team_id = $1")
            .bind(team_b)
            .fetch_one(&state.db)
            .await
            .unwrap();
        assert_eq!(for_b, 3);
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn session_rejects_a_team_from_another_division() {
        let (app, state) = create_test_app().await;
        let division_id = seed_division(&state.db).await;
        let other_division = seed_division(&state.db).await;
        let home_team = seed_team(&state.db, division_id, 1, true).await;
        let foreign_team = seed_team(&state.db, other_division, 1, true).await;
        let session_id = seed_session(&state.db, division_id, home_team, "not-started").await;
        let token = admin_token();

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/api/events/{division_id}/sessions/{session_id}"))
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({"teamId": foreign_team}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let (team,): (Option<Uuid>,) =
            sqlx::query_as("SELECT team_id FROM judging_sessions WHERE id = $1")
                .bind(session_id)
                .fetch_one(&state.db)
                .await
                .unwrap();
        assert_eq!(team, Some(home_team));
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn session_rejects_an_unregistered_team() {
        let (app, state) = create_test_app().await;
        let division_id = seed_division(&state.db).await;
        let home_team = seed_team(&state.db, division_id, 1, true).await;
        let walk_in = seed_team(&state.db, division_id, 2, false).await;
        let session_id = seed_session(&state.db, division_id, home_team, "not-started").await;
        let token = admin_token();

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/api/events/{division_id}/sessions/{session_id}"))
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({"teamId": walk_in}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
