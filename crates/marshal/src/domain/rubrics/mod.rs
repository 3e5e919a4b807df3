//! Rubric domain module.

mod handler;
mod request;
mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/team/{team_id}",
            get(list_team_rubrics).delete(delete_team_rubrics),
        )
        .route(
            "/team/{team_id}/{category}",
            get(get_rubric).put(upsert_rubric).delete(delete_rubric),
        )
}
