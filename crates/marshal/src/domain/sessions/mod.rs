//! Judging session domain module.

mod handler;
mod request;
mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sessions))
        .route("/{id}", get(get_session).put(update_session))
        .route("/{id}/start", post(start_session))
        .route("/{id}/complete", post(complete_session))
        .route("/{id}/abort", post(abort_session))
        .route("/{id}/reset", post(reset_session))
}
