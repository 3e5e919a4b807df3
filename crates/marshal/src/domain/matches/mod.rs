//! Robot game match domain module.

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
        .route("/", get(list_matches))
        .route("/{id}", get(get_match).put(update_match))
        .route("/{id}/start", post(start_match))
        .route("/{id}/complete", post(complete_match))
        .route("/{id}/abort", post(abort_match))
        .route("/{id}/reset", post(reset_match))
}
