//! Team roster domain module.

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
        .route("/", get(list_teams).post(create_team))
        .route(
            "/{id}",
            get(get_team).put(update_team).delete(delete_team),
        )
        .route("/{id}/register", post(register_team))
}
