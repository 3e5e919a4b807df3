//! Division document and event-state domain module.

mod handler;
mod request;
mod response;

pub use handler::*;
pub use request::*;
pub use response::*;
