//! Health check domain module.

mod handler;

pub use handler::*;
