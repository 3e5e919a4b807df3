//! Authentication domain module.

mod handler;
mod jwt;
mod request;
mod response;

pub use handler::*;
pub use jwt::*;
pub use request::*;
pub use response::*;
