//! Common types and domain logic shared across Podium services.

pub mod lifecycle;
pub mod schedule;
pub mod types;

pub use types::*;
