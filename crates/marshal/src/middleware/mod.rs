//! Request middleware: authentication, division scoping, rate limiting.

pub mod auth;
pub mod division;
pub mod rate_limit;
