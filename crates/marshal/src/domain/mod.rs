//! Domain modules containing business logic and handlers.

pub mod auth;
pub mod authorization;
pub mod awards;
pub mod cv_forms;
pub mod divisions;
pub mod health;
pub mod insights;
pub mod matches;
pub mod rooms;
pub mod rubrics;
pub mod schedule;
pub mod scoresheets;
pub mod sessions;
pub mod tables;
pub mod teams;
pub mod tickets;
pub mod users;
