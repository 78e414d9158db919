//! HTTP handlers
//!
//! Handlers validate the request, run the authorization guard for the route
//! and delegate to `services`. Errors propagate as [`crate::AppError`].

pub mod auth;
pub mod health;
pub mod jobs;
pub mod posts;
pub mod push;
pub mod users;
