//! # Actix Middleware Library
//!
//! Middleware components shared by ProPulse Actix services
//!
//! ## Modules
//! - `jwt_auth`: bearer-token authentication that never rejects a request on
//!   its own, plus the `CurrentUser` extractor that does

pub mod jwt_auth;

pub use jwt_auth::{bearer_token, CurrentUser, JwtAuthMiddleware};
