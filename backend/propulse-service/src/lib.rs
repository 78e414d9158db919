pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

use crypto_core::jwt::TokenKeys;
use services::{InvitationService, NotificationDispatcher};
use sqlx::PgPool;
use std::sync::Arc;

/// Shared handler state, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub keys: Arc<TokenKeys>,
    pub notifier: NotificationDispatcher,
    pub invitations: InvitationService,
}

impl AppState {
    pub fn new(
        db: PgPool,
        keys: Arc<TokenKeys>,
        notifier: NotificationDispatcher,
        invitation_ttl: chrono::Duration,
    ) -> Self {
        let invitations =
            InvitationService::new(db.clone(), keys.clone(), notifier.clone(), invitation_ttl);
        Self {
            db,
            keys,
            notifier,
            invitations,
        }
    }
}
