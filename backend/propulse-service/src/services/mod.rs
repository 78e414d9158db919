//! Domain operations behind the HTTP handlers
//!
//! - `jobs`: the membership and privilege graph
//! - `invitations`: signed invitation capabilities layered on `jobs`
//! - `posts`: job-scoped posts and replies with tag validation
//! - `users`: credential store and push subscriptions
//! - `tokens`: session token issuance
//! - `notifications`: best-effort Web Push fan-out

pub mod invitations;
pub mod jobs;
pub mod notifications;
pub mod posts;
pub mod tokens;
pub mod users;

pub use invitations::InvitationService;
pub use notifications::NotificationDispatcher;

use crate::error::AppError;
use error_types::is_unique_violation;

/// Turn a unique violation into a conflict with a domain message
pub(crate) fn conflict_on_duplicate(err: sqlx::Error, message: &str) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict(message.to_string())
    } else {
        err.into()
    }
}
