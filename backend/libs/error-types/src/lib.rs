//! Shared error payloads for ProPulse services
//!
//! Every failed HTTP request leaves a service with the same body:
//!
//! ```json
//! { "error": { "message": "The user is not associated with this project", "status": 400 } }
//! ```
//!
//! The service's own error enum and the authentication extractors in
//! `actix-middleware` both render through [`ErrorResponse`], so clients can
//! parse a single shape regardless of where the request was rejected.

use serde::{Deserialize, Serialize};

/// SQLSTATE raised by Postgres for a unique or primary key violation
pub const PG_UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE raised by Postgres for a foreign key violation
pub const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

/// Inner error object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub message: String,
    pub status: u16,
}

/// Top-level error envelope returned to API clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

impl ErrorResponse {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                message: message.into(),
                status,
            },
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(401, "Unauthorized")
    }
}

/// Returns the SQLSTATE code of a database error, if any
pub fn pg_error_code(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|code| code.into_owned()),
        _ => None,
    }
}

/// True when the error is a unique constraint violation.
///
/// Membership and privilege rows rely on this to turn the losing writer of a
/// concurrent insert into a conflict instead of a duplicate row.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    pg_error_code(err).as_deref() == Some(PG_UNIQUE_VIOLATION)
}

pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    pg_error_code(err).as_deref() == Some(PG_FOREIGN_KEY_VIOLATION)
}
