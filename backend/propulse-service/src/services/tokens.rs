use crypto_core::jwt::{SessionClaims, TokenKeys};
use sqlx::PgPool;

use crate::db::job_repo;
use crate::error::Result;

/// Sign a session token carrying the user's current memberships.
///
/// Called whenever memberships may have changed so the token stays in step
/// with the graph.
pub async fn issue_session_token(
    db: &PgPool,
    keys: &TokenKeys,
    user_id: i32,
    email: &str,
) -> Result<String> {
    let jobs = job_repo::job_ids_for_user(db, user_id).await?;
    let token = keys.issue_session_token(&SessionClaims::new(user_id, email, jobs))?;
    Ok(token)
}
