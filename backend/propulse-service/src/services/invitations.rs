//! Invitation workflow
//!
//! An invitation is a signed capability `{invited, privilege, jobId}` with an
//! expiry; nothing is persisted. Redeeming it runs `jobs::associate`, so a
//! second redemption fails the same way a duplicate association does.

use chrono::Duration;
use crypto_core::jwt::{InvitationClaims, PrivilegeGrant, TokenKeys};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use crate::db::job_repo;
use crate::error::{AppError, Result};
use crate::models::Association;
use crate::services::{jobs, tokens, users, NotificationDispatcher};

pub const INVITATION_SENT: &str = "Invitation sent successfully";
pub const NOT_SUBSCRIBED: &str = "This user is not subscribed to notifications";
pub const NOT_INVITED: &str = "You were not invited to this project!";

/// Outcome of redeeming an invitation
#[derive(Debug, Clone)]
pub struct Accepted {
    pub job_id: i32,
    pub association: Association,
    /// Session token re-issued with the new membership
    pub token: String,
}

#[derive(Clone)]
pub struct InvitationService {
    db: PgPool,
    keys: Arc<TokenKeys>,
    notifier: NotificationDispatcher,
    ttl: Duration,
}

impl InvitationService {
    pub fn new(
        db: PgPool,
        keys: Arc<TokenKeys>,
        notifier: NotificationDispatcher,
        ttl: Duration,
    ) -> Self {
        Self {
            db,
            keys,
            notifier,
            ttl,
        }
    }

    /// Sign an invitation for `invited_email` and push it to their devices.
    ///
    /// Returns the signed token. Fails when the invitee is already a member
    /// or has no push subscription to deliver it to.
    pub async fn invite(
        &self,
        job_id: i32,
        inviter_email: &str,
        invited_email: &str,
        privilege: PrivilegeGrant,
    ) -> Result<String> {
        let job = jobs::find_job(&self.db, job_id).await?;
        let invitee = users::get_by_email(&self.db, invited_email).await?;

        if job_repo::is_member(&self.db, job_id, invitee.id).await? {
            return Err(AppError::BadRequest(jobs::ALREADY_MEMBER.to_string()));
        }

        let subscriptions = users::subscriptions_for_users(&self.db, &[invitee.id]).await?;
        if subscriptions.is_empty() {
            return Err(AppError::BadRequest(NOT_SUBSCRIBED.to_string()));
        }

        let claims = InvitationClaims::new(invitee.id, job_id, privilege, self.ttl);
        let token = self.keys.issue_invitation_token(&claims)?;

        let payload = self
            .notifier
            .invitation_payload(inviter_email, &job.name, &token);
        self.notifier
            .dispatch_to_subscriptions(subscriptions, payload);

        info!(
            job_id,
            invited = invitee.id,
            trusted = privilege.is_granted(),
            "Invitation issued"
        );
        Ok(token)
    }

    /// Redeem an invitation on behalf of the authenticated user
    pub async fn accept(&self, token: &str, user_id: i32, email: &str) -> Result<Accepted> {
        let claims = self.keys.verify_invitation_token(token)?;

        if claims.invited != user_id {
            return Err(AppError::BadRequest(NOT_INVITED.to_string()));
        }
        // The invitee may have been deactivated since the invite was issued
        users::get(&self.db, user_id).await?;

        let association = jobs::associate(
            &self.db,
            claims.job_id,
            claims.invited,
            claims.privilege.is_granted(),
        )
        .await?;

        let token = tokens::issue_session_token(&self.db, &self.keys, user_id, email).await?;

        info!(job_id = claims.job_id, user_id, "Invitation redeemed");
        Ok(Accepted {
            job_id: claims.job_id,
            association,
            token,
        })
    }
}

