use propulse_push_shared::{
    send_multicast, MulticastSendResult, NotificationPayload, PushSender, PushSubscription,
};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::db::user_repo;

/// Delivers push notifications to users' registered endpoints.
///
/// Delivery is best effort: lookup and send failures are logged and never
/// reach the caller. Request handlers use the `dispatch_*` methods, which
/// run the fan-out on a background task and return at once.
#[derive(Clone)]
pub struct NotificationDispatcher {
    db: PgPool,
    sender: Option<Arc<dyn PushSender>>,
    base_url: String,
    frontend_url: String,
}

impl NotificationDispatcher {
    /// `sender` is `None` when push delivery is not configured
    pub fn new(
        db: PgPool,
        sender: Option<Arc<dyn PushSender>>,
        base_url: impl Into<String>,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            db,
            sender,
            base_url: base_url.into(),
            frontend_url: frontend_url.into(),
        }
    }

    pub fn post_tag_payload(&self, author_email: &str, post_id: i32) -> NotificationPayload {
        tag_payload(author_email, format!("{}/posts/{post_id}", self.base_url))
    }

    pub fn reply_tag_payload(&self, author_email: &str, reply_id: i32) -> NotificationPayload {
        tag_payload(
            author_email,
            format!("{}/posts/replies/{reply_id}", self.base_url),
        )
    }

    pub fn invitation_payload(
        &self,
        inviter_email: &str,
        job_name: &str,
        token: &str,
    ) -> NotificationPayload {
        NotificationPayload {
            title: format!("{inviter_email} invited you to join {job_name}!"),
            body: "Click the link to accept the invitation.".to_string(),
            url: format!("{}/invitation?token={token}", self.frontend_url),
        }
    }

    /// Fire-and-forget [`Self::notify_users`]
    pub fn dispatch_to_users(
        &self,
        user_ids: Vec<i32>,
        payload: NotificationPayload,
    ) -> JoinHandle<MulticastSendResult> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.notify_users(&user_ids, &payload).await })
    }

    /// Fire-and-forget [`Self::notify_subscriptions`]
    pub fn dispatch_to_subscriptions(
        &self,
        subscriptions: Vec<PushSubscription>,
        payload: NotificationPayload,
    ) -> JoinHandle<MulticastSendResult> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            dispatcher
                .notify_subscriptions(&subscriptions, &payload)
                .await
        })
    }

    /// Notify every registered endpoint of the given users
    async fn notify_users(
        &self,
        user_ids: &[i32],
        payload: &NotificationPayload,
    ) -> MulticastSendResult {
        if user_ids.is_empty() {
            return MulticastSendResult::default();
        }

        let subscriptions: Vec<PushSubscription> =
            match user_repo::subscriptions_for_users(&self.db, user_ids).await {
                Ok(rows) => rows.into_iter().map(PushSubscription::from).collect(),
                Err(e) => {
                    warn!(error = %e, "Failed to load push subscriptions");
                    return MulticastSendResult::default();
                }
            };

        self.notify_subscriptions(&subscriptions, payload).await
    }

    async fn notify_subscriptions(
        &self,
        subscriptions: &[PushSubscription],
        payload: &NotificationPayload,
    ) -> MulticastSendResult {
        if subscriptions.is_empty() {
            return MulticastSendResult::default();
        }

        let Some(sender) = self.sender.as_deref() else {
            debug!(
                subscriptions = subscriptions.len(),
                "Push delivery disabled, skipping notification"
            );
            return MulticastSendResult::default();
        };

        let result = send_multicast(sender, subscriptions, &payload.to_bytes()).await;

        info!(
            delivered = result.success_count,
            failed = result.failure_count,
            "Push notification dispatched"
        );

        if !result.gone_endpoints.is_empty() {
            match user_repo::delete_subscriptions_by_endpoint(&self.db, &result.gone_endpoints)
                .await
            {
                Ok(removed) => info!(removed, "Removed expired push subscriptions"),
                Err(e) => warn!(error = %e, "Failed to remove expired push subscriptions"),
            }
        }

        result
    }
}

fn tag_payload(author_email: &str, url: String) -> NotificationPayload {
    NotificationPayload {
        title: format!("{author_email} tagged you in a post!"),
        body: "Click the link to view the message.".to_string(),
        url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use propulse_push_shared::{PushError, SendResult, SubscriptionKeys};
    use sqlx::postgres::PgPoolOptions;
    use std::time::Duration;
    use tokio::time::Instant;

    // Never connects; payload helpers and sends without gone endpoints do
    // not touch the pool
    fn dispatcher_with(sender: Option<Arc<dyn PushSender>>) -> NotificationDispatcher {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/propulse_unused")
            .unwrap();
        NotificationDispatcher::new(pool, sender, "http://api.test", "http://app.test")
    }

    fn dispatcher() -> NotificationDispatcher {
        dispatcher_with(None)
    }

    fn subscription(endpoint: &str) -> PushSubscription {
        PushSubscription {
            endpoint: endpoint.into(),
            keys: SubscriptionKeys {
                p256dh: "key".into(),
                auth: "auth".into(),
            },
        }
    }

    /// Push service that takes its time answering
    struct SlowSender(Duration);

    #[async_trait]
    impl PushSender for SlowSender {
        async fn send(
            &self,
            subscription: &PushSubscription,
            _payload: &[u8],
        ) -> Result<SendResult, PushError> {
            tokio::time::sleep(self.0).await;
            Ok(SendResult {
                endpoint: subscription.endpoint.clone(),
                status: 201,
            })
        }
    }

    #[tokio::test]
    async fn test_tag_payloads() {
        let dispatcher = dispatcher();

        let post = dispatcher.post_tag_payload("user1@email.com", 4);
        assert_eq!(post.title, "user1@email.com tagged you in a post!");
        assert_eq!(post.body, "Click the link to view the message.");
        assert_eq!(post.url, "http://api.test/posts/4");

        let reply = dispatcher.reply_tag_payload("user1@email.com", 9);
        assert_eq!(reply.url, "http://api.test/posts/replies/9");
    }

    #[tokio::test]
    async fn test_invitation_payload() {
        let payload = dispatcher().invitation_payload("user1@email.com", "Job1", "abc.def.ghi");
        assert_eq!(payload.title, "user1@email.com invited you to join Job1!");
        assert_eq!(payload.body, "Click the link to accept the invitation.");
        assert_eq!(payload.url, "http://app.test/invitation?token=abc.def.ghi");
    }

    #[tokio::test]
    async fn test_dispatch_does_not_wait_for_slow_push_service() {
        let sender: Arc<dyn PushSender> = Arc::new(SlowSender(Duration::from_secs(3)));
        let dispatcher = dispatcher_with(Some(sender));
        let payload = dispatcher.post_tag_payload("user1@email.com", 1);

        let started = Instant::now();
        let handle = dispatcher.dispatch_to_subscriptions(
            vec![subscription("https://push.example.com/slow")],
            payload,
        );
        assert!(started.elapsed() < Duration::from_millis(500));

        // The delivery still completes in the background
        let result = handle.await.unwrap();
        assert_eq!(result.success_count, 1);
    }

    #[tokio::test]
    async fn test_disabled_dispatcher_skips_delivery() {
        let dispatcher = dispatcher();
        assert!(dispatcher.sender.is_none());

        let subscriptions = vec![subscription("https://push.example.com/1")];
        let payload = dispatcher.post_tag_payload("user1@email.com", 1);
        let result = dispatcher.notify_subscriptions(&subscriptions, &payload).await;
        assert_eq!(result, MulticastSendResult::default());

        let result = dispatcher.notify_users(&[], &payload).await;
        assert_eq!(result.success_count, 0);
    }
}
