use async_trait::async_trait;
use futures::future::join_all;
use reqwest::StatusCode;
use std::time::Duration;

use crate::encryption;
use crate::errors::PushError;
use crate::models::*;
use crate::vapid::VapidSigner;

/// Default time a push service keeps an undelivered message (seconds)
pub const DEFAULT_TTL_SECS: u32 = 86_400;

/// Upper bound on one push service round trip
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivers one encrypted message to one subscription.
///
/// Implemented by [`WebPushClient`] for real push services; tests swap in
/// recording fakes.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<SendResult, PushError>;
}

/// Web Push Client
///
/// Encrypts each payload for the subscriber and posts it to the
/// subscription endpoint, identified with a VAPID token.
pub struct WebPushClient {
    vapid: VapidSigner,
    ttl_secs: u32,
    http_client: reqwest::Client,
}

impl WebPushClient {
    /// Create new Web Push client
    ///
    /// # Arguments
    /// * `vapid` - Application server signer
    /// * `ttl_secs` - How long the push service should retain the message
    pub fn new(vapid: VapidSigner, ttl_secs: u32) -> Result<Self, PushError> {
        Self::with_timeout(vapid, ttl_secs, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Same as [`Self::new`] with an explicit per-request timeout
    pub fn with_timeout(
        vapid: VapidSigner,
        ttl_secs: u32,
        timeout: Duration,
    ) -> Result<Self, PushError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PushError::SendRequestError(e.to_string()))?;

        Ok(Self {
            vapid,
            ttl_secs,
            http_client,
        })
    }
}

#[async_trait]
impl PushSender for WebPushClient {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<SendResult, PushError> {
        let body = encryption::encrypt(payload, &subscription.keys.p256dh, &subscription.keys.auth)?;
        let authorization = self.vapid.authorization_header(&subscription.endpoint)?;

        let response = self
            .http_client
            .post(&subscription.endpoint)
            .header("Authorization", authorization)
            .header("TTL", self.ttl_secs.to_string())
            .header("Content-Encoding", "aes128gcm")
            .header("Content-Type", "application/octet-stream")
            .body(body)
            .send()
            .await
            .map_err(|e| PushError::SendRequestError(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(SendResult {
                endpoint: subscription.endpoint.clone(),
                status: status.as_u16(),
            }),
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                Err(PushError::SubscriptionGone(subscription.endpoint.clone()))
            }
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());

                Err(PushError::ApiError(status.as_u16(), error_text))
            }
        }
    }
}

/// Send one payload to many subscriptions concurrently.
///
/// Individual failures are logged and counted; they never abort the batch.
pub async fn send_multicast(
    sender: &dyn PushSender,
    subscriptions: &[PushSubscription],
    payload: &[u8],
) -> MulticastSendResult {
    let outcomes = join_all(
        subscriptions
            .iter()
            .map(|subscription| sender.send(subscription, payload)),
    )
    .await;

    let mut result = MulticastSendResult::default();
    for (subscription, outcome) in subscriptions.iter().zip(outcomes) {
        match outcome {
            Ok(_) => result.success_count += 1,
            Err(PushError::SubscriptionGone(endpoint)) => {
                tracing::info!(endpoint = %endpoint, "Push subscription expired");
                result.failure_count += 1;
                result.gone_endpoints.push(endpoint);
            }
            Err(e) => {
                tracing::warn!(
                    endpoint = %subscription.endpoint,
                    error = %e,
                    "Push delivery failed"
                );
                result.failure_count += 1;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use p256::{elliptic_curve::sec1::ToEncodedPoint, SecretKey};
    use rand::{rngs::OsRng, RngCore};
    use std::sync::Mutex;
    use tokio::net::TcpListener;

    /// Fails for endpoints containing "gone" or "broken"
    #[derive(Default)]
    struct ScriptedSender {
        delivered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PushSender for ScriptedSender {
        async fn send(
            &self,
            subscription: &PushSubscription,
            _payload: &[u8],
        ) -> Result<SendResult, PushError> {
            if subscription.endpoint.contains("gone") {
                return Err(PushError::SubscriptionGone(subscription.endpoint.clone()));
            }
            if subscription.endpoint.contains("broken") {
                return Err(PushError::ApiError(500, "boom".into()));
            }
            self.delivered
                .lock()
                .unwrap()
                .push(subscription.endpoint.clone());
            Ok(SendResult {
                endpoint: subscription.endpoint.clone(),
                status: 201,
            })
        }
    }

    fn subscription(endpoint: &str) -> PushSubscription {
        PushSubscription {
            endpoint: endpoint.to_string(),
            keys: SubscriptionKeys {
                p256dh: "key".into(),
                auth: "auth".into(),
            },
        }
    }

    #[tokio::test]
    async fn test_multicast_counts_failures_without_aborting() {
        let sender = ScriptedSender::default();
        let subscriptions = vec![
            subscription("https://push.example.com/ok-1"),
            subscription("https://push.example.com/gone"),
            subscription("https://push.example.com/broken"),
            subscription("https://push.example.com/ok-2"),
        ];

        let result = send_multicast(&sender, &subscriptions, b"{}").await;

        assert_eq!(result.success_count, 2);
        assert_eq!(result.failure_count, 2);
        assert_eq!(result.gone_endpoints, vec!["https://push.example.com/gone"]);
        assert_eq!(sender.delivered.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_multicast_with_no_subscriptions() {
        let sender = ScriptedSender::default();
        let result = send_multicast(&sender, &[], b"{}").await;
        assert_eq!(result, MulticastSendResult::default());
    }

    /// Keys a browser would hand out with its subscription
    fn browser_subscription(endpoint: &str) -> PushSubscription {
        let secret = SecretKey::random(&mut OsRng);
        let mut auth = [0u8; 16];
        OsRng.fill_bytes(&mut auth);
        PushSubscription {
            endpoint: endpoint.to_string(),
            keys: SubscriptionKeys {
                p256dh: URL_SAFE_NO_PAD
                    .encode(secret.public_key().to_encoded_point(false).as_bytes()),
                auth: URL_SAFE_NO_PAD.encode(auth),
            },
        }
    }

    #[tokio::test]
    async fn test_unresponsive_push_service_times_out() {
        // Accepts connections and never answers
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let vapid_key = URL_SAFE_NO_PAD.encode(SecretKey::random(&mut OsRng).to_bytes());
        let signer =
            VapidSigner::from_base64(&vapid_key, None, "mailto:admin@propulse.test").unwrap();
        let client =
            WebPushClient::with_timeout(signer, DEFAULT_TTL_SECS, Duration::from_millis(200))
                .unwrap();

        let subscription = browser_subscription(&format!("http://{addr}/send/1"));
        let started = std::time::Instant::now();
        let outcome = client.send(&subscription, b"{}").await;

        assert!(matches!(outcome, Err(PushError::SendRequestError(_))));
        assert!(started.elapsed() < Duration::from_secs(5));
        server.abort();
    }
}
