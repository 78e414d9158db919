use serde::{Deserialize, Serialize};

/// Keys from a browser `PushSubscription.toJSON()`, base64url encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    /// Subscriber's P-256 public key (uncompressed point)
    pub p256dh: String,
    /// 16-byte authentication secret
    pub auth: String,
}

/// A browser push subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

/// JSON document shown by the service worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub url: String,
}

impl NotificationPayload {
    pub fn to_bytes(&self) -> Vec<u8> {
        // Serializing three strings cannot fail
        serde_json::to_vec(self).unwrap_or_default()
    }
}

/// Push Send Result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResult {
    pub endpoint: String,
    pub status: u16,
}

/// Outcome of delivering one payload to many subscriptions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MulticastSendResult {
    pub success_count: usize,
    pub failure_count: usize,
    /// Endpoints the push service reported as expired or unsubscribed
    pub gone_endpoints: Vec<String>,
}
