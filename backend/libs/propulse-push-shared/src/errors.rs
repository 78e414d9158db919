use thiserror::Error;

/// Web Push Error Types
#[derive(Error, Debug)]
pub enum PushError {
    #[error("Invalid VAPID key: {0}")]
    InvalidVapidKey(String),

    #[error("Invalid subscription: {0}")]
    InvalidSubscription(String),

    #[error("Failed to sign VAPID token: {0}")]
    JwtEncodeError(String),

    #[error("Payload encryption failed: {0}")]
    Encryption(String),

    #[error("Payload of {0} bytes exceeds the push record size")]
    PayloadTooLarge(usize),

    #[error("Push send request failed: {0}")]
    SendRequestError(String),

    #[error("Subscription is no longer valid: {0}")]
    SubscriptionGone(String),

    #[error("Push service error: {0} - {1}")]
    ApiError(u16, String),
}

