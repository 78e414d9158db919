/// ProPulse Web Push Shared Library
///
/// Delivers push notifications to browser push services using the Web Push
/// protocol, so no vendor SDK is involved.
///
/// It handles:
/// - VAPID application-server identification (RFC 8292), signed with ES256
/// - `aes128gcm` payload encryption against the subscriber's keys (RFC 8291)
/// - Single and multicast delivery behind the `PushSender` trait

pub mod client;
pub mod encryption;
pub mod errors;
pub mod models;
pub mod vapid;

pub use client::{send_multicast, PushSender, WebPushClient};
pub use errors::PushError;
pub use models::{
    MulticastSendResult, NotificationPayload, PushSubscription, SendResult, SubscriptionKeys,
};
pub use vapid::VapidSigner;
