use chrono::{DateTime, Utc};
use propulse_push_shared::{PushSubscription, SubscriptionKeys};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::job::JobList;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub organization: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_img: Option<String>,
    pub active: bool,
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
}

/// Profile plus job summaries, as returned by `GET /users/{id}`
#[derive(Debug, Clone, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub jobs: JobList,
    /// Only present when a user reads their own profile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscriptions: Option<Vec<PushSubscription>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    #[validate(email, length(min = 6, max = 60))]
    pub email: String,
    #[validate(length(min = 5, max = 20))]
    pub password: String,
    #[validate(length(min = 1, max = 30))]
    pub first_name: String,
    #[validate(length(min = 1, max = 30))]
    pub last_name: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: String,
    #[validate(length(min = 1, max = 60))]
    pub organization: String,
    #[validate(length(min = 1, max = 60))]
    pub title: String,
    #[validate(url)]
    pub profile_img: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Partial profile update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[validate(email, length(min = 6, max = 60))]
    pub email: Option<String>,
    #[validate(length(min = 5, max = 20))]
    pub password: Option<String>,
    #[validate(length(min = 1, max = 30))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 30))]
    pub last_name: Option<String>,
    #[validate(length(min = 7, max = 20))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 60))]
    pub organization: Option<String>,
    #[validate(length(min = 1, max = 60))]
    pub title: Option<String>,
    #[validate(url)]
    pub profile_img: Option<String>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.organization.is_none()
            && self.title.is_none()
            && self.profile_img.is_none()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SubscriptionKeysRequest {
    #[validate(length(min = 1, max = 200))]
    pub p256dh: String,
    #[validate(length(min = 1, max = 100))]
    pub auth: String,
}

/// Body of `POST /push/subscribe/{id}`: a browser `PushSubscription.toJSON()`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubscribeRequest {
    #[validate(url, length(max = 2048))]
    pub endpoint: String,
    /// Milliseconds since the epoch; `null` when the subscription never expires
    pub expiration_time: Option<i64>,
    #[validate(nested)]
    pub keys: SubscriptionKeysRequest,
}

impl SubscribeRequest {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_time
            .is_some_and(|expires_at| expires_at <= now.timestamp_millis())
    }
}

impl From<SubscribeRequest> for PushSubscription {
    fn from(req: SubscribeRequest) -> Self {
        PushSubscription {
            endpoint: req.endpoint,
            keys: SubscriptionKeys {
                p256dh: req.keys.p256dh,
                auth: req.keys.auth,
            },
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub user_id: i32,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
}

impl From<SubscriptionRow> for PushSubscription {
    fn from(row: SubscriptionRow) -> Self {
        PushSubscription {
            endpoint: row.endpoint,
            keys: SubscriptionKeys {
                p256dh: row.p256dh,
                auth: row.auth,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UpdatedUserResponse {
    pub user: User,
    pub token: String,
}
