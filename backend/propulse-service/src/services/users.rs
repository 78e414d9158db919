use crypto_core::password::{hash_password, verify_password, PasswordError};
use propulse_push_shared::PushSubscription;
use sqlx::PgPool;
use tracing::info;

use crate::db::{job_repo, user_repo};
use crate::error::{AppError, Result};
use crate::models::{
    JobList, MessageResponse, RegisterRequest, UpdateUserRequest, User, UserDetail,
};
use crate::services::conflict_on_duplicate;

const INVALID_CREDENTIALS: &str = "Invalid email/password";

fn duplicate_email(email: &str) -> String {
    format!("Duplicate email: {email} already exists")
}

fn no_user_with_id(id: i32) -> AppError {
    AppError::NotFound(format!("No user with id: {id}"))
}

/// Create a user with a hashed password
pub async fn register(db: &PgPool, req: &RegisterRequest) -> Result<User> {
    let duplicate = duplicate_email(&req.email);
    if user_repo::email_taken(db, &req.email).await? {
        return Err(AppError::BadRequest(duplicate));
    }

    let password_hash = hash_password(&req.password)?;
    let user = user_repo::create_user(db, req, &password_hash)
        .await
        .map_err(|e| conflict_on_duplicate(e, &duplicate))?;

    info!(user_id = user.id, "User registered");
    Ok(user)
}

/// Check credentials; unknown, inactive and mismatched users look the same
pub async fn authenticate(db: &PgPool, email: &str, password: &str) -> Result<User> {
    let user = match user_repo::find_by_email(db, email).await? {
        Some(user) if user.active => user,
        _ => return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string())),
    };

    match verify_password(password, &user.password) {
        Ok(()) => Ok(user),
        Err(PasswordError::Mismatch) => Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string())),
        Err(e) => Err(e.into()),
    }
}

pub async fn get(db: &PgPool, user_id: i32) -> Result<User> {
    user_repo::find_active_by_id(db, user_id)
        .await?
        .ok_or_else(|| no_user_with_id(user_id))
}

pub async fn get_by_email(db: &PgPool, email: &str) -> Result<User> {
    user_repo::find_active_by_email(db, email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No user with email: {email}")))
}

/// Profile, jobs and, when `include_subscriptions`, the push subscriptions
pub async fn get_detail(db: &PgPool, user_id: i32, include_subscriptions: bool) -> Result<UserDetail> {
    let user = get(db, user_id).await?;
    let jobs = JobList::from_summaries(job_repo::jobs_for_user(db, user_id).await?);

    let subscriptions = if include_subscriptions {
        let rows = user_repo::subscriptions_for_users(db, &[user_id]).await?;
        Some(rows.into_iter().map(PushSubscription::from).collect())
    } else {
        None
    };

    Ok(UserDetail {
        user,
        jobs,
        subscriptions,
    })
}

/// Partial update; a new password is re-hashed
pub async fn update(db: &PgPool, user_id: i32, changes: &UpdateUserRequest) -> Result<User> {
    if changes.is_empty() {
        return Err(AppError::BadRequest("No data to update".to_string()));
    }

    let current = get(db, user_id).await?;

    let duplicate = changes.email.as_deref().map(duplicate_email);
    if let (Some(email), Some(message)) = (changes.email.as_deref(), duplicate.as_deref()) {
        if email.to_lowercase() != current.email && user_repo::email_taken(db, email).await? {
            return Err(AppError::BadRequest(message.to_string()));
        }
    }

    let password_hash = changes
        .password
        .as_deref()
        .map(hash_password)
        .transpose()?;

    let user = user_repo::update_user(db, user_id, changes, password_hash.as_deref())
        .await
        .map_err(|e| match duplicate.as_deref() {
            Some(message) => conflict_on_duplicate(e, message),
            None => e.into(),
        })?
        .ok_or_else(|| no_user_with_id(user_id))?;

    info!(user_id, "User updated");
    Ok(user)
}

/// Soft-delete; the user disappears from every read
pub async fn deactivate(db: &PgPool, user_id: i32) -> Result<MessageResponse> {
    if user_repo::deactivate(db, user_id).await? == 0 {
        return Err(no_user_with_id(user_id));
    }

    info!(user_id, "User deactivated");
    Ok(MessageResponse::new("User deactivated"))
}

pub async fn add_subscription(
    db: &PgPool,
    user_id: i32,
    subscription: &PushSubscription,
) -> Result<MessageResponse> {
    get(db, user_id).await?;

    user_repo::insert_subscription(db, user_id, subscription)
        .await
        .map_err(|e| conflict_on_duplicate(e, "Subscription already exists"))?;

    info!(user_id, "Push subscription added");
    Ok(MessageResponse::new("Subscription added successfully"))
}

/// Push subscriptions of the given active users
pub async fn subscriptions_for_users(db: &PgPool, user_ids: &[i32]) -> Result<Vec<PushSubscription>> {
    let rows = user_repo::subscriptions_for_users(db, user_ids).await?;
    Ok(rows.into_iter().map(PushSubscription::from).collect())
}
