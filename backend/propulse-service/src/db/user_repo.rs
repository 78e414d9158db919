/// User repository - users and their push subscriptions
use crate::models::{RegisterRequest, SubscriptionRow, UpdateUserRequest, User};
use propulse_push_shared::PushSubscription;
use sqlx::PgExecutor;

// Emails are stored lowercased; lookups lowercase their argument to match
const USER_COLUMNS: &str = "id, email, password, first_name, last_name, phone, organization, \
                            title, profile_img, active, created_at";

/// Insert a new user; `password_hash` is the already-hashed credential
pub async fn create_user<'e, E: PgExecutor<'e>>(
    db: E,
    req: &RegisterRequest,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (email, password, first_name, last_name, phone, organization, title, profile_img)
        VALUES (lower($1), $2, $3, $4, $5, $6, $7, $8)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&req.email)
    .bind(password_hash)
    .bind(&req.first_name)
    .bind(&req.last_name)
    .bind(&req.phone)
    .bind(&req.organization)
    .bind(&req.title)
    .bind(&req.profile_img)
    .fetch_one(db)
    .await
}

/// Find a user by email, including inactive users
pub async fn find_by_email<'e, E: PgExecutor<'e>>(
    db: E,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = lower($1)"))
        .bind(email)
        .fetch_optional(db)
        .await
}

pub async fn find_active_by_email<'e, E: PgExecutor<'e>>(
    db: E,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = lower($1) AND active"
    ))
    .bind(email)
    .fetch_optional(db)
    .await
}

pub async fn find_active_by_id<'e, E: PgExecutor<'e>>(
    db: E,
    id: i32,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND active"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Whether any user, active or not, already owns the email
pub async fn email_taken<'e, E: PgExecutor<'e>>(db: E, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = lower($1))")
        .bind(email)
        .fetch_one(db)
        .await
}

/// Apply a partial update to an active user. `password_hash` replaces the
/// stored credential when present.
pub async fn update_user<'e, E: PgExecutor<'e>>(
    db: E,
    id: i32,
    changes: &UpdateUserRequest,
    password_hash: Option<&str>,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET email = COALESCE(lower($2), email),
            password = COALESCE($3, password),
            first_name = COALESCE($4, first_name),
            last_name = COALESCE($5, last_name),
            phone = COALESCE($6, phone),
            organization = COALESCE($7, organization),
            title = COALESCE($8, title),
            profile_img = COALESCE($9, profile_img)
        WHERE id = $1 AND active
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&changes.email)
    .bind(password_hash)
    .bind(&changes.first_name)
    .bind(&changes.last_name)
    .bind(&changes.phone)
    .bind(&changes.organization)
    .bind(&changes.title)
    .bind(&changes.profile_img)
    .fetch_optional(db)
    .await
}

/// Soft-delete; returns the number of rows changed
pub async fn deactivate<'e, E: PgExecutor<'e>>(db: E, id: i32) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET active = FALSE WHERE id = $1 AND active")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// Ids of active users owning the given emails, with the matched email
pub async fn active_ids_by_emails<'e, E: PgExecutor<'e>>(
    db: E,
    emails: &[String],
) -> Result<Vec<(i32, String)>, sqlx::Error> {
    sqlx::query_as::<_, (i32, String)>(
        "SELECT id, email FROM users \
         WHERE email IN (SELECT lower(e) FROM unnest($1::text[]) AS e) AND active",
    )
    .bind(emails)
    .fetch_all(db)
    .await
}

/// Whether two users are members of at least one common job
pub async fn shares_job<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i32,
    other_id: i32,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1
            FROM job_associations a
            JOIN job_associations b ON a.job_id = b.job_id
            WHERE a.user_id = $1 AND b.user_id = $2
        )
        "#,
    )
    .bind(user_id)
    .bind(other_id)
    .fetch_one(db)
    .await
}

pub async fn insert_subscription<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i32,
    subscription: &PushSubscription,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO user_subscriptions (user_id, endpoint, p256dh, auth)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(user_id)
    .bind(&subscription.endpoint)
    .bind(&subscription.keys.p256dh)
    .bind(&subscription.keys.auth)
    .execute(db)
    .await?;
    Ok(())
}

/// Subscriptions of every active user in `user_ids`, oldest first
pub async fn subscriptions_for_users<'e, E: PgExecutor<'e>>(
    db: E,
    user_ids: &[i32],
) -> Result<Vec<SubscriptionRow>, sqlx::Error> {
    sqlx::query_as::<_, SubscriptionRow>(
        r#"
        SELECT s.user_id, s.endpoint, s.p256dh, s.auth
        FROM user_subscriptions s
        JOIN users u ON u.id = s.user_id
        WHERE s.user_id = ANY($1::int[]) AND u.active
        ORDER BY s.id
        "#,
    )
    .bind(user_ids)
    .fetch_all(db)
    .await
}

/// Drop subscriptions the push service reported as gone
pub async fn delete_subscriptions_by_endpoint<'e, E: PgExecutor<'e>>(
    db: E,
    endpoints: &[String],
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM user_subscriptions WHERE endpoint = ANY($1::text[])")
        .bind(endpoints)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}
