/// Post repository - posts, replies and their tags
use crate::models::{NewPost, NewReply, Post, PostDetail, Reply, ReplyDetail};
use sqlx::PgExecutor;

const POST_COLUMNS: &str =
    "id, date_posted, posted_by, job_id, deadline, progress, urgency, content, tagged, is_reply";

const REPLY_COLUMNS: &str =
    "id, date_posted, posted_by, reply_to, deadline, content, tagged, is_reply";

const REPLY_DETAIL_SELECT: &str = r#"
    SELECT r.id, r.date_posted, r.posted_by AS creator_id, u.email AS created_by,
           r.reply_to, p.job_id, r.deadline, r.content, r.is_reply,
           COALESCE(array_agg(t.user_id ORDER BY t.user_id)
                    FILTER (WHERE t.user_id IS NOT NULL), '{}') AS tagged_ids,
           COALESCE(array_agg(tu.email ORDER BY t.user_id)
                    FILTER (WHERE t.user_id IS NOT NULL), '{}') AS tagged_users
    FROM replies r
    JOIN posts p ON p.id = r.reply_to
    JOIN users u ON u.id = r.posted_by
    LEFT JOIN reply_tagged_users t ON t.reply_id = r.id
    LEFT JOIN users tu ON tu.id = t.user_id
"#;

pub async fn insert_post<'e, E: PgExecutor<'e>>(
    db: E,
    job_id: i32,
    author_id: i32,
    post: &NewPost,
    tagged: &[i32],
) -> Result<Post, sqlx::Error> {
    sqlx::query_as::<_, Post>(&format!(
        r#"
        INSERT INTO posts (posted_by, job_id, deadline, progress, urgency, content, tagged)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(author_id)
    .bind(job_id)
    .bind(post.deadline)
    .bind(&post.progress)
    .bind(&post.urgency)
    .bind(&post.content)
    .bind(tagged)
    .fetch_one(db)
    .await
}

pub async fn insert_post_tags<'e, E: PgExecutor<'e>>(
    db: E,
    post_id: i32,
    user_ids: &[i32],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO post_tagged_users (post_id, user_id) SELECT $1, UNNEST($2::int[])",
    )
    .bind(post_id)
    .bind(user_ids)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn insert_reply<'e, E: PgExecutor<'e>>(
    db: E,
    post_id: i32,
    author_id: i32,
    reply: &NewReply,
    tagged: &[i32],
) -> Result<Reply, sqlx::Error> {
    sqlx::query_as::<_, Reply>(&format!(
        r#"
        INSERT INTO replies (posted_by, reply_to, deadline, content, tagged)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {REPLY_COLUMNS}
        "#
    ))
    .bind(author_id)
    .bind(post_id)
    .bind(reply.deadline)
    .bind(&reply.content)
    .bind(tagged)
    .fetch_one(db)
    .await
}

pub async fn insert_reply_tags<'e, E: PgExecutor<'e>>(
    db: E,
    reply_id: i32,
    user_ids: &[i32],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO reply_tagged_users (reply_id, user_id) SELECT $1, UNNEST($2::int[])",
    )
    .bind(reply_id)
    .bind(user_ids)
    .execute(db)
    .await?;
    Ok(())
}

/// Job a post belongs to
pub async fn post_job_id<'e, E: PgExecutor<'e>>(
    db: E,
    post_id: i32,
) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT job_id FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(db)
        .await
}

/// Job of the post a reply answers
pub async fn reply_job_id<'e, E: PgExecutor<'e>>(
    db: E,
    reply_id: i32,
) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        "SELECT posts.job_id FROM replies JOIN posts ON posts.id = replies.reply_to WHERE replies.id = $1",
    )
    .bind(reply_id)
    .fetch_optional(db)
    .await
}

pub async fn find_post_detail<'e, E: PgExecutor<'e>>(
    db: E,
    post_id: i32,
) -> Result<Option<PostDetail>, sqlx::Error> {
    sqlx::query_as::<_, PostDetail>(
        r#"
        SELECT p.id, p.date_posted, p.posted_by AS creator_id, u.email AS created_by,
               p.job_id, j.name AS job_name, p.deadline, p.progress, p.urgency,
               p.content, p.is_reply,
               COALESCE(array_agg(t.user_id ORDER BY t.user_id)
                        FILTER (WHERE t.user_id IS NOT NULL), '{}') AS tagged_ids,
               COALESCE(array_agg(tu.email ORDER BY t.user_id)
                        FILTER (WHERE t.user_id IS NOT NULL), '{}') AS tagged_users
        FROM posts p
        JOIN users u ON u.id = p.posted_by
        JOIN jobs j ON j.id = p.job_id
        LEFT JOIN post_tagged_users t ON t.post_id = p.id
        LEFT JOIN users tu ON tu.id = t.user_id
        WHERE p.id = $1
        GROUP BY p.id, u.email, j.name
        "#,
    )
    .bind(post_id)
    .fetch_optional(db)
    .await
}

/// Replies to a post in chronological order
pub async fn replies_for_post<'e, E: PgExecutor<'e>>(
    db: E,
    post_id: i32,
) -> Result<Vec<ReplyDetail>, sqlx::Error> {
    sqlx::query_as::<_, ReplyDetail>(&format!(
        r#"
        {REPLY_DETAIL_SELECT}
        WHERE r.reply_to = $1
        GROUP BY r.id, u.email, p.job_id
        ORDER BY r.date_posted, r.id
        "#
    ))
    .bind(post_id)
    .fetch_all(db)
    .await
}

pub async fn find_reply_detail<'e, E: PgExecutor<'e>>(
    db: E,
    reply_id: i32,
) -> Result<Option<ReplyDetail>, sqlx::Error> {
    sqlx::query_as::<_, ReplyDetail>(&format!(
        r#"
        {REPLY_DETAIL_SELECT}
        WHERE r.id = $1
        GROUP BY r.id, u.email, p.job_id
        "#
    ))
    .bind(reply_id)
    .fetch_optional(db)
    .await
}
