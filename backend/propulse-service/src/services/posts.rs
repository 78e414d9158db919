use sqlx::PgPool;
use std::collections::BTreeSet;
use tracing::info;

use crate::db::{job_repo, post_repo, user_repo};
use crate::error::{AppError, Result};
use crate::models::{NewPost, NewReply, Post, PostDetail, Reply, ReplyDetail};
use crate::services::NotificationDispatcher;

pub const TAGS_NOT_MEMBERS: &str = "One or more tagged users are not associated with this project";

pub fn no_post_with_id(post_id: i32) -> AppError {
    AppError::NotFound(format!("No post with id: {post_id}"))
}

pub fn no_reply_with_id(reply_id: i32) -> AppError {
    AppError::NotFound(format!("No reply with id: {reply_id}"))
}

/// Resolve tagged emails to user ids, requiring every one to be an active
/// member of the job. Duplicates collapse; order follows the ids.
pub async fn resolve_tags(db: &PgPool, job_id: i32, emails: &[String]) -> Result<Vec<i32>> {
    let emails: Vec<String> = emails
        .iter()
        .map(|email| email.trim().to_lowercase())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if emails.is_empty() {
        return Ok(Vec::new());
    }

    let resolved = user_repo::active_ids_by_emails(db, &emails).await?;
    if resolved.len() != emails.len() {
        return Err(AppError::BadRequest(TAGS_NOT_MEMBERS.to_string()));
    }

    let mut ids: Vec<i32> = resolved.into_iter().map(|(id, _)| id).collect();
    ids.sort_unstable();

    let members = job_repo::count_members(db, job_id, &ids).await?;
    if members != ids.len() as i64 {
        return Err(AppError::BadRequest(TAGS_NOT_MEMBERS.to_string()));
    }

    Ok(ids)
}

/// Create a post; tag validation happens before anything is written
pub async fn create_post(
    db: &PgPool,
    notifier: &NotificationDispatcher,
    job_id: i32,
    author_id: i32,
    author_email: &str,
    new_post: &NewPost,
) -> Result<Post> {
    let tagged = resolve_tags(db, job_id, &new_post.tagged).await?;

    let mut tx = db.begin().await?;
    let post = post_repo::insert_post(&mut *tx, job_id, author_id, new_post, &tagged).await?;
    post_repo::insert_post_tags(&mut *tx, post.id, &tagged).await?;
    tx.commit().await?;

    info!(post_id = post.id, job_id, author_id, tagged = tagged.len(), "Post created");

    let payload = notifier.post_tag_payload(author_email, post.id);
    notifier.dispatch_to_users(tagged, payload);

    Ok(post)
}

/// Create a reply; tags are checked against the parent post's job
pub async fn create_reply(
    db: &PgPool,
    notifier: &NotificationDispatcher,
    post_id: i32,
    author_id: i32,
    author_email: &str,
    new_reply: &NewReply,
) -> Result<Reply> {
    let job_id = post_job_id(db, post_id).await?;
    let tagged = resolve_tags(db, job_id, &new_reply.tagged).await?;

    let mut tx = db.begin().await?;
    let reply = post_repo::insert_reply(&mut *tx, post_id, author_id, new_reply, &tagged).await?;
    post_repo::insert_reply_tags(&mut *tx, reply.id, &tagged).await?;
    tx.commit().await?;

    info!(reply_id = reply.id, post_id, author_id, tagged = tagged.len(), "Reply created");

    let payload = notifier.reply_tag_payload(author_email, reply.id);
    notifier.dispatch_to_users(tagged, payload);

    Ok(reply)
}

pub async fn post_job_id(db: &PgPool, post_id: i32) -> Result<i32> {
    post_repo::post_job_id(db, post_id)
        .await?
        .ok_or_else(|| no_post_with_id(post_id))
}

pub async fn reply_job_id(db: &PgPool, reply_id: i32) -> Result<i32> {
    post_repo::reply_job_id(db, reply_id)
        .await?
        .ok_or_else(|| no_reply_with_id(reply_id))
}

/// Post with tagged emails and, when there are any, its replies
pub async fn get_post(db: &PgPool, post_id: i32) -> Result<PostDetail> {
    let mut post = post_repo::find_post_detail(db, post_id)
        .await?
        .ok_or_else(|| no_post_with_id(post_id))?;

    let replies = post_repo::replies_for_post(db, post_id).await?;
    if !replies.is_empty() {
        post.replies = Some(replies);
    }

    Ok(post)
}

pub async fn get_reply(db: &PgPool, reply_id: i32) -> Result<ReplyDetail> {
    post_repo::find_reply_detail(db, reply_id)
        .await?
        .ok_or_else(|| no_reply_with_id(reply_id))
}
