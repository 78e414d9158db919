//! Authorization checks run by handlers before touching the graph.
//!
//! Job guards look the job up first, so an absent job is a 404 for everyone;
//! a missing relationship is a 401.

use sqlx::PgPool;

use crate::db::{job_repo, user_repo};
use crate::error::{AppError, Result};
use crate::models::Job;
use crate::services::jobs::no_job_with_id;

use super::CurrentUser;

/// The path refers to the authenticated user
pub fn ensure_self(user: &CurrentUser, user_id: i32) -> Result<()> {
    if user.id() == user_id {
        Ok(())
    } else {
        Err(AppError::unauthorized())
    }
}

async fn load_job(db: &PgPool, job_id: i32) -> Result<Job> {
    job_repo::find_job(db, job_id)
        .await?
        .ok_or_else(|| no_job_with_id(job_id))
}

/// The user is a member of the job
pub async fn ensure_member(db: &PgPool, job_id: i32, user: &CurrentUser) -> Result<Job> {
    let job = load_job(db, job_id).await?;
    if job_repo::is_member(db, job_id, user.id()).await? {
        Ok(job)
    } else {
        Err(AppError::unauthorized())
    }
}

/// The user administers the job or holds trusted privilege on it
pub async fn ensure_trusted(db: &PgPool, job_id: i32, user: &CurrentUser) -> Result<Job> {
    let job = load_job(db, job_id).await?;
    if job.admin_id == user.id() || job_repo::has_privilege(db, job_id, user.id()).await? {
        Ok(job)
    } else {
        Err(AppError::unauthorized())
    }
}

/// The user is the job's current admin
pub async fn ensure_admin(db: &PgPool, job_id: i32, user: &CurrentUser) -> Result<Job> {
    let job = load_job(db, job_id).await?;
    if job.admin_id == user.id() {
        Ok(job)
    } else {
        Err(AppError::unauthorized())
    }
}

/// A profile is visible to its owner and to anyone sharing a job with them
pub async fn ensure_visible_user(db: &PgPool, user_id: i32, user: &CurrentUser) -> Result<()> {
    if user.id() == user_id || user_repo::shares_job(db, user.id(), user_id).await? {
        Ok(())
    } else {
        Err(AppError::unauthorized())
    }
}
