//! Job membership and privilege graph
//!
//! Membership and privilege are separate relations. A privilege row always
//! refines an existing membership (enforced by a foreign key), the admin is
//! always a member, and removing a member removes their privilege in the same
//! transaction. Existence checks here are advisory: the primary keys on both
//! relations turn a losing concurrent insert into a [`AppError::Conflict`].

use sqlx::PgPool;
use tracing::info;

use crate::db::job_repo;
use crate::error::{AppError, Result};
use crate::models::{Association, Job, JobDetail, JobList, NewJob, UpdateJob};
use crate::services::conflict_on_duplicate;

pub const ALREADY_MEMBER: &str = "The user is already associated with this job";
pub const NOT_MEMBER: &str = "The user is not associated with this project";
pub const ALREADY_TRUSTED: &str = "The user already has privileges for this project";

pub fn no_job_with_id(job_id: i32) -> AppError {
    AppError::NotFound(format!("No job with id: {job_id}"))
}

/// Create a job; the admin joins it as a trusted member in the same transaction
pub async fn create_job(db: &PgPool, spec: &NewJob, admin_id: i32) -> Result<Job> {
    let mut tx = db.begin().await?;

    let job = job_repo::insert_job(&mut *tx, spec, admin_id).await?;
    job_repo::insert_association(&mut *tx, job.id, admin_id).await?;
    job_repo::insert_privilege(&mut *tx, job.id, admin_id).await?;

    tx.commit().await?;

    info!(job_id = job.id, admin_id, "Job created");
    Ok(job)
}

pub async fn find_job(db: &PgPool, job_id: i32) -> Result<Job> {
    job_repo::find_job(db, job_id)
        .await?
        .ok_or_else(|| no_job_with_id(job_id))
}

/// Every job the user belongs to, or the no-jobs marker
pub async fn list_jobs_for_user(db: &PgPool, user_id: i32) -> Result<JobList> {
    let jobs = job_repo::jobs_for_user(db, user_id).await?;
    Ok(JobList::from_summaries(jobs))
}

/// Job with its posts, its non-admin members and the requester's privilege
pub async fn get_job(db: &PgPool, job_id: i32, requesting_user_id: i32) -> Result<JobDetail> {
    let summary = job_repo::find_summary(db, job_id)
        .await?
        .ok_or_else(|| no_job_with_id(job_id))?;

    let posts = job_repo::posts_for_job(db, job_id).await?;
    let users = job_repo::members_excluding_admin(db, job_id, summary.admin_id).await?;
    let privilege = is_trusted(db, job_id, requesting_user_id).await?;

    Ok(JobDetail {
        summary,
        privilege,
        posts,
        users,
    })
}

/// Add a member, optionally trusted. Not idempotent: an existing membership
/// is a conflict.
pub async fn associate(
    db: &PgPool,
    job_id: i32,
    user_id: i32,
    grant_privilege: bool,
) -> Result<Association> {
    if job_repo::is_member(db, job_id, user_id).await? {
        return Err(AppError::Conflict(ALREADY_MEMBER.to_string()));
    }

    let mut tx = db.begin().await?;

    job_repo::insert_association(&mut *tx, job_id, user_id)
        .await
        .map_err(|e| conflict_on_duplicate(e, ALREADY_MEMBER))?;

    let association = if grant_privilege {
        job_repo::insert_privilege(&mut *tx, job_id, user_id).await?;
        Association::Trusted
    } else {
        Association::Member
    };

    tx.commit().await?;

    info!(job_id, user_id, trusted = grant_privilege, "User associated with job");
    Ok(association)
}

/// Remove a member together with any privilege they hold
pub async fn dissociate(db: &PgPool, job_id: i32, user_id: i32) -> Result<()> {
    let job = find_job(db, job_id).await?;
    if job.admin_id == user_id {
        return Err(AppError::BadRequest(
            "The project admin cannot be removed from the project".to_string(),
        ));
    }

    let mut tx = db.begin().await?;

    job_repo::delete_privilege(&mut *tx, job_id, user_id).await?;
    let removed = job_repo::delete_association(&mut *tx, job_id, user_id).await?;
    if removed == 0 {
        // Nothing was deleted; dropping the transaction rolls back
        return Err(AppError::NotFound(NOT_MEMBER.to_string()));
    }

    tx.commit().await?;

    info!(job_id, user_id, "User dissociated from job");
    Ok(())
}

/// Make an existing member trusted
pub async fn grant_privilege(db: &PgPool, job_id: i32, user_id: i32) -> Result<()> {
    if !job_repo::is_member(db, job_id, user_id).await? {
        return Err(AppError::NotFound(NOT_MEMBER.to_string()));
    }
    if job_repo::has_privilege(db, job_id, user_id).await? {
        return Err(AppError::Conflict(ALREADY_TRUSTED.to_string()));
    }

    job_repo::insert_privilege(db, job_id, user_id)
        .await
        .map_err(|e| conflict_on_duplicate(e, ALREADY_TRUSTED))?;

    info!(job_id, user_id, "Privilege granted");
    Ok(())
}

pub async fn is_member(db: &PgPool, job_id: i32, user_id: i32) -> Result<bool> {
    Ok(job_repo::is_member(db, job_id, user_id).await?)
}

/// Privilege lookup; absence is `false`
pub async fn is_trusted(db: &PgPool, job_id: i32, user_id: i32) -> Result<bool> {
    Ok(job_repo::has_privilege(db, job_id, user_id).await?)
}

pub async fn update_job(db: &PgPool, job_id: i32, changes: &UpdateJob) -> Result<Job> {
    if changes.is_empty() {
        return Err(AppError::BadRequest("No data to update".to_string()));
    }

    let job = job_repo::update_job(db, job_id, changes)
        .await?
        .ok_or_else(|| no_job_with_id(job_id))?;

    info!(job_id, "Job updated");
    Ok(job)
}

/// Swap the admin. The caller confirms `new_admin_id` is a member; the new
/// admin is also made trusted so the privilege relation keeps covering them.
pub async fn transfer_admin(db: &PgPool, job_id: i32, new_admin_id: i32) -> Result<()> {
    let mut tx = db.begin().await?;

    if job_repo::update_admin(&mut *tx, job_id, new_admin_id).await? == 0 {
        return Err(AppError::BadRequest("Admin transfer failed".to_string()));
    }
    job_repo::ensure_privilege(&mut *tx, job_id, new_admin_id).await?;

    tx.commit().await?;

    info!(job_id, new_admin_id, "Job admin transferred");
    Ok(())
}
