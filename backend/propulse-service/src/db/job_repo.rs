/// Job repository - jobs, memberships and privileges
use crate::models::{Job, JobMember, JobPost, JobSummary, NewJob, UpdateJob};
use sqlx::PgExecutor;

const JOB_COLUMNS: &str = "id, name, city, state, street_addr, admin_id, date_created";

const SUMMARY_SELECT: &str = r#"
    SELECT jobs.id, jobs.name, jobs.city, jobs.state, jobs.street_addr,
           jobs.admin_id, users.email AS admin_email, jobs.date_created
    FROM jobs
    JOIN users ON users.id = jobs.admin_id
"#;

pub async fn insert_job<'e, E: PgExecutor<'e>>(
    db: E,
    job: &NewJob,
    admin_id: i32,
) -> Result<Job, sqlx::Error> {
    sqlx::query_as::<_, Job>(&format!(
        r#"
        INSERT INTO jobs (name, city, state, street_addr, admin_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {JOB_COLUMNS}
        "#
    ))
    .bind(&job.name)
    .bind(&job.city)
    .bind(&job.state)
    .bind(&job.street_addr)
    .bind(admin_id)
    .fetch_one(db)
    .await
}

pub async fn find_job<'e, E: PgExecutor<'e>>(db: E, job_id: i32) -> Result<Option<Job>, sqlx::Error> {
    sqlx::query_as::<_, Job>(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
        .bind(job_id)
        .fetch_optional(db)
        .await
}

pub async fn find_summary<'e, E: PgExecutor<'e>>(
    db: E,
    job_id: i32,
) -> Result<Option<JobSummary>, sqlx::Error> {
    sqlx::query_as::<_, JobSummary>(&format!("{SUMMARY_SELECT} WHERE jobs.id = $1"))
        .bind(job_id)
        .fetch_optional(db)
        .await
}

/// Jobs the user is a member of, oldest first
pub async fn jobs_for_user<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i32,
) -> Result<Vec<JobSummary>, sqlx::Error> {
    sqlx::query_as::<_, JobSummary>(&format!(
        r#"
        {SUMMARY_SELECT}
        JOIN job_associations ja ON ja.job_id = jobs.id
        WHERE ja.user_id = $1
        ORDER BY jobs.id
        "#
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn job_ids_for_user<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i32,
) -> Result<Vec<i32>, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        "SELECT job_id FROM job_associations WHERE user_id = $1 ORDER BY job_id",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// Posts of a job in chronological order, with author emails
pub async fn posts_for_job<'e, E: PgExecutor<'e>>(
    db: E,
    job_id: i32,
) -> Result<Vec<JobPost>, sqlx::Error> {
    sqlx::query_as::<_, JobPost>(
        r#"
        SELECT posts.id, posts.date_posted, users.email AS posted_by,
               posts.deadline, posts.progress, posts.urgency, posts.content
        FROM posts
        JOIN users ON users.id = posts.posted_by
        WHERE posts.job_id = $1
        ORDER BY posts.date_posted, posts.id
        "#,
    )
    .bind(job_id)
    .fetch_all(db)
    .await
}

/// Active members other than the admin, ordered by email
pub async fn members_excluding_admin<'e, E: PgExecutor<'e>>(
    db: E,
    job_id: i32,
    admin_id: i32,
) -> Result<Vec<JobMember>, sqlx::Error> {
    sqlx::query_as::<_, JobMember>(
        r#"
        SELECT users.id, users.email, users.organization, users.title
        FROM users
        JOIN job_associations ja ON ja.user_id = users.id
        WHERE ja.job_id = $1 AND users.id <> $2 AND users.active
        ORDER BY users.email
        "#,
    )
    .bind(job_id)
    .bind(admin_id)
    .fetch_all(db)
    .await
}

pub async fn insert_association<'e, E: PgExecutor<'e>>(
    db: E,
    job_id: i32,
    user_id: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO job_associations (job_id, user_id) VALUES ($1, $2)")
        .bind(job_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn insert_privilege<'e, E: PgExecutor<'e>>(
    db: E,
    job_id: i32,
    user_id: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO job_privileges (job_id, user_id) VALUES ($1, $2)")
        .bind(job_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Insert a privilege row unless one already exists
pub async fn ensure_privilege<'e, E: PgExecutor<'e>>(
    db: E,
    job_id: i32,
    user_id: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO job_privileges (job_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(job_id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn delete_privilege<'e, E: PgExecutor<'e>>(
    db: E,
    job_id: i32,
    user_id: i32,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM job_privileges WHERE job_id = $1 AND user_id = $2")
        .bind(job_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_association<'e, E: PgExecutor<'e>>(
    db: E,
    job_id: i32,
    user_id: i32,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM job_associations WHERE job_id = $1 AND user_id = $2")
        .bind(job_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn is_member<'e, E: PgExecutor<'e>>(
    db: E,
    job_id: i32,
    user_id: i32,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM job_associations WHERE job_id = $1 AND user_id = $2)",
    )
    .bind(job_id)
    .bind(user_id)
    .fetch_one(db)
    .await
}

pub async fn has_privilege<'e, E: PgExecutor<'e>>(
    db: E,
    job_id: i32,
    user_id: i32,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM job_privileges WHERE job_id = $1 AND user_id = $2)",
    )
    .bind(job_id)
    .bind(user_id)
    .fetch_one(db)
    .await
}

/// How many of `user_ids` are members of the job
pub async fn count_members<'e, E: PgExecutor<'e>>(
    db: E,
    job_id: i32,
    user_ids: &[i32],
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM job_associations WHERE job_id = $1 AND user_id = ANY($2::int[])",
    )
    .bind(job_id)
    .bind(user_ids)
    .fetch_one(db)
    .await
}

pub async fn update_job<'e, E: PgExecutor<'e>>(
    db: E,
    job_id: i32,
    changes: &UpdateJob,
) -> Result<Option<Job>, sqlx::Error> {
    sqlx::query_as::<_, Job>(&format!(
        r#"
        UPDATE jobs
        SET name = COALESCE($2, name),
            city = COALESCE($3, city),
            state = COALESCE($4, state),
            street_addr = COALESCE($5, street_addr)
        WHERE id = $1
        RETURNING {JOB_COLUMNS}
        "#
    ))
    .bind(job_id)
    .bind(&changes.name)
    .bind(&changes.city)
    .bind(&changes.state)
    .bind(&changes.street_addr)
    .fetch_optional(db)
    .await
}

/// Swap the admin; zero rows means the job is absent or already owned by them
pub async fn update_admin<'e, E: PgExecutor<'e>>(
    db: E,
    job_id: i32,
    new_admin_id: i32,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE jobs SET admin_id = $2 WHERE id = $1 AND admin_id <> $2")
        .bind(job_id)
        .bind(new_admin_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}
