use chrono::{DateTime, NaiveDate, Utc};
use crypto_core::jwt::{PrivilegeGrant, NO_JOBS_MESSAGE};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub name: String,
    pub city: String,
    pub state: String,
    pub street_addr: String,
    pub admin_id: i32,
    pub date_created: DateTime<Utc>,
}

/// A job as listed for one of its members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: i32,
    pub name: String,
    pub city: String,
    pub state: String,
    pub street_addr: String,
    pub admin_id: i32,
    pub admin_email: String,
    pub date_created: DateTime<Utc>,
}

/// Jobs of a user; empty membership is reported with a message, not an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum JobList {
    Jobs(Vec<JobSummary>),
    NoJobs { message: String },
}

impl JobList {
    pub fn from_summaries(jobs: Vec<JobSummary>) -> Self {
        if jobs.is_empty() {
            JobList::NoJobs {
                message: NO_JOBS_MESSAGE.to_string(),
            }
        } else {
            JobList::Jobs(jobs)
        }
    }
}

/// Post line in a job detail; `posted_by` is the author's email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobPost {
    pub id: i32,
    pub date_posted: DateTime<Utc>,
    pub posted_by: String,
    pub deadline: Option<NaiveDate>,
    pub progress: Option<String>,
    pub urgency: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct JobMember {
    pub id: i32,
    pub email: String,
    pub organization: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobDetail {
    #[serde(flatten)]
    pub summary: JobSummary,
    /// Whether the requesting user holds trusted privilege on this job
    pub privilege: bool,
    pub posts: Vec<JobPost>,
    /// Members other than the admin, ordered by email
    pub users: Vec<JobMember>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 60))]
    pub city: String,
    #[validate(length(min = 2, max = 30))]
    pub state: String,
    #[validate(length(min = 1, max = 120))]
    pub street_addr: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateJob {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 60))]
    pub city: Option<String>,
    #[validate(length(min = 2, max = 30))]
    pub state: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub street_addr: Option<String>,
}

impl UpdateJob {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.city.is_none() && self.state.is_none() && self.street_addr.is_none()
    }
}

/// Body of `POST /jobs/invite/{job_id}`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct InviteRequest {
    /// Email of the user to invite
    #[validate(email)]
    pub invited: String,
    pub privilege: PrivilegeGrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcceptQuery {
    pub token: String,
}

/// Result of adding a user to a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Association {
    Member,
    Trusted,
}

impl Association {
    pub fn message(self) -> &'static str {
        match self {
            Association::Member => "You have been added to the project!",
            Association::Trusted => "You have been added to the project as a trusted user!",
        }
    }

    pub fn detail(self) -> Option<&'static str> {
        match self {
            Association::Member => None,
            Association::Trusted => {
                Some("As a trusted user, you may invite other users to the project!")
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedJobResponse {
    pub job: Job,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job: Job,
    pub message: String,
}
