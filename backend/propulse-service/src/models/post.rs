use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i32,
    pub date_posted: DateTime<Utc>,
    pub posted_by: i32,
    pub job_id: i32,
    pub deadline: Option<NaiveDate>,
    pub progress: Option<String>,
    pub urgency: Option<String>,
    pub content: String,
    /// Ids of the tagged users
    pub tagged: Vec<i32>,
    pub is_reply: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: i32,
    pub date_posted: DateTime<Utc>,
    pub posted_by: i32,
    pub reply_to: i32,
    pub deadline: Option<NaiveDate>,
    pub content: String,
    pub tagged: Vec<i32>,
    pub is_reply: bool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    pub id: i32,
    pub date_posted: DateTime<Utc>,
    pub creator_id: i32,
    /// Author email
    pub created_by: String,
    pub job_id: i32,
    pub job_name: String,
    pub deadline: Option<NaiveDate>,
    pub progress: Option<String>,
    pub urgency: Option<String>,
    pub content: String,
    pub is_reply: bool,
    pub tagged_ids: Vec<i32>,
    pub tagged_users: Vec<String>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<ReplyDetail>>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReplyDetail {
    pub id: i32,
    pub date_posted: DateTime<Utc>,
    pub creator_id: i32,
    pub created_by: String,
    pub reply_to: i32,
    /// Job of the parent post
    pub job_id: i32,
    pub deadline: Option<NaiveDate>,
    pub content: String,
    pub is_reply: bool,
    pub tagged_ids: Vec<i32>,
    pub tagged_users: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewPost {
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
    /// Emails of the users to tag
    #[serde(default)]
    #[validate(length(max = 50))]
    pub tagged: Vec<String>,
    pub deadline: Option<NaiveDate>,
    #[validate(length(min = 1, max = 30))]
    pub progress: Option<String>,
    #[validate(length(min = 1, max = 30))]
    pub urgency: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewReply {
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub tagged: Vec<String>,
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse<T> {
    pub post: T,
}

#[derive(Debug, Serialize)]
pub struct ReplyResponse<T> {
    pub reply: T,
}
