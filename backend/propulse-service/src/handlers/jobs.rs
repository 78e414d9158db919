use actix_web::{web, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::{ensure_admin, ensure_member, ensure_self, ensure_trusted, CurrentUser};
use crate::models::{
    AcceptQuery, CreatedJobResponse, InviteRequest, JobResponse, MessageResponse, NewJob,
    UpdateJob,
};
use crate::services::invitations::INVITATION_SENT;
use crate::services::{jobs, tokens};
use crate::AppState;

/// POST /jobs
///
/// The creator becomes admin; the returned token already lists the new job.
pub async fn create_job(
    state: web::Data<AppState>,
    user: CurrentUser,
    req: web::Json<NewJob>,
) -> Result<HttpResponse> {
    req.validate()?;

    let job = jobs::create_job(&state.db, &req, user.id()).await?;
    let token = tokens::issue_session_token(&state.db, &state.keys, user.id(), user.email()).await?;

    Ok(HttpResponse::Created().json(CreatedJobResponse { job, token }))
}

/// POST /jobs/invite/{job_id}
pub async fn invite(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
    req: web::Json<InviteRequest>,
) -> Result<HttpResponse> {
    let job_id = path.into_inner();
    ensure_trusted(&state.db, job_id, &user).await?;
    req.validate()?;

    state
        .invitations
        .invite(job_id, user.email(), &req.invited, req.privilege)
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new(INVITATION_SENT)))
}

/// POST /jobs/accept?token=...
pub async fn accept_invitation(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<AcceptQuery>,
) -> Result<HttpResponse> {
    let accepted = state
        .invitations
        .accept(&query.token, user.id(), user.email())
        .await?;

    let mut body = json!({
        "message": accepted.association.message(),
        "jobId": accepted.job_id,
        "token": accepted.token,
    });
    if let Some(detail) = accepted.association.detail() {
        body["detail"] = json!(detail);
    }

    Ok(HttpResponse::Ok().json(body))
}

/// GET /jobs/{id}
pub async fn get_job(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let job_id = path.into_inner();
    ensure_member(&state.db, job_id, &user).await?;

    let job = jobs::get_job(&state.db, job_id, user.id()).await?;
    Ok(HttpResponse::Ok().json(json!({ "job": job })))
}

/// GET /jobs/user/{id}
pub async fn user_jobs(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    ensure_self(&user, user_id)?;

    let jobs = jobs::list_jobs_for_user(&state.db, user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "jobs": jobs })))
}

/// POST /jobs/{id}/remove/{user_id}
pub async fn remove_user(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse> {
    let (job_id, user_id) = path.into_inner();
    ensure_trusted(&state.db, job_id, &user).await?;

    jobs::dissociate(&state.db, job_id, user_id).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new(
        "The user was removed from the project",
    )))
}

/// POST /jobs/{id}/trust/{user_id}
pub async fn trust_user(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse> {
    let (job_id, user_id) = path.into_inner();
    ensure_trusted(&state.db, job_id, &user).await?;

    jobs::grant_privilege(&state.db, job_id, user_id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(message) => AppError::BadRequest(message),
            other => other,
        })?;

    Ok(HttpResponse::Ok().json(MessageResponse::with_detail(
        "You have added the user to the project as a trusted user!",
        "As a trusted user, they may invite other users to the project!",
    )))
}

/// PATCH /jobs/{id}
pub async fn update_job(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
    req: web::Json<UpdateJob>,
) -> Result<HttpResponse> {
    let job_id = path.into_inner();
    ensure_trusted(&state.db, job_id, &user).await?;
    req.validate()?;

    let job = jobs::update_job(&state.db, job_id, &req).await?;

    Ok(HttpResponse::Ok().json(JobResponse {
        job,
        message: "The project was updated successfully".to_string(),
    }))
}

/// PATCH /jobs/{id}/transfer/{user_id}
pub async fn transfer_admin(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse> {
    let (job_id, new_admin_id) = path.into_inner();
    ensure_admin(&state.db, job_id, &user).await?;

    if !jobs::is_member(&state.db, job_id, new_admin_id).await? {
        return Err(AppError::BadRequest(jobs::NOT_MEMBER.to_string()));
    }
    jobs::transfer_admin(&state.db, job_id, new_admin_id).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Admin transfer successful")))
}
