use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::error::Result;
use crate::middleware::{ensure_member, CurrentUser};
use crate::models::{NewPost, NewReply, PostResponse, ReplyResponse};
use crate::services::posts;
use crate::AppState;

/// POST /posts/{job_id}
pub async fn create_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
    req: web::Json<NewPost>,
) -> Result<HttpResponse> {
    let job_id = path.into_inner();
    ensure_member(&state.db, job_id, &user).await?;
    req.validate()?;

    let post =
        posts::create_post(&state.db, &state.notifier, job_id, user.id(), user.email(), &req)
            .await?;

    Ok(HttpResponse::Created().json(PostResponse { post }))
}

/// POST /posts/reply/{post_id}
pub async fn create_reply(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
    req: web::Json<NewReply>,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();
    let job_id = posts::post_job_id(&state.db, post_id).await?;
    ensure_member(&state.db, job_id, &user).await?;
    req.validate()?;

    let reply =
        posts::create_reply(&state.db, &state.notifier, post_id, user.id(), user.email(), &req)
            .await?;

    Ok(HttpResponse::Created().json(ReplyResponse { reply }))
}

/// GET /posts/{post_id}
pub async fn get_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();
    let job_id = posts::post_job_id(&state.db, post_id).await?;
    ensure_member(&state.db, job_id, &user).await?;

    let post = posts::get_post(&state.db, post_id).await?;
    Ok(HttpResponse::Ok().json(PostResponse { post }))
}

/// GET /posts/replies/{reply_id}
pub async fn get_reply(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let reply_id = path.into_inner();
    let job_id = posts::reply_job_id(&state.db, reply_id).await?;
    ensure_member(&state.db, job_id, &user).await?;

    let reply = posts::get_reply(&state.db, reply_id).await?;
    Ok(HttpResponse::Ok().json(ReplyResponse { reply }))
}
