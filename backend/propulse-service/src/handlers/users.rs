use actix_web::{web, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::error::Result;
use crate::middleware::{ensure_self, ensure_visible_user, CurrentUser};
use crate::models::{UpdateUserRequest, UpdatedUserResponse};
use crate::services::{tokens, users};
use crate::AppState;

/// GET /users/{id}
///
/// Subscriptions are only included when users look at themselves.
pub async fn get_user(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();

    // 404 for absent users takes precedence over visibility
    users::get(&state.db, user_id).await?;
    ensure_visible_user(&state.db, user_id, &user).await?;

    let detail = users::get_detail(&state.db, user_id, user.id() == user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "user": detail })))
}

/// PATCH /users/{id}
pub async fn update_user(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
    req: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    ensure_self(&user, user_id)?;
    req.validate()?;

    let updated = users::update(&state.db, user_id, &req).await?;
    let token =
        tokens::issue_session_token(&state.db, &state.keys, updated.id, &updated.email).await?;

    Ok(HttpResponse::Ok().json(UpdatedUserResponse {
        user: updated,
        token,
    }))
}

/// PATCH /users/deactivate/{id}
pub async fn deactivate_user(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    ensure_self(&user, user_id)?;

    let message = users::deactivate(&state.db, user_id).await?;
    Ok(HttpResponse::Ok().json(message))
}
