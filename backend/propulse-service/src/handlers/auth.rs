use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::error::Result;
use crate::models::{LoginRequest, RegisterRequest, TokenResponse};
use crate::services::{tokens, users};
use crate::AppState;

/// POST /auth/login
pub async fn login(state: web::Data<AppState>, req: web::Json<LoginRequest>) -> Result<HttpResponse> {
    req.validate()?;

    let user = users::authenticate(&state.db, &req.email, &req.password).await?;
    let token = tokens::issue_session_token(&state.db, &state.keys, user.id, &user.email).await?;

    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

/// POST /auth/register
pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let user = users::register(&state.db, &req).await?;
    let token = tokens::issue_session_token(&state.db, &state.keys, user.id, &user.email).await?;

    Ok(HttpResponse::Created().json(TokenResponse { token }))
}
