use actix_web::{web, HttpResponse};
use chrono::Utc;
use propulse_push_shared::PushSubscription;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::{ensure_self, CurrentUser};
use crate::models::SubscribeRequest;
use crate::services::users;
use crate::AppState;

pub const SUBSCRIPTION_EXPIRED: &str = "Subscription has already expired";

/// POST /push/subscribe/{id}
pub async fn subscribe(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<i32>,
    req: web::Json<SubscribeRequest>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    ensure_self(&user, user_id)?;
    req.validate()?;
    if req.is_expired(Utc::now()) {
        return Err(AppError::BadRequest(SUBSCRIPTION_EXPIRED.to_string()));
    }

    let subscription = PushSubscription::from(req.into_inner());
    let message = users::add_subscription(&state.db, user_id, &subscription).await?;

    Ok(HttpResponse::Ok().json(message))
}
