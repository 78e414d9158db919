//! Route configuration
//!
//! Extractor error handlers are registered here too, so malformed bodies,
//! paths and queries all answer with the standard error body.

use actix_web::{error, web, HttpRequest};

use crate::error::AppError;
use crate::handlers;

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err: error::JsonPayloadError, _req: &HttpRequest| {
            AppError::BadRequest(err.to_string()).into()
        })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err: error::PathError, _req: &HttpRequest| {
        AppError::BadRequest(err.to_string()).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: error::QueryPayloadError, _req: &HttpRequest| {
        AppError::BadRequest(err.to_string()).into()
    })
}

/// Configure all routes for the application
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .app_data(query_config())
        .route("/health", web::get().to(handlers::health::health_check))
        .service(
            web::scope("/auth")
                .route("/login", web::post().to(handlers::auth::login))
                .route("/register", web::post().to(handlers::auth::register)),
        )
        .service(
            web::scope("/users")
                .route(
                    "/deactivate/{id}",
                    web::patch().to(handlers::users::deactivate_user),
                )
                .route("/{id}", web::get().to(handlers::users::get_user))
                .route("/{id}", web::patch().to(handlers::users::update_user)),
        )
        .service(
            web::scope("/push")
                .route("/subscribe/{id}", web::post().to(handlers::push::subscribe)),
        )
        .service(
            web::scope("/jobs")
                .route("", web::post().to(handlers::jobs::create_job))
                .route("/accept", web::post().to(handlers::jobs::accept_invitation))
                .route("/invite/{job_id}", web::post().to(handlers::jobs::invite))
                .route("/user/{id}", web::get().to(handlers::jobs::user_jobs))
                .route("/{id}", web::get().to(handlers::jobs::get_job))
                .route("/{id}", web::patch().to(handlers::jobs::update_job))
                .route(
                    "/{id}/remove/{user_id}",
                    web::post().to(handlers::jobs::remove_user),
                )
                .route(
                    "/{id}/trust/{user_id}",
                    web::post().to(handlers::jobs::trust_user),
                )
                .route(
                    "/{id}/transfer/{user_id}",
                    web::patch().to(handlers::jobs::transfer_admin),
                ),
        )
        .service(
            web::scope("/posts")
                .route("/reply/{post_id}", web::post().to(handlers::posts::create_reply))
                .route("/replies/{reply_id}", web::get().to(handlers::posts::get_reply))
                .route("/{job_id}", web::post().to(handlers::posts::create_post))
                .route("/{post_id}", web::get().to(handlers::posts::get_post)),
        );
}
