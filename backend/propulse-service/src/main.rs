use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use propulse_push_shared::{PushSender, VapidSigner, WebPushClient};
use propulse_service::config::{Config, PushConfig};
use propulse_service::middleware::JwtAuthMiddleware;
use propulse_service::services::NotificationDispatcher;
use propulse_service::{db, routes, AppState};
use std::io;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Web Push sender, or `None` when VAPID keys are not configured
fn push_sender(config: &PushConfig) -> io::Result<Option<Arc<dyn PushSender>>> {
    let Some(private_key) = config.vapid_private_key.as_deref() else {
        tracing::warn!("VAPID keys not configured; push notifications are disabled");
        return Ok(None);
    };

    let signer = VapidSigner::from_base64(
        private_key,
        config.vapid_public_key.as_deref(),
        &config.subject,
    )
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    let client = WebPushClient::new(signer, config.ttl_secs)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    Ok(Some(Arc::new(client)))
}

fn cors(config: &Config) -> Cors {
    config
        .cors
        .allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "PATCH", "OPTIONS"])
        .allowed_headers(vec![
            actix_web::http::header::AUTHORIZATION,
            actix_web::http::header::CONTENT_TYPE,
        ])
        .max_age(config.cors.max_age)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    init_tracing();

    let config = Config::from_env().map_err(|e| {
        tracing::error!("Configuration error: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    tracing::info!(env = %config.app.env, "Starting propulse-service");

    let keys = config.jwt.token_keys().map_err(|e| {
        tracing::error!("Invalid JWT signing keys: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;
    tracing::info!(algorithm = ?keys.algorithm(), "JWT signing keys loaded");
    let keys = Arc::new(keys);

    config.database.log_config();
    let pool = db_pool::create_pool(&config.database).await.map_err(|e| {
        tracing::error!("Failed to connect to database: {}", e);
        io::Error::new(io::ErrorKind::Other, "Database connection failed")
    })?;

    if config.app.run_migrations {
        db::run_migrations(&pool).await.map_err(|e| {
            tracing::error!("Failed to run migrations: {}", e);
            io::Error::new(io::ErrorKind::Other, e.to_string())
        })?;
        tracing::info!("Database migrations applied");
    }

    let sender = push_sender(&config.push)?;
    let notifier = NotificationDispatcher::new(
        pool.clone(),
        sender,
        config.app.base_url.clone(),
        config.app.frontend_url.clone(),
    );

    let state = AppState::new(pool, keys.clone(), notifier, config.jwt.invitation_ttl());
    let addr = (config.app.host.clone(), config.app.port);
    let config = Arc::new(config);

    tracing::info!("Starting HTTP server on {}:{}", addr.0, addr.1);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(JwtAuthMiddleware::new(keys.clone()))
            .wrap(cors(&config))
            .wrap(TracingLogger::default())
            .configure(routes::configure_routes)
    })
    .bind(addr)?
    .run()
    .await
}
