use actix_middleware::SessionGuard;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use social_service::config::{Config, LogFormat, StorageConfig};
use social_service::handlers;
use social_service::metrics::{self, MetricsMiddleware};
use social_service::repository::{PgNotificationRepository, PgPostRepository, PgUserRepository};
use social_service::{AppState, Repositories};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info".into());

    let (json, text) = match format {
        LogFormat::Json => (
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            ),
            None,
        ),
        LogFormat::Text => (None, Some(tracing_subscriber::fmt::layer())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .init();
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.log.format);

    info!("🔧 Starting social-service v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "✅ Configuration loaded: env={}, http_port={}",
        config.app.env, config.app.http_port
    );

    let repos = match &config.storage {
        StorageConfig::Postgres(db) => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(db.max_connections)
                .min_connections(db.min_connections)
                .acquire_timeout(Duration::from_secs(10))
                .idle_timeout(Duration::from_secs(600))
                .connect(&db.url)
                .await
                .context("Failed to connect to database")?;
            info!("✅ Database pool created");

            sqlx::migrate!("./migrations")
                .run(&pg_pool)
                .await
                .context("Failed to run database migrations")?;
            info!("✅ Database migrations completed");

            Repositories {
                users: Arc::new(PgUserRepository::new(pg_pool.clone())),
                posts: Arc::new(PgPostRepository::new(pg_pool.clone())),
                notifications: Arc::new(PgNotificationRepository::new(pg_pool)),
            }
        }
        StorageConfig::Memory => {
            warn!("⚠️  Using in-memory storage; all state is lost on restart");
            Repositories::in_memory()
        }
    };

    let state = AppState::new(repos, &config.auth).context("Failed to build application state")?;
    let signer = state.signer();
    let cookie_name = state.cookie_name().to_string();
    let state = web::Data::new(state);

    let http_addr = format!("{}:{}", config.app.host, config.app.http_port);
    info!("🚀 Starting HTTP server on http://{}", http_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(MetricsMiddleware)
            .wrap(SessionGuard::new(signer.clone(), cookie_name.clone()))
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .configure(handlers::configure)
    })
    .bind(&http_addr)
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server error")?;

    info!("🛑 social-service shutting down");
    Ok(())
}
