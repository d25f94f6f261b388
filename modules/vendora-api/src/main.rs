use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vendora_common::{Config, ContentFilter};
use vendora_email::{EmailBackend, NoopBackend, SmtpBackend, SmtpConfig};
use vendora_pipeline::{
    AuditLog, Dispatcher, MemoryProfiles, MemoryWindowStore, NotificationPersister, ProfileSource,
    RateLimiter, RealtimePush, SpamGuard,
};
use vendora_realtime::{ws_handler, JwtService, RealtimeChannel};
use vendora_store::{spawn_ttl_sweeper, NotificationStore, PgAuditLog, PgNotificationStore};

mod rest;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("vendora=info".parse()?))
        .init();

    let config = Config::from_env();

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    let pg_store = Arc::new(PgNotificationStore::new(pool.clone()));
    pg_store.migrate().await?;
    let store: Arc<dyn NotificationStore> = pg_store.clone();

    let jwt = JwtService::new(&config.jwt_secret, config.jwt_issuer.clone());
    let channel = Arc::new(RealtimeChannel::new(
        jwt.clone(),
        config.ws_inbound_max_per_minute,
    ));

    let email: Arc<dyn EmailBackend> = if config.smtp_username.is_empty() {
        info!("SMTP credentials not set, using noop email backend");
        Arc::new(NoopBackend)
    } else {
        Arc::new(SmtpBackend::new(SmtpConfig {
            host: config.smtp_host.clone(),
            port: config.smtp_port,
            username: config.smtp_username.clone(),
            password: config.smtp_password.clone(),
            from: config.email_from.clone(),
        })?)
    };

    // Integration point for the platform preference service. Until it is
    // wired, every recipient gets the platform default profile.
    let profiles: Arc<dyn ProfileSource> = Arc::new(MemoryProfiles::new());

    let audit: Arc<dyn AuditLog> = Arc::new(PgAuditLog::new(pool.clone()));

    let create_limiter = Arc::new(RateLimiter::new(
        Arc::new(MemoryWindowStore::new()),
        config.rate_limit_create_max,
        Duration::from_secs(config.rate_limit_create_window_secs),
        config.rate_limit_exempt_super_admin,
    ));
    let general_limiter = Arc::new(RateLimiter::new(
        Arc::new(MemoryWindowStore::new()),
        config.rate_limit_general_max,
        Duration::from_secs(config.rate_limit_general_window_secs),
        config.rate_limit_exempt_super_admin,
    ));
    let spam_guard = Arc::new(SpamGuard::new(
        Arc::new(MemoryWindowStore::new()),
        config.dedup_max_per_window,
        Duration::from_secs(config.dedup_window_secs),
    ));

    let dispatcher = Dispatcher::new(
        ContentFilter::new(config.allowed_action_origins.clone()),
        create_limiter,
        spam_guard,
        profiles,
        pg_store.clone() as Arc<dyn NotificationPersister>,
        email,
        channel.clone() as Arc<dyn RealtimePush>,
        audit,
    );

    spawn_ttl_sweeper(
        store.clone(),
        Duration::from_secs(config.sweep_interval_secs),
    );

    let app_state = Arc::new(AppState {
        dispatcher,
        store,
        jwt,
        general_limiter,
    });

    let api = Router::new()
        .route("/api/notifications", get(rest::notifications::list))
        .route(
            "/api/notifications/{id}/read",
            post(rest::notifications::mark_read),
        )
        .route(
            "/api/notifications/{id}/unread",
            post(rest::notifications::mark_unread),
        )
        .route(
            "/api/notifications/{id}",
            delete(rest::notifications::delete),
        )
        .route("/internal/notifications", post(rest::notifications::emit))
        .with_state(app_state);

    let ws = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(channel);

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(api)
        .merge(ws)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.web_host, config.web_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "vendora notification api listening");
    axum::serve(listener, app).await?;

    Ok(())
}
