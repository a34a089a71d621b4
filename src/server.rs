//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, event channel setup, the job runner, the
//! background processor and the Axum server lifecycle.

use crate::application::background_processor::BackgroundProcessor;
use crate::application::jobs::JobRunnerSettings;
use crate::application::services::IngestSettings;
use crate::config::Config;
use crate::domain::item_event::ItemStoredEvent;
use crate::infrastructure::events::{
    EventChannel, LocalEventChannel, RedisEventChannel, spawn_subscriber,
};
use crate::infrastructure::feed::HackerNewsClient;
use crate::infrastructure::persistence::{PgAnalyticsRepository, PgItemRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const EVENT_BUFFER: usize = 1024;

/// Opens the PostgreSQL pool with the configured limits.
///
/// # Errors
///
/// Returns an error if the database cannot be reached.
pub async fn connect_database(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");
    Ok(pool)
}

/// Applies embedded migrations.
///
/// # Errors
///
/// Returns an error if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations applied");
    Ok(())
}

/// Connects the Redis event channel, falling back to the in-process one.
pub async fn connect_events(config: &Config) -> Arc<dyn EventChannel> {
    if let Some(redis_url) = &config.redis_url {
        match RedisEventChannel::connect(redis_url, EVENT_BUFFER).await {
            Ok(redis) => {
                tracing::info!("Event channel enabled (Redis)");
                return Arc::new(redis);
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to connect to Redis: {}. Using in-process event channel.",
                    e
                );
            }
        }
    } else {
        tracing::info!("Event channel: in-process");
    }

    Arc::new(LocalEventChannel::new(EVENT_BUFFER))
}

/// Builds the application state over PostgreSQL, the HTTP feed client and
/// the given event channel, and starts the job runner.
///
/// # Errors
///
/// Returns an error if the feed client cannot be built.
pub fn build_state(config: &Config, pool: PgPool, events: Arc<dyn EventChannel>) -> Result<AppState> {
    let pool = Arc::new(pool);
    let items = Arc::new(PgItemRepository::new(pool.clone()));
    let analytics = Arc::new(PgAnalyticsRepository::new(pool));

    let feed = HackerNewsClient::new(
        &config.feed_base_url,
        config.feed_timeout(),
        config.feed_fetch_retries,
    )
    .context("Failed to build feed client")?;

    Ok(AppState::build(
        items,
        analytics,
        Arc::new(feed),
        events,
        Arc::new(config.vocabulary()),
        IngestSettings {
            topic: config.event_topic.clone(),
            fetch_concurrency: config.feed_fetch_concurrency,
            default_limit: config.feed_top_limit,
        },
        JobRunnerSettings {
            queue_capacity: config.job_queue_capacity,
            worker_concurrency: config.job_worker_concurrency,
            retention: config.job_retention(),
        },
    ))
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Event channel (Redis or in-process fallback)
/// - Job runner
/// - Background processor (when enabled)
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - The event subscription cannot be opened
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_database(&config).await?;
    migrate(&pool).await?;

    let events = connect_events(&config).await;
    let state = build_state(&config, pool, events.clone())?;

    let stop = CancellationToken::new();
    let processor = if config.background_processor {
        let handler = Arc::new(BackgroundProcessor::new(state.ingest_service.clone()));
        let handle = spawn_subscriber::<ItemStoredEvent, _>(
            events.as_ref(),
            &config.event_topic,
            handler,
            stop.clone(),
        )
        .await
        .context("Failed to subscribe background processor")?;

        tracing::info!(topic = %config.event_topic, "Background processor started");
        Some(handle)
    } else {
        tracing::info!("Background processor disabled");
        None
    };

    let job_runner = state.job_runner.clone();
    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("HTTP server stopped, shutting down workers");

    stop.cancel();
    if let Some(handle) = processor
        && let Err(e) = handle.await
    {
        tracing::warn!("Background processor ended abnormally: {}", e);
    }

    job_runner.shutdown().await;
    events.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
