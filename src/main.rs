//! Order Admin — Entry Point
//!
//! Initializes configuration, logging and storage, then serves the
//! order admin routes until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Connect SQLite + apply schema, optionally seed offers
//! 4. Create adapters (repository, catalog, sessions, pricing, metrics)
//! 5. Create the OrderAdmin use case
//! 6. Spawn health server, metrics server, session sweeper, database probe
//! 7. Serve the admin router
//! 8. Wait for SIGINT → graceful shutdown

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use order_admin::adapters::http::{self, AppState};
use order_admin::adapters::metrics::{HealthServer, HealthState, MetricsRegistry};
use order_admin::adapters::persistence::{self, SqlOfferCatalog, SqlOrderRepository};
use order_admin::adapters::pricing::MarkupPriceCalculator;
use order_admin::adapters::session::{MemorySessionStore, SessionCookie};
use order_admin::config::loader::{config_path, load_config};
use order_admin::ports::{OrderRepository, SessionStore};
use order_admin::usecases::{AdminSettings, OrderAdmin};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config = load_config(&config_path()).context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.server.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.server.name,
        version = env!("CARGO_PKG_VERSION"),
        bind = %config.server.bind_address,
        "Starting order admin"
    );

    // ── 3. Storage ──────────────────────────────────────────
    let pool = persistence::connect(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to database")?;
    persistence::migrate(&pool)
        .await
        .context("Failed to apply schema")?;

    let catalog = Arc::new(SqlOfferCatalog::new(pool.clone()));
    if let Some(path) = &config.database.offer_seed_path {
        catalog
            .seed_from_jsonl(path)
            .await
            .context("Failed to seed offers")?;
    }

    // ── 4. Adapters ─────────────────────────────────────────
    let repository: Arc<dyn OrderRepository> = Arc::new(SqlOrderRepository::new(pool.clone()));
    let sessions = Arc::new(MemorySessionStore::new(Duration::from_secs(
        config.session.ttl_seconds,
    )));
    let pricer = Arc::new(MarkupPriceCalculator::new(config.pricing.price_scale));
    let metrics = Arc::new(MetricsRegistry::new().context("Failed to register metrics")?);

    // ── 5. Use case ─────────────────────────────────────────
    let admin = Arc::new(OrderAdmin::new(
        Arc::clone(&repository),
        Arc::clone(&sessions) as Arc<dyn SessionStore>,
        catalog,
        pricer,
        AdminSettings::from_config(&config),
    ));

    // ── 6. Background tasks ─────────────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let health = Arc::new(HealthState::new());

    let health_handle = tokio::spawn(
        HealthServer::new(Arc::clone(&health), config.metrics.health_port)
            .run(shutdown_tx.subscribe()),
    );

    let metrics_handle = if config.metrics.enabled {
        let server = Arc::clone(&metrics).serve(
            config.metrics.bind_address.clone(),
            shutdown_tx.subscribe(),
        );
        Some(tokio::spawn(async move {
            if let Err(e) = server.await {
                error!(error = %e, "Metrics server failed");
            }
        }))
    } else {
        info!("Metrics export disabled");
        None
    };

    let sweeper_sessions = Arc::clone(&sessions);
    let sweeper_gauge = metrics.active_sessions.clone();
    let sweep_interval = Duration::from_secs(config.session.sweep_interval_seconds);
    let sweeper_shutdown = shutdown_tx.subscribe();
    let sweeper_handle = tokio::spawn(async move {
        sweeper_sessions
            .run_sweeper(
                sweep_interval,
                move |live| sweeper_gauge.set(i64::try_from(live).unwrap_or(i64::MAX)),
                sweeper_shutdown,
            )
            .await;
    });

    let probe_health = Arc::clone(&health);
    let probe_interval = Duration::from_secs(config.metrics.probe_interval_seconds);
    let probe_shutdown = shutdown_tx.subscribe();
    let probe_handle = tokio::spawn(async move {
        probe_health
            .run_database_probe(repository, probe_interval, probe_shutdown)
            .await;
    });

    // ── 7. Admin server ─────────────────────────────────────
    let cookie = SessionCookie::new(&config.session.cookie_name);
    let router = http::router(Arc::new(AppState { admin, metrics }), cookie);
    let bind_address = config.server.bind_address.clone();
    let admin_shutdown = shutdown_tx.subscribe();
    let admin_handle = tokio::spawn(async move {
        if let Err(e) = http::serve(router, &bind_address, admin_shutdown).await {
            error!(error = %e, "Admin server failed");
        }
    });

    info!("All tasks spawned, order admin is running");

    // ── 8. Wait for SIGINT ──────────────────────────────────
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("SIGINT received, initiating graceful shutdown");
        }
    }

    // Readiness goes 503 before listeners close.
    health.begin_shutdown();
    let _ = shutdown_tx.send(());
    info!("Shutdown signal broadcast to all tasks");

    if tokio::time::timeout(Duration::from_secs(30), admin_handle)
        .await
        .is_err()
    {
        warn!("Admin server did not stop within 30s");
    }

    for handle in [sweeper_handle, probe_handle] {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }
    if let Some(handle) = metrics_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }
    match tokio::time::timeout(Duration::from_secs(5), health_handle).await {
        Ok(Ok(Err(e))) => warn!(error = %e, "Health server exited with error"),
        Err(_) => warn!("Health server did not stop within 5s"),
        _ => {}
    }

    pool.close().await;
    info!("Shutdown complete");
    Ok(())
}
