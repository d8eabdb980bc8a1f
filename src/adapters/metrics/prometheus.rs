//! Prometheus Metrics Registry - Order Admin Observability
//!
//! Registers and exposes Prometheus metrics on :9090. Covers admin
//! request counts and latency, order/item lifecycle counters, and the
//! number of live admin sessions.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tokio::sync::broadcast;
use tracing::{error, info, instrument};

/// Centralized Prometheus metrics for the order admin.
///
/// All metrics follow the naming convention `order_admin_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Admin requests by action and outcome (ok, not_found, invalid, error).
    pub requests: IntCounterVec,
    /// Admin request latency histogram (microseconds).
    pub request_latency_us: HistogramVec,
    /// Orders inserted from drafts.
    pub orders_created: IntCounter,
    /// Orders deleted, singly or in bulk.
    pub orders_deleted: IntCounter,
    /// Items added to drafts or stored orders.
    pub items_added: IntCounter,
    /// Items removed from drafts or stored orders.
    pub items_removed: IntCounter,
    /// Sessions currently held in memory.
    pub active_sessions: IntGauge,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("order_admin_requests_total", "Admin requests handled"),
            &["action", "outcome"],
        )?;

        let request_latency_us = HistogramVec::new(
            HistogramOpts::new(
                "order_admin_request_latency_us",
                "Admin request latency in microseconds",
            )
            .buckets(vec![
                100.0, 500.0, 1000.0, 5000.0, 10000.0, 50000.0, 250_000.0,
            ]),
            &["action"],
        )?;

        let orders_created =
            IntCounter::new("order_admin_orders_created_total", "Orders created from drafts")?;
        let orders_deleted =
            IntCounter::new("order_admin_orders_deleted_total", "Orders deleted")?;
        let items_added =
            IntCounter::new("order_admin_items_added_total", "Order items added")?;
        let items_removed =
            IntCounter::new("order_admin_items_removed_total", "Order items removed")?;
        let active_sessions =
            IntGauge::new("order_admin_active_sessions", "Admin sessions held in memory")?;

        // Register all metrics
        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(request_latency_us.clone()))?;
        registry.register(Box::new(orders_created.clone()))?;
        registry.register(Box::new(orders_deleted.clone()))?;
        registry.register(Box::new(items_added.clone()))?;
        registry.register(Box::new(items_removed.clone()))?;
        registry.register(Box::new(active_sessions.clone()))?;

        Ok(Self {
            registry,
            requests,
            request_latency_us,
            orders_created,
            orders_deleted,
            items_added,
            items_removed,
            active_sessions,
        })
    }

    /// Record one handled admin request.
    pub fn observe(&self, action: &str, outcome: &str, elapsed: Duration) {
        self.requests.with_label_values(&[action, outcome]).inc();
        #[allow(clippy::cast_precision_loss)]
        self.request_latency_us
            .with_label_values(&[action])
            .observe(elapsed.as_micros() as f64);
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let metrics = Arc::clone(&metrics_self);
                async move {
                    metrics.render().map_err(|e| {
                        error!(error = %e, "Failed to encode metrics");
                        StatusCode::INTERNAL_SERVER_ERROR
                    })
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}
