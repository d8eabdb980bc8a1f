//! Admin HTTP surface.
//!
//! All order admin routes live under `/admin/orders`. Responses are JSON
//! views (see [`views`]); every request is bound to a cookie session that
//! holds the draft order and pending flash messages.

pub mod error;
pub mod handlers;
pub mod views;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::info;

use crate::adapters::metrics::MetricsRegistry;
use crate::adapters::session::{session_cookie_layer, SessionCookie};
use crate::usecases::OrderAdmin;

/// Shared state of the admin handlers.
pub struct AppState {
    pub admin: Arc<OrderAdmin>,
    pub metrics: Arc<MetricsRegistry>,
}

/// Build the admin router.
pub fn router(state: Arc<AppState>, cookie: SessionCookie) -> Router {
    Router::new()
        .route("/admin/orders", get(handlers::index))
        .route(
            "/admin/orders/create",
            get(handlers::create_form).post(handlers::create_submit),
        )
        .route("/admin/orders/offer-search", get(handlers::offer_search))
        .route("/admin/orders/add-item", post(handlers::add_item))
        .route("/admin/orders/delete-item", post(handlers::delete_item))
        .route(
            "/admin/orders/edit-item",
            get(handlers::edit_item_form).post(handlers::edit_item_submit),
        )
        .route("/admin/orders/items", get(handlers::items))
        .route("/admin/orders/utilities", get(handlers::utilities))
        .route("/admin/orders/:id", get(handlers::view))
        .route(
            "/admin/orders/:id/update",
            get(handlers::update_form).post(handlers::update_submit),
        )
        .route("/admin/orders/:id/delete", post(handlers::delete))
        .layer(middleware::from_fn_with_state(cookie, session_cookie_layer))
        .with_state(state)
}

/// Serve the admin router until shutdown is signalled.
pub async fn serve(
    router: Router,
    bind_address: &str,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    let listener = TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind admin server to {bind_address}"))?;

    info!(addr = %bind_address, "Admin server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await
        .context("Admin server failed")?;

    info!("Admin server stopped");
    Ok(())
}
