//! Configuration Module - TOML-based Service Configuration
//!
//! Loads and validates configuration from `config.toml`, with the
//! database URL overridable from the environment. Page sizes, session
//! lifetime and pricing precision are externalized here - nothing is
//! hardcoded in the usecases layer.

pub mod loader;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// Top-level service configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before the service begins accepting requests.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Service identity and HTTP listener.
  pub server: ServerConfig,
  /// Database connection.
  pub database: DatabaseConfig,
  /// Session cookie and draft lifetime.
  #[serde(default)]
  pub session: SessionConfig,
  /// Price calculation parameters.
  #[serde(default)]
  pub pricing: PricingConfig,
  /// Admin page sizes.
  #[serde(default)]
  pub admin: AdminConfig,
  /// Metrics and monitoring.
  #[serde(default)]
  pub metrics: MetricsConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  /// Human-readable service name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Admin HTTP bind address.
  #[serde(default = "default_bind_address")]
  pub bind_address: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
  /// sqlx connection URL, e.g. `sqlite://data/orders.db?mode=rwc`.
  pub url: String,
  /// Maximum pooled connections.
  #[serde(default = "default_max_connections")]
  pub max_connections: u32,
  /// Optional JSONL file of offers loaded into the catalog at startup.
  #[serde(default)]
  pub offer_seed_path: Option<String>,
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
  /// Name of the session cookie.
  #[serde(default = "default_cookie_name")]
  pub cookie_name: String,
  /// Idle lifetime of a session (seconds). Drafts expire with it.
  #[serde(default = "default_session_ttl")]
  pub ttl_seconds: u64,
  /// How often expired sessions are swept (seconds).
  #[serde(default = "default_sweep_interval")]
  pub sweep_interval_seconds: u64,
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self {
      cookie_name: default_cookie_name(),
      ttl_seconds: default_session_ttl(),
      sweep_interval_seconds: default_sweep_interval(),
    }
  }
}

/// Price calculation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
  /// Decimal places kept on computed unit prices.
  #[serde(default = "default_price_scale")]
  pub price_scale: u32,
  /// Highest extra rate (percent) an order may carry.
  #[serde(default = "default_max_extra_rate")]
  pub max_extra_rate: Decimal,
}

impl Default for PricingConfig {
  fn default() -> Self {
    Self {
      price_scale: default_price_scale(),
      max_extra_rate: default_max_extra_rate(),
    }
  }
}

/// Admin listing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
  /// Orders per page on the index.
  #[serde(default = "default_orders_per_page")]
  pub orders_per_page: u32,
  /// Offers per page in the offer search fragment.
  #[serde(default = "default_offers_per_page")]
  pub offers_per_page: u32,
}

impl Default for AdminConfig {
  fn default() -> Self {
    Self {
      orders_per_page: default_orders_per_page(),
      offers_per_page: default_offers_per_page(),
    }
  }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
  /// Health check endpoint port.
  #[serde(default = "default_health_port")]
  pub health_port: u16,
  /// Database readiness probe interval (seconds).
  #[serde(default = "default_probe_interval")]
  pub probe_interval_seconds: u64,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: default_true(),
      bind_address: default_metrics_addr(),
      health_port: default_health_port(),
      probe_interval_seconds: default_probe_interval(),
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_bind_address() -> String {
  "0.0.0.0:8080".to_string()
}

fn default_max_connections() -> u32 {
  5
}

fn default_cookie_name() -> String {
  "order_admin_session".to_string()
}

fn default_session_ttl() -> u64 {
  3600
}

fn default_sweep_interval() -> u64 {
  60
}

fn default_price_scale() -> u32 {
  2
}

fn default_max_extra_rate() -> Decimal {
  dec!(1000)
}

fn default_orders_per_page() -> u32 {
  20
}

fn default_offers_per_page() -> u32 {
  10
}

fn default_true() -> bool {
  true
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

fn default_health_port() -> u16 {
  8081
}

fn default_probe_interval() -> u64 {
  15
}
