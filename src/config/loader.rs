//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, applying environment overrides,
//! validating all parameters, and providing clear error messages
//! for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::info;

use super::AppConfig;

/// Environment variable naming an alternative config file.
pub const ENV_CONFIG_PATH: &str = "ORDER_ADMIN_CONFIG";

/// Environment variable overriding `database.url`.
pub const ENV_DATABASE_URL: &str = "ORDER_ADMIN_DATABASE_URL";

/// Config path from `ORDER_ADMIN_CONFIG`, falling back to `config.toml`.
pub fn config_path() -> String {
  std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| "config.toml".to_string())
}

/// Load and validate configuration from a TOML file.
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let mut config = parse_config(&content)?;

  if let Ok(url) = std::env::var(ENV_DATABASE_URL) {
    config.database.url = url;
    validate_config(&config)?;
  }

  info!(
    name = %config.server.name,
    bind = %config.server.bind_address,
    orders_per_page = config.admin.orders_per_page,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;

  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-empty names, addresses and URLs
/// - Positive page sizes and pool size
/// - Sensible session lifetimes
/// - Pricing precision within what prices are stored with
fn validate_config(config: &AppConfig) -> Result<()> {
  // Server validation
  anyhow::ensure!(
    !config.server.name.is_empty(),
    "server.name must not be empty"
  );
  anyhow::ensure!(
    !config.server.bind_address.is_empty(),
    "server.bind_address must not be empty"
  );

  // Database validation
  anyhow::ensure!(
    !config.database.url.is_empty(),
    "database.url must not be empty"
  );
  anyhow::ensure!(
    config.database.max_connections > 0,
    "database.max_connections must be positive, got {}",
    config.database.max_connections
  );

  // Session validation
  anyhow::ensure!(
    !config.session.cookie_name.is_empty()
      && config
        .session
        .cookie_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
    "session.cookie_name must be a non-empty token, got '{}'",
    config.session.cookie_name
  );
  anyhow::ensure!(
    config.session.ttl_seconds > 0,
    "session.ttl_seconds must be positive"
  );
  anyhow::ensure!(
    config.session.sweep_interval_seconds > 0,
    "session.sweep_interval_seconds must be positive"
  );

  // Pricing validation
  anyhow::ensure!(
    config.pricing.price_scale <= 6,
    "pricing.price_scale must be in [0, 6], got {}",
    config.pricing.price_scale
  );
  anyhow::ensure!(
    config.pricing.max_extra_rate >= Decimal::ZERO,
    "pricing.max_extra_rate must not be negative, got {}",
    config.pricing.max_extra_rate
  );

  // Admin validation
  anyhow::ensure!(
    config.admin.orders_per_page > 0 && config.admin.orders_per_page <= 500,
    "admin.orders_per_page must be in (0, 500], got {}",
    config.admin.orders_per_page
  );
  anyhow::ensure!(
    config.admin.offers_per_page > 0 && config.admin.offers_per_page <= 500,
    "admin.offers_per_page must be in (0, 500], got {}",
    config.admin.offers_per_page
  );

  // Metrics validation
  anyhow::ensure!(
    config.metrics.probe_interval_seconds > 0,
    "metrics.probe_interval_seconds must be positive"
  );

  Ok(())
}
