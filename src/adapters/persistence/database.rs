//! Pool setup and schema.

use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

/// Schema statements, applied in order at startup. Every statement is
/// idempotent so restarts against an existing file are safe.
const SCHEMA: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS orders (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_name    TEXT NOT NULL,
        customer_email   TEXT NOT NULL DEFAULT '',
        customer_phone   TEXT NOT NULL DEFAULT '',
        delivery_address TEXT NOT NULL DEFAULT '',
        comment          TEXT NOT NULL DEFAULT '',
        status           TEXT NOT NULL,
        extra_rate       TEXT NOT NULL,
        created_at       TEXT NOT NULL,
        updated_at       TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS order_items (
        id        TEXT PRIMARY KEY,
        order_id  INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
        position  INTEGER NOT NULL,
        offer_id  INTEGER NOT NULL,
        sku       TEXT NOT NULL,
        title     TEXT NOT NULL,
        amount    INTEGER NOT NULL CHECK (amount > 0),
        price     TEXT NOT NULL
    )
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_order_items_order
        ON order_items (order_id, position)
    ",
    r"
    CREATE TABLE IF NOT EXISTS offers (
        id     INTEGER PRIMARY KEY,
        sku    TEXT NOT NULL UNIQUE,
        title  TEXT NOT NULL,
        price  TEXT NOT NULL
    )
    ",
];

/// Connect a pool to `url`.
///
/// In-memory databases exist per connection, so they get a single
/// connection that is never recycled.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("invalid database url: {url}"))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool_options = if url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections)
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .context("failed to connect to database")?;

    info!(max_connections, "Database pool connected");
    Ok(pool)
}

/// Apply the schema.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    for &statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("schema migration failed")?;
    }
    info!(statements = SCHEMA.len(), "Schema applied");
    Ok(())
}

/// In-memory pool with the schema applied.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let pool = connect("sqlite::memory:", 1).await?;
    migrate(&pool).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let pool = connect_in_memory().await.unwrap();
        migrate(&pool).await.unwrap();

        let (tables,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
             AND name IN ('orders', 'order_items', 'offers')",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(tables, 3);
    }
}
