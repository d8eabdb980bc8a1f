//! SQL Offer Catalog - Offer Lookup and JSONL Seeding
//!
//! The catalog is owned by another system; this adapter only reads the
//! `offers` table. For local setups the table can be seeded from a JSONL
//! file (one offer object per line), skipping malformed lines.

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use tokio::fs;
use tracing::{info, instrument, warn};

use crate::domain::{Offer, OfferId, OfferSearch, Page};
use crate::ports::OfferCatalog;

/// sqlx-backed read-only offer catalog.
#[derive(Clone)]
pub struct SqlOfferCatalog {
    pool: SqlitePool,
}

impl SqlOfferCatalog {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace one offer.
    pub async fn upsert(&self, offer: &Offer) -> Result<()> {
        sqlx::query(
            "INSERT INTO offers (id, sku, title, price) VALUES (?, ?, ?, ?) \
             ON CONFLICT (id) DO UPDATE SET sku = excluded.sku, \
             title = excluded.title, price = excluded.price",
        )
        .bind(offer.id)
        .bind(&offer.sku)
        .bind(&offer.title)
        .bind(offer.price.to_string())
        .execute(&self.pool)
        .await
        .with_context(|| format!("upsert offer {} failed", offer.id))?;
        Ok(())
    }

    /// Seed offers from a JSONL file. Returns the number of offers written.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn seed_from_jsonl(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read offer seed file: {}", path.display()))?;

        let mut seeded = 0;
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Offer>(line) {
                Ok(offer) => {
                    self.upsert(&offer).await?;
                    seeded += 1;
                }
                Err(e) => {
                    warn!(
                        line = line_no + 1,
                        error = %e,
                        "Skipping malformed offer record"
                    );
                }
            }
        }

        info!(count = seeded, "Offers seeded");
        Ok(seeded)
    }
}

#[async_trait]
impl OfferCatalog for SqlOfferCatalog {
    async fn find_offer(&self, id: OfferId) -> Result<Option<Offer>> {
        let row = sqlx::query("SELECT id, sku, title, price FROM offers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("find offer failed")?;

        row.as_ref().map(offer_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn search_offers(&self, search: &OfferSearch, per_page: u32) -> Result<Page<Offer>> {
        let page = search.page.unwrap_or(1).max(1);
        let offset = Page::<Offer>::offset(page, per_page);

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM offers WHERE 1 = 1");
        push_text_filter(&mut count, search);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .context("count offers failed")?;

        let mut select =
            QueryBuilder::<Sqlite>::new("SELECT id, sku, title, price FROM offers WHERE 1 = 1");
        push_text_filter(&mut select, search);
        select
            .push(" ORDER BY title, id LIMIT ")
            .push_bind(i64::from(per_page))
            .push(" OFFSET ")
            .push_bind(i64::try_from(offset).context("page offset out of range")?);
        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .context("search offers failed")?;

        Ok(Page {
            items: rows.iter().map(offer_from_row).collect::<Result<_>>()?,
            total: u64::try_from(total).unwrap_or_default(),
            page,
            per_page,
        })
    }
}

fn push_text_filter(builder: &mut QueryBuilder<'_, Sqlite>, search: &OfferSearch) {
    if let Some(text) = search.text() {
        let pattern = format!("%{text}%");
        builder
            .push(" AND (title LIKE ")
            .push_bind(pattern.clone())
            .push(" OR sku LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn offer_from_row(row: &SqliteRow) -> Result<Offer> {
    let price: String = row.try_get("price")?;
    Ok(Offer {
        id: row.try_get("id")?,
        sku: row.try_get("sku")?,
        title: row.try_get("title")?,
        price: Decimal::from_str(&price).context("stored offer price is not a decimal")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::connect_in_memory;
    use rust_decimal_macros::dec;

    async fn catalog() -> SqlOfferCatalog {
        let catalog = SqlOfferCatalog::new(connect_in_memory().await.unwrap());
        for (id, sku, title, price) in [
            (1, "TEA-GRN", "Green tea", dec!(4.50)),
            (2, "TEA-BLK", "Black tea", dec!(3.90)),
            (3, "MUG-01", "Ceramic mug", dec!(12.00)),
        ] {
            catalog
                .upsert(&Offer {
                    id,
                    sku: sku.to_string(),
                    title: title.to_string(),
                    price,
                })
                .await
                .unwrap();
        }
        catalog
    }

    #[tokio::test]
    async fn test_find_offer() {
        let catalog = catalog().await;
        let offer = catalog.find_offer(2).await.unwrap().unwrap();
        assert_eq!(offer.title, "Black tea");
        assert_eq!(offer.price, dec!(3.90));
        assert!(catalog.find_offer(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_matches_title_and_sku() {
        let catalog = catalog().await;

        let search = OfferSearch {
            q: Some("tea".to_string()),
            page: None,
        };
        let page = catalog.search_offers(&search, 10).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].title, "Black tea");

        let search = OfferSearch {
            q: Some("MUG".to_string()),
            page: None,
        };
        let page = catalog.search_offers(&search, 10).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, 3);
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_offer() {
        let catalog = catalog().await;
        catalog
            .upsert(&Offer {
                id: 1,
                sku: "TEA-GRN".to_string(),
                title: "Sencha".to_string(),
                price: dec!(5.25),
            })
            .await
            .unwrap();

        let offer = catalog.find_offer(1).await.unwrap().unwrap();
        assert_eq!(offer.title, "Sencha");
        assert_eq!(offer.price, dec!(5.25));
    }

    #[tokio::test]
    async fn test_seed_skips_malformed_lines() {
        let catalog = SqlOfferCatalog::new(connect_in_memory().await.unwrap());
        let path = std::env::temp_dir().join(format!("offers-{}.jsonl", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            "{\"id\":10,\"sku\":\"A\",\"title\":\"Apple\",\"price\":\"1.20\"}\n\
             not json\n\
             \n\
             {\"id\":11,\"sku\":\"B\",\"title\":\"Banana\",\"price\":\"0.80\"}\n",
        )
        .await
        .unwrap();

        let seeded = catalog.seed_from_jsonl(&path).await.unwrap();
        let _ = fs::remove_file(&path).await;

        assert_eq!(seeded, 2);
        assert_eq!(catalog.find_offer(11).await.unwrap().unwrap().title, "Banana");
    }
}
