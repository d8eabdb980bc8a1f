//! Catalog offers as seen by the order admin (read-only).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type OfferId = i64;

/// A catalog entry available for purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub sku: String,
    pub title: String,
    /// Base unit price before any order-level extra rate.
    pub price: Decimal,
}

/// Filter for the offer search fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OfferSearch {
    /// Matched against title and SKU.
    pub q: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
}

impl OfferSearch {
    /// Trimmed search text, `None` when blank.
    pub fn text(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

/// One page of a larger result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total matches across all pages.
    pub total: u64,
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn page_count(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.per_page))
    }

    /// Row offset of the first item of `page` (1-based, 0 treated as 1).
    pub fn offset(page: u32, per_page: u32) -> u64 {
        u64::from(page.max(1) - 1) * u64::from(per_page)
    }
}
