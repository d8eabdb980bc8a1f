//! Offer Catalog Port - Read-only Offer Lookup

use async_trait::async_trait;

use crate::domain::{Offer, OfferId, OfferSearch, Page};

#[async_trait]
pub trait OfferCatalog: Send + Sync + 'static {
    /// Find an offer by id.
    async fn find_offer(&self, id: OfferId) -> anyhow::Result<Option<Offer>>;

    /// Search offers by title or SKU.
    async fn search_offers(
        &self,
        search: &OfferSearch,
        per_page: u32,
    ) -> anyhow::Result<Page<Offer>>;
}
