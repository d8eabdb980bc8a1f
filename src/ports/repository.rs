//! Repository Port - Stored Order Persistence
//!
//! Orders are saved together with their full item set; callers never
//! write items on their own.

use async_trait::async_trait;

use crate::domain::{Order, OrderId, OrderSearch, Page};

/// Trait for order storage providers.
#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    /// Load one order with its items.
    async fn find(&self, id: OrderId) -> anyhow::Result<Option<Order>>;

    /// List orders matching `search`, newest first.
    async fn search(&self, search: &OrderSearch, per_page: u32) -> anyhow::Result<Page<Order>>;

    /// Insert a draft order and its items, returning the assigned id.
    async fn insert(&self, order: &Order) -> anyhow::Result<OrderId>;

    /// Overwrite a stored order and replace its items.
    ///
    /// Returns `false` if no order with that id exists.
    async fn update(&self, order: &Order) -> anyhow::Result<bool>;

    /// Delete one order and its items. Returns `false` if it did not exist.
    async fn delete(&self, id: OrderId) -> anyhow::Result<bool>;

    /// Ids of every stored order.
    async fn all_ids(&self) -> anyhow::Result<Vec<OrderId>>;

    /// Check the backing store is reachable.
    async fn is_healthy(&self) -> bool;
}
