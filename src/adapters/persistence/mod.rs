//! Persistence Adapters - SQLite Storage via sqlx
//!
//! Implements the `OrderRepository` and `OfferCatalog` ports on a
//! shared sqlx pool. Orders are written together with their items in
//! one transaction; offers are read-only apart from JSONL seeding.

pub mod database;
pub mod offers;
pub mod orders;

pub use database::{connect, connect_in_memory, migrate};
pub use offers::SqlOfferCatalog;
pub use orders::SqlOrderRepository;
