//! Domain layer - Order admin entities and pricing rules.
//!
//! Pure types with no I/O (hexagonal architecture inner ring).
//! Everything here is serializable and testable in isolation.

pub mod error;
pub mod offer;
pub mod order;
pub mod pricing;

// Re-export core types for convenience
pub use error::{AdminError, AdminResult, Entity, ValidationError};
pub use offer::{Offer, OfferId, OfferSearch, Page};
pub use order::{
    ItemForm, ItemId, Order, OrderForm, OrderId, OrderItem, OrderSearch, OrderStatus,
};
