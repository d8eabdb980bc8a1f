//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `OrderRepository`: Stored orders and their items
//! - `SessionStore`: Per-admin draft order and flash messages
//! - `OfferCatalog`: Read-only offer lookup and search
//! - `PriceCalculator`: Unit pricing with an order's extra rate

pub mod catalog;
pub mod pricing;
pub mod repository;
pub mod session;

pub use catalog::OfferCatalog;
pub use pricing::PriceCalculator;
pub use repository::OrderRepository;
pub use session::{Flash, FlashLevel, SessionId, SessionStore};
