//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the admin's workflows.
//!
//! Use cases:
//! - `OrderAdmin`: Order CRUD, draft handling, item management and
//!   the bulk utilities
//! - `OrderLocks`: per-order write serialization

pub mod locks;
pub mod order_admin;

pub use order_admin::{AdminSettings, FormOutcome, OfferSearchResult, OrderAdmin};
