//! Session Adapters - In-memory Sessions Keyed by Cookie
//!
//! `MemorySessionStore` implements the `SessionStore` port; `cookie`
//! provides the axum middleware that assigns every request a
//! `SessionId` and issues the cookie for new sessions.

pub mod cookie;
pub mod memory;

pub use cookie::{session_cookie_layer, SessionCookie};
pub use memory::MemorySessionStore;
