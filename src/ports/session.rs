//! Session Port - Per-admin Draft Order and Flash Messages
//!
//! Each admin browser session holds at most one unsaved draft order and a
//! queue of one-shot flash messages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Order;

/// Opaque session identifier carried in the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

/// A one-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// The session's draft order, if one was stored.
    async fn load_draft(&self, session: SessionId) -> anyhow::Result<Option<Order>>;

    /// Store `order` as the session's draft, replacing any previous one.
    async fn save_draft(&self, session: SessionId, order: &Order) -> anyhow::Result<()>;

    /// Forget the session's draft.
    async fn clear_draft(&self, session: SessionId) -> anyhow::Result<()>;

    /// Queue a flash message.
    async fn push_flash(&self, session: SessionId, flash: Flash) -> anyhow::Result<()>;

    /// Drain the queued flash messages.
    async fn take_flashes(&self, session: SessionId) -> anyhow::Result<Vec<Flash>>;
}
