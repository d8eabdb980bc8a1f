//! In-memory session store with idle expiry.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, instrument};

use crate::domain::Order;
use crate::ports::{Flash, SessionId, SessionStore};

#[derive(Debug)]
struct SessionEntry {
    draft: Option<Order>,
    flashes: Vec<Flash>,
    last_seen: Instant,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            draft: None,
            flashes: Vec::new(),
            last_seen: Instant::now(),
        }
    }
}

/// Session data held in process memory.
///
/// Entries idle for longer than the TTL are treated as absent and removed
/// by [`MemorySessionStore::purge_expired`].
pub struct MemorySessionStore {
    entries: RwLock<HashMap<SessionId, SessionEntry>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of sessions currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop sessions idle for longer than the TTL. Returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let ttl = self.ttl;
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.last_seen.elapsed() < ttl);
        before - entries.len()
    }

    /// Sweep expired sessions every `interval` until shutdown.
    ///
    /// `on_sweep` receives the number of live sessions after each sweep.
    #[instrument(skip(self, on_sweep, shutdown_rx))]
    pub async fn run_sweeper(
        &self,
        interval: Duration,
        on_sweep: impl Fn(usize) + Send,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Session sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let purged = self.purge_expired().await;
                    if purged > 0 {
                        debug!(purged, "Expired sessions purged");
                    }
                    on_sweep(self.len().await);
                }
            }
        }
    }

    /// Run `f` on the live entry for `session`, creating or resetting it
    /// when missing or expired.
    async fn with_entry<T>(&self, session: SessionId, f: impl FnOnce(&mut SessionEntry) -> T) -> T {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(session).or_insert_with(SessionEntry::new);
        if entry.last_seen.elapsed() >= self.ttl {
            *entry = SessionEntry::new();
        }
        entry.last_seen = Instant::now();
        f(entry)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load_draft(&self, session: SessionId) -> anyhow::Result<Option<Order>> {
        Ok(self.with_entry(session, |entry| entry.draft.clone()).await)
    }

    async fn save_draft(&self, session: SessionId, order: &Order) -> anyhow::Result<()> {
        anyhow::ensure!(
            order.is_new_record(),
            "stored order {:?} cannot be kept as a session draft",
            order.id
        );
        let order = order.clone();
        self.with_entry(session, move |entry| entry.draft = Some(order)).await;
        Ok(())
    }

    async fn clear_draft(&self, session: SessionId) -> anyhow::Result<()> {
        self.with_entry(session, |entry| entry.draft = None).await;
        Ok(())
    }

    async fn push_flash(&self, session: SessionId, flash: Flash) -> anyhow::Result<()> {
        self.with_entry(session, move |entry| entry.flashes.push(flash)).await;
        Ok(())
    }

    async fn take_flashes(&self, session: SessionId) -> anyhow::Result<Vec<Flash>> {
        Ok(self
            .with_entry(session, |entry| std::mem::take(&mut entry.flashes))
            .await)
    }
}
