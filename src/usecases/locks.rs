//! Per-order Write Locks
//!
//! Item and form actions read an order, change it and write the whole
//! order back. Each action holds the lock of its target order for that
//! whole sequence, so concurrent requests on one draft (per session) or
//! one stored order (per id) run one at a time. Different orders never
//! contend.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::domain::OrderId;
use crate::ports::SessionId;

/// What an action writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderTarget {
  /// The session's draft.
  Draft(SessionId),
  /// A stored order.
  Stored(OrderId),
}

impl OrderTarget {
  /// Zero or no id means the session draft.
  pub fn resolve(session: SessionId, order_id: Option<OrderId>) -> Self {
    match order_id.filter(|id| *id != 0) {
      Some(id) => Self::Stored(id),
      None => Self::Draft(session),
    }
  }
}

/// Registry of one-permit semaphores keyed by target.
#[derive(Debug, Default)]
pub struct OrderLocks {
  semaphores: Arc<DashMap<OrderTarget, Arc<Semaphore>>>,
}

impl OrderLocks {
  pub fn new() -> Self {
    Self::default()
  }

  /// Wait for exclusive access to `target`.
  pub async fn acquire(&self, target: OrderTarget) -> OrderGuard {
    let semaphore = self
      .semaphores
      .entry(target)
      .or_insert_with(|| Arc::new(Semaphore::new(1)))
      .clone();
    // The semaphore is never closed.
    let permit = semaphore.acquire_owned().await.ok();
    OrderGuard {
      permit,
      target,
      semaphores: Arc::clone(&self.semaphores),
    }
  }

  /// Number of targets with a live lock entry.
  pub fn len(&self) -> usize {
    self.semaphores.len()
  }

  pub fn is_empty(&self) -> bool {
    self.semaphores.is_empty()
  }
}

/// Exclusive access to one target until dropped.
#[derive(Debug)]
pub struct OrderGuard {
  permit: Option<OwnedSemaphorePermit>,
  target: OrderTarget,
  semaphores: Arc<DashMap<OrderTarget, Arc<Semaphore>>>,
}

impl Drop for OrderGuard {
  fn drop(&mut self) {
    drop(self.permit.take());
    // Only the registry still holds the semaphore: nobody is waiting.
    self
      .semaphores
      .remove_if(&self.target, |_, semaphore| Arc::strong_count(semaphore) == 1);
  }
}
