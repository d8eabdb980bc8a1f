//! Order Admin - Order CRUD and Line-item Management
//!
//! Implements every admin action on orders:
//! - Listing, viewing, updating and deleting stored orders
//! - The draft-then-save creation flow (draft lives in the session)
//! - Adding, editing and removing line items on drafts and stored orders
//! - Offer search for the "add item" picker
//! - Bulk deletion of every stored order
//!
//! An order is either a session draft (`id == None`) or a stored row,
//! never both: saving a draft removes it from the session, and every item
//! change is written back to wherever the order lives. Every action that
//! writes an order holds that order's lock from load to write-back.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::domain::{
  AdminError, AdminResult, Entity, ItemForm, ItemId, OfferId, OfferSearch, Order,
  OrderForm, OrderId, OrderItem, OrderSearch, Page, Offer, ValidationError,
};
use super::locks::{OrderLocks, OrderTarget};
use crate::ports::{Flash, OfferCatalog, OrderRepository, PriceCalculator, SessionId, SessionStore};

/// Page sizes and limits the admin applies.
#[derive(Debug, Clone)]
pub struct AdminSettings {
  pub orders_per_page: u32,
  pub offers_per_page: u32,
  /// Highest extra rate (percent) accepted from the order form.
  pub max_extra_rate: Decimal,
}

impl AdminSettings {
  pub fn from_config(config: &AppConfig) -> Self {
    Self {
      orders_per_page: config.admin.orders_per_page,
      offers_per_page: config.admin.offers_per_page,
      max_extra_rate: config.pricing.max_extra_rate,
    }
  }
}

impl Default for AdminSettings {
  fn default() -> Self {
    Self {
      orders_per_page: 20,
      offers_per_page: 10,
      max_extra_rate: Decimal::ONE_THOUSAND,
    }
  }
}

/// Result of a create or update form submission.
#[derive(Debug, Clone, Serialize)]
pub struct FormOutcome {
  /// The order as it should be redisplayed.
  pub order: Order,
  /// Whether the submission was stored.
  pub saved: bool,
  /// Rejected fields; empty when nothing was submitted or it was saved.
  pub errors: Vec<ValidationError>,
}

/// Offer search results for the item picker of one order.
#[derive(Debug, Clone, Serialize)]
pub struct OfferSearchResult {
  /// Target order (0 for the session draft).
  pub order_id: OrderId,
  pub search_text: Option<String>,
  pub offers: Page<Offer>,
}

/// The order admin use case.
pub struct OrderAdmin {
  /// Stored orders.
  repository: Arc<dyn OrderRepository>,
  /// Drafts and flash messages.
  sessions: Arc<dyn SessionStore>,
  /// Offer lookup.
  catalog: Arc<dyn OfferCatalog>,
  /// Unit pricing.
  pricer: Arc<dyn PriceCalculator>,
  /// Serializes writes per draft and per stored order.
  locks: OrderLocks,
  settings: AdminSettings,
}

impl OrderAdmin {
  pub fn new(
    repository: Arc<dyn OrderRepository>,
    sessions: Arc<dyn SessionStore>,
    catalog: Arc<dyn OfferCatalog>,
    pricer: Arc<dyn PriceCalculator>,
    settings: AdminSettings,
  ) -> Self {
    Self {
      repository,
      sessions,
      catalog,
      pricer,
      locks: OrderLocks::new(),
      settings,
    }
  }

  pub const fn settings(&self) -> &AdminSettings {
    &self.settings
  }

  /// Whether the order store is reachable.
  pub async fn is_healthy(&self) -> bool {
    self.repository.is_healthy().await
  }

  // ── Lookup ────────────────────────────────────────────

  /// List stored orders for the index page.
  #[instrument(skip(self))]
  pub async fn list_orders(&self, search: &OrderSearch) -> AdminResult<Page<Order>> {
    Ok(
      self
        .repository
        .search(search, self.settings.orders_per_page)
        .await?,
    )
  }

  /// Load a stored order by primary key.
  #[instrument(skip(self))]
  pub async fn find_order(&self, id: OrderId) -> AdminResult<Order> {
    match self.repository.find(id).await? {
      Some(order) => Ok(order),
      None => {
        warn!(order_id = id, "Order not found");
        Err(AdminError::not_found(Entity::Order, id))
      }
    }
  }

  /// Resolve the order an item action targets.
  ///
  /// A non-zero id loads the stored order; zero or no id means the
  /// session's draft, which is created on first use.
  pub async fn resolve_order(
    &self,
    session: SessionId,
    order_id: Option<OrderId>,
  ) -> AdminResult<Order> {
    match order_id.filter(|id| *id != 0) {
      Some(id) => self.find_order(id).await,
      None => self.draft(session, false).await,
    }
  }

  /// The session's draft order.
  ///
  /// With `clear`, any existing draft is discarded and a fresh empty one
  /// is stored in its place.
  #[instrument(skip(self, session), fields(session = %session))]
  pub async fn draft(&self, session: SessionId, clear: bool) -> AdminResult<Order> {
    if clear {
      let order = Order::new_draft();
      self.sessions.save_draft(session, &order).await?;
      info!("Draft order reset");
      return Ok(order);
    }

    Ok(
      self
        .sessions
        .load_draft(session)
        .await?
        .unwrap_or_else(Order::new_draft),
    )
  }

  /// Write an order back to where it lives: the session for drafts,
  /// the repository for stored orders.
  pub async fn persist(&self, session: SessionId, order: &Order) -> AdminResult<()> {
    match order.id {
      None => self.sessions.save_draft(session, order).await?,
      Some(id) => {
        if !self.repository.update(order).await? {
          return Err(AdminError::not_found(Entity::Order, id));
        }
      }
    }
    Ok(())
  }

  // ── Create / update / delete ──────────────────────────

  /// Creation flow.
  ///
  /// Without a form this only shows the draft (`reset` starts a new one).
  /// With a valid form the draft is inserted, removed from the session and
  /// a success flash is queued.
  #[instrument(skip(self, session, form), fields(session = %session, submitted = form.is_some()))]
  pub async fn create(
    &self,
    session: SessionId,
    form: Option<&OrderForm>,
    reset: bool,
  ) -> AdminResult<FormOutcome> {
    let _guard = self.locks.acquire(OrderTarget::Draft(session)).await;
    let mut order = self.draft(session, reset).await?;

    let Some(form) = form else {
      return Ok(FormOutcome {
        order,
        saved: false,
        errors: Vec::new(),
      });
    };

    if let Err(errors) = order.apply_form(form, self.settings.max_extra_rate) {
      info!(errors = errors.len(), "Order form rejected");
      return Ok(FormOutcome {
        order,
        saved: false,
        errors,
      });
    }

    let id = self.repository.insert(&order).await?;
    order.id = Some(id);
    self.sessions.clear_draft(session).await?;
    self
      .sessions
      .push_flash(session, Flash::success("Order was created"))
      .await?;

    info!(order_id = id, items = order.items.len(), "Order created");

    Ok(FormOutcome {
      order,
      saved: true,
      errors: Vec::new(),
    })
  }

  /// Update flow for a stored order.
  #[instrument(skip(self, session, form), fields(session = %session, submitted = form.is_some()))]
  pub async fn update(
    &self,
    session: SessionId,
    id: OrderId,
    form: Option<&OrderForm>,
  ) -> AdminResult<FormOutcome> {
    let _guard = self.locks.acquire(OrderTarget::Stored(id)).await;
    let mut order = self.find_order(id).await?;

    let Some(form) = form else {
      return Ok(FormOutcome {
        order,
        saved: false,
        errors: Vec::new(),
      });
    };

    if let Err(errors) = order.apply_form(form, self.settings.max_extra_rate) {
      info!(errors = errors.len(), "Order form rejected");
      return Ok(FormOutcome {
        order,
        saved: false,
        errors,
      });
    }

    self.persist(session, &order).await?;
    self
      .sessions
      .push_flash(session, Flash::success("Order was updated"))
      .await?;

    info!(order_id = id, "Order updated");

    Ok(FormOutcome {
      order,
      saved: true,
      errors: Vec::new(),
    })
  }

  /// Delete a stored order and its items.
  #[instrument(skip(self))]
  pub async fn delete(&self, id: OrderId) -> AdminResult<()> {
    let _guard = self.locks.acquire(OrderTarget::Stored(id)).await;
    if !self.repository.delete(id).await? {
      warn!(order_id = id, "Order not found");
      return Err(AdminError::not_found(Entity::Order, id));
    }
    info!(order_id = id, "Order deleted");
    Ok(())
  }

  // ── Items ─────────────────────────────────────────────

  /// Search the catalog for offers to add to an order.
  #[instrument(skip(self))]
  pub async fn search_offers(
    &self,
    order_id: OrderId,
    search: &OfferSearch,
  ) -> AdminResult<OfferSearchResult> {
    let offers = self
      .catalog
      .search_offers(search, self.settings.offers_per_page)
      .await?;

    Ok(OfferSearchResult {
      order_id,
      search_text: search.text().map(str::to_string),
      offers,
    })
  }

  /// Price an offer for the target order and append it as a new item.
  #[instrument(skip(self, session), fields(session = %session))]
  pub async fn add_item(
    &self,
    session: SessionId,
    order_id: Option<OrderId>,
    offer_id: OfferId,
    amount: u32,
  ) -> AdminResult<Order> {
    if amount == 0 {
      return Err(AdminError::Validation(vec![ValidationError::new(
        "amount",
        "amount must be a positive whole number",
      )]));
    }

    let _guard = self
      .locks
      .acquire(OrderTarget::resolve(session, order_id))
      .await;
    let mut order = self.resolve_order(session, order_id).await?;
    let offer = self.find_offer(offer_id).await?;

    let price = self.pricer.unit_price(&offer, order.extra_rate);
    let item = OrderItem::from_offer(&offer, price, amount);
    let item_id = item.id;
    order.add_item(item);

    self.persist(session, &order).await?;

    info!(
      order_id = ?order.id,
      offer_id,
      item_id = %item_id,
      amount,
      price = %price,
      extra_rate = %order.extra_rate,
      "Item added"
    );

    Ok(order)
  }

  /// Remove an item from the target order.
  #[instrument(skip(self, session), fields(session = %session))]
  pub async fn remove_item(
    &self,
    session: SessionId,
    order_id: Option<OrderId>,
    item_id: ItemId,
  ) -> AdminResult<Order> {
    let _guard = self
      .locks
      .acquire(OrderTarget::resolve(session, order_id))
      .await;
    let mut order = self.resolve_order(session, order_id).await?;

    if order.remove_item(item_id).is_none() {
      warn!(item_id = %item_id, "Order item not found");
      return Err(AdminError::not_found(Entity::OrderItem, item_id));
    }

    self.persist(session, &order).await?;
    info!(order_id = ?order.id, item_id = %item_id, "Item removed");

    Ok(order)
  }

  /// Look up one item of the target order.
  pub async fn find_item(
    &self,
    session: SessionId,
    order_id: Option<OrderId>,
    item_id: ItemId,
  ) -> AdminResult<(Order, OrderItem)> {
    let order = self.resolve_order(session, order_id).await?;
    let item = order
      .item(item_id)
      .cloned()
      .ok_or_else(|| AdminError::not_found(Entity::OrderItem, item_id))?;
    Ok((order, item))
  }

  /// Apply an item edit and write the parent order back.
  #[instrument(skip(self, session, form), fields(session = %session))]
  pub async fn edit_item(
    &self,
    session: SessionId,
    order_id: Option<OrderId>,
    item_id: ItemId,
    form: &ItemForm,
  ) -> AdminResult<Order> {
    let _guard = self
      .locks
      .acquire(OrderTarget::resolve(session, order_id))
      .await;
    let mut order = self.resolve_order(session, order_id).await?;

    let item = order
      .item_mut(item_id)
      .ok_or_else(|| AdminError::not_found(Entity::OrderItem, item_id))?;
    item.apply_form(form)?;
    let (amount, price) = (item.amount, item.price);

    self.persist(session, &order).await?;
    info!(order_id = ?order.id, item_id = %item_id, amount, price = %price, "Item updated");

    Ok(order)
  }

  // ── Utilities ─────────────────────────────────────────

  /// Delete every stored order, one row at a time.
  ///
  /// Orders removed concurrently by someone else are skipped.
  #[instrument(skip(self, session), fields(session = %session))]
  pub async fn drop_all_orders(&self, session: SessionId) -> AdminResult<usize> {
    let ids = self.repository.all_ids().await?;
    let mut deleted = 0;
    for id in ids {
      let _guard = self.locks.acquire(OrderTarget::Stored(id)).await;
      if self.repository.delete(id).await? {
        deleted += 1;
      }
    }

    self
      .sessions
      .push_flash(session, Flash::success("Orders clear"))
      .await?;
    warn!(deleted, "All orders dropped");

    Ok(deleted)
  }

  /// Drain the session's pending flash messages.
  pub async fn take_flashes(&self, session: SessionId) -> AdminResult<Vec<Flash>> {
    Ok(self.sessions.take_flashes(session).await?)
  }

  async fn find_offer(&self, id: OfferId) -> AdminResult<Offer> {
    match self.catalog.find_offer(id).await? {
      Some(offer) => Ok(offer),
      None => {
        warn!(offer_id = id, "Offer not found");
        Err(AdminError::not_found(Entity::Offer, id))
      }
    }
  }
}
