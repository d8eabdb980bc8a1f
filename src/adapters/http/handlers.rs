//! Admin route handlers.
//!
//! Handlers stay thin: extract the request, call [`OrderAdmin`], record
//! the action's latency and outcome, and render the resulting view.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Redirect, Response};
use axum::{Extension, Form};
use serde::Deserialize;
use serde_json::json;

use super::views::{items_data, items_view, link_id, order_page, ItemView, Layout, OrderView, View};
use super::AppState;
use crate::domain::{
    AdminError, AdminResult, Entity, ItemForm, ItemId, OfferId, OfferSearch, OrderForm, OrderId, OrderSearch,
};
use crate::ports::SessionId;
use crate::usecases::FormOutcome;

/// Where the index lives; deletes redirect here.
pub const ORDERS_PATH: &str = "/admin/orders";

type Shared = State<Arc<AppState>>;

#[derive(Debug, Deserialize)]
pub struct OfferSearchQuery {
    pub order_id: Option<OrderId>,
    pub q: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AddItemQuery {
    pub offer_id: OfferId,
    pub order_id: Option<OrderId>,
    pub amount: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteItemQuery {
    pub item_id: String,
    pub order_id: Option<OrderId>,
}

#[derive(Debug, Deserialize)]
pub struct EditItemQuery {
    pub id: String,
    pub order_id: Option<OrderId>,
}

/// Item ids that do not parse cannot name an item.
fn parse_item_id(raw: &str) -> AdminResult<ItemId> {
    raw.trim()
        .parse()
        .map_err(|_| AdminError::not_found(Entity::OrderItem, raw))
}

#[derive(Debug, Deserialize)]
pub struct ItemsQuery {
    pub order_id: Option<OrderId>,
}

#[derive(Debug, Deserialize)]
pub struct UtilitiesQuery {
    #[serde(rename = "drop-all-orders")]
    pub drop_all_orders: Option<String>,
}

impl UtilitiesQuery {
    /// Any value other than empty, `0` or `false` requests the drop.
    pub fn wants_drop(&self) -> bool {
        self.drop_all_orders
            .as_deref()
            .map(str::trim)
            .is_some_and(|v| !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"))
    }
}

fn outcome<T>(result: &AdminResult<T>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) if e.is_not_found() => "not_found",
        Err(AdminError::Validation(_)) => "invalid",
        Err(_) => "error",
    }
}

impl AppState {
    fn record<T>(&self, action: &str, started: Instant, result: &AdminResult<T>) {
        self.metrics
            .observe(action, outcome(result), started.elapsed());
    }
}

// ── Orders ────────────────────────────────────────────────

pub async fn index(
    State(state): Shared,
    Extension(session): Extension<SessionId>,
    Query(search): Query<OrderSearch>,
) -> Result<Response, AdminError> {
    let started = Instant::now();
    let result = state.admin.list_orders(&search).await;
    state.record("index", started, &result);
    let page = result?;

    let data = json!({
        "search": {
            "id": search.order_id(),
            "status": search.status(),
            "customer": search.customer(),
        },
        "orders": order_page(&page),
    });
    Ok(View::new("index", "Orders", data)
        .render(Layout::Page, &state.admin, session)
        .await)
}

pub async fn view(
    State(state): Shared,
    Extension(session): Extension<SessionId>,
    Path(id): Path<OrderId>,
) -> Result<Response, AdminError> {
    let started = Instant::now();
    let result = state.admin.find_order(id).await;
    state.record("view", started, &result);
    let order = result?;

    let data = json!({
        "order": OrderView::new(&order),
        "items": items_data(&order),
    });
    Ok(View::new("view", format!("Order #{id}"), data)
        .render(Layout::Page, &state.admin, session)
        .await)
}

pub async fn create_form(
    State(state): Shared,
    Extension(session): Extension<SessionId>,
    layout: Layout,
) -> Result<Response, AdminError> {
    // A plain page load starts a fresh draft; asynchronous reloads keep it.
    let reset = layout == Layout::Page;
    let started = Instant::now();
    let result = state.admin.create(session, None, reset).await;
    state.record("create", started, &result);
    Ok(render_form(&state, session, "create", "Create Order", result?).await)
}

pub async fn create_submit(
    State(state): Shared,
    Extension(session): Extension<SessionId>,
    Form(form): Form<OrderForm>,
) -> Result<Response, AdminError> {
    let started = Instant::now();
    let result = state.admin.create(session, Some(&form), false).await;
    state.record("create", started, &result);
    let outcome = result?;
    if outcome.saved {
        state.metrics.orders_created.inc();
    }
    Ok(render_form(&state, session, "create", "Create Order", outcome).await)
}

pub async fn update_form(
    State(state): Shared,
    Extension(session): Extension<SessionId>,
    Path(id): Path<OrderId>,
) -> Result<Response, AdminError> {
    let started = Instant::now();
    let result = state.admin.update(session, id, None).await;
    state.record("update", started, &result);
    let title = format!("Update Order: {id}");
    Ok(render_form(&state, session, "update", title, result?).await)
}

pub async fn update_submit(
    State(state): Shared,
    Extension(session): Extension<SessionId>,
    Path(id): Path<OrderId>,
    Form(form): Form<OrderForm>,
) -> Result<Response, AdminError> {
    let started = Instant::now();
    let result = state.admin.update(session, id, Some(&form)).await;
    state.record("update", started, &result);
    let title = format!("Update Order: {id}");
    Ok(render_form(&state, session, "update", title, result?).await)
}

pub async fn delete(
    State(state): Shared,
    Path(id): Path<OrderId>,
) -> Result<Redirect, AdminError> {
    let started = Instant::now();
    let result = state.admin.delete(id).await;
    state.record("delete", started, &result);
    result?;
    state.metrics.orders_deleted.inc();
    Ok(Redirect::to(ORDERS_PATH))
}

async fn render_form(
    state: &AppState,
    session: SessionId,
    name: &'static str,
    title: impl Into<String>,
    outcome: FormOutcome,
) -> Response {
    let status = if outcome.errors.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    let data = json!({
        "order": OrderView::new(&outcome.order),
        "items": items_data(&outcome.order),
        "saved": outcome.saved,
        "errors": outcome.errors,
    });
    View::new(name, title, data)
        .with_status(status)
        .render(Layout::Page, &state.admin, session)
        .await
}

// ── Items ─────────────────────────────────────────────────

pub async fn offer_search(
    State(state): Shared,
    Extension(session): Extension<SessionId>,
    Query(query): Query<OfferSearchQuery>,
) -> Result<Response, AdminError> {
    let search = OfferSearch {
        q: query.q,
        page: query.page,
    };
    let started = Instant::now();
    let result = state
        .admin
        .search_offers(query.order_id.unwrap_or(0), &search)
        .await;
    state.record("offer_search", started, &result);
    let found = result?;

    let data = serde_json::to_value(&found).map_err(anyhow::Error::from)?;
    Ok(View::new("offer-search", "Offers", data)
        .render(Layout::Fragment, &state.admin, session)
        .await)
}

pub async fn add_item(
    State(state): Shared,
    Extension(session): Extension<SessionId>,
    layout: Layout,
    Query(query): Query<AddItemQuery>,
) -> Result<Response, AdminError> {
    let started = Instant::now();
    let result = state
        .admin
        .add_item(
            session,
            query.order_id,
            query.offer_id,
            query.amount.unwrap_or(1),
        )
        .await;
    state.record("add_item", started, &result);
    let order = result?;
    state.metrics.items_added.inc();
    Ok(items_view(&order)
        .render(layout, &state.admin, session)
        .await)
}

pub async fn delete_item(
    State(state): Shared,
    Extension(session): Extension<SessionId>,
    layout: Layout,
    Query(query): Query<DeleteItemQuery>,
) -> Result<Response, AdminError> {
    let started = Instant::now();
    let result = match parse_item_id(&query.item_id) {
        Ok(item_id) => state.admin.remove_item(session, query.order_id, item_id).await,
        Err(e) => Err(e),
    };
    state.record("delete_item", started, &result);
    let order = result?;
    state.metrics.items_removed.inc();
    Ok(items_view(&order)
        .render(layout, &state.admin, session)
        .await)
}

pub async fn edit_item_form(
    State(state): Shared,
    Extension(session): Extension<SessionId>,
    layout: Layout,
    Query(query): Query<EditItemQuery>,
) -> Result<Response, AdminError> {
    let started = Instant::now();
    let result = match parse_item_id(&query.id) {
        Ok(item_id) => state.admin.find_item(session, query.order_id, item_id).await,
        Err(e) => Err(e),
    };
    state.record("edit_item", started, &result);
    let (order, item) = result?;

    let data = json!({
        "order_id": link_id(&order),
        "item": ItemView::new(&item),
    });
    Ok(View::new("edit-item", "Edit item", data)
        .render(layout, &state.admin, session)
        .await)
}

pub async fn edit_item_submit(
    State(state): Shared,
    Extension(session): Extension<SessionId>,
    layout: Layout,
    Query(query): Query<EditItemQuery>,
    Form(form): Form<ItemForm>,
) -> Result<Response, AdminError> {
    let started = Instant::now();
    let result = match parse_item_id(&query.id) {
        Ok(item_id) => {
            state
                .admin
                .edit_item(session, query.order_id, item_id, &form)
                .await
        }
        Err(e) => Err(e),
    };
    state.record("edit_item", started, &result);
    let order = result?;
    Ok(items_view(&order)
        .render(layout, &state.admin, session)
        .await)
}

pub async fn items(
    State(state): Shared,
    Extension(session): Extension<SessionId>,
    layout: Layout,
    Query(query): Query<ItemsQuery>,
) -> Result<Response, AdminError> {
    let started = Instant::now();
    let result = state.admin.resolve_order(session, query.order_id).await;
    state.record("items", started, &result);
    let order = result?;
    Ok(items_view(&order)
        .render(layout, &state.admin, session)
        .await)
}

// ── Utilities ─────────────────────────────────────────────

pub async fn utilities(
    State(state): Shared,
    Extension(session): Extension<SessionId>,
    Query(query): Query<UtilitiesQuery>,
) -> Result<Response, AdminError> {
    let mut dropped = None;
    if query.wants_drop() {
        let started = Instant::now();
        let result = state.admin.drop_all_orders(session).await;
        state.record("drop_all_orders", started, &result);
        let count = result?;
        state
            .metrics
            .orders_deleted
            .inc_by(u64::try_from(count).unwrap_or(u64::MAX));
        dropped = Some(count);
    }

    Ok(View::new("utilities", "Utilities", json!({ "dropped": dropped }))
        .render(Layout::Page, &state.admin, session)
        .await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag(value: Option<&str>) -> UtilitiesQuery {
        UtilitiesQuery {
            drop_all_orders: value.map(str::to_string),
        }
    }

    #[test]
    fn test_malformed_item_id_is_not_found() {
        assert!(parse_item_id("not-a-uuid").unwrap_err().is_not_found());
        let id = uuid::Uuid::new_v4();
        assert_eq!(parse_item_id(&format!(" {id} ")).unwrap(), id);
    }

    #[test]
    fn test_drop_flag_truthiness() {
        assert!(flag(Some("1")).wants_drop());
        assert!(flag(Some("yes")).wants_drop());
        assert!(!flag(Some("0")).wants_drop());
        assert!(!flag(Some("")).wants_drop());
        assert!(!flag(Some("False")).wants_drop());
        assert!(!flag(None).wants_drop());
    }
}
