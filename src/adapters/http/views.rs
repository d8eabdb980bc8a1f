//! JSON view payloads.
//!
//! Every admin response is a named view. Full pages wrap the view data in
//! the layout envelope (title and pending flash messages); fragments,
//! served to asynchronous requests for embedding in an already rendered
//! page, carry only the view name and data.

use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::domain::{Order, OrderId, OrderItem, Page};
use crate::ports::{Flash, SessionId};
use crate::usecases::OrderAdmin;

/// Header set by browsers' asynchronous requests.
pub const REQUESTED_WITH: &str = "x-requested-with";

/// How a view is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Full page with the layout envelope.
    Page,
    /// Bare view data for embedding.
    Fragment,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Layout {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let is_async = parts
            .headers
            .get(REQUESTED_WITH)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.eq_ignore_ascii_case("XMLHttpRequest"));
        Ok(if is_async { Self::Fragment } else { Self::Page })
    }
}

/// A named view and its data.
#[derive(Debug)]
pub struct View {
    pub name: &'static str,
    pub title: String,
    pub data: Value,
    pub status: StatusCode,
}

impl View {
    pub fn new(name: &'static str, title: impl Into<String>, data: Value) -> Self {
        Self {
            name,
            title: title.into(),
            data,
            status: StatusCode::OK,
        }
    }

    #[must_use]
    pub const fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Render with `layout`. Pages drain the session's flash messages.
    pub async fn render(self, layout: Layout, admin: &OrderAdmin, session: SessionId) -> Response {
        let body = match layout {
            Layout::Fragment => json!({
                "view": self.name,
                "data": self.data,
            }),
            Layout::Page => {
                let flashes: Vec<Flash> = admin.take_flashes(session).await.unwrap_or_else(|e| {
                    warn!(error = %e, "Failed to read flash messages");
                    Vec::new()
                });
                json!({
                    "view": self.name,
                    "title": self.title,
                    "flashes": flashes,
                    "data": self.data,
                })
            }
        };
        (self.status, Json(body)).into_response()
    }
}

/// An order with its derived totals.
#[derive(Debug, Serialize)]
pub struct OrderView<'a> {
    #[serde(flatten)]
    pub order: &'a Order,
    pub total: Decimal,
    pub item_count: u64,
    pub is_new_record: bool,
}

impl<'a> OrderView<'a> {
    pub fn new(order: &'a Order) -> Self {
        Self {
            order,
            total: order.total(),
            item_count: order.item_count(),
            is_new_record: order.is_new_record(),
        }
    }
}

/// A line item with its subtotal.
#[derive(Debug, Serialize)]
pub struct ItemView<'a> {
    #[serde(flatten)]
    pub item: &'a OrderItem,
    pub subtotal: Decimal,
}

impl<'a> ItemView<'a> {
    pub fn new(item: &'a OrderItem) -> Self {
        Self {
            item,
            subtotal: item.subtotal(),
        }
    }
}

/// Target id used in item links: 0 for the session draft.
pub fn link_id(order: &Order) -> OrderId {
    order.id.unwrap_or(0)
}

/// Data of the `_items` view.
pub fn items_data(order: &Order) -> Value {
    let items: Vec<ItemView<'_>> = order.items.iter().map(ItemView::new).collect();
    json!({
        "order_id": link_id(order),
        "items": items,
        "total": order.total(),
    })
}

/// The `_items` view of an order.
pub fn items_view(order: &Order) -> View {
    View::new("_items", "Order items", items_data(order))
}

/// Orders page with derived totals per order.
pub fn order_page(page: &Page<Order>) -> Value {
    let orders: Vec<OrderView<'_>> = page.items.iter().map(OrderView::new).collect();
    json!({
        "orders": orders,
        "total": page.total,
        "page": page.page,
        "per_page": page.per_page,
        "page_count": page.page_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Offer;
    use rust_decimal_macros::dec;

    #[test]
    fn test_items_data_for_draft_uses_zero_id() {
        let mut order = Order::new_draft();
        let offer = Offer {
            id: 1,
            sku: "PEN".to_string(),
            title: "Pen".to_string(),
            price: dec!(1.25),
        };
        order.add_item(OrderItem::from_offer(&offer, dec!(1.25), 4));

        let data = items_data(&order);
        assert_eq!(data["order_id"], 0);
        assert_eq!(data["items"][0]["title"], "Pen");
        assert_eq!(data["items"][0]["subtotal"], "5.00");
        assert_eq!(data["total"], "5.00");
    }

    #[test]
    fn test_order_view_flattens_order_fields() {
        let mut order = Order::new_draft();
        order.customer_name = "Ada".to_string();
        let value = serde_json::to_value(OrderView::new(&order)).unwrap();
        assert_eq!(value["customer_name"], "Ada");
        assert_eq!(value["is_new_record"], true);
        assert_eq!(value["status"], "new");
    }
}
