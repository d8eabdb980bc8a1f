//! Order and order-item entities.
//!
//! An `Order` without an `id` is a draft that only lives in the admin's
//! session. Once stored it carries the database id and is never written
//! back to the session again.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValidationError;
use super::offer::{Offer, OfferId};

/// Database identifier of a stored order.
pub type OrderId = i64;

/// Identifier of a line item, assigned when the item is created so that
/// draft items can be addressed before the order is saved.
pub type ItemId = Uuid;

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    New,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Stable textual form, used for storage and query parameters.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "new" => Ok(Self::New),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ValidationError::new(
                "status",
                format!("unknown order status '{other}'"),
            )),
        }
    }
}

/// A priced quantity of an offer attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Item identifier.
    pub id: ItemId,
    /// Offer this item was created from.
    pub offer_id: OfferId,
    /// Offer SKU at the time the item was added.
    pub sku: String,
    /// Offer title at the time the item was added.
    pub title: String,
    /// Quantity ordered.
    pub amount: u32,
    /// Unit price after the order's extra rate was applied.
    pub price: Decimal,
}

impl OrderItem {
    /// Create an item for `offer` with an already computed unit price.
    pub fn from_offer(offer: &Offer, price: Decimal, amount: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            offer_id: offer.id,
            sku: offer.sku.clone(),
            title: offer.title.clone(),
            amount,
            price,
        }
    }

    /// Price times amount.
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.amount)
    }
}

/// A customer purchase record, either a session draft or a stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Database id; `None` while the order is a draft.
    pub id: Option<OrderId>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub delivery_address: String,
    pub comment: String,
    pub status: OrderStatus,
    /// Percentage markup applied when pricing new items (negative for a discount).
    pub extra_rate: Decimal,
    /// Line items in insertion order.
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// An empty draft order.
    pub fn new_draft() -> Self {
        let now = Utc::now();
        Self {
            id: None,
            customer_name: String::new(),
            customer_email: String::new(),
            customer_phone: String::new(),
            delivery_address: String::new(),
            comment: String::new(),
            status: OrderStatus::New,
            extra_rate: Decimal::ZERO,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the order has never been stored.
    pub const fn is_new_record(&self) -> bool {
        self.id.is_none()
    }

    pub fn item(&self, id: ItemId) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut OrderItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Append an item.
    pub fn add_item(&mut self, item: OrderItem) {
        self.items.push(item);
        self.touch();
    }

    /// Remove an item by id, returning it if it was present.
    pub fn remove_item(&mut self, id: ItemId) -> Option<OrderItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        let removed = self.items.remove(index);
        self.touch();
        Some(removed)
    }

    /// Sum of all item subtotals.
    pub fn total(&self) -> Decimal {
        self.items.iter().map(OrderItem::subtotal).sum()
    }

    /// Total quantity across all items.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.amount)).sum()
    }

    /// Apply submitted form fields. Fields absent from the form are kept.
    ///
    /// # Errors
    /// Returns every field that failed validation; the order is left
    /// unchanged in that case.
    pub fn apply_form(
        &mut self,
        form: &OrderForm,
        max_extra_rate: Decimal,
    ) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut next = self.clone();

        if let Some(name) = &form.customer_name {
            next.customer_name = name.trim().to_string();
        }
        if let Some(email) = &form.customer_email {
            next.customer_email = email.trim().to_string();
        }
        if let Some(phone) = &form.customer_phone {
            next.customer_phone = phone.trim().to_string();
        }
        if let Some(address) = &form.delivery_address {
            next.delivery_address = address.trim().to_string();
        }
        if let Some(comment) = &form.comment {
            next.comment = comment.clone();
        }
        if let Some(status) = non_blank(form.status.as_deref()) {
            match status.parse() {
                Ok(status) => next.status = status,
                Err(e) => errors.push(e),
            }
        }
        if let Some(rate) = non_blank(form.extra_rate.as_deref()) {
            match rate.parse::<Decimal>() {
                Ok(rate) if rate < -Decimal::ONE_HUNDRED || rate > max_extra_rate => {
                    errors.push(ValidationError::new(
                        "extra_rate",
                        format!("extra rate must be between -100 and {max_extra_rate}"),
                    ));
                }
                Ok(rate) => next.extra_rate = rate,
                Err(_) => errors.push(ValidationError::new(
                    "extra_rate",
                    format!("'{rate}' is not a number"),
                )),
            }
        }

        if next.customer_name.is_empty() {
            errors.push(ValidationError::new("customer_name", "customer name cannot be blank"));
        }
        if !next.customer_email.is_empty() && !next.customer_email.contains('@') {
            errors.push(ValidationError::new(
                "customer_email",
                "customer email is not a valid email address",
            ));
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        next.touch();
        *self = next;
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Order fields as submitted from the admin form.
///
/// Every field is optional and kept as raw text; conversion happens in
/// [`Order::apply_form`] so malformed input becomes a validation error
/// rather than a rejected request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderForm {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub delivery_address: Option<String>,
    pub comment: Option<String>,
    pub status: Option<String>,
    pub extra_rate: Option<String>,
}

/// Item fields as submitted from the item edit form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemForm {
    pub amount: Option<String>,
    pub price: Option<String>,
}

impl OrderItem {
    /// Apply an edit to amount and, optionally, an explicit unit price.
    ///
    /// # Errors
    /// Returns the offending fields; the item is left unchanged.
    pub fn apply_form(&mut self, form: &ItemForm) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut amount = self.amount;
        let mut price = self.price;

        if let Some(raw) = non_blank(form.amount.as_deref()) {
            match raw.parse::<u32>() {
                Ok(0) | Err(_) => errors.push(ValidationError::new(
                    "amount",
                    "amount must be a positive whole number",
                )),
                Ok(value) => amount = value,
            }
        }
        if let Some(raw) = non_blank(form.price.as_deref()) {
            match raw.parse::<Decimal>() {
                Ok(value) if value.is_sign_negative() => {
                    errors.push(ValidationError::new("price", "price cannot be negative"));
                }
                Ok(value) => price = value,
                Err(_) => errors.push(ValidationError::new(
                    "price",
                    format!("'{raw}' is not a number"),
                )),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        self.amount = amount;
        self.price = price;
        Ok(())
    }
}

/// Filters for the order list page.
///
/// Filters that do not parse are ignored rather than rejected, so a stale
/// bookmark still lists orders.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderSearch {
    pub id: Option<String>,
    pub status: Option<String>,
    /// Matched against customer name, email and phone.
    pub customer: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
}

impl OrderSearch {
    pub fn order_id(&self) -> Option<OrderId> {
        non_blank(self.id.as_deref())?.parse().ok()
    }

    pub fn status(&self) -> Option<OrderStatus> {
        non_blank(self.status.as_deref())?.parse().ok()
    }

    pub fn customer(&self) -> Option<&str> {
        non_blank(self.customer.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn offer() -> Offer {
        Offer {
            id: 7,
            sku: "TEA-01".to_string(),
            title: "Green tea".to_string(),
            price: dec!(4.50),
        }
    }

    #[test]
    fn test_new_draft_is_new_record() {
        let order = Order::new_draft();
        assert!(order.is_new_record());
        assert!(order.items.is_empty());
        assert_eq!(order.total(), Decimal::ZERO);
    }

    #[test]
    fn test_add_and_remove_item() {
        let mut order = Order::new_draft();
        let item = OrderItem::from_offer(&offer(), dec!(4.95), 3);
        let id = item.id;
        order.add_item(item);

        assert_eq!(order.total(), dec!(14.85));
        assert_eq!(order.item_count(), 3);

        let removed = order.remove_item(id).unwrap();
        assert_eq!(removed.offer_id, 7);
        assert!(order.items.is_empty());
        assert!(order.remove_item(id).is_none());
    }

    #[test]
    fn test_apply_form_updates_fields() {
        let mut order = Order::new_draft();
        let form = OrderForm {
            customer_name: Some("  Ada Lovelace ".to_string()),
            customer_email: Some("ada@example.com".to_string()),
            status: Some("processing".to_string()),
            extra_rate: Some("12.5".to_string()),
            ..OrderForm::default()
        };

        order.apply_form(&form, dec!(1000)).unwrap();
        assert_eq!(order.customer_name, "Ada Lovelace");
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.extra_rate, dec!(12.5));
    }

    #[test]
    fn test_apply_form_rejects_invalid_input_atomically() {
        let mut order = Order::new_draft();
        order.customer_name = "Bob".to_string();
        let form = OrderForm {
            customer_name: Some("Robert".to_string()),
            extra_rate: Some("lots".to_string()),
            status: Some("shipped".to_string()),
            ..OrderForm::default()
        };

        let errors = order.apply_form(&form, dec!(1000)).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(order.customer_name, "Bob");
    }

    #[test]
    fn test_apply_form_requires_customer_name() {
        let mut order = Order::new_draft();
        let errors = order.apply_form(&OrderForm::default(), dec!(1000)).unwrap_err();
        assert_eq!(errors[0].field, "customer_name");
    }

    #[test]
    fn test_extra_rate_bounds() {
        let mut order = Order::new_draft();
        let form = OrderForm {
            customer_name: Some("Eve".to_string()),
            extra_rate: Some("-150".to_string()),
            ..OrderForm::default()
        };
        assert!(order.apply_form(&form, dec!(1000)).is_err());
    }

    #[test]
    fn test_item_form_rejects_zero_amount() {
        let mut item = OrderItem::from_offer(&offer(), dec!(4.50), 1);
        let form = ItemForm {
            amount: Some("0".to_string()),
            price: None,
        };
        assert!(item.apply_form(&form).is_err());
        assert_eq!(item.amount, 1);

        let form = ItemForm {
            amount: Some("5".to_string()),
            price: Some("3.99".to_string()),
        };
        item.apply_form(&form).unwrap();
        assert_eq!(item.amount, 5);
        assert_eq!(item.subtotal(), dec!(19.95));
    }

    #[test]
    fn test_order_search_ignores_unparseable_filters() {
        let search = OrderSearch {
            id: Some("abc".to_string()),
            status: Some("lost".to_string()),
            customer: Some(" ada ".to_string()),
            page: None,
        };
        assert_eq!(search.order_id(), None);
        assert_eq!(search.status(), None);
        assert_eq!(search.customer(), Some("ada"));
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [
            OrderStatus::New,
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }
}
