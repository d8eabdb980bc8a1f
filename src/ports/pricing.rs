//! Price Calculator Port
//!
//! The extra rate is passed explicitly with every call; implementations
//! hold no per-order state.

use rust_decimal::Decimal;

use crate::domain::Offer;

pub trait PriceCalculator: Send + Sync + 'static {
    /// Unit price of `offer` for an order with the given extra rate.
    fn unit_price(&self, offer: &Offer, extra_rate: Decimal) -> Decimal;
}
