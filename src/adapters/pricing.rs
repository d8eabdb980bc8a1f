//! Markup Price Calculator - Default PriceCalculator Adapter
//!
//! Prices an offer at its base price adjusted by the order's extra rate,
//! rounded to the configured number of decimal places.

use rust_decimal::Decimal;

use crate::domain::pricing::apply_extra_rate;
use crate::domain::Offer;
use crate::ports::PriceCalculator;

#[derive(Debug, Clone)]
pub struct MarkupPriceCalculator {
    /// Decimal places kept on unit prices.
    scale: u32,
}

impl MarkupPriceCalculator {
    pub const fn new(scale: u32) -> Self {
        Self { scale }
    }
}

impl Default for MarkupPriceCalculator {
    fn default() -> Self {
        Self::new(2)
    }
}

impl PriceCalculator for MarkupPriceCalculator {
    fn unit_price(&self, offer: &Offer, extra_rate: Decimal) -> Decimal {
        apply_extra_rate(offer.price, extra_rate, self.scale)
    }
}
