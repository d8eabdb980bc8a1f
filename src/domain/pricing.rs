//! Extra-rate price adjustment.
//!
//! An order's extra rate is a percentage applied on top of an offer's base
//! price when a new item is priced: `base * (100 + rate) / 100`, rounded
//! half away from zero to the configured number of decimal places.
//! A rate of -100 prices the item at zero; lower rates are clamped there.

use rust_decimal::prelude::*;

/// Apply a percentage extra rate to a base price.
pub fn apply_extra_rate(base: Decimal, extra_rate: Decimal, scale: u32) -> Decimal {
    let factor = (Decimal::ONE_HUNDRED + extra_rate).max(Decimal::ZERO) / Decimal::ONE_HUNDRED;
    (base * factor).round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}
