//! Item-Level Price Calculator
//!
//! Pure functions: upsell counter, tier lookup and line subtotal.

use rust_decimal::prelude::*;
use shared::models::Article;

/// Rounding for monetary values (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// Round a monetary amount to cents
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Upsell threshold counter for `upsell_units` upsell items on an order
///
/// A single upsell unit never raises the price; from two units on the
/// counter grows by one per extra unit.
pub fn threshold_counter(upsell_units: u32) -> u32 {
    upsell_units.saturating_sub(1)
}

/// Tier price for an upsell article at `counter`
///
/// Falls back to the closest lower configured tier, then to `base_price`.
pub fn tier_price(article: &Article, counter: u32) -> Decimal {
    article
        .upsell_tiers
        .iter()
        .take(counter as usize + 1)
        .rev()
        .find_map(|tier| *tier)
        .unwrap_or(article.base_price)
}

/// Effective unit price of an article on an order with `counter`
pub fn unit_price(article: &Article, counter: u32) -> Decimal {
    if article.is_upsell {
        tier_price(article, counter)
    } else {
        article.base_price
    }
}

/// Line subtotal: `unit_price × quantity`, rounded to cents
pub fn line_subtotal(unit_price: Decimal, quantity: u32) -> Decimal {
    round_money(unit_price * Decimal::from(quantity))
}
