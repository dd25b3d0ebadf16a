//! Order-Level Price Calculator
//!
//! Re-prices every line of an order from the upsell threshold counter and
//! sums the subtotals into `Order.total`. The delivery fee is never included.

use super::item_calculator::{line_subtotal, threshold_counter, unit_price};
use crate::orders::traits::{CommandContext, OrderError};
use rust_decimal::Decimal;
use shared::models::Article;
use shared::order::{LineItem, Order};
use std::collections::HashMap;

/// Result of pricing an order's lines
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCalculationResult {
    /// Σ quantities of upsell lines
    pub upsell_units: u32,
    pub counter: u32,
    /// Lines with `unit_price` and `subtotal` filled in
    pub lines: Vec<LineItem>,
    /// Σ line subtotals
    pub total: Decimal,
}

/// Price `lines` against `articles` (pure)
pub fn price_lines(
    lines: &[LineItem],
    articles: &HashMap<i64, Article>,
) -> Result<OrderCalculationResult, OrderError> {
    let article = |id: i64| articles.get(&id).ok_or(OrderError::ArticleNotFound(id));

    let mut upsell_units = 0u32;
    for line in lines {
        if article(line.article_id)?.is_upsell {
            upsell_units = upsell_units.checked_add(line.quantity).ok_or_else(|| {
                OrderError::InvalidOperation(format!(
                    "Upsell quantity overflow on line {}",
                    line.id
                ))
            })?;
        }
    }
    let counter = threshold_counter(upsell_units);

    let mut priced = Vec::with_capacity(lines.len());
    let mut total = Decimal::ZERO;
    for line in lines {
        let unit = unit_price(article(line.article_id)?, counter);
        let subtotal = line_subtotal(unit, line.quantity);
        total += subtotal;
        priced.push(LineItem {
            unit_price: unit,
            subtotal,
            ..line.clone()
        });
    }

    Ok(OrderCalculationResult {
        upsell_units,
        counter,
        lines: priced,
        total,
    })
}

/// Recompute the pricing of an order inside the command transaction
///
/// Persists every line and updates `order.upsell_counter` / `order.total`
/// in memory; the caller saves the order.
pub fn recompute_order_pricing(
    ctx: &CommandContext<'_>,
    order: &mut Order,
) -> Result<OrderCalculationResult, OrderError> {
    let lines = ctx.load_lines(order.id)?;

    let mut articles = HashMap::new();
    for line in &lines {
        if !articles.contains_key(&line.article_id) {
            articles.insert(line.article_id, ctx.load_article(line.article_id)?);
        }
    }

    let result = price_lines(&lines, &articles)?;
    for line in &result.lines {
        ctx.storage().store_line(ctx.txn(), line)?;
    }

    order.upsell_counter = result.counter;
    order.total = result.total;

    tracing::debug!(
        order_id = order.id,
        upsell_units = result.upsell_units,
        counter = result.counter,
        total = %result.total,
        "Order pricing recomputed"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: i64, price: i64, upsell: bool, tiers: Vec<Option<Decimal>>) -> Article {
        Article {
            id,
            name: format!("Article {}", id),
            base_price: Decimal::new(price, 0),
            is_upsell: upsell,
            upsell_tiers: tiers,
            available_quantity: 0,
            variants: vec![],
        }
    }

    fn line(id: u64, article_id: i64, quantity: u32) -> LineItem {
        LineItem {
            id,
            order_id: 1,
            article_id,
            variant_id: None,
            quantity,
            unit_price: Decimal::ZERO,
            subtotal: Decimal::ZERO,
        }
    }

    fn catalog() -> HashMap<i64, Article> {
        let mut map = HashMap::new();
        map.insert(
            1,
            article(
                1,
                80,
                true,
                vec![Some(Decimal::new(80, 0)), Some(Decimal::new(70, 0)), None],
            ),
        );
        map.insert(2, article(2, 100, false, vec![]));
        map
    }

    #[test]
    fn test_single_upsell_unit_keeps_base_tier() {
        let result = price_lines(&[line(1, 1, 1), line(2, 2, 3)], &catalog()).unwrap();
        assert_eq!(result.counter, 0);
        assert_eq!(result.lines[1].subtotal, Decimal::new(300, 0));
        assert_eq!(result.lines[0].subtotal, Decimal::new(80, 0));
        assert_eq!(result.total, Decimal::new(380, 0));
    }

    #[test]
    fn test_three_upsell_units_use_tier_two_fallback() {
        let result = price_lines(&[line(1, 1, 3), line(2, 2, 3)], &catalog()).unwrap();
        assert_eq!(result.upsell_units, 3);
        assert_eq!(result.counter, 2);
        // tier[2] unset -> tier[1]
        assert_eq!(result.lines[0].unit_price, Decimal::new(70, 0));
        assert_eq!(result.lines[0].subtotal, Decimal::new(210, 0));
        assert_eq!(result.total, Decimal::new(510, 0));
    }

    #[test]
    fn test_pricing_is_idempotent() {
        let first = price_lines(&[line(1, 1, 2), line(2, 2, 1)], &catalog()).unwrap();
        let second = price_lines(&first.lines, &catalog()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_total_is_sum_of_subtotals() {
        let lines = [line(1, 1, 4), line(2, 2, 2), line(3, 2, 1)];
        let result = price_lines(&lines, &catalog()).unwrap();
        let sum: Decimal = result.lines.iter().map(|l| l.subtotal).sum();
        assert_eq!(result.total, sum);
    }

    #[test]
    fn test_empty_order() {
        let result = price_lines(&[], &catalog()).unwrap();
        assert_eq!(result.counter, 0);
        assert_eq!(result.total, Decimal::ZERO);
    }

    #[test]
    fn test_upsell_quantity_overflow_refused() {
        let lines = [line(1, 1, u32::MAX), line(2, 1, 1)];
        assert!(matches!(
            price_lines(&lines, &catalog()),
            Err(OrderError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_missing_article() {
        assert!(matches!(
            price_lines(&[line(1, 9, 1)], &catalog()),
            Err(OrderError::ArticleNotFound(9))
        ));
    }
}
