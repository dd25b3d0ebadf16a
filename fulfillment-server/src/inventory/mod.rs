//! Inventory ledger
//!
//! Available quantity lives on the article (or on a variant when the stock
//! slot names one) and is only ever changed through [`adjust_stock`], which
//! appends a [`StockMovement`] in the same write transaction.

use crate::orders::storage::counter;
use crate::orders::traits::{CommandContext, OrderError};
use shared::models::{StockKey, StockMovement};

/// A signed change of one stock slot
#[derive(Debug, Clone)]
pub struct StockChange<'r> {
    pub key: StockKey,
    /// Positive = credit, negative = debit
    pub delta: i64,
    pub reason: &'r str,
    pub order_reference: Option<&'r str>,
    pub operator_id: i64,
}

/// Apply a stock change and append its movement
///
/// A debit that would take the slot below zero is refused.
pub fn adjust_stock(
    ctx: &CommandContext<'_>,
    change: StockChange<'_>,
) -> Result<StockMovement, OrderError> {
    let StockChange {
        key,
        delta,
        reason,
        order_reference,
        operator_id,
    } = change;

    if delta == 0 {
        return Err(OrderError::InvalidOperation(
            "Stock adjustment must not be zero".to_string(),
        ));
    }
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(OrderError::InvalidOperation(
            "Stock adjustment reason must not be empty".to_string(),
        ));
    }

    let mut article = ctx.load_article_slot(key.article_id, key.variant_id)?;
    let before = article.available(key.variant_id).unwrap_or(0);
    let after = before.checked_add(delta).ok_or_else(|| {
        OrderError::InvalidOperation(format!("Stock adjustment {} out of range for {}", delta, key))
    })?;
    if after < 0 {
        let requested = delta.checked_neg().ok_or_else(|| {
            OrderError::InvalidOperation(format!("Stock adjustment {} out of range", delta))
        })?;
        return Err(OrderError::InsufficientStock {
            slot: key.to_string(),
            available: before,
            requested,
        });
    }

    match key.variant_id {
        Some(variant_id) => {
            if let Some(variant) = article.variant_mut(variant_id) {
                variant.available_quantity = after;
            }
        }
        None => article.available_quantity = after,
    }
    ctx.storage().store_article(ctx.txn(), &article)?;

    let movement = StockMovement {
        id: ctx.next_id(counter::MOVEMENT)?,
        article_id: key.article_id,
        variant_id: key.variant_id,
        quantity: delta,
        quantity_before: before,
        quantity_after: after,
        reason: reason.to_string(),
        order_reference: order_reference.map(str::to_string),
        operator_id,
        created_at: ctx.now(),
    };
    ctx.storage().append_stock_movement(ctx.txn(), &movement)?;

    tracing::info!(
        slot = %key,
        delta,
        quantity_after = after,
        order_reference = ?movement.order_reference,
        "Stock adjusted"
    );
    Ok(movement)
}
