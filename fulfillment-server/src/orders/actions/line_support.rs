//! Shared checks and commit step for line item actions

use crate::audit;
use crate::orders::traits::{ActionOutcome, CommandContext, OrderError};
use crate::pricing::recompute_order_pricing;
use serde::Serialize;
use shared::models::{Article, OperationType};
use shared::order::{
    FulfillmentEventKind, LineItem, MAX_LINE_QUANTITY, MIN_LINE_QUANTITY, Order,
};

/// Order and its re-priced lines, returned by every line action
#[derive(Debug, Serialize)]
pub struct PricedOrder {
    pub order: Order,
    pub lines: Vec<LineItem>,
}

/// Lines may change before the first state or in an editable state
pub(super) fn ensure_editable(order: &Order) -> Result<(), OrderError> {
    match order.current_state {
        None => Ok(()),
        Some(kind) if kind.allows_line_changes() => Ok(()),
        Some(kind) => Err(OrderError::StatePrecondition(format!(
            "Lines of order {} cannot change while {}",
            order.reference,
            kind.label()
        ))),
    }
}

pub(super) fn validate_quantity(quantity: u32) -> Result<(), OrderError> {
    if !(MIN_LINE_QUANTITY..=MAX_LINE_QUANTITY).contains(&quantity) {
        return Err(OrderError::InvalidOperation(format!(
            "Quantity must be between {} and {}, got {}",
            MIN_LINE_QUANTITY, MAX_LINE_QUANTITY, quantity
        )));
    }
    Ok(())
}

/// Non-blocking notice when the slot holds less than the line asks for
pub(super) fn warn_if_short(
    ctx: &mut CommandContext<'_>,
    article: &Article,
    variant_id: Option<i64>,
    quantity: u32,
) {
    let available = article.available(variant_id).unwrap_or(0);
    if available < i64::from(quantity) {
        ctx.warn(format!(
            "Only {} unit(s) of {} in stock, {} requested",
            available, article.name, quantity
        ));
    }
}

/// Re-price the order, save it and write the LINE_CHANGED entry
pub(super) fn commit_line_change(
    ctx: &mut CommandContext<'_>,
    order: &mut Order,
    operator_id: i64,
    conclusion: &str,
) -> Result<ActionOutcome, OrderError> {
    let priced = recompute_order_pricing(ctx, order)?;
    ctx.save_order(order)?;
    audit::record(
        ctx,
        order.id,
        OperationType::LineChanged,
        operator_id,
        conclusion,
    )?;

    ctx.emit(
        Some(order.id),
        FulfillmentEventKind::LinesChanged {
            upsell_counter: order.upsell_counter,
            total: order.total,
        },
    );

    ActionOutcome::new(format!("Order {} total is now {}", order.reference, order.total))
        .with_data(&PricedOrder {
            order: order.clone(),
            lines: priced.lines,
        })
}
