//! Return processing
//!
//! Puts returned goods back on the shelf. Good units are credited through the
//! inventory ledger; damaged units are written off (no stock movement). The
//! order's state is left untouched.

use super::recap::{return_condition_recap, slot_condition};
use crate::audit;
use crate::inventory::{StockChange, adjust_stock};
use crate::orders::traits::{CommandContext, OrderError};
use serde::Serialize;
use shared::models::{OperationType, StockKey, StockMovement};
use shared::order::{FulfillmentEventKind, ItemCondition, Order, StateKind};

/// Result of a return processing
#[derive(Debug, Clone, Serialize)]
pub struct ReturnProcessingOutcome {
    pub credited_units: u32,
    pub damaged_units: u32,
    pub movements: Vec<StockMovement>,
    /// 第几次处理（允许重复处理时 > 1）
    pub processing_count: u32,
}

/// One returned stock slot and the condition it is processed under
#[derive(Debug, Clone)]
struct ReturnedSlot {
    key: StockKey,
    quantity: u32,
    condition: ItemCondition,
}

/// Process the returned goods of `order_id`
///
/// `condition` overrides every slot; without it each slot takes the condition
/// recorded at reconciliation time.
pub fn record_return_processing(
    ctx: &mut CommandContext<'_>,
    order_id: u64,
    condition: Option<ItemCondition>,
    comment: Option<&str>,
    operator_id: i64,
) -> Result<ReturnProcessingOutcome, OrderError> {
    let order = ctx.load_order(order_id)?;
    let comment = comment.map(str::trim).filter(|c| !c.is_empty());

    let slots = match order.current_state {
        Some(StateKind::Returned) => returned_order_slots(ctx, &order, condition)?,
        Some(StateKind::PartiallyDelivered) => partial_delivery_slots(ctx, &order, condition)?,
        _ => {
            return Err(OrderError::StatePrecondition(format!(
                "Order {} must be {} or {} to process its return",
                order.reference,
                StateKind::Returned.label(),
                StateKind::PartiallyDelivered.label()
            )));
        }
    };

    let previous = ctx
        .storage()
        .return_processing_count(ctx.txn(), order_id)?;
    if previous > 0 {
        if !ctx.options().allow_repeated_return_processing {
            return Err(OrderError::ReturnAlreadyProcessed(order_id));
        }
        tracing::warn!(order_id, previous, "Return processed again, stock will be credited twice");
        ctx.warn(format!(
            "Return of {} was already processed {} time(s)",
            order.reference, previous
        ));
    }

    let reason = match comment {
        Some(comment) => format!("Return {}: {}", order.reference, comment),
        None => format!("Return {}", order.reference),
    };

    let mut movements = Vec::new();
    let mut credited_units = 0u32;
    let mut damaged_units = 0u32;
    for slot in &slots {
        if !slot.condition.is_good() {
            damaged_units += slot.quantity;
            continue;
        }
        let movement = adjust_stock(
            ctx,
            StockChange {
                key: slot.key,
                delta: i64::from(slot.quantity),
                reason: &reason,
                order_reference: Some(&order.reference),
                operator_id,
            },
        )?;
        credited_units += slot.quantity;
        movements.push(movement);
    }

    let mut conclusion = format!(
        "{}: {} unit(s) restocked, {} unit(s) damaged",
        order.reference, credited_units, damaged_units
    );
    if let Some(comment) = comment {
        conclusion.push_str(". ");
        conclusion.push_str(comment);
    }
    audit::record(
        ctx,
        order_id,
        OperationType::ReturnProcessed,
        operator_id,
        &conclusion,
    )?;

    let processing_count = ctx
        .storage()
        .increment_return_processing(ctx.txn(), order_id)?;

    tracing::info!(
        order_id,
        credited_units,
        damaged_units,
        processing_count,
        "Return processed"
    );
    ctx.emit(
        Some(order_id),
        FulfillmentEventKind::ReturnProcessed { credited_units },
    );

    Ok(ReturnProcessingOutcome {
        credited_units,
        damaged_units,
        movements,
        processing_count,
    })
}

/// Fully returned order: every line comes back
fn returned_order_slots(
    ctx: &mut CommandContext<'_>,
    order: &Order,
    condition: Option<ItemCondition>,
) -> Result<Vec<ReturnedSlot>, OrderError> {
    let lines = ctx.load_lines(order.id)?;
    let recap = match condition {
        Some(_) => None,
        None => Some(return_condition_recap(
            ctx.storage(),
            ctx.txn(),
            order,
            ctx.options().default_return_condition,
        )?),
    };

    let mut defaulted = false;
    let mut slots = Vec::with_capacity(lines.len());
    for line in lines {
        let key = StockKey::new(line.article_id, line.variant_id);
        let resolved = match (condition, &recap) {
            (Some(condition), _) => condition,
            (None, Some(recap)) => match slot_condition(recap, &key) {
                Some((condition, was_defaulted)) => {
                    defaulted |= was_defaulted;
                    condition
                }
                None => {
                    defaulted = true;
                    ctx.options().default_return_condition
                }
            },
            (None, None) => ctx.options().default_return_condition,
        };
        slots.push(ReturnedSlot {
            key,
            quantity: line.quantity,
            condition: resolved,
        });
    }

    if defaulted {
        ctx.warn(format!(
            "No reconciliation data for {}, returned items assumed {}",
            order.reference,
            ctx.options().default_return_condition
        ));
    }
    Ok(slots)
}

/// Partially delivered order: only the returned quantities come back
fn partial_delivery_slots(
    ctx: &CommandContext<'_>,
    order: &Order,
    condition: Option<ItemCondition>,
) -> Result<Vec<ReturnedSlot>, OrderError> {
    let record = ctx
        .storage()
        .get_reconciliation(ctx.txn(), order.id)?
        .ok_or_else(|| {
            OrderError::StatePrecondition(format!(
                "Order {} has no reconciliation record",
                order.reference
            ))
        })?;

    Ok(record
        .lines
        .iter()
        .filter(|line| line.returned_quantity > 0)
        .map(|line| ReturnedSlot {
            key: StockKey::new(line.article_id, line.variant_id),
            quantity: line.returned_quantity,
            condition: condition
                .or(line.condition)
                .unwrap_or(ItemCondition::Damaged),
        })
        .collect())
}
