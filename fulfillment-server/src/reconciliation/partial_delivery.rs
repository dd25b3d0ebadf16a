//! Partial delivery reconciliation
//!
//! Splits an in-delivery order into what the customer kept and what came
//! back. The original moves to Partially Delivered; the returned quantities
//! are forked into a `RESEND-` order that re-enters preparation. Stock is
//! not touched here, returns are credited by return processing.

use crate::audit;
use crate::orders::storage::counter;
use crate::orders::traits::{CommandContext, OrderError};
use crate::orders::transition::apply_transition;
use crate::pricing::recompute_order_pricing;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::OperationType;
use shared::order::{
    DeliveredEntry, FulfillmentEventKind, ItemCondition, LineItem, Order, ReconciledLine,
    ReconciliationRecord, ReturnedEntry, StateKind, TransitionEvent,
};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Result of a partial delivery
#[derive(Debug, Clone, Serialize)]
pub struct PartialDeliveryOutcome {
    pub record: ReconciliationRecord,
    pub resend_order: Order,
}

/// Record a partial delivery of `order_id`
pub fn record_partial_delivery(
    ctx: &mut CommandContext<'_>,
    order_id: u64,
    delivered: &[DeliveredEntry],
    returned: &[ReturnedEntry],
    operator_id: i64,
) -> Result<PartialDeliveryOutcome, OrderError> {
    let mut order = ctx.load_order(order_id)?;
    if order.current_state != Some(StateKind::InDelivery) {
        return Err(OrderError::StatePrecondition(format!(
            "Order {} must be {} to record a partial delivery",
            order.reference,
            StateKind::InDelivery.label()
        )));
    }

    let lines = ctx.load_lines(order_id)?;
    let reconciled = reconcile_lines(order_id, &lines, delivered, returned)?;

    apply_transition(
        ctx,
        &mut order,
        TransitionEvent::DeliverPartially,
        operator_id,
        None,
    )?;

    let resend_order = fork_resend_order(ctx, &order, &reconciled, operator_id)?;

    let record = ReconciliationRecord {
        order_id,
        lines: reconciled,
        resend_order_id: resend_order.id,
        operator_id,
        recorded_at: ctx.now(),
    };
    ctx.storage().store_reconciliation(ctx.txn(), &record)?;

    let conclusion = partial_delivery_conclusion(&order, &record, &resend_order);
    audit::record(
        ctx,
        order_id,
        OperationType::PartialDelivery,
        operator_id,
        &conclusion,
    )?;

    tracing::info!(
        order_id,
        resend_order_id = resend_order.id,
        delivered = record.total_delivered(),
        returned = record.total_returned(),
        "Partial delivery recorded"
    );
    ctx.emit(
        Some(order_id),
        FulfillmentEventKind::ResendCreated {
            resend_order_id: resend_order.id,
            reference: resend_order.reference.clone(),
        },
    );

    Ok(PartialDeliveryOutcome {
        record,
        resend_order,
    })
}

/// Validate the split of every line, before any write
///
/// Each line of the order must satisfy `delivered + returned == quantity`;
/// lines missing from both lists count as zero.
fn reconcile_lines(
    order_id: u64,
    lines: &[LineItem],
    delivered: &[DeliveredEntry],
    returned: &[ReturnedEntry],
) -> Result<Vec<ReconciledLine>, OrderError> {
    let known = |line_id: u64| {
        if lines.iter().any(|l| l.id == line_id) {
            Ok(())
        } else {
            Err(OrderError::LineNotFound { order_id, line_id })
        }
    };

    let mut delivered_by_line: HashMap<u64, u32> = HashMap::new();
    for entry in delivered {
        known(entry.line_id)?;
        if delivered_by_line.insert(entry.line_id, entry.quantity).is_some() {
            return Err(OrderError::InvalidOperation(format!(
                "Line {} is listed twice as delivered",
                entry.line_id
            )));
        }
    }

    let mut returned_by_line: HashMap<u64, (u32, ItemCondition)> = HashMap::new();
    for entry in returned {
        known(entry.line_id)?;
        if returned_by_line
            .insert(entry.line_id, (entry.quantity, entry.condition))
            .is_some()
        {
            return Err(OrderError::InvalidOperation(format!(
                "Line {} is listed twice as returned",
                entry.line_id
            )));
        }
    }

    let mut reconciled = Vec::with_capacity(lines.len());
    for line in lines {
        let delivered = delivered_by_line.get(&line.id).copied().unwrap_or(0);
        let (returned, condition) = match returned_by_line.get(&line.id) {
            Some((quantity, condition)) => (*quantity, (*quantity > 0).then_some(*condition)),
            None => (0, None),
        };
        if delivered > line.quantity || returned > line.quantity {
            return Err(OrderError::ReconciliationMismatch(format!(
                "line {}: delivered {} / returned {} exceeds ordered {}",
                line.id, delivered, returned, line.quantity
            )));
        }
        if delivered.checked_add(returned) != Some(line.quantity) {
            return Err(OrderError::ReconciliationMismatch(format!(
                "line {}: delivered {} + returned {} != ordered {}",
                line.id, delivered, returned, line.quantity
            )));
        }
        reconciled.push(ReconciledLine {
            line_id: line.id,
            article_id: line.article_id,
            variant_id: line.variant_id,
            original_quantity: line.quantity,
            delivered_quantity: delivered,
            returned_quantity: returned,
            condition,
        });
    }

    if !reconciled.iter().any(|l| l.delivered_quantity > 0) {
        return Err(OrderError::InvalidOperation(
            "Nothing was delivered, use the Returned transition".to_string(),
        ));
    }
    if !reconciled.iter().any(|l| l.returned_quantity > 0) {
        return Err(OrderError::InvalidOperation(
            "Nothing was returned, use the Delivered transition".to_string(),
        ));
    }

    Ok(reconciled)
}

/// Create the resend order holding the returned quantities
fn fork_resend_order(
    ctx: &mut CommandContext<'_>,
    origin: &Order,
    reconciled: &[ReconciledLine],
    operator_id: i64,
) -> Result<Order, OrderError> {
    let reference = Order::resend_reference(&origin.reference);
    if ctx
        .storage()
        .find_order_by_reference(ctx.txn(), &reference)?
        .is_some()
    {
        return Err(OrderError::OrderReferenceExists(reference));
    }

    let now = ctx.now();
    let mut resend = Order {
        id: ctx.next_id(counter::ORDER)?,
        reference,
        client_reference: origin.client_reference.clone(),
        city: origin.city.clone(),
        declared_total: Decimal::ZERO,
        delivery_fee: origin.delivery_fee,
        upsell_counter: 0,
        total: Decimal::ZERO,
        current_state_id: None,
        current_state: None,
        forked_from_order_id: Some(origin.id),
        assigned_operator_id: None,
        version: 0,
        created_at: now,
        updated_at: now,
    };

    for line in reconciled.iter().filter(|l| l.returned_quantity > 0) {
        let item = LineItem {
            id: ctx.next_id(counter::LINE)?,
            order_id: resend.id,
            article_id: line.article_id,
            variant_id: line.variant_id,
            quantity: line.returned_quantity,
            unit_price: Decimal::ZERO,
            subtotal: Decimal::ZERO,
        };
        ctx.storage().store_line(ctx.txn(), &item)?;
    }
    recompute_order_pricing(ctx, &mut resend)?;
    resend.declared_total = resend.total;

    ctx.save_order(&mut resend)?;
    ctx.storage()
        .index_order_reference(ctx.txn(), &resend.reference, resend.id)?;
    ctx.storage().link_fork(ctx.txn(), origin.id, resend.id)?;
    ctx.emit(
        Some(resend.id),
        FulfillmentEventKind::OrderCreated {
            reference: resend.reference.clone(),
        },
    );

    apply_transition(ctx, &mut resend, TransitionEvent::Resend, operator_id, None)?;
    audit::record(
        ctx,
        resend.id,
        OperationType::ResendCreated,
        operator_id,
        &format!("{} forked from {}", resend.reference, origin.reference),
    )?;

    Ok(resend)
}

/// Human-readable PARTIAL_DELIVERY audit conclusion, one clause per article
fn partial_delivery_conclusion(
    order: &Order,
    record: &ReconciliationRecord,
    resend: &Order,
) -> String {
    let mut text = format!("{} partially delivered:", order.reference);
    for (i, line) in record.lines.iter().enumerate() {
        let separator = if i == 0 { " " } else { "; " };
        let slot = match line.variant_id {
            Some(variant_id) => format!("article {}/{}", line.article_id, variant_id),
            None => format!("article {}", line.article_id),
        };
        let _ = write!(
            text,
            "{}{} delivered {}",
            separator, slot, line.delivered_quantity
        );
        if let Some(condition) = line.condition {
            let _ = write!(text, ", returned {} ({})", line.returned_quantity, condition);
        }
    }
    let _ = write!(text, ". Resend order {}", resend.reference);
    text
}
