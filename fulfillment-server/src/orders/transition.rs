//! Transition engine
//!
//! The only writer of the state ledger. A transition closes the open
//! instance, opens the target one, moves `Order.current_state_id` and runs
//! the side effects tied to the target kind, all in the caller's write
//! transaction.

use super::ledger;
use super::storage::counter;
use super::traits::{CommandContext, OrderError};
use crate::audit;
use shared::models::OperationType;
use shared::order::{
    FulfillmentEventKind, Order, StateInstance, StateKind, TransitionEvent, next_state,
};

/// Apply `event` to `order`
///
/// Refused with a state-precondition error when the transition table has no
/// edge from the current state. On success `order` is saved and the new open
/// instance is returned.
pub fn apply_transition(
    ctx: &mut CommandContext<'_>,
    order: &mut Order,
    event: TransitionEvent,
    operator_id: i64,
    comment: Option<&str>,
) -> Result<StateInstance, OrderError> {
    let history = ledger::state_history(ctx.storage(), ctx.txn(), order.id)?;
    let current = ledger::open_instance(order, &history)?.cloned();
    let source = current.as_ref().map(|i| i.kind);

    if event == TransitionEvent::Resend && !order.is_resend() {
        return Err(OrderError::StatePrecondition(format!(
            "Order {} is not a resend order",
            order.reference
        )));
    }

    let target = next_state(source, event).ok_or_else(|| {
        OrderError::StatePrecondition(format!(
            "Order {} cannot go {:?} from {}",
            order.reference,
            event,
            source.map(|k| k.label()).unwrap_or("no state")
        ))
    })?;

    let now = ctx.now();
    let comment = comment.map(str::trim).filter(|c| !c.is_empty());

    if let Some(mut closing) = current {
        closing.ended_at = Some(now);
        closing.closed_by = Some(operator_id);
        ctx.storage().store_state_instance(ctx.txn(), &closing)?;
    }

    let instance = StateInstance {
        id: ctx.next_id(counter::STATE)?,
        order_id: order.id,
        kind: target,
        started_at: now,
        ended_at: None,
        operator_id: Some(operator_id),
        closed_by: None,
        comment: comment.map(str::to_string),
    };
    ctx.storage().store_state_instance(ctx.txn(), &instance)?;

    order.current_state_id = Some(instance.id);
    order.current_state = Some(target);

    if target == StateKind::ReturnToConfirmation {
        order.assigned_operator_id = find_confirmation_operator(ctx, &history)?;
        match order.assigned_operator_id {
            Some(assignee) => tracing::info!(
                order_id = order.id,
                assignee,
                "Order returned to its confirmation operator"
            ),
            None => tracing::info!(
                order_id = order.id,
                "No confirmation operator in history, order queued unassigned"
            ),
        }
    }

    record_side_effect(ctx, order, target, operator_id, comment)?;
    ctx.save_order(order)?;

    tracing::info!(
        order_id = order.id,
        from = ?source,
        to = ?target,
        state_instance_id = instance.id,
        "Order transitioned"
    );
    ctx.emit(
        Some(order.id),
        FulfillmentEventKind::StateChanged {
            from: source,
            to: target,
            state_instance_id: instance.id,
            assigned_operator_id: order.assigned_operator_id,
        },
    );
    Ok(instance)
}

/// Walk the history backward to the most recent confirmation-team operator
fn find_confirmation_operator(
    ctx: &CommandContext<'_>,
    history: &[StateInstance],
) -> Result<Option<i64>, OrderError> {
    for instance in history.iter().rev() {
        for operator_id in [instance.closed_by, instance.operator_id].into_iter().flatten() {
            if let Some(operator) = ctx.find_operator(operator_id)?
                && operator.is_confirmation()
            {
                return Ok(Some(operator.id));
            }
        }
    }
    Ok(None)
}

/// Audit entry written when an order reaches `target`
fn record_side_effect(
    ctx: &mut CommandContext<'_>,
    order: &Order,
    target: StateKind,
    operator_id: i64,
    comment: Option<&str>,
) -> Result<(), OrderError> {
    let operation_type = match target {
        StateKind::Confirmed => OperationType::OrderConfirmed,
        StateKind::Prepared => OperationType::PreparationCompleted,
        StateKind::Delivered => OperationType::Delivered,
        StateKind::Returned => OperationType::Returned,
        StateKind::ReturnToConfirmation => OperationType::ProblemReported,
        // PartiallyDelivered is audited by the reconciliation procedure
        StateKind::InPreparation
        | StateKind::Collected
        | StateKind::Packed
        | StateKind::InDelivery
        | StateKind::PartiallyDelivered => return Ok(()),
    };

    let conclusion = match comment {
        Some(comment) => format!("{} {}: {}", order.reference, target.label(), comment),
        None => format!("{} {}", order.reference, target.label()),
    };
    audit::record(ctx, order.id, operation_type, operator_id, &conclusion)?;
    Ok(())
}
