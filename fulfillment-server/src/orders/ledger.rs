//! State ledger queries
//!
//! The ledger is the append-only list of [`StateInstance`]s of an order.
//! `Order.current_state_id` points at the single open instance; both are
//! written in the same transaction by the transition engine.

use super::storage::{OrderStorage, TableReader};
use super::traits::OrderError;
use shared::order::{Order, StateInstance};

/// Full state history of an order, oldest first
pub fn state_history<R: TableReader>(
    storage: &OrderStorage,
    txn: &R,
    order_id: u64,
) -> Result<Vec<StateInstance>, OrderError> {
    Ok(storage.get_state_instances(txn, order_id)?)
}

/// Find the open instance of `history`, checking the ledger invariants
///
/// At most one instance may be open and it must be the one the order points
/// at. Anything else is data corruption, not a caller error.
pub fn open_instance<'h>(
    order: &Order,
    history: &'h [StateInstance],
) -> Result<Option<&'h StateInstance>, OrderError> {
    let mut open = history.iter().filter(|i| i.is_open());
    let current = open.next();
    if open.next().is_some() {
        tracing::error!(order_id = order.id, "More than one open state instance");
        return Err(OrderError::LedgerCorrupted(order.id));
    }

    if current.map(|i| i.id) != order.current_state_id {
        tracing::error!(
            order_id = order.id,
            pointer = ?order.current_state_id,
            open = ?current.map(|i| i.id),
            "Current state pointer does not match the open instance"
        );
        return Err(OrderError::LedgerCorrupted(order.id));
    }

    Ok(current)
}

/// Current (open) state instance of an order
pub fn current_state<R: TableReader>(
    storage: &OrderStorage,
    txn: &R,
    order: &Order,
) -> Result<Option<StateInstance>, OrderError> {
    let history = state_history(storage, txn, order.id)?;
    Ok(open_instance(order, &history)?.cloned())
}

/// Previous meaningful state: the closed, non-transient instance with the
/// latest end time not after the current instance's start
///
/// Preparation-phase kinds are skipped so that e.g. "In Preparation" does not
/// hide "Confirmed" or "Partially Delivered".
pub fn previous_instance<'h>(
    history: &'h [StateInstance],
    current: &StateInstance,
) -> Option<&'h StateInstance> {
    history
        .iter()
        .filter(|i| i.id != current.id && !i.kind.is_transient())
        .filter_map(|i| i.ended_at.map(|ended| (ended, i)))
        .filter(|(ended, _)| *ended <= current.started_at)
        .max_by_key(|(ended, i)| (*ended, i.id))
        .map(|(_, i)| i)
}

/// Previous meaningful state of an order (`None` without a current state)
pub fn previous_state<R: TableReader>(
    storage: &OrderStorage,
    txn: &R,
    order: &Order,
) -> Result<Option<StateInstance>, OrderError> {
    let history = state_history(storage, txn, order.id)?;
    let Some(current) = open_instance(order, &history)? else {
        return Ok(None);
    };
    Ok(previous_instance(&history, current).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::order::StateKind;

    fn instance(id: u64, kind: StateKind, started: i64, ended: Option<i64>) -> StateInstance {
        StateInstance {
            id,
            order_id: 1,
            kind,
            started_at: started,
            ended_at: ended,
            operator_id: None,
            closed_by: None,
            comment: None,
        }
    }

    fn order(current_state_id: Option<u64>) -> Order {
        Order {
            id: 1,
            reference: "CMD-1".to_string(),
            client_reference: "CLI".to_string(),
            city: "Rabat".to_string(),
            declared_total: Decimal::ZERO,
            delivery_fee: Decimal::ZERO,
            upsell_counter: 0,
            total: Decimal::ZERO,
            current_state_id,
            current_state: None,
            forked_from_order_id: None,
            assigned_operator_id: None,
            version: 0,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_open_instance_matches_pointer() {
        let history = vec![
            instance(1, StateKind::Confirmed, 10, Some(20)),
            instance(2, StateKind::InPreparation, 20, None),
        ];
        let open = open_instance(&order(Some(2)), &history).unwrap();
        assert_eq!(open.map(|i| i.id), Some(2));
        assert!(open_instance(&order(None), &[]).unwrap().is_none());
    }

    #[test]
    fn test_two_open_instances_is_corruption() {
        let history = vec![
            instance(1, StateKind::Confirmed, 10, None),
            instance(2, StateKind::InPreparation, 20, None),
        ];
        assert!(matches!(
            open_instance(&order(Some(2)), &history),
            Err(OrderError::LedgerCorrupted(1))
        ));
    }

    #[test]
    fn test_dangling_pointer_is_corruption() {
        let history = vec![instance(1, StateKind::Confirmed, 10, Some(20))];
        assert!(matches!(
            open_instance(&order(Some(1)), &history),
            Err(OrderError::LedgerCorrupted(1))
        ));
    }

    #[test]
    fn test_previous_skips_preparation_phase() {
        let history = vec![
            instance(1, StateKind::Confirmed, 10, Some(20)),
            instance(2, StateKind::InPreparation, 20, Some(30)),
            instance(3, StateKind::Collected, 30, Some(40)),
            instance(4, StateKind::ReturnToConfirmation, 40, None),
        ];
        let previous = previous_instance(&history, &history[3]).unwrap();
        assert_eq!(previous.kind, StateKind::Confirmed);
    }

    #[test]
    fn test_previous_with_same_millisecond_boundary() {
        let history = vec![
            instance(1, StateKind::Confirmed, 10, Some(10)),
            instance(2, StateKind::InPreparation, 10, Some(10)),
            instance(3, StateKind::Prepared, 10, None),
        ];
        assert_eq!(previous_instance(&history, &history[2]).unwrap().id, 1);
    }

    #[test]
    fn test_no_previous_for_first_state() {
        let history = vec![instance(1, StateKind::Confirmed, 10, None)];
        assert!(previous_instance(&history, &history[0]).is_none());
    }
}
