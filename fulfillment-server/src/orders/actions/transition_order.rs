//! Transition command handler
//!
//! Moves an order to the state kind named by `target`. The label is parsed
//! leniently (canonical, SCREAMING_SNAKE or French) and resolved to the one
//! event that leads there.

use crate::orders::traits::{
    ActionOutcome, CommandContext, CommandHandler, CommandMetadata, OrderError,
};
use crate::orders::transition::apply_transition;
use shared::order::{StateKind, TransitionEvent};

/// Transition action
#[derive(Debug, Clone)]
pub struct TransitionOrderAction {
    pub order_id: u64,
    pub target: String,
    pub comment: Option<String>,
}

impl CommandHandler for TransitionOrderAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<ActionOutcome, OrderError> {
        // 1. Resolve the target kind
        let target = StateKind::from_label(&self.target)
            .ok_or_else(|| OrderError::UnknownStateKind(self.target.clone()))?;

        // 2. Partial delivery needs the per-line split
        if target == StateKind::PartiallyDelivered {
            return Err(OrderError::InvalidOperation(
                "Use RECORD_PARTIAL_DELIVERY to partially deliver an order".to_string(),
            ));
        }

        // 3. Apply
        let mut order = ctx.load_order(self.order_id)?;
        let instance = apply_transition(
            ctx,
            &mut order,
            TransitionEvent::leading_to(target),
            metadata.operator_id,
            self.comment.as_deref(),
        )?;

        ActionOutcome::new(format!("Order {} is now {}", order.reference, target.label()))
            .with_data(&instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::fixtures::{create_order, create_test_metadata};
    use crate::orders::storage::OrderStorage;
    use crate::orders::traits::EngineOptions;
    use shared::models::{Operation, OperationType};
    use shared::order::StateInstance;

    fn transition(order_id: u64, target: &str) -> TransitionOrderAction {
        TransitionOrderAction {
            order_id,
            target: target.to_string(),
            comment: None,
        }
    }

    #[test]
    fn test_transition_accepts_label_forms() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 10, EngineOptions::default());
        let order = create_order(&mut ctx, "CMD-1");
        let metadata = create_test_metadata();

        for label in ["Confirmée", "IN_PREPARATION", "prepared", "En livraison", "Livrée"] {
            transition(order.id, label).execute(&mut ctx, &metadata).unwrap();
        }

        let stored = storage.get_order(&txn, order.id).unwrap().unwrap();
        assert_eq!(stored.current_state, Some(StateKind::Delivered));
        let ops: Vec<Operation> = storage.get_operations(&txn, order.id).unwrap();
        assert_eq!(ops.last().unwrap().operation_type, OperationType::Delivered);
    }

    #[test]
    fn test_returns_new_state_instance() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 10, EngineOptions::default());
        let order = create_order(&mut ctx, "CMD-1");

        let outcome = TransitionOrderAction {
            order_id: order.id,
            target: "Confirmed".to_string(),
            comment: Some("Client joint".to_string()),
        }
        .execute(&mut ctx, &create_test_metadata())
        .unwrap();

        let instance: StateInstance = serde_json::from_value(outcome.data.unwrap()).unwrap();
        assert!(instance.is_open());
        assert_eq!(instance.kind, StateKind::Confirmed);
        assert_eq!(instance.operator_id, Some(1));
        assert_eq!(instance.comment.as_deref(), Some("Client joint"));
    }

    #[test]
    fn test_unknown_label_rejected() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 10, EngineOptions::default());
        let order = create_order(&mut ctx, "CMD-1");

        let err = transition(order.id, "Lost in transit")
            .execute(&mut ctx, &create_test_metadata())
            .unwrap_err();
        assert!(matches!(err, OrderError::UnknownStateKind(_)));
    }

    #[test]
    fn test_partial_delivery_not_a_plain_transition() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 10, EngineOptions::default());
        let order = create_order(&mut ctx, "CMD-1");

        let err = transition(order.id, "Partially Delivered")
            .execute(&mut ctx, &create_test_metadata())
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidOperation(_)));
    }

    #[test]
    fn test_skipping_a_step_is_refused() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 10, EngineOptions::default());
        let order = create_order(&mut ctx, "CMD-1");
        let metadata = create_test_metadata();

        transition(order.id, "Confirmed").execute(&mut ctx, &metadata).unwrap();
        let err = transition(order.id, "In Delivery")
            .execute(&mut ctx, &metadata)
            .unwrap_err();
        assert!(matches!(err, OrderError::StatePrecondition(_)));
    }

    #[test]
    fn test_missing_order() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 10, EngineOptions::default());

        let err = transition(99, "Confirmed")
            .execute(&mut ctx, &create_test_metadata())
            .unwrap_err();
        assert!(matches!(err, OrderError::OrderNotFound(99)));
    }
}
