//! RecordReturnProcessing command handler

use crate::orders::traits::{
    ActionOutcome, CommandContext, CommandHandler, CommandMetadata, OrderError,
};
use crate::reconciliation::record_return_processing;
use shared::order::ItemCondition;

/// RecordReturnProcessing action
#[derive(Debug, Clone)]
pub struct RecordReturnProcessingAction {
    pub order_id: u64,
    pub condition: Option<ItemCondition>,
    pub comment: Option<String>,
}

impl CommandHandler for RecordReturnProcessingAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<ActionOutcome, OrderError> {
        let outcome = record_return_processing(
            ctx,
            self.order_id,
            self.condition,
            self.comment.as_deref(),
            metadata.operator_id,
        )?;

        ActionOutcome::new(format!(
            "{} unit(s) restocked, {} unit(s) damaged",
            outcome.credited_units, outcome.damaged_units
        ))
        .with_data(&outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::fixtures::{
        article, create_order, create_test_metadata, seed_article,
    };
    use crate::orders::actions::{AddLineAction, TransitionOrderAction};
    use crate::orders::storage::OrderStorage;
    use crate::orders::traits::EngineOptions;
    use shared::order::StateKind;

    #[test]
    fn test_returned_order_restocked() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        seed_article(&storage, &txn, article(2, 100, 10));
        let mut ctx = CommandContext::new(&txn, &storage, 10, EngineOptions::default());
        let order = create_order(&mut ctx, "CMD-1");
        let metadata = create_test_metadata();

        AddLineAction {
            order_id: order.id,
            article_id: 2,
            variant_id: None,
            quantity: 4,
        }
        .execute(&mut ctx, &metadata)
        .unwrap();
        for target in ["Confirmed", "In Preparation", "Prepared", "In Delivery", "Returned"] {
            TransitionOrderAction {
                order_id: order.id,
                target: target.to_string(),
                comment: None,
            }
            .execute(&mut ctx, &metadata)
            .unwrap();
        }

        let outcome = RecordReturnProcessingAction {
            order_id: order.id,
            condition: Some(ItemCondition::Good),
            comment: Some("Refus client".to_string()),
        }
        .execute(&mut ctx, &metadata)
        .unwrap();

        assert_eq!(outcome.data.unwrap()["credited_units"], 4);
        assert_eq!(
            storage.get_article(&txn, 2).unwrap().unwrap().available_quantity,
            14
        );
        let stored = storage.get_order(&txn, order.id).unwrap().unwrap();
        assert_eq!(stored.current_state, Some(StateKind::Returned));
    }
}
