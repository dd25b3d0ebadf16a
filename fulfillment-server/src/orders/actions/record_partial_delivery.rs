//! RecordPartialDelivery command handler

use crate::orders::traits::{
    ActionOutcome, CommandContext, CommandHandler, CommandMetadata, OrderError,
};
use crate::reconciliation::record_partial_delivery;
use shared::order::{DeliveredEntry, ReturnedEntry};

/// RecordPartialDelivery action
#[derive(Debug, Clone)]
pub struct RecordPartialDeliveryAction {
    pub order_id: u64,
    pub delivered: Vec<DeliveredEntry>,
    pub returned: Vec<ReturnedEntry>,
}

impl CommandHandler for RecordPartialDeliveryAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<ActionOutcome, OrderError> {
        let outcome = record_partial_delivery(
            ctx,
            self.order_id,
            &self.delivered,
            &self.returned,
            metadata.operator_id,
        )?;

        ActionOutcome::new(format!(
            "{} unit(s) delivered, {} unit(s) forked into {}",
            outcome.record.total_delivered(),
            outcome.record.total_returned(),
            outcome.resend_order.reference
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
    use shared::order::{ItemCondition, StateKind};

    #[test]
    fn test_record_partial_delivery() {
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
            quantity: 5,
        }
        .execute(&mut ctx, &metadata)
        .unwrap();
        let line_id = storage.get_lines(&txn, order.id).unwrap()[0].id;
        for target in ["Confirmed", "In Preparation", "Prepared", "In Delivery"] {
            TransitionOrderAction {
                order_id: order.id,
                target: target.to_string(),
                comment: None,
            }
            .execute(&mut ctx, &metadata)
            .unwrap();
        }

        let outcome = RecordPartialDeliveryAction {
            order_id: order.id,
            delivered: vec![DeliveredEntry {
                line_id,
                quantity: 3,
            }],
            returned: vec![ReturnedEntry {
                line_id,
                quantity: 2,
                condition: ItemCondition::Good,
            }],
        }
        .execute(&mut ctx, &metadata)
        .unwrap();

        assert!(outcome.message.contains("RESEND-CMD-1"));
        let data = outcome.data.unwrap();
        let resend_id = data["resend_order"]["id"].as_u64().unwrap();
        let resend = storage.get_order(&txn, resend_id).unwrap().unwrap();
        assert_eq!(resend.current_state, Some(StateKind::InPreparation));
        assert_eq!(storage.get_lines(&txn, resend_id).unwrap()[0].quantity, 2);
        // 库存在处理退货之前不变
        assert_eq!(
            storage.get_article(&txn, 2).unwrap().unwrap().available_quantity,
            10
        );
    }
}
