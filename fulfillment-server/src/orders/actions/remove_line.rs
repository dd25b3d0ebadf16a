//! RemoveLine command handler

use super::line_support::{commit_line_change, ensure_editable};
use crate::orders::traits::{
    ActionOutcome, CommandContext, CommandHandler, CommandMetadata, OrderError,
};

/// RemoveLine action
#[derive(Debug, Clone)]
pub struct RemoveLineAction {
    pub order_id: u64,
    pub line_id: u64,
}

impl CommandHandler for RemoveLineAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<ActionOutcome, OrderError> {
        let mut order = ctx.load_order(self.order_id)?;
        ensure_editable(&order)?;
        let line = ctx.load_line(order.id, self.line_id)?;

        ctx.storage()
            .remove_line(ctx.txn(), order.id, line.id)?;

        let conclusion = format!(
            "Removed {} x article {} (line {})",
            line.quantity, line.article_id, line.id
        );
        commit_line_change(ctx, &mut order, metadata.operator_id, &conclusion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::fixtures::{
        create_order, create_test_metadata, seed_article, upsell_article,
    };
    use crate::orders::actions::AddLineAction;
    use crate::orders::storage::OrderStorage;
    use crate::orders::traits::EngineOptions;
    use rust_decimal::Decimal;

    #[test]
    fn test_remove_reprices_remaining_lines() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        seed_article(&storage, &txn, upsell_article(1));
        seed_article(&storage, &txn, upsell_article(2));
        let mut ctx = CommandContext::new(&txn, &storage, 10, EngineOptions::default());
        let order = create_order(&mut ctx, "CMD-1");
        let metadata = create_test_metadata();

        for article_id in [1, 2] {
            AddLineAction {
                order_id: order.id,
                article_id,
                variant_id: None,
                quantity: 1,
            }
            .execute(&mut ctx, &metadata)
            .unwrap();
        }
        // U=2 → counter 1 → 90 each
        let stored = storage.get_order(&txn, order.id).unwrap().unwrap();
        assert_eq!(stored.total, Decimal::from(180));

        let second = storage.get_lines(&txn, order.id).unwrap()[1].id;
        RemoveLineAction {
            order_id: order.id,
            line_id: second,
        }
        .execute(&mut ctx, &metadata)
        .unwrap();

        let stored = storage.get_order(&txn, order.id).unwrap().unwrap();
        assert_eq!(stored.upsell_counter, 0);
        assert_eq!(stored.total, Decimal::from(100));
        assert_eq!(storage.get_lines(&txn, order.id).unwrap().len(), 1);
    }

    #[test]
    fn test_remove_missing_line() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 10, EngineOptions::default());
        let order = create_order(&mut ctx, "CMD-1");

        let err = RemoveLineAction {
            order_id: order.id,
            line_id: 3,
        }
        .execute(&mut ctx, &create_test_metadata())
        .unwrap_err();
        assert!(matches!(err, OrderError::LineNotFound { .. }));
    }
}
