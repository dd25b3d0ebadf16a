//! AdjustStock command handler
//!
//! Manual inventory correction (count, breakage, supplier delivery).

use crate::inventory::{StockChange, adjust_stock};
use crate::orders::traits::{
    ActionOutcome, CommandContext, CommandHandler, CommandMetadata, OrderError,
};
use shared::models::StockKey;
use shared::order::FulfillmentEventKind;

/// AdjustStock action
#[derive(Debug, Clone)]
pub struct AdjustStockAction {
    pub article_id: i64,
    pub variant_id: Option<i64>,
    pub delta: i64,
    pub reason: String,
}

impl CommandHandler for AdjustStockAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<ActionOutcome, OrderError> {
        let movement = adjust_stock(
            ctx,
            StockChange {
                key: StockKey::new(self.article_id, self.variant_id),
                delta: self.delta,
                reason: &self.reason,
                order_reference: None,
                operator_id: metadata.operator_id,
            },
        )?;

        ctx.emit(
            None,
            FulfillmentEventKind::StockAdjusted {
                article_id: movement.article_id,
                variant_id: movement.variant_id,
                quantity_after: movement.quantity_after,
            },
        );
        ActionOutcome::new(format!(
            "Stock {} -> {}",
            movement.quantity_before, movement.quantity_after
        ))
        .with_data(&movement)
    }
}
