//! AddLine command handler
//!
//! Adds an article (or one of its variants) to an order and re-prices it.

use super::line_support::{commit_line_change, ensure_editable, validate_quantity, warn_if_short};
use crate::orders::storage::counter;
use crate::orders::traits::{
    ActionOutcome, CommandContext, CommandHandler, CommandMetadata, OrderError,
};
use rust_decimal::Decimal;
use shared::order::LineItem;

/// AddLine action
#[derive(Debug, Clone)]
pub struct AddLineAction {
    pub order_id: u64,
    pub article_id: i64,
    pub variant_id: Option<i64>,
    pub quantity: u32,
}

impl CommandHandler for AddLineAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<ActionOutcome, OrderError> {
        // 1. Load and validate
        let mut order = ctx.load_order(self.order_id)?;
        ensure_editable(&order)?;
        validate_quantity(self.quantity)?;
        let article = ctx.load_article_slot(self.article_id, self.variant_id)?;
        warn_if_short(ctx, &article, self.variant_id, self.quantity);

        // 2. Insert the line (priced by the recompute below)
        let line = LineItem {
            id: ctx.next_id(counter::LINE)?,
            order_id: order.id,
            article_id: article.id,
            variant_id: self.variant_id,
            quantity: self.quantity,
            unit_price: Decimal::ZERO,
            subtotal: Decimal::ZERO,
        };
        ctx.storage().store_line(ctx.txn(), &line)?;

        // 3. Re-price, save, audit
        let conclusion = format!("Added {} x {} (line {})", line.quantity, article.name, line.id);
        commit_line_change(ctx, &mut order, metadata.operator_id, &conclusion)
    }
}
