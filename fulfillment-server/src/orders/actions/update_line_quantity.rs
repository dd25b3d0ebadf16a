//! UpdateLineQuantity command handler

use super::line_support::{commit_line_change, ensure_editable, validate_quantity, warn_if_short};
use crate::orders::traits::{
    ActionOutcome, CommandContext, CommandHandler, CommandMetadata, OrderError,
};

/// UpdateLineQuantity action
#[derive(Debug, Clone)]
pub struct UpdateLineQuantityAction {
    pub order_id: u64,
    pub line_id: u64,
    pub quantity: u32,
}

impl CommandHandler for UpdateLineQuantityAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<ActionOutcome, OrderError> {
        let mut order = ctx.load_order(self.order_id)?;
        ensure_editable(&order)?;
        validate_quantity(self.quantity)?;
        let mut line = ctx.load_line(order.id, self.line_id)?;
        let article = ctx.load_article(line.article_id)?;
        warn_if_short(ctx, &article, line.variant_id, self.quantity);

        let previous = line.quantity;
        line.quantity = self.quantity;
        ctx.storage().store_line(ctx.txn(), &line)?;

        let conclusion = format!(
            "{} quantity {} -> {} (line {})",
            article.name, previous, line.quantity, line.id
        );
        commit_line_change(ctx, &mut order, metadata.operator_id, &conclusion)
    }
}
