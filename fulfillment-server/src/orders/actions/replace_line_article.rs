//! ReplaceLineArticle command handler
//!
//! Swaps the article of a line, keeping its quantity.

use super::line_support::{commit_line_change, ensure_editable, warn_if_short};
use crate::orders::traits::{
    ActionOutcome, CommandContext, CommandHandler, CommandMetadata, OrderError,
};

/// ReplaceLineArticle action
#[derive(Debug, Clone)]
pub struct ReplaceLineArticleAction {
    pub order_id: u64,
    pub line_id: u64,
    pub article_id: i64,
    pub variant_id: Option<i64>,
}

impl CommandHandler for ReplaceLineArticleAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<ActionOutcome, OrderError> {
        let mut order = ctx.load_order(self.order_id)?;
        ensure_editable(&order)?;
        let mut line = ctx.load_line(order.id, self.line_id)?;
        if line.article_id == self.article_id && line.variant_id == self.variant_id {
            return Err(OrderError::InvalidOperation(format!(
                "Line {} already holds this article",
                line.id
            )));
        }
        let article = ctx.load_article_slot(self.article_id, self.variant_id)?;
        warn_if_short(ctx, &article, self.variant_id, line.quantity);

        let previous = line.article_id;
        line.article_id = article.id;
        line.variant_id = self.variant_id;
        ctx.storage().store_line(ctx.txn(), &line)?;

        let conclusion = format!(
            "Line {}: article {} replaced by {}",
            line.id, previous, article.name
        );
        commit_line_change(ctx, &mut order, metadata.operator_id, &conclusion)
    }
}
