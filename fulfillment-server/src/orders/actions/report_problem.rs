//! ReportProblem command handler
//!
//! A preparer sends an order back to confirmation with a description of the
//! problem. The order is handed to the confirmation operator found in its
//! history, or left in the unassigned pool.

use crate::orders::traits::{
    ActionOutcome, CommandContext, CommandHandler, CommandMetadata, OrderError,
};
use crate::orders::transition::apply_transition;
use shared::order::TransitionEvent;

/// ReportProblem action
#[derive(Debug, Clone)]
pub struct ReportProblemAction {
    pub order_id: u64,
    pub comment: String,
}

impl CommandHandler for ReportProblemAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<ActionOutcome, OrderError> {
        if self.comment.trim().is_empty() {
            return Err(OrderError::InvalidOperation(
                "A problem report needs a description".to_string(),
            ));
        }

        let mut order = ctx.load_order(self.order_id)?;
        apply_transition(
            ctx,
            &mut order,
            TransitionEvent::ReportProblem,
            metadata.operator_id,
            Some(&self.comment),
        )?;

        let message = match order.assigned_operator_id {
            Some(operator_id) => format!(
                "Order {} sent back to confirmation operator {}",
                order.reference, operator_id
            ),
            None => format!(
                "Order {} queued for confirmation (unassigned)",
                order.reference
            ),
        };
        ActionOutcome::new(message).with_data(&order)
    }
}
