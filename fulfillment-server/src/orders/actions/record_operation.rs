//! RecordOperation command handler
//!
//! Free audit entry on an order. The operation type is an open set: unknown
//! labels are registered on first use and reported back as a warning.

use crate::audit;
use crate::orders::traits::{
    ActionOutcome, CommandContext, CommandHandler, CommandMetadata, OrderError,
};
use shared::models::OperationType;
use shared::order::FulfillmentEventKind;

/// RecordOperation action
#[derive(Debug, Clone)]
pub struct RecordOperationAction {
    pub order_id: u64,
    pub operation_type: String,
    pub conclusion: String,
}

impl CommandHandler for RecordOperationAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<ActionOutcome, OrderError> {
        // Order must exist
        let order = ctx.load_order(self.order_id)?;

        let operation_type = OperationType::from_label(&self.operation_type);
        let operation = audit::record(
            ctx,
            order.id,
            operation_type,
            metadata.operator_id,
            &self.conclusion,
        )?;

        ctx.emit(
            Some(order.id),
            FulfillmentEventKind::OperationRecorded {
                operation_id: operation.id,
                operation_type: operation.operation_type.to_string(),
            },
        );
        ActionOutcome::new(format!(
            "{} recorded on {}",
            operation.operation_type, order.reference
        ))
        .with_data(&operation)
    }
}
