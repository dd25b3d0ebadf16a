//! Command action implementations
//!
//! Each action implements the `CommandHandler` trait and handles
//! one specific command type.

use crate::orders::traits::{
    ActionOutcome, CommandContext, CommandHandler, CommandMetadata, OrderError,
};
use shared::order::{CommandPayload, FulfillmentCommand};

mod add_line;
mod adjust_stock;
mod create_order;
mod line_support;
mod record_operation;
mod record_partial_delivery;
mod record_return_processing;
mod remove_line;
mod replace_line_article;
mod report_problem;
mod transition_order;
mod update_line_quantity;

#[cfg(test)]
pub(crate) mod fixtures;

pub use add_line::AddLineAction;
pub use adjust_stock::AdjustStockAction;
pub use create_order::CreateOrderAction;
pub use line_support::PricedOrder;
pub use record_operation::RecordOperationAction;
pub use record_partial_delivery::RecordPartialDeliveryAction;
pub use record_return_processing::RecordReturnProcessingAction;
pub use remove_line::RemoveLineAction;
pub use replace_line_article::ReplaceLineArticleAction;
pub use report_problem::ReportProblemAction;
pub use transition_order::TransitionOrderAction;
pub use update_line_quantity::UpdateLineQuantityAction;

/// CommandAction enum - dispatches to concrete action implementations
#[derive(Debug, Clone)]
pub enum CommandAction {
    CreateOrder(CreateOrderAction),
    Transition(TransitionOrderAction),
    ReportProblem(ReportProblemAction),
    AddLine(AddLineAction),
    UpdateLineQuantity(UpdateLineQuantityAction),
    RemoveLine(RemoveLineAction),
    ReplaceLineArticle(ReplaceLineArticleAction),
    RecordPartialDelivery(RecordPartialDeliveryAction),
    RecordReturnProcessing(RecordReturnProcessingAction),
    RecordOperation(RecordOperationAction),
    AdjustStock(AdjustStockAction),
}

impl CommandHandler for CommandAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<ActionOutcome, OrderError> {
        match self {
            CommandAction::CreateOrder(action) => action.execute(ctx, metadata),
            CommandAction::Transition(action) => action.execute(ctx, metadata),
            CommandAction::ReportProblem(action) => action.execute(ctx, metadata),
            CommandAction::AddLine(action) => action.execute(ctx, metadata),
            CommandAction::UpdateLineQuantity(action) => action.execute(ctx, metadata),
            CommandAction::RemoveLine(action) => action.execute(ctx, metadata),
            CommandAction::ReplaceLineArticle(action) => action.execute(ctx, metadata),
            CommandAction::RecordPartialDelivery(action) => action.execute(ctx, metadata),
            CommandAction::RecordReturnProcessing(action) => action.execute(ctx, metadata),
            CommandAction::RecordOperation(action) => action.execute(ctx, metadata),
            CommandAction::AdjustStock(action) => action.execute(ctx, metadata),
        }
    }
}

/// Convert FulfillmentCommand to CommandAction
///
/// This is the ONLY place with a match on CommandPayload.
impl From<&FulfillmentCommand> for CommandAction {
    fn from(cmd: &FulfillmentCommand) -> Self {
        match &cmd.payload {
            CommandPayload::CreateOrder {
                reference,
                client_reference,
                city,
                declared_total,
                delivery_fee,
            } => CommandAction::CreateOrder(CreateOrderAction {
                reference: reference.clone(),
                client_reference: client_reference.clone(),
                city: city.clone(),
                declared_total: *declared_total,
                delivery_fee: *delivery_fee,
            }),
            CommandPayload::Transition {
                order_id,
                target,
                comment,
            } => CommandAction::Transition(TransitionOrderAction {
                order_id: *order_id,
                target: target.clone(),
                comment: comment.clone(),
            }),
            CommandPayload::ReportProblem { order_id, comment } => {
                CommandAction::ReportProblem(ReportProblemAction {
                    order_id: *order_id,
                    comment: comment.clone(),
                })
            }
            CommandPayload::AddLine {
                order_id,
                article_id,
                variant_id,
                quantity,
            } => CommandAction::AddLine(AddLineAction {
                order_id: *order_id,
                article_id: *article_id,
                variant_id: *variant_id,
                quantity: *quantity,
            }),
            CommandPayload::UpdateLineQuantity {
                order_id,
                line_id,
                quantity,
            } => CommandAction::UpdateLineQuantity(UpdateLineQuantityAction {
                order_id: *order_id,
                line_id: *line_id,
                quantity: *quantity,
            }),
            CommandPayload::RemoveLine { order_id, line_id } => {
                CommandAction::RemoveLine(RemoveLineAction {
                    order_id: *order_id,
                    line_id: *line_id,
                })
            }
            CommandPayload::ReplaceLineArticle {
                order_id,
                line_id,
                article_id,
                variant_id,
            } => CommandAction::ReplaceLineArticle(ReplaceLineArticleAction {
                order_id: *order_id,
                line_id: *line_id,
                article_id: *article_id,
                variant_id: *variant_id,
            }),
            CommandPayload::RecordPartialDelivery {
                order_id,
                delivered,
                returned,
            } => CommandAction::RecordPartialDelivery(RecordPartialDeliveryAction {
                order_id: *order_id,
                delivered: delivered.clone(),
                returned: returned.clone(),
            }),
            CommandPayload::RecordReturnProcessing {
                order_id,
                condition,
                comment,
            } => CommandAction::RecordReturnProcessing(RecordReturnProcessingAction {
                order_id: *order_id,
                condition: *condition,
                comment: comment.clone(),
            }),
            CommandPayload::RecordOperation {
                order_id,
                operation_type,
                conclusion,
            } => CommandAction::RecordOperation(RecordOperationAction {
                order_id: *order_id,
                operation_type: operation_type.clone(),
                conclusion: conclusion.clone(),
            }),
            CommandPayload::AdjustStock {
                article_id,
                variant_id,
                delta,
                reason,
            } => CommandAction::AdjustStock(AdjustStockAction {
                article_id: *article_id,
                variant_id: *variant_id,
                delta: *delta,
                reason: reason.clone(),
            }),
        }
    }
}
