//! CreateOrder command handler
//!
//! Intake entry point: registers an order with no lines and no state yet.

use crate::orders::storage::counter;
use crate::orders::traits::{
    ActionOutcome, CommandContext, CommandHandler, CommandMetadata, OrderError,
};
use rust_decimal::Decimal;
use shared::order::{FulfillmentEventKind, Order, RESEND_PREFIX};

/// CreateOrder action
#[derive(Debug, Clone)]
pub struct CreateOrderAction {
    pub reference: String,
    pub client_reference: String,
    pub city: String,
    pub declared_total: Decimal,
    pub delivery_fee: Decimal,
}

impl CommandHandler for CreateOrderAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<ActionOutcome, OrderError> {
        // 1. Validate input
        let reference = self.reference.trim();
        if reference.is_empty() {
            return Err(OrderError::InvalidOperation(
                "Order reference must not be empty".to_string(),
            ));
        }
        if reference.starts_with(RESEND_PREFIX) {
            return Err(OrderError::InvalidOperation(format!(
                "References starting with {} are reserved for resend orders",
                RESEND_PREFIX
            )));
        }
        let client_reference = self.client_reference.trim();
        if client_reference.is_empty() {
            return Err(OrderError::InvalidOperation(
                "Client reference must not be empty".to_string(),
            ));
        }
        if self.declared_total.is_sign_negative() || self.delivery_fee.is_sign_negative() {
            return Err(OrderError::InvalidOperation(
                "Amounts must not be negative".to_string(),
            ));
        }

        // 2. Reference must be unique
        if ctx
            .storage()
            .find_order_by_reference(ctx.txn(), reference)?
            .is_some()
        {
            return Err(OrderError::OrderReferenceExists(reference.to_string()));
        }

        // 3. Confirmation operators keep the orders they create
        let assigned_operator_id = ctx
            .find_operator(metadata.operator_id)?
            .filter(|op| op.is_confirmation())
            .map(|op| op.id);

        // 4. Persist
        let now = ctx.now();
        let mut order = Order {
            id: ctx.next_id(counter::ORDER)?,
            reference: reference.to_string(),
            client_reference: client_reference.to_string(),
            city: self.city.trim().to_string(),
            declared_total: self.declared_total,
            delivery_fee: self.delivery_fee,
            upsell_counter: 0,
            total: Decimal::ZERO,
            current_state_id: None,
            current_state: None,
            forked_from_order_id: None,
            assigned_operator_id,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        ctx.save_order(&mut order)?;
        ctx.storage()
            .index_order_reference(ctx.txn(), &order.reference, order.id)?;

        ctx.emit(
            Some(order.id),
            FulfillmentEventKind::OrderCreated {
                reference: order.reference.clone(),
            },
        );

        ActionOutcome::new(format!("Order {} created", order.reference)).with_data(&order)
    }
}
