//! FulfillmentManager - Core command processing
//!
//! This module handles:
//! - Command validation and processing
//! - Persistence to redb (one write transaction per command)
//! - Event broadcasting after commit
//! - Catalog / operator administration and read queries
//!
//! # Command Flow
//!
//! ```text
//! execute_command(cmd)
//!     ├─ 1. Idempotency check (command_id)
//!     ├─ 2. Begin write transaction
//!     ├─ 3. Double-check idempotency, resolve operator
//!     ├─ 4. Convert command to action and execute
//!     ├─ 5. Sequence pending events
//!     ├─ 6. Mark command processed
//!     ├─ 7. Commit transaction
//!     ├─ 8. Broadcast event(s)
//!     └─ 9. Return response
//! ```
//!
//! redb allows a single write transaction at a time and every precondition
//! is read inside it, so two commands on the same order are serialized: the
//! second one sees the first one's committed state.

mod error;
pub use error::*;

use super::actions::CommandAction;
use super::ledger;
use super::storage::{OrderStorage, StorageError, counter};
use super::traits::{CommandContext, CommandHandler, CommandMetadata, EngineOptions};
use crate::inventory::{StockChange, adjust_stock};
use crate::reconciliation;
use shared::models::{Article, Operation, Operator, StockKey, StockMovement};
use shared::order::{
    CommandResponse, FulfillmentCommand, FulfillmentEvent, LineItem, Order, ReconciliationRecord,
    ReturnConditionRecap, StateInstance,
};
use std::path::Path;
use tokio::sync::broadcast;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// Operator id recorded on movements written by administration (no human actor)
pub const SYSTEM_OPERATOR_ID: i64 = 0;

/// FulfillmentManager for command processing
#[derive(Clone)]
pub struct FulfillmentManager {
    storage: OrderStorage,
    event_tx: broadcast::Sender<FulfillmentEvent>,
    options: EngineOptions,
}

impl std::fmt::Debug for FulfillmentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FulfillmentManager")
            .field("storage", &"<OrderStorage>")
            .field("event_tx", &"<broadcast::Sender>")
            .field("options", &self.options)
            .finish()
    }
}

impl FulfillmentManager {
    /// Create a new FulfillmentManager with the given database path
    pub fn new(db_path: impl AsRef<Path>, options: EngineOptions) -> ManagerResult<Self> {
        let storage = OrderStorage::open(db_path)?;
        tracing::info!(?options, "FulfillmentManager started");
        Ok(Self::from_parts(storage, options))
    }

    /// Create a FulfillmentManager with existing storage (for testing)
    #[cfg(test)]
    pub fn with_storage(storage: OrderStorage, options: EngineOptions) -> Self {
        Self::from_parts(storage, options)
    }

    fn from_parts(storage: OrderStorage, options: EngineOptions) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            storage,
            event_tx,
            options,
        }
    }

    /// Subscribe to event broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<FulfillmentEvent> {
        self.event_tx.subscribe()
    }

    /// Get the underlying storage
    pub fn storage(&self) -> &OrderStorage {
        &self.storage
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Execute a command and return the response
    pub fn execute_command(&self, cmd: FulfillmentCommand) -> CommandResponse {
        let command_id = cmd.command_id.clone();
        match self.process_command(cmd) {
            Ok((response, events)) => {
                // Broadcast events after successful commit
                for event in events {
                    if self.event_tx.send(event).is_err() {
                        tracing::trace!("Event broadcast skipped: no active receivers");
                        break;
                    }
                }
                response
            }
            Err(err) => {
                tracing::debug!(command_id = %command_id, error = %err, "Command refused");
                CommandResponse::error(command_id, err.into())
            }
        }
    }

    /// Process command and return response with events
    ///
    /// Any error drops the write transaction, which aborts it: a refused
    /// command leaves no trace.
    fn process_command(
        &self,
        cmd: FulfillmentCommand,
    ) -> ManagerResult<(CommandResponse, Vec<FulfillmentEvent>)> {
        tracing::debug!(
            command_id = %cmd.command_id,
            command = cmd.payload.name(),
            payload = ?cmd.payload,
            "Processing command"
        );

        // 1. Idempotency check (before transaction)
        if self.storage.is_command_processed(&cmd.command_id)? {
            tracing::warn!(command_id = %cmd.command_id, "Duplicate command");
            return Ok((CommandResponse::duplicate(cmd.command_id), vec![]));
        }

        // 2. Begin write transaction
        let txn = self.storage.begin_write()?;

        // 3. Double-check idempotency within transaction
        if self
            .storage
            .is_command_processed_txn(&txn, &cmd.command_id)?
        {
            return Ok((CommandResponse::duplicate(cmd.command_id), vec![]));
        }

        // 只接受已登记的操作员
        if self.storage.get_operator(&txn, cmd.operator_id)?.is_none() {
            return Err(ManagerError::OperatorNotFound(cmd.operator_id));
        }

        // 4. Create context and execute
        let now = shared::util::now_millis();
        let mut ctx = CommandContext::new(&txn, &self.storage, now, self.options);
        let metadata = CommandMetadata {
            command_id: cmd.command_id.clone(),
            operator_id: cmd.operator_id,
            operator_name: cmd.operator_name.clone(),
            timestamp: cmd.timestamp,
        };
        let action = CommandAction::from(&cmd);
        let outcome = action.execute(&mut ctx, &metadata)?;
        let (warnings, pending) = ctx.finish();

        // 5. Sequence events
        let mut events = Vec::with_capacity(pending.len());
        for pending in pending {
            events.push(FulfillmentEvent {
                sequence: self.storage.next_id(&txn, counter::EVENT)?,
                order_id: pending.order_id,
                command_id: cmd.command_id.clone(),
                timestamp: now,
                kind: pending.kind,
            });
        }

        // 6. Mark command processed
        self.storage.mark_command_processed(&txn, &cmd.command_id)?;

        // 7. Commit transaction
        txn.commit().map_err(StorageError::from)?;

        let order_id = cmd.order_id();
        tracing::info!(
            command_id = %cmd.command_id,
            command = cmd.payload.name(),
            order_id = ?order_id,
            event_count = events.len(),
            warning_count = warnings.len(),
            "Command processed successfully"
        );
        Ok((
            CommandResponse::success(cmd.command_id, outcome.message, outcome.data, warnings),
            events,
        ))
    }

    // ========== Administration ==========

    /// Create or update a catalog article
    ///
    /// Stock of an existing article (and of its existing variants) is kept;
    /// the quantities of new slots are booked as opening stock movements.
    pub fn upsert_article(&self, article: Article) -> ManagerResult<Article> {
        if article.name.trim().is_empty() {
            return Err(ManagerError::InvalidOperation(
                "Article name must not be empty".to_string(),
            ));
        }
        if article.base_price.is_sign_negative() {
            return Err(ManagerError::InvalidOperation(
                "Article price must not be negative".to_string(),
            ));
        }
        if article.available_quantity < 0
            || article.variants.iter().any(|v| v.available_quantity < 0)
        {
            return Err(ManagerError::InvalidOperation(
                "Opening stock must not be negative".to_string(),
            ));
        }

        let txn = self.storage.begin_write()?;
        let existing = self.storage.get_article(&txn, article.id)?;

        // 新库存位先以 0 入库，再通过库存流水记入期初数量
        let mut stored = article.clone();
        let mut openings = Vec::new();
        match &existing {
            Some(current) => stored.available_quantity = current.available_quantity,
            None => {
                stored.available_quantity = 0;
                openings.push((StockKey::new(article.id, None), article.available_quantity));
            }
        }
        for variant in &mut stored.variants {
            match existing.as_ref().and_then(|c| c.variant(variant.id)) {
                Some(current) => variant.available_quantity = current.available_quantity,
                None => {
                    openings.push((
                        StockKey::new(article.id, Some(variant.id)),
                        variant.available_quantity,
                    ));
                    variant.available_quantity = 0;
                }
            }
        }
        self.storage.store_article(&txn, &stored)?;

        let ctx = CommandContext::new(
            &txn,
            &self.storage,
            shared::util::now_millis(),
            self.options,
        );
        for (key, quantity) in openings.into_iter().filter(|(_, q)| *q > 0) {
            adjust_stock(
                &ctx,
                StockChange {
                    key,
                    delta: quantity,
                    reason: "Opening stock",
                    order_reference: None,
                    operator_id: SYSTEM_OPERATOR_ID,
                },
            )?;
        }
        drop(ctx);

        let saved = self
            .storage
            .get_article(&txn, article.id)?
            .ok_or(ManagerError::ArticleNotFound(article.id))?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            article_id = saved.id,
            created = existing.is_none(),
            "Article upserted"
        );
        Ok(saved)
    }

    /// Register (or update) an operator of the directory
    pub fn register_operator(&self, operator: Operator) -> ManagerResult<()> {
        if operator.name.trim().is_empty() {
            return Err(ManagerError::InvalidOperation(
                "Operator name must not be empty".to_string(),
            ));
        }
        let txn = self.storage.begin_write()?;
        self.storage.store_operator(&txn, &operator)?;
        txn.commit().map_err(StorageError::from)?;
        tracing::info!(
            operator_id = operator.id,
            role = operator.role.as_str(),
            "Operator registered"
        );
        Ok(())
    }

    // ========== Public Query Methods ==========

    pub fn get_order(&self, order_id: u64) -> ManagerResult<Option<Order>> {
        let txn = self.storage.begin_read()?;
        Ok(self.storage.get_order(&txn, order_id)?)
    }

    pub fn find_order_by_reference(&self, reference: &str) -> ManagerResult<Option<Order>> {
        let txn = self.storage.begin_read()?;
        match self.storage.find_order_by_reference(&txn, reference)? {
            Some(order_id) => Ok(self.storage.get_order(&txn, order_id)?),
            None => Ok(None),
        }
    }

    pub fn list_orders(&self) -> ManagerResult<Vec<Order>> {
        let txn = self.storage.begin_read()?;
        Ok(self.storage.get_orders(&txn)?)
    }

    /// Open state instance of an order (`None` before the first transition)
    pub fn current_state(&self, order_id: u64) -> ManagerResult<Option<StateInstance>> {
        let txn = self.storage.begin_read()?;
        let order = self.require_order(&txn, order_id)?;
        Ok(ledger::current_state(&self.storage, &txn, &order)?)
    }

    /// Previous meaningful state (preparation-phase kinds skipped)
    pub fn previous_state(&self, order_id: u64) -> ManagerResult<Option<StateInstance>> {
        let txn = self.storage.begin_read()?;
        let order = self.require_order(&txn, order_id)?;
        Ok(ledger::previous_state(&self.storage, &txn, &order)?)
    }

    /// Full state history, oldest first
    pub fn state_history(&self, order_id: u64) -> ManagerResult<Vec<StateInstance>> {
        let txn = self.storage.begin_read()?;
        self.require_order(&txn, order_id)?;
        Ok(ledger::state_history(&self.storage, &txn, order_id)?)
    }

    pub fn line_items(&self, order_id: u64) -> ManagerResult<Vec<LineItem>> {
        let txn = self.storage.begin_read()?;
        self.require_order(&txn, order_id)?;
        Ok(self.storage.get_lines(&txn, order_id)?)
    }

    /// Audit trail of an order, in append order
    pub fn operations_for_order(&self, order_id: u64) -> ManagerResult<Vec<Operation>> {
        let txn = self.storage.begin_read()?;
        self.require_order(&txn, order_id)?;
        Ok(self.storage.get_operations(&txn, order_id)?)
    }

    /// Operation type labels registered on the fly
    pub fn registered_operation_types(&self) -> ManagerResult<Vec<String>> {
        let txn = self.storage.begin_read()?;
        Ok(self.storage.get_operation_types(&txn)?)
    }

    pub fn reconciliation_for(&self, order_id: u64) -> ManagerResult<Option<ReconciliationRecord>> {
        let txn = self.storage.begin_read()?;
        Ok(self.storage.get_reconciliation(&txn, order_id)?)
    }

    /// Per-article condition recap of a returned or resend order
    pub fn return_condition_recap(&self, order_id: u64) -> ManagerResult<ReturnConditionRecap> {
        let txn = self.storage.begin_read()?;
        let order = self.require_order(&txn, order_id)?;
        Ok(reconciliation::return_condition_recap(
            &self.storage,
            &txn,
            &order,
            self.options.default_return_condition,
        )?)
    }

    /// Resend orders forked from `order_id`
    ///
    /// Follows the fork links first, then the `RESEND-` reference convention
    /// restricted to the same client.
    pub fn find_resend_orders(&self, order_id: u64) -> ManagerResult<Vec<Order>> {
        let txn = self.storage.begin_read()?;
        let origin = self.require_order(&txn, order_id)?;

        let mut resends = Vec::new();
        for resend_id in self.storage.get_forks(&txn, order_id)? {
            if let Some(order) = self.storage.get_order(&txn, resend_id)? {
                resends.push(order);
            }
        }

        let by_reference = Order::resend_reference(&origin.reference);
        if let Some(resend_id) = self.storage.find_order_by_reference(&txn, &by_reference)?
            && !resends.iter().any(|o| o.id == resend_id)
            && let Some(order) = self.storage.get_order(&txn, resend_id)?
            && order.client_reference == origin.client_reference
        {
            resends.push(order);
        }
        Ok(resends)
    }

    pub fn stock_movements_for(&self, article_id: i64) -> ManagerResult<Vec<StockMovement>> {
        let txn = self.storage.begin_read()?;
        Ok(self.storage.get_stock_movements(&txn, article_id)?)
    }

    pub fn get_article(&self, article_id: i64) -> ManagerResult<Option<Article>> {
        let txn = self.storage.begin_read()?;
        Ok(self.storage.get_article(&txn, article_id)?)
    }

    fn require_order(&self, txn: &redb::ReadTransaction, order_id: u64) -> ManagerResult<Order> {
        self.storage
            .get_order(txn, order_id)?
            .ok_or(ManagerError::OrderNotFound(order_id))
    }
}

#[cfg(test)]
mod tests;
