//! Command handling seams
//!
//! - [`CommandHandler`]: implemented by every action
//! - [`CommandContext`]: the write transaction plus per-command bookkeeping
//! - [`OrderError`]: domain error taxonomy returned by actions

use super::storage::{OrderStorage, StorageError};
use redb::WriteTransaction;
use shared::models::{Article, Operator};
use shared::order::{FulfillmentEventKind, ItemCondition, LineItem, Order};
use thiserror::Error;

/// Domain errors raised while executing a command
///
/// Any error aborts the surrounding write transaction: a refused command
/// leaves every table exactly as it was.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    OrderNotFound(u64),

    #[error("Order reference already exists: {0}")]
    OrderReferenceExists(String),

    #[error("Line {line_id} not found on order {order_id}")]
    LineNotFound { order_id: u64, line_id: u64 },

    #[error("Article not found: {0}")]
    ArticleNotFound(i64),

    #[error("Variant {variant_id} not found for article {article_id}")]
    VariantNotFound { article_id: i64, variant_id: i64 },

    #[error("Operator not found: {0}")]
    OperatorNotFound(i64),

    /// The order's current state does not allow the requested action
    #[error("{0}")]
    StatePrecondition(String),

    #[error("Unknown state kind: {0}")]
    UnknownStateKind(String),

    #[error("Reconciliation mismatch: {0}")]
    ReconciliationMismatch(String),

    #[error("Return already processed for order {0}")]
    ReturnAlreadyProcessed(u64),

    #[error("Insufficient stock for {slot}: available {available}, requested {requested}")]
    InsufficientStock {
        slot: String,
        available: i64,
        requested: i64,
    },

    /// More than one open state instance, or a dangling current state pointer
    #[error("State ledger corrupted for order {0}")]
    LedgerCorrupted(u64),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Engine switches resolved from configuration
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Allow `RecordReturnProcessing` more than once per order (double credit)
    pub allow_repeated_return_processing: bool,
    /// Condition assumed when no reconciliation data exists for a returned line
    pub default_return_condition: ItemCondition,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            allow_repeated_return_processing: false,
            default_return_condition: ItemCondition::Good,
        }
    }
}

/// Command metadata (who/when/which command)
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub command_id: String,
    pub operator_id: i64,
    pub operator_name: String,
    /// Client timestamp (Unix milliseconds)
    pub timestamp: i64,
}

/// Result of a successful action
#[derive(Debug, Clone, Default)]
pub struct ActionOutcome {
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl ActionOutcome {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }

    /// Attach a serializable payload
    pub fn with_data<T: serde::Serialize>(mut self, data: &T) -> Result<Self, OrderError> {
        self.data = Some(serde_json::to_value(data).map_err(StorageError::from)?);
        Ok(self)
    }
}

/// Event produced by an action, sequenced by the manager at commit time
#[derive(Debug, Clone)]
pub struct PendingEvent {
    pub order_id: Option<u64>,
    pub kind: FulfillmentEventKind,
}

/// Per-command execution context
///
/// Wraps the write transaction. All reads an action uses to check its
/// preconditions must go through this transaction.
pub struct CommandContext<'a> {
    txn: &'a WriteTransaction,
    storage: &'a OrderStorage,
    now: i64,
    options: EngineOptions,
    warnings: Vec<String>,
    events: Vec<PendingEvent>,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        txn: &'a WriteTransaction,
        storage: &'a OrderStorage,
        now: i64,
        options: EngineOptions,
    ) -> Self {
        Self {
            txn,
            storage,
            now,
            options,
            warnings: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn txn(&self) -> &'a WriteTransaction {
        self.txn
    }

    pub fn storage(&self) -> &'a OrderStorage {
        self.storage
    }

    /// Server time of this command (Unix milliseconds)
    pub fn now(&self) -> i64 {
        self.now
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    pub fn next_id(&self, name: &str) -> Result<u64, OrderError> {
        Ok(self.storage.next_id(self.txn, name)?)
    }

    // ========== Loading ==========

    pub fn load_order(&self, order_id: u64) -> Result<Order, OrderError> {
        self.storage
            .get_order(self.txn, order_id)?
            .ok_or(OrderError::OrderNotFound(order_id))
    }

    pub fn load_line(&self, order_id: u64, line_id: u64) -> Result<LineItem, OrderError> {
        self.storage
            .get_line(self.txn, order_id, line_id)?
            .ok_or(OrderError::LineNotFound { order_id, line_id })
    }

    pub fn load_lines(&self, order_id: u64) -> Result<Vec<LineItem>, OrderError> {
        Ok(self.storage.get_lines(self.txn, order_id)?)
    }

    pub fn load_article(&self, article_id: i64) -> Result<Article, OrderError> {
        self.storage
            .get_article(self.txn, article_id)?
            .ok_or(OrderError::ArticleNotFound(article_id))
    }

    /// Load an article and check that `variant_id` (if any) belongs to it
    pub fn load_article_slot(
        &self,
        article_id: i64,
        variant_id: Option<i64>,
    ) -> Result<Article, OrderError> {
        let article = self.load_article(article_id)?;
        if let Some(variant_id) = variant_id
            && article.variant(variant_id).is_none()
        {
            return Err(OrderError::VariantNotFound {
                article_id,
                variant_id,
            });
        }
        Ok(article)
    }

    pub fn find_operator(&self, operator_id: i64) -> Result<Option<Operator>, OrderError> {
        Ok(self.storage.get_operator(self.txn, operator_id)?)
    }

    // ========== Saving ==========

    /// Persist an order, bumping its version and `updated_at`
    pub fn save_order(&self, order: &mut Order) -> Result<(), OrderError> {
        order.version += 1;
        order.updated_at = self.now;
        self.storage.store_order(self.txn, order)?;
        Ok(())
    }

    // ========== Warnings / events ==========

    /// Record a non-fatal notice returned to the caller
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn emit(&mut self, order_id: Option<u64>, kind: FulfillmentEventKind) {
        self.events.push(PendingEvent { order_id, kind });
    }

    /// Consume the context, returning warnings and pending events
    pub fn finish(self) -> (Vec<String>, Vec<PendingEvent>) {
        (self.warnings, self.events)
    }
}

/// Command handler implemented by every action
///
/// Execution is synchronous: everything happens inside one redb write
/// transaction owned by the manager.
pub trait CommandHandler {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<ActionOutcome, OrderError>;
}
