//! redb-based storage layer for the fulfillment engine
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` | Orders |
//! | `order_references` | `reference` | `order_id` | Unique external reference index |
//! | `line_items` | `(order_id, line_id)` | `LineItem` | Line items |
//! | `state_instances` | `(order_id, instance_id)` | `StateInstance` | State ledger (append, close only) |
//! | `articles` | `article_id` | `Article` | Catalog + available quantity |
//! | `stock_movements` | `(article_id, movement_id)` | `StockMovement` | Inventory ledger (append-only) |
//! | `operators` | `operator_id` | `Operator` | Operator directory |
//! | `operations` | `(order_id, operation_id)` | `Operation` | Audit log (append-only) |
//! | `operation_types` | `label` | registered_at | Open set of audit tags |
//! | `reconciliations` | `order_id` | `ReconciliationRecord` | Partial delivery records |
//! | `forks` | `(origin_id, resend_id)` | `()` | Origin → resend order index |
//! | `return_processing` | `order_id` | `u32` | Return processing count |
//! | `processed_commands` | `command_id` | `()` | Idempotency check |
//! | `counters` | name | `u64` | Id allocation and event sequence |
//!
//! Values are JSON-serialized. Every mutating command runs inside a single
//! `WriteTransaction`; redb allows one writer at a time, so reads performed
//! inside that transaction cannot be invalidated by a concurrent command.

use redb::{
    Database, Key, ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition, Value,
    WriteTransaction,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::models::{Article, Operator, Operation, StockMovement};
use shared::order::{LineItem, Order, ReconciliationRecord, StateInstance};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

const ORDERS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("orders");

const ORDER_REFERENCES_TABLE: TableDefinition<&str, u64> =
    TableDefinition::new("order_references");

const LINE_ITEMS_TABLE: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("line_items");

const STATE_INSTANCES_TABLE: TableDefinition<(u64, u64), &[u8]> =
    TableDefinition::new("state_instances");

const ARTICLES_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("articles");

const STOCK_MOVEMENTS_TABLE: TableDefinition<(i64, u64), &[u8]> =
    TableDefinition::new("stock_movements");

const OPERATORS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("operators");

const OPERATIONS_TABLE: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("operations");

const OPERATION_TYPES_TABLE: TableDefinition<&str, i64> = TableDefinition::new("operation_types");

const RECONCILIATIONS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("reconciliations");

const FORKS_TABLE: TableDefinition<(u64, u64), ()> = TableDefinition::new("forks");

const RETURN_PROCESSING_TABLE: TableDefinition<u64, u32> =
    TableDefinition::new("return_processing");

/// Table for tracking processed commands: key = command_id, value = empty (idempotency)
const PROCESSED_COMMANDS_TABLE: TableDefinition<&str, ()> =
    TableDefinition::new("processed_commands");

const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Counter names in `counters`
pub mod counter {
    pub const ORDER: &str = "order";
    pub const LINE: &str = "line";
    pub const STATE: &str = "state";
    pub const OPERATION: &str = "operation";
    pub const MOVEMENT: &str = "movement";
    pub const EVENT: &str = "event";
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Read access shared by write and read transactions
///
/// Lets every query run either inside the command's write transaction
/// (precondition checks) or in a standalone read transaction (read API).
/// Do not keep the returned handle alive while writing to the same table.
pub trait TableReader {
    fn read_table<K: Key + 'static, V: Value + 'static>(
        &self,
        def: TableDefinition<'static, K, V>,
    ) -> StorageResult<impl ReadableTable<K, V> + '_>;
}

impl TableReader for WriteTransaction {
    fn read_table<K: Key + 'static, V: Value + 'static>(
        &self,
        def: TableDefinition<'static, K, V>,
    ) -> StorageResult<impl ReadableTable<K, V> + '_> {
        Ok(self.open_table(def)?)
    }
}

impl TableReader for ReadTransaction {
    fn read_table<K: Key + 'static, V: Value + 'static>(
        &self,
        def: TableDefinition<'static, K, V>,
    ) -> StorageResult<impl ReadableTable<K, V> + '_> {
        Ok(self.open_table(def)?)
    }
}

fn encode<T: Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Fulfillment storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl OrderStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits are durable once `commit()` returns (copy-on-write with
    /// an atomic root swap), so a crash never leaves a half-applied command.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    fn init_tables(db: &Database) -> StorageResult<()> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_REFERENCES_TABLE)?;
            let _ = write_txn.open_table(LINE_ITEMS_TABLE)?;
            let _ = write_txn.open_table(STATE_INSTANCES_TABLE)?;
            let _ = write_txn.open_table(ARTICLES_TABLE)?;
            let _ = write_txn.open_table(STOCK_MOVEMENTS_TABLE)?;
            let _ = write_txn.open_table(OPERATORS_TABLE)?;
            let _ = write_txn.open_table(OPERATIONS_TABLE)?;
            let _ = write_txn.open_table(OPERATION_TYPES_TABLE)?;
            let _ = write_txn.open_table(RECONCILIATIONS_TABLE)?;
            let _ = write_txn.open_table(FORKS_TABLE)?;
            let _ = write_txn.open_table(RETURN_PROCESSING_TABLE)?;
            let _ = write_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
            let _ = write_txn.open_table(COUNTERS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Begin a read transaction
    pub fn begin_read(&self) -> StorageResult<ReadTransaction> {
        Ok(self.db.begin_read()?)
    }

    // ========== Counters ==========

    /// Increment a counter and return the new value (ids start at 1)
    pub fn next_id(&self, txn: &WriteTransaction, name: &str) -> StorageResult<u64> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table.get(name)?.map(|guard| guard.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(name, next)?;
        Ok(next)
    }

    /// Current counter value (0 if never incremented)
    pub fn current_counter<R: TableReader>(&self, txn: &R, name: &str) -> StorageResult<u64> {
        let table = txn.read_table(COUNTERS_TABLE)?;
        Ok(table.get(name)?.map(|guard| guard.value()).unwrap_or(0))
    }

    // ========== Idempotency ==========

    /// Check if a command has been processed (read-only)
    pub fn is_command_processed(&self, command_id: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        self.is_command_processed_txn(&read_txn, command_id)
    }

    /// Check if a command has been processed (within transaction)
    pub fn is_command_processed_txn<R: TableReader>(
        &self,
        txn: &R,
        command_id: &str,
    ) -> StorageResult<bool> {
        let table = txn.read_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    /// Mark a command as processed
    pub fn mark_command_processed(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        table.insert(command_id, ())?;
        Ok(())
    }

    // ========== Orders ==========

    pub fn store_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let bytes = encode(order)?;
        let mut table = txn.open_table(ORDERS_TABLE)?;
        table.insert(order.id, bytes.as_slice())?;
        Ok(())
    }

    pub fn get_order<R: TableReader>(
        &self,
        txn: &R,
        order_id: u64,
    ) -> StorageResult<Option<Order>> {
        let table = txn.read_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All orders, by id
    pub fn get_orders<R: TableReader>(&self, txn: &R) -> StorageResult<Vec<Order>> {
        let table = txn.read_table(ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            orders.push(decode(value.value())?);
        }
        Ok(orders)
    }

    pub fn index_order_reference(
        &self,
        txn: &WriteTransaction,
        reference: &str,
        order_id: u64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(ORDER_REFERENCES_TABLE)?;
        table.insert(reference, order_id)?;
        Ok(())
    }

    pub fn find_order_by_reference<R: TableReader>(
        &self,
        txn: &R,
        reference: &str,
    ) -> StorageResult<Option<u64>> {
        let table = txn.read_table(ORDER_REFERENCES_TABLE)?;
        Ok(table.get(reference)?.map(|guard| guard.value()))
    }

    // ========== Line Items ==========

    pub fn store_line(&self, txn: &WriteTransaction, line: &LineItem) -> StorageResult<()> {
        let bytes = encode(line)?;
        let mut table = txn.open_table(LINE_ITEMS_TABLE)?;
        table.insert((line.order_id, line.id), bytes.as_slice())?;
        Ok(())
    }

    pub fn remove_line(
        &self,
        txn: &WriteTransaction,
        order_id: u64,
        line_id: u64,
    ) -> StorageResult<bool> {
        let mut table = txn.open_table(LINE_ITEMS_TABLE)?;
        let removed = table.remove((order_id, line_id))?.is_some();
        Ok(removed)
    }

    pub fn get_line<R: TableReader>(
        &self,
        txn: &R,
        order_id: u64,
        line_id: u64,
    ) -> StorageResult<Option<LineItem>> {
        let table = txn.read_table(LINE_ITEMS_TABLE)?;
        match table.get((order_id, line_id))? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Line items of an order, by line id
    pub fn get_lines<R: TableReader>(
        &self,
        txn: &R,
        order_id: u64,
    ) -> StorageResult<Vec<LineItem>> {
        let table = txn.read_table(LINE_ITEMS_TABLE)?;
        let mut lines = Vec::new();
        for entry in table.range((order_id, 0)..=(order_id, u64::MAX))? {
            let (_, value) = entry?;
            lines.push(decode(value.value())?);
        }
        Ok(lines)
    }

    // ========== State Ledger ==========

    pub fn store_state_instance(
        &self,
        txn: &WriteTransaction,
        instance: &StateInstance,
    ) -> StorageResult<()> {
        let bytes = encode(instance)?;
        let mut table = txn.open_table(STATE_INSTANCES_TABLE)?;
        table.insert((instance.order_id, instance.id), bytes.as_slice())?;
        Ok(())
    }

    pub fn get_state_instance<R: TableReader>(
        &self,
        txn: &R,
        order_id: u64,
        instance_id: u64,
    ) -> StorageResult<Option<StateInstance>> {
        let table = txn.read_table(STATE_INSTANCES_TABLE)?;
        match table.get((order_id, instance_id))? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    /// State history of an order, oldest first (ids are allocated in time order)
    pub fn get_state_instances<R: TableReader>(
        &self,
        txn: &R,
        order_id: u64,
    ) -> StorageResult<Vec<StateInstance>> {
        let table = txn.read_table(STATE_INSTANCES_TABLE)?;
        let mut instances = Vec::new();
        for entry in table.range((order_id, 0)..=(order_id, u64::MAX))? {
            let (_, value) = entry?;
            instances.push(decode(value.value())?);
        }
        Ok(instances)
    }

    // ========== Catalog / Inventory ==========

    pub fn store_article(&self, txn: &WriteTransaction, article: &Article) -> StorageResult<()> {
        let bytes = encode(article)?;
        let mut table = txn.open_table(ARTICLES_TABLE)?;
        table.insert(article.id, bytes.as_slice())?;
        Ok(())
    }

    pub fn get_article<R: TableReader>(
        &self,
        txn: &R,
        article_id: i64,
    ) -> StorageResult<Option<Article>> {
        let table = txn.read_table(ARTICLES_TABLE)?;
        match table.get(article_id)? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn append_stock_movement(
        &self,
        txn: &WriteTransaction,
        movement: &StockMovement,
    ) -> StorageResult<()> {
        let bytes = encode(movement)?;
        let mut table = txn.open_table(STOCK_MOVEMENTS_TABLE)?;
        table.insert((movement.article_id, movement.id), bytes.as_slice())?;
        Ok(())
    }

    /// Stock movements of an article (all variants), oldest first
    pub fn get_stock_movements<R: TableReader>(
        &self,
        txn: &R,
        article_id: i64,
    ) -> StorageResult<Vec<StockMovement>> {
        let table = txn.read_table(STOCK_MOVEMENTS_TABLE)?;
        let mut movements = Vec::new();
        for entry in table.range((article_id, 0)..=(article_id, u64::MAX))? {
            let (_, value) = entry?;
            movements.push(decode(value.value())?);
        }
        Ok(movements)
    }

    // ========== Operators ==========

    pub fn store_operator(&self, txn: &WriteTransaction, operator: &Operator) -> StorageResult<()> {
        let bytes = encode(operator)?;
        let mut table = txn.open_table(OPERATORS_TABLE)?;
        table.insert(operator.id, bytes.as_slice())?;
        Ok(())
    }

    pub fn get_operator<R: TableReader>(
        &self,
        txn: &R,
        operator_id: i64,
    ) -> StorageResult<Option<Operator>> {
        let table = txn.read_table(OPERATORS_TABLE)?;
        match table.get(operator_id)? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    // ========== Audit Log ==========

    pub fn append_operation(
        &self,
        txn: &WriteTransaction,
        operation: &Operation,
    ) -> StorageResult<()> {
        let bytes = encode(operation)?;
        let mut table = txn.open_table(OPERATIONS_TABLE)?;
        table.insert((operation.order_id, operation.id), bytes.as_slice())?;
        Ok(())
    }

    /// Audit entries of an order, oldest first
    pub fn get_operations<R: TableReader>(
        &self,
        txn: &R,
        order_id: u64,
    ) -> StorageResult<Vec<Operation>> {
        let table = txn.read_table(OPERATIONS_TABLE)?;
        let mut operations = Vec::new();
        for entry in table.range((order_id, 0)..=(order_id, u64::MAX))? {
            let (_, value) = entry?;
            operations.push(decode(value.value())?);
        }
        Ok(operations)
    }

    pub fn is_operation_type_registered<R: TableReader>(
        &self,
        txn: &R,
        label: &str,
    ) -> StorageResult<bool> {
        let table = txn.read_table(OPERATION_TYPES_TABLE)?;
        Ok(table.get(label)?.is_some())
    }

    pub fn register_operation_type(
        &self,
        txn: &WriteTransaction,
        label: &str,
        registered_at: i64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(OPERATION_TYPES_TABLE)?;
        table.insert(label, registered_at)?;
        Ok(())
    }

    /// Registered audit tags (labels outside the known set)
    pub fn get_operation_types<R: TableReader>(&self, txn: &R) -> StorageResult<Vec<String>> {
        let table = txn.read_table(OPERATION_TYPES_TABLE)?;
        let mut labels = Vec::new();
        for entry in table.iter()? {
            let (key, _) = entry?;
            labels.push(key.value().to_string());
        }
        Ok(labels)
    }

    // ========== Reconciliation ==========

    pub fn store_reconciliation(
        &self,
        txn: &WriteTransaction,
        record: &ReconciliationRecord,
    ) -> StorageResult<()> {
        let bytes = encode(record)?;
        let mut table = txn.open_table(RECONCILIATIONS_TABLE)?;
        table.insert(record.order_id, bytes.as_slice())?;
        Ok(())
    }

    pub fn get_reconciliation<R: TableReader>(
        &self,
        txn: &R,
        order_id: u64,
    ) -> StorageResult<Option<ReconciliationRecord>> {
        let table = txn.read_table(RECONCILIATIONS_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn link_fork(
        &self,
        txn: &WriteTransaction,
        origin_id: u64,
        resend_id: u64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(FORKS_TABLE)?;
        table.insert((origin_id, resend_id), ())?;
        Ok(())
    }

    /// Resend orders forked from `origin_id`
    pub fn get_forks<R: TableReader>(&self, txn: &R, origin_id: u64) -> StorageResult<Vec<u64>> {
        let table = txn.read_table(FORKS_TABLE)?;
        let mut forks = Vec::new();
        for entry in table.range((origin_id, 0)..=(origin_id, u64::MAX))? {
            let (key, _) = entry?;
            forks.push(key.value().1);
        }
        Ok(forks)
    }

    pub fn return_processing_count<R: TableReader>(
        &self,
        txn: &R,
        order_id: u64,
    ) -> StorageResult<u32> {
        let table = txn.read_table(RETURN_PROCESSING_TABLE)?;
        Ok(table.get(order_id)?.map(|guard| guard.value()).unwrap_or(0))
    }

    /// Increment the return processing count, returning the new count
    pub fn increment_return_processing(
        &self,
        txn: &WriteTransaction,
        order_id: u64,
    ) -> StorageResult<u32> {
        let mut table = txn.open_table(RETURN_PROCESSING_TABLE)?;
        let current = table.get(order_id)?.map(|guard| guard.value()).unwrap_or(0);
        table.insert(order_id, current + 1)?;
        Ok(current + 1)
    }
}
