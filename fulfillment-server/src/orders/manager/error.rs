use super::super::storage::StorageError;
use super::super::traits::OrderError;
use shared::order::{CommandError, CommandErrorCode};
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

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

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// 将存储错误转换为错误码（前端负责本地化）
fn classify_storage_error(e: &StorageError) -> CommandErrorCode {
    // 序列化错误是数据问题，不是系统繁忙
    if let StorageError::Serialization(_) = e {
        return CommandErrorCode::InternalError;
    }

    // redb 错误通过字符串匹配分类
    let err_str = e.to_string().to_lowercase();

    // 磁盘空间不足
    if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc")
    {
        return CommandErrorCode::StorageFull;
    }

    // 内存不足
    if err_str.contains("out of memory") || err_str.contains("cannot allocate") {
        return CommandErrorCode::OutOfMemory;
    }

    // 数据损坏
    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return CommandErrorCode::StorageCorrupted;
    }

    // 默认：系统繁忙（redb 的 Database/Transaction/Table/Storage/Commit 错误）
    CommandErrorCode::SystemBusy
}

impl From<ManagerError> for CommandError {
    fn from(err: ManagerError) -> Self {
        let message = err.to_string();
        let code = match err {
            ManagerError::Storage(e) => {
                let code = classify_storage_error(&e);
                tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
                code
            }
            ManagerError::OrderNotFound(_) => CommandErrorCode::OrderNotFound,
            ManagerError::OrderReferenceExists(_) => CommandErrorCode::OrderReferenceExists,
            ManagerError::LineNotFound { .. } => CommandErrorCode::LineNotFound,
            ManagerError::ArticleNotFound(_) => CommandErrorCode::ArticleNotFound,
            ManagerError::VariantNotFound { .. } => CommandErrorCode::VariantNotFound,
            ManagerError::OperatorNotFound(_) => CommandErrorCode::OperatorNotFound,
            ManagerError::StatePrecondition(_) => CommandErrorCode::StatePrecondition,
            ManagerError::UnknownStateKind(_) => CommandErrorCode::UnknownStateKind,
            ManagerError::ReconciliationMismatch(_) => CommandErrorCode::ReconciliationMismatch,
            ManagerError::ReturnAlreadyProcessed(_) => CommandErrorCode::ReturnAlreadyProcessed,
            ManagerError::InsufficientStock { .. } => CommandErrorCode::InsufficientStock,
            ManagerError::InvalidOperation(_) => CommandErrorCode::InvalidOperation,
            ManagerError::Internal(ref msg) => {
                tracing::error!(error = %msg, "Internal error");
                CommandErrorCode::InternalError
            }
        };
        CommandError::new(code, message)
    }
}

impl From<OrderError> for ManagerError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::OrderNotFound(id) => ManagerError::OrderNotFound(id),
            OrderError::OrderReferenceExists(r) => ManagerError::OrderReferenceExists(r),
            OrderError::LineNotFound { order_id, line_id } => {
                ManagerError::LineNotFound { order_id, line_id }
            }
            OrderError::ArticleNotFound(id) => ManagerError::ArticleNotFound(id),
            OrderError::VariantNotFound {
                article_id,
                variant_id,
            } => ManagerError::VariantNotFound {
                article_id,
                variant_id,
            },
            OrderError::OperatorNotFound(id) => ManagerError::OperatorNotFound(id),
            OrderError::StatePrecondition(msg) => ManagerError::StatePrecondition(msg),
            OrderError::UnknownStateKind(label) => ManagerError::UnknownStateKind(label),
            OrderError::ReconciliationMismatch(msg) => ManagerError::ReconciliationMismatch(msg),
            OrderError::ReturnAlreadyProcessed(id) => ManagerError::ReturnAlreadyProcessed(id),
            OrderError::InsufficientStock {
                slot,
                available,
                requested,
            } => ManagerError::InsufficientStock {
                slot,
                available,
                requested,
            },
            OrderError::InvalidOperation(msg) => ManagerError::InvalidOperation(msg),
            OrderError::LedgerCorrupted(order_id) => {
                tracing::error!(order_id, "State ledger invariant violated");
                ManagerError::Internal(format!("State ledger corrupted for order {}", order_id))
            }
            OrderError::Storage(e) => ManagerError::Storage(e),
        }
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
