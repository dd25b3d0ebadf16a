//! 操作日志模块 — 订单审计追踪
//!
//! Append-only: 无更新/删除接口。条目在命令的写事务内写入，
//! 命令失败时随事务一起回滚（失败的尝试不记录）。
//!
//! 操作类型是开放集合：未知标签在首次使用时登记到 `operation_types` 表，
//! 并以 warning 形式返回给调用方。

use crate::orders::storage::counter;
use crate::orders::traits::{CommandContext, OrderError};
use shared::models::{Operation, OperationType};

/// Append an audit entry to an order
///
/// The conclusion must be non-empty after trimming. Unknown operation types
/// are auto-registered.
pub fn record(
    ctx: &mut CommandContext<'_>,
    order_id: u64,
    operation_type: OperationType,
    operator_id: i64,
    conclusion: &str,
) -> Result<Operation, OrderError> {
    let conclusion = conclusion.trim();
    if conclusion.is_empty() {
        return Err(OrderError::InvalidOperation(
            "Operation conclusion must not be empty".to_string(),
        ));
    }

    if let OperationType::Other(label) = &operation_type {
        if label.is_empty() {
            return Err(OrderError::InvalidOperation(
                "Operation type must not be empty".to_string(),
            ));
        }
        ensure_registered(ctx, label)?;
    }

    let operation = Operation {
        id: ctx.next_id(counter::OPERATION)?,
        order_id,
        operation_type,
        operator_id,
        conclusion: conclusion.to_string(),
        created_at: ctx.now(),
    };
    ctx.storage().append_operation(ctx.txn(), &operation)?;

    tracing::info!(
        target: "audit",
        order_id,
        operator_id,
        operation_id = operation.id,
        operation_type = %operation.operation_type,
        "Operation recorded"
    );
    Ok(operation)
}

/// 登记未知操作类型（每个标签只登记一次）
fn ensure_registered(ctx: &mut CommandContext<'_>, label: &str) -> Result<(), OrderError> {
    let storage = ctx.storage();
    if storage.is_operation_type_registered(ctx.txn(), label)? {
        return Ok(());
    }
    storage.register_operation_type(ctx.txn(), label, ctx.now())?;
    tracing::warn!(operation_type = %label, "Auto-registered unknown operation type");
    ctx.warn(format!("Operation type '{}' was not known and has been registered", label));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::storage::OrderStorage;
    use crate::orders::traits::EngineOptions;

    #[test]
    fn test_record_appends_in_order() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 1000, EngineOptions::default());

        record(&mut ctx, 1, OperationType::PreparationCompleted, 7, "Prepared").unwrap();
        record(&mut ctx, 1, OperationType::Delivered, 8, "  Delivered to client  ").unwrap();
        record(&mut ctx, 2, OperationType::Returned, 8, "Refused").unwrap();

        let ops = storage.get_operations(&txn, 1).unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].operation_type, OperationType::PreparationCompleted);
        assert_eq!(ops[1].conclusion, "Delivered to client");
        assert_eq!(ops[1].created_at, 1000);
        assert!(ctx.warnings().is_empty());
    }

    #[test]
    fn test_empty_conclusion_rejected() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 1000, EngineOptions::default());

        let result = record(&mut ctx, 1, OperationType::Delivered, 7, "   ");
        assert!(matches!(result, Err(OrderError::InvalidOperation(_))));
        assert!(storage.get_operations(&txn, 1).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_type_registered_once_with_warning() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 1000, EngineOptions::default());

        let kind = OperationType::from_label("customer called");
        record(&mut ctx, 1, kind.clone(), 7, "Asked for a new slot").unwrap();
        record(&mut ctx, 1, kind, 7, "Called again").unwrap();

        assert_eq!(ctx.warnings().len(), 1);
        assert!(ctx.warnings()[0].contains("CUSTOMER_CALLED"));
        assert_eq!(
            storage.get_operation_types(&txn).unwrap(),
            vec!["CUSTOMER_CALLED".to_string()]
        );
    }
}
