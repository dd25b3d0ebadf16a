//! Return condition read-back
//!
//! The recap of an order comes from, in order of preference:
//! 1. its own reconciliation record (partially delivered order)
//! 2. the record of the order it was forked from (resend order)
//! 3. its line items, with the configured default condition (`defaulted`)

use crate::orders::storage::{OrderStorage, TableReader};
use crate::orders::traits::OrderError;
use shared::models::StockKey;
use shared::order::{
    ArticleConditionRecap, ItemCondition, Order, ReconciliationRecord, ReturnConditionRecap,
};

/// Build the per-article condition recap of `order`
pub fn return_condition_recap<R: TableReader>(
    storage: &OrderStorage,
    txn: &R,
    order: &Order,
    default_condition: ItemCondition,
) -> Result<ReturnConditionRecap, OrderError> {
    if let Some(record) = storage.get_reconciliation(txn, order.id)? {
        return Ok(recap_from_record(order.id, &record));
    }

    if let Some(origin_id) = order.forked_from_order_id
        && let Some(record) = storage.get_reconciliation(txn, origin_id)?
    {
        return Ok(recap_from_record(order.id, &record));
    }

    tracing::warn!(
        order_id = order.id,
        condition = %default_condition,
        "No reconciliation record found, defaulting return condition"
    );
    let mut articles = Vec::new();
    for line in storage.get_lines(txn, order.id)? {
        accumulate(
            &mut articles,
            StockKey::new(line.article_id, line.variant_id),
            line.quantity,
            default_condition,
            true,
        );
    }
    Ok(ReturnConditionRecap {
        order_id: order.id,
        source_order_id: None,
        articles,
    })
}

fn recap_from_record(order_id: u64, record: &ReconciliationRecord) -> ReturnConditionRecap {
    let mut articles = Vec::new();
    for line in record.lines.iter().filter(|l| l.returned_quantity > 0) {
        // 旧记录可能缺少状况，按损坏处理（不入库）
        let condition = line.condition.unwrap_or(ItemCondition::Damaged);
        accumulate(
            &mut articles,
            StockKey::new(line.article_id, line.variant_id),
            line.returned_quantity,
            condition,
            false,
        );
    }
    ReturnConditionRecap {
        order_id,
        source_order_id: Some(record.order_id),
        articles,
    }
}

fn accumulate(
    articles: &mut Vec<ArticleConditionRecap>,
    key: StockKey,
    quantity: u32,
    condition: ItemCondition,
    defaulted: bool,
) {
    if let Some(existing) = articles.iter_mut().find(|a| {
        a.article_id == key.article_id && a.variant_id == key.variant_id && a.condition == condition
    }) {
        existing.quantity += quantity;
        return;
    }
    articles.push(ArticleConditionRecap {
        article_id: key.article_id,
        variant_id: key.variant_id,
        quantity,
        condition,
        defaulted,
    });
}

/// Condition of one stock slot in a recap
///
/// A slot recorded under both conditions resolves to `Damaged`, so a recap can
/// never credit more than was reported good. Returns `None` for slots absent
/// from the recap.
pub fn slot_condition(
    recap: &ReturnConditionRecap,
    key: &StockKey,
) -> Option<(ItemCondition, bool)> {
    let mut found: Option<(ItemCondition, bool)> = None;
    for entry in recap
        .articles
        .iter()
        .filter(|a| a.article_id == key.article_id && a.variant_id == key.variant_id)
    {
        found = Some(match found {
            Some((condition, defaulted)) if condition != entry.condition => {
                (ItemCondition::Damaged, defaulted || entry.defaulted)
            }
            Some((condition, defaulted)) => (condition, defaulted || entry.defaulted),
            None => (entry.condition, entry.defaulted),
        });
    }
    found
}
