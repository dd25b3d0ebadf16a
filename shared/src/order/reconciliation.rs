//! Reconciliation records (partial delivery and returns)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Condition of a returned item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCondition {
    Good,
    #[serde(alias = "bad")]
    Damaged,
}

impl ItemCondition {
    pub fn is_good(&self) -> bool {
        matches!(self, Self::Good)
    }
}

impl fmt::Display for ItemCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Good => f.write_str("good"),
            Self::Damaged => f.write_str("damaged"),
        }
    }
}

/// Outcome of one line in a partial delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledLine {
    pub line_id: u64,
    pub article_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<i64>,
    pub original_quantity: u32,
    pub delivered_quantity: u32,
    pub returned_quantity: u32,
    /// Condition of the returned units (`None` when nothing came back)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<ItemCondition>,
}

/// Typed partial delivery record, keyed by the originating order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRecord {
    pub order_id: u64,
    pub lines: Vec<ReconciledLine>,
    pub resend_order_id: u64,
    pub operator_id: i64,
    pub recorded_at: i64,
}

impl ReconciliationRecord {
    pub fn total_delivered(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.delivered_quantity)).sum()
    }

    pub fn total_returned(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.returned_quantity)).sum()
    }
}

/// Condition of one article in a return recap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleConditionRecap {
    pub article_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<i64>,
    pub quantity: u32,
    pub condition: ItemCondition,
    /// No reconciliation data was found; `condition` is the configured default
    pub defaulted: bool,
}

/// Per-article condition recap of a returned or resend order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnConditionRecap {
    pub order_id: u64,
    /// Order whose reconciliation record was read, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_order_id: Option<u64>,
    pub articles: Vec<ArticleConditionRecap>,
}

impl ReturnConditionRecap {
    pub fn any_defaulted(&self) -> bool {
        self.articles.iter().any(|a| a.defaulted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_accepts_bad_alias() {
        let c: ItemCondition = serde_json::from_str("\"bad\"").unwrap();
        assert_eq!(c, ItemCondition::Damaged);
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"damaged\"");
    }
}
