//! Stock Movement Model

use serde::{Deserialize, Serialize};

/// Immutable signed adjustment of an inventory slot
///
/// `quantity_after == quantity_before + quantity` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: u64,
    pub article_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<i64>,
    /// Signed delta (positive = credit)
    pub quantity: i64,
    pub quantity_before: i64,
    pub quantity_after: i64,
    pub reason: String,
    /// Reference of the order that caused the movement, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_reference: Option<String>,
    pub operator_id: i64,
    pub created_at: i64,
}
