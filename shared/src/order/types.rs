//! Order and line item types

use super::state::StateKind;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reference prefix of forked resend orders
pub const RESEND_PREFIX: &str = "RESEND-";

/// Line quantity bounds
pub const MIN_LINE_QUANTITY: u32 = 1;
pub const MAX_LINE_QUANTITY: u32 = 9999;

/// Customer order tracked through fulfillment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Internal sequential id
    pub id: u64,
    /// External reference (unique)
    pub reference: String,
    pub client_reference: String,
    pub city: String,
    /// Amount announced at intake
    pub declared_total: Decimal,
    /// Delivery fee for the city; never part of `total`
    #[serde(default)]
    pub delivery_fee: Decimal,
    /// Upsell threshold counter (persisted by the pricing engine)
    #[serde(default)]
    pub upsell_counter: u32,
    /// Σ line subtotals
    #[serde(default)]
    pub total: Decimal,
    /// Open state instance, `None` before the first transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_state_id: Option<u64>,
    /// Kind of the open state instance (denormalized)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_state: Option<StateKind>,
    /// Origin of a resend order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forked_from_order_id: Option<u64>,
    /// `None` = unassigned pool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_operator_id: Option<i64>,
    /// Bumped on every mutation
    #[serde(default)]
    pub version: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    pub fn is_resend(&self) -> bool {
        self.forked_from_order_id.is_some()
    }

    /// Amount payable by the customer
    pub fn payable(&self) -> Decimal {
        self.total + self.delivery_fee
    }

    /// Reference of a resend order forked from `reference`
    pub fn resend_reference(reference: &str) -> String {
        format!("{}{}", RESEND_PREFIX, reference)
    }
}

/// Order line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: u64,
    pub order_id: u64,
    pub article_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<i64>,
    pub quantity: u32,
    /// Effective unit price from the last pricing recompute
    #[serde(default)]
    pub unit_price: Decimal,
    /// `unit_price × quantity`
    #[serde(default)]
    pub subtotal: Decimal,
}
