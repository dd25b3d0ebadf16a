//! Fulfillment events - broadcast after a command commits

use super::state::StateKind;
use serde::{Deserialize, Serialize};

/// Notification published after a successful commit
///
/// Downstream queues (preparation, delivery, reporting) use these to observe
/// new current states without polling the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FulfillmentEvent {
    /// Global sequence number (monotonic across restarts)
    pub sequence: u64,
    /// `None` for inventory-only events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<u64>,
    /// Command that produced this event
    pub command_id: String,
    /// Server timestamp (Unix milliseconds)
    pub timestamp: i64,
    pub kind: FulfillmentEventKind,
}

/// Event kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentEventKind {
    OrderCreated {
        reference: String,
    },
    StateChanged {
        #[serde(skip_serializing_if = "Option::is_none")]
        from: Option<StateKind>,
        to: StateKind,
        state_instance_id: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        assigned_operator_id: Option<i64>,
    },
    LinesChanged {
        upsell_counter: u32,
        total: rust_decimal::Decimal,
    },
    ResendCreated {
        resend_order_id: u64,
        reference: String,
    },
    ReturnProcessed {
        credited_units: u32,
    },
    OperationRecorded {
        operation_id: u64,
        operation_type: String,
    },
    StockAdjusted {
        article_id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        variant_id: Option<i64>,
        quantity_after: i64,
    },
}
