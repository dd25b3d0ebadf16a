//! Order fulfillment types
//!
//! - State ledger vocabulary: [`StateKind`], [`TransitionEvent`], [`StateInstance`]
//! - Orders and line items
//! - Reconciliation records for partial delivery and returns
//! - Commands (requests that mutate orders) and events (broadcast after commit)

pub mod command;
pub mod event;
pub mod reconciliation;
pub mod state;
pub mod types;

// Re-exports
pub use command::{
    CommandError, CommandErrorCode, CommandPayload, CommandResponse, DeliveredEntry,
    FulfillmentCommand, ReturnedEntry,
};
pub use event::{FulfillmentEvent, FulfillmentEventKind};
pub use reconciliation::{
    ArticleConditionRecap, ItemCondition, ReconciledLine, ReconciliationRecord,
    ReturnConditionRecap,
};
pub use state::{StateInstance, StateKind, TransitionEvent, next_state};
pub use types::*;
