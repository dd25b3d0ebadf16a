//! Order fulfillment engine
//!
//! - **storage**: redb persistence (orders, lines, state ledger, catalog, audit, stock)
//! - **ledger**: state ledger queries (current / previous state, history)
//! - **transition**: transition engine, the only writer of the ledger
//! - **actions**: one handler per command payload
//! - **manager**: FulfillmentManager, command pipeline and read queries
//!
//! # Architecture
//!
//! ```text
//! Command → FulfillmentManager → Action → Storage (redb, one write txn)
//!                 ↓
//!         Broadcast (after commit)
//!                 ↓
//!           All Subscribers
//! ```

pub mod actions;
pub mod ledger;
pub mod manager;
pub mod storage;
pub mod traits;
pub mod transition;

// Re-exports
pub use manager::{FulfillmentManager, ManagerError, ManagerResult};
pub use storage::OrderStorage;
pub use traits::{EngineOptions, OrderError};

// Re-export shared types for convenience
pub use shared::order::{
    CommandError, CommandErrorCode, CommandPayload, CommandResponse, FulfillmentCommand,
    FulfillmentEvent, FulfillmentEventKind, StateKind,
};
