//! Shared types for the fulfillment pipeline
//!
//! Domain and wire types used by the engine and its callers: orders, line
//! items, the state ledger vocabulary, catalog/inventory records, audit
//! operations, reconciliation records, commands and the unified error system.
//! Nothing in this crate performs I/O.

pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
