//! Data models
//!
//! Catalog, operator directory, inventory and audit records persisted by the
//! fulfillment server. Numeric ids follow the catalog's `i64` convention;
//! engine-assigned ids (orders, lines, ledger rows) are `u64`.

pub mod article;
pub mod operation;
pub mod operator;
pub mod stock;

// Re-exports
pub use article::*;
pub use operation::*;
pub use operator::*;
pub use stock::*;
