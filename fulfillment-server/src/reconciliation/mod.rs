//! Reconciliation procedures
//!
//! - partial delivery: split an in-delivery order and fork a resend order
//! - return processing: restock good returned units
//! - recap: per-article return conditions read back from the typed record

mod partial_delivery;
mod recap;
mod return_processing;

pub use partial_delivery::{PartialDeliveryOutcome, record_partial_delivery};
pub use recap::{return_condition_recap, slot_condition};
pub use return_processing::{ReturnProcessingOutcome, record_return_processing};
