//! Pricing Engine
//!
//! Line prices depend on the order's upsell threshold counter, derived from
//! the total quantity of upsell articles on the order. Every line mutation
//! triggers a full recompute: every line is re-priced from scratch with the
//! freshly derived counter, so recomputing twice is a no-op.

mod item_calculator;
mod order_calculator;

pub use item_calculator::*;
pub use order_calculator::*;
