//! Operator Model

use serde::{Deserialize, Serialize};

/// Team an operator works in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorRole {
    Confirmation,
    Preparation,
    Delivery,
    Supervisor,
}

impl OperatorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmation => "confirmation",
            Self::Preparation => "preparation",
            Self::Delivery => "delivery",
            Self::Supervisor => "supervisor",
        }
    }
}

/// Operator directory entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: i64,
    pub name: String,
    pub role: OperatorRole,
}

impl Operator {
    /// Whether this operator belongs to the confirmation team
    pub fn is_confirmation(&self) -> bool {
        self.role == OperatorRole::Confirmation
    }
}
