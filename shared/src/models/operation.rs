//! Operation (audit entry) Model

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Typed audit tag
///
/// The set is open: labels outside the known variants are kept as
/// [`OperationType::Other`] and registered by the audit log on first use.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationType {
    OrderConfirmed,
    PreparationCompleted,
    Delivered,
    PartialDelivery,
    Returned,
    ReturnProcessed,
    ProblemReported,
    ResendCreated,
    LineChanged,
    Other(String),
}

impl OperationType {
    pub const KNOWN: [OperationType; 9] = [
        Self::OrderConfirmed,
        Self::PreparationCompleted,
        Self::Delivered,
        Self::PartialDelivery,
        Self::Returned,
        Self::ReturnProcessed,
        Self::ProblemReported,
        Self::ResendCreated,
        Self::LineChanged,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::OrderConfirmed => "ORDER_CONFIRMED",
            Self::PreparationCompleted => "PREPARATION_COMPLETED",
            Self::Delivered => "DELIVERED",
            Self::PartialDelivery => "PARTIAL_DELIVERY",
            Self::Returned => "RETURNED",
            Self::ReturnProcessed => "RETURN_PROCESSED",
            Self::ProblemReported => "PROBLEM_REPORTED",
            Self::ResendCreated => "RESEND_CREATED",
            Self::LineChanged => "LINE_CHANGED",
            Self::Other(label) => label,
        }
    }

    /// Parse a label. Known labels match case-insensitively; anything else
    /// becomes `Other` with the label normalized to SCREAMING_SNAKE_CASE.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().replace([' ', '-'], "_").to_uppercase();
        Self::KNOWN
            .iter()
            .find(|k| k.as_str() == normalized)
            .cloned()
            .unwrap_or(Self::Other(normalized))
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OperationType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OperationType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// Immutable audit row attached to an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: u64,
    pub order_id: u64,
    pub operation_type: OperationType,
    pub operator_id: i64,
    /// Human-readable conclusion (never empty)
    pub conclusion: String,
    pub created_at: i64,
}
