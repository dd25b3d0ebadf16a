//! State ledger vocabulary and the transition table

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fulfillment phase of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StateKind {
    Confirmed,
    InPreparation,
    Collected,
    Packed,
    Prepared,
    InDelivery,
    Delivered,
    PartiallyDelivered,
    Returned,
    ReturnToConfirmation,
}

impl StateKind {
    /// All kinds, in pipeline order
    pub const ALL: [StateKind; 10] = [
        Self::Confirmed,
        Self::InPreparation,
        Self::Collected,
        Self::Packed,
        Self::Prepared,
        Self::InDelivery,
        Self::Delivered,
        Self::PartiallyDelivered,
        Self::Returned,
        Self::ReturnToConfirmation,
    ];

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Confirmed => "Confirmed",
            Self::InPreparation => "In Preparation",
            Self::Collected => "Collected",
            Self::Packed => "Packed",
            Self::Prepared => "Prepared",
            Self::InDelivery => "In Delivery",
            Self::Delivered => "Delivered",
            Self::PartiallyDelivered => "Partially Delivered",
            Self::Returned => "Returned",
            Self::ReturnToConfirmation => "Return-to-Confirmation",
        }
    }

    /// Labels used by operators on the floor
    fn french_label(&self) -> &'static str {
        match self {
            Self::Confirmed => "Confirmée",
            Self::InPreparation => "En préparation",
            Self::Collected => "Collectée",
            Self::Packed => "Emballée",
            Self::Prepared => "Préparée",
            Self::InDelivery => "En livraison",
            Self::Delivered => "Livrée",
            Self::PartiallyDelivered => "Livrée partiellement",
            Self::Returned => "Retournée",
            Self::ReturnToConfirmation => "Retour Confirmation",
        }
    }

    fn snake_label(&self) -> &'static str {
        match self {
            Self::Confirmed => "CONFIRMED",
            Self::InPreparation => "IN_PREPARATION",
            Self::Collected => "COLLECTED",
            Self::Packed => "PACKED",
            Self::Prepared => "PREPARED",
            Self::InDelivery => "IN_DELIVERY",
            Self::Delivered => "DELIVERED",
            Self::PartiallyDelivered => "PARTIALLY_DELIVERED",
            Self::Returned => "RETURNED",
            Self::ReturnToConfirmation => "RETURN_TO_CONFIRMATION",
        }
    }

    /// Ordering rank used by queues and reports
    pub fn rank(&self) -> u8 {
        match self {
            Self::Confirmed => 10,
            Self::InPreparation => 20,
            Self::Collected => 30,
            Self::Packed => 40,
            Self::Prepared => 50,
            Self::InDelivery => 60,
            Self::Delivered => 70,
            Self::PartiallyDelivered => 80,
            Self::Returned => 90,
            Self::ReturnToConfirmation => 100,
        }
    }

    /// Badge color (hex)
    pub fn color(&self) -> &'static str {
        match self {
            Self::Confirmed => "#2563eb",
            Self::InPreparation => "#f59e0b",
            Self::Collected => "#eab308",
            Self::Packed => "#a16207",
            Self::Prepared => "#0891b2",
            Self::InDelivery => "#7c3aed",
            Self::Delivered => "#16a34a",
            Self::PartiallyDelivered => "#65a30d",
            Self::Returned => "#dc2626",
            Self::ReturnToConfirmation => "#db2777",
        }
    }

    /// Preparation-phase kinds skipped by the "previous state" query
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::InPreparation | Self::Collected | Self::Packed)
    }

    /// Delivery outcome kinds
    pub fn is_delivery_outcome(&self) -> bool {
        matches!(
            self,
            Self::Delivered | Self::PartiallyDelivered | Self::Returned
        )
    }

    /// Whether line items may be added, changed or removed in this state
    pub fn allows_line_changes(&self) -> bool {
        matches!(
            self,
            Self::Confirmed
                | Self::InPreparation
                | Self::Collected
                | Self::Packed
                | Self::ReturnToConfirmation
        )
    }

    /// Parse a label: canonical, SCREAMING_SNAKE or French, case-insensitive
    pub fn from_label(label: &str) -> Option<Self> {
        let wanted = label.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|k| {
            k.label().to_lowercase() == wanted
                || k.snake_label().to_lowercase() == wanted
                || k.french_label().to_lowercase() == wanted
        })
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error for labels outside the state vocabulary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStateKind(pub String);

impl fmt::Display for UnknownStateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown state kind: {}", self.0)
    }
}

impl std::error::Error for UnknownStateKind {}

impl FromStr for StateKind {
    type Err = UnknownStateKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| UnknownStateKind(s.to_string()))
    }
}

/// Events driving the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionEvent {
    Confirm,
    StartPreparation,
    Collect,
    Pack,
    MarkPrepared,
    Dispatch,
    Deliver,
    DeliverPartially,
    Return,
    ReportProblem,
    /// First state of a forked resend order
    Resend,
}

impl TransitionEvent {
    /// The event whose edges lead to `target`.
    ///
    /// `InPreparation` resolves to `StartPreparation`; `Resend` is only
    /// emitted by the reconciliation procedure.
    pub fn leading_to(target: StateKind) -> Self {
        match target {
            StateKind::Confirmed => Self::Confirm,
            StateKind::InPreparation => Self::StartPreparation,
            StateKind::Collected => Self::Collect,
            StateKind::Packed => Self::Pack,
            StateKind::Prepared => Self::MarkPrepared,
            StateKind::InDelivery => Self::Dispatch,
            StateKind::Delivered => Self::Deliver,
            StateKind::PartiallyDelivered => Self::DeliverPartially,
            StateKind::Returned => Self::Return,
            StateKind::ReturnToConfirmation => Self::ReportProblem,
        }
    }
}

/// Transition table: `(source, event) -> target`
///
/// `None` source means the order has no state yet. Returns `None` when the
/// edge does not exist.
pub fn next_state(source: Option<StateKind>, event: TransitionEvent) -> Option<StateKind> {
    use StateKind::*;
    use TransitionEvent as E;

    match event {
        E::Confirm => match source {
            None | Some(ReturnToConfirmation) => Some(Confirmed),
            _ => None,
        },
        E::StartPreparation => (source == Some(Confirmed)).then_some(InPreparation),
        E::Collect => (source == Some(InPreparation)).then_some(Collected),
        E::Pack => (source == Some(Collected)).then_some(Packed),
        E::MarkPrepared => match source {
            Some(InPreparation) | Some(Packed) => Some(Prepared),
            _ => None,
        },
        E::Dispatch => (source == Some(Prepared)).then_some(InDelivery),
        E::Deliver => (source == Some(InDelivery)).then_some(Delivered),
        E::DeliverPartially => (source == Some(InDelivery)).then_some(PartiallyDelivered),
        E::Return => (source == Some(InDelivery)).then_some(Returned),
        E::ReportProblem => (source == Some(InPreparation)).then_some(ReturnToConfirmation),
        E::Resend => source.is_none().then_some(InPreparation),
    }
}

/// One occupancy interval of a state kind for an order
///
/// `ended_at == None` marks the current state. Closed instances are never
/// reopened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateInstance {
    pub id: u64,
    pub order_id: u64,
    pub kind: StateKind,
    pub started_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<i64>,
    /// Operator who opened the instance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<i64>,
    /// Operator who closed the instance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_by: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl StateInstance {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_variants() {
        assert_eq!(StateKind::from_label("In Preparation"), Some(StateKind::InPreparation));
        assert_eq!(StateKind::from_label("in_delivery"), Some(StateKind::InDelivery));
        assert_eq!(StateKind::from_label("LIVRÉE"), Some(StateKind::Delivered));
        assert_eq!(
            StateKind::from_label(" retour confirmation "),
            Some(StateKind::ReturnToConfirmation)
        );
        assert_eq!(StateKind::from_label("Lost"), None);
        assert_eq!(StateKind::from_label(""), None);
    }

    #[test]
    fn test_from_str_error() {
        let err = "Archived".parse::<StateKind>().unwrap_err();
        assert_eq!(err, UnknownStateKind("Archived".to_string()));
    }

    #[test]
    fn test_labels_unique() {
        for (i, a) in StateKind::ALL.iter().enumerate() {
            for b in &StateKind::ALL[i + 1..] {
                assert_ne!(a.label(), b.label());
                assert_ne!(a.rank(), b.rank());
            }
        }
    }

    #[test]
    fn test_main_pipeline_edges() {
        use StateKind::*;
        use TransitionEvent as E;
        let path = [
            (None, E::Confirm, Confirmed),
            (Some(Confirmed), E::StartPreparation, InPreparation),
            (Some(InPreparation), E::Collect, Collected),
            (Some(Collected), E::Pack, Packed),
            (Some(Packed), E::MarkPrepared, Prepared),
            (Some(Prepared), E::Dispatch, InDelivery),
            (Some(InDelivery), E::Deliver, Delivered),
        ];
        for (source, event, target) in path {
            assert_eq!(next_state(source, event), Some(target));
        }
        assert_eq!(next_state(Some(InPreparation), E::MarkPrepared), Some(Prepared));
    }

    #[test]
    fn test_exceptional_edges() {
        use StateKind::*;
        use TransitionEvent as E;
        assert_eq!(
            next_state(Some(InPreparation), E::ReportProblem),
            Some(ReturnToConfirmation)
        );
        assert_eq!(next_state(Some(ReturnToConfirmation), E::Confirm), Some(Confirmed));
        assert_eq!(next_state(None, E::Resend), Some(InPreparation));
        assert_eq!(next_state(Some(InDelivery), E::Return), Some(Returned));
    }

    #[test]
    fn test_illegal_edges() {
        use StateKind::*;
        use TransitionEvent as E;
        assert_eq!(next_state(Some(Confirmed), E::MarkPrepared), None);
        assert_eq!(next_state(None, E::StartPreparation), None);
        assert_eq!(next_state(Some(Delivered), E::Confirm), None);
        assert_eq!(next_state(Some(Returned), E::StartPreparation), None);
        assert_eq!(next_state(Some(PartiallyDelivered), E::Resend), None);
        assert_eq!(next_state(Some(Packed), E::ReportProblem), None);
    }

    #[test]
    fn test_each_target_has_one_event() {
        for kind in StateKind::ALL {
            let event = TransitionEvent::leading_to(kind);
            let reachable = [None]
                .into_iter()
                .chain(StateKind::ALL.into_iter().map(Some))
                .any(|s| next_state(s, event) == Some(kind));
            assert!(reachable, "{kind} unreachable via {event:?}");
        }
    }
}
