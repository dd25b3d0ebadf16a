//! Order commands - requests that mutate orders

use super::reconciliation::ItemCondition;
use crate::error::ErrorCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Command sent by an operator (UI, API or intake collaborator)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentCommand {
    /// Client-generated id, used for idempotency
    pub command_id: String,
    pub operator_id: i64,
    /// Operator name (snapshot for logs)
    pub operator_name: String,
    /// Client timestamp (Unix milliseconds)
    pub timestamp: i64,
    pub payload: CommandPayload,
}

impl FulfillmentCommand {
    pub fn new(
        operator_id: i64,
        operator_name: impl Into<String>,
        payload: CommandPayload,
    ) -> Self {
        Self {
            command_id: crate::util::new_command_id(),
            operator_id,
            operator_name: operator_name.into(),
            timestamp: crate::util::now_millis(),
            payload,
        }
    }

    /// Order targeted by the command, if it already exists
    pub fn order_id(&self) -> Option<u64> {
        self.payload.order_id()
    }
}

/// Delivered quantity of one line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveredEntry {
    pub line_id: u64,
    pub quantity: u32,
}

/// Returned quantity of one line and its condition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnedEntry {
    pub line_id: u64,
    pub quantity: u32,
    pub condition: ItemCondition,
}

/// Command payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandPayload {
    // ========== Intake ==========
    CreateOrder {
        reference: String,
        client_reference: String,
        city: String,
        declared_total: Decimal,
        #[serde(default)]
        delivery_fee: Decimal,
    },

    // ========== State ledger ==========
    Transition {
        order_id: u64,
        /// State kind label (canonical, SCREAMING_SNAKE or French)
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
    },
    ReportProblem {
        order_id: u64,
        comment: String,
    },

    // ========== Line items ==========
    AddLine {
        order_id: u64,
        article_id: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant_id: Option<i64>,
        quantity: u32,
    },
    UpdateLineQuantity {
        order_id: u64,
        line_id: u64,
        quantity: u32,
    },
    RemoveLine {
        order_id: u64,
        line_id: u64,
    },
    ReplaceLineArticle {
        order_id: u64,
        line_id: u64,
        article_id: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant_id: Option<i64>,
    },

    // ========== Reconciliation ==========
    RecordPartialDelivery {
        order_id: u64,
        delivered: Vec<DeliveredEntry>,
        returned: Vec<ReturnedEntry>,
    },
    RecordReturnProcessing {
        order_id: u64,
        /// `None` = use the per-article condition recap
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<ItemCondition>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
    },

    // ========== Audit / inventory ==========
    RecordOperation {
        order_id: u64,
        operation_type: String,
        conclusion: String,
    },
    AdjustStock {
        article_id: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant_id: Option<i64>,
        delta: i64,
        reason: String,
    },
}

impl CommandPayload {
    pub fn order_id(&self) -> Option<u64> {
        match self {
            Self::CreateOrder { .. } | Self::AdjustStock { .. } => None,
            Self::Transition { order_id, .. }
            | Self::ReportProblem { order_id, .. }
            | Self::AddLine { order_id, .. }
            | Self::UpdateLineQuantity { order_id, .. }
            | Self::RemoveLine { order_id, .. }
            | Self::ReplaceLineArticle { order_id, .. }
            | Self::RecordPartialDelivery { order_id, .. }
            | Self::RecordReturnProcessing { order_id, .. }
            | Self::RecordOperation { order_id, .. } => Some(*order_id),
        }
    }

    /// Payload name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateOrder { .. } => "CREATE_ORDER",
            Self::Transition { .. } => "TRANSITION",
            Self::ReportProblem { .. } => "REPORT_PROBLEM",
            Self::AddLine { .. } => "ADD_LINE",
            Self::UpdateLineQuantity { .. } => "UPDATE_LINE_QUANTITY",
            Self::RemoveLine { .. } => "REMOVE_LINE",
            Self::ReplaceLineArticle { .. } => "REPLACE_LINE_ARTICLE",
            Self::RecordPartialDelivery { .. } => "RECORD_PARTIAL_DELIVERY",
            Self::RecordReturnProcessing { .. } => "RECORD_RETURN_PROCESSING",
            Self::RecordOperation { .. } => "RECORD_OPERATION",
            Self::AdjustStock { .. } => "ADJUST_STOCK",
        }
    }
}

/// Command response: `{success, message, data}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// The command ID this responds to
    pub command_id: String,
    /// Whether the command succeeded
    pub success: bool,
    pub message: String,
    /// Result payload (created order, new state instance...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Non-fatal notices (auto-registered labels, defaulted conditions)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Error details if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

impl CommandResponse {
    pub fn success(
        command_id: String,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            command_id,
            success: true,
            message: message.into(),
            data,
            warnings,
            error: None,
        }
    }

    pub fn error(command_id: String, error: CommandError) -> Self {
        Self {
            command_id,
            success: false,
            message: error.message.clone(),
            data: None,
            warnings: Vec::new(),
            error: Some(error),
        }
    }

    pub fn duplicate(command_id: String) -> Self {
        Self {
            command_id,
            success: true,
            message: "Duplicate command ignored".to_string(),
            data: None,
            warnings: Vec::new(),
            error: None,
        }
    }
}

/// Command error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandError {
    pub code: CommandErrorCode,
    pub message: String,
}

impl CommandError {
    pub fn new(code: CommandErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Command error codes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandErrorCode {
    OrderNotFound,
    OrderReferenceExists,
    LineNotFound,
    ArticleNotFound,
    VariantNotFound,
    OperatorNotFound,
    StatePrecondition,
    UnknownStateKind,
    ReconciliationMismatch,
    ReturnAlreadyProcessed,
    InsufficientStock,
    InvalidOperation,
    DuplicateCommand,
    InternalError,
    // Storage errors (maps to ErrorCode 94xx)
    StorageFull,
    OutOfMemory,
    StorageCorrupted,
    SystemBusy,
}

impl From<CommandErrorCode> for ErrorCode {
    fn from(code: CommandErrorCode) -> Self {
        match code {
            CommandErrorCode::OrderNotFound => ErrorCode::OrderNotFound,
            CommandErrorCode::OrderReferenceExists => ErrorCode::OrderReferenceExists,
            CommandErrorCode::LineNotFound => ErrorCode::OrderItemNotFound,
            CommandErrorCode::ArticleNotFound => ErrorCode::ProductNotFound,
            CommandErrorCode::VariantNotFound => ErrorCode::SpecNotFound,
            CommandErrorCode::OperatorNotFound => ErrorCode::EmployeeNotFound,
            CommandErrorCode::StatePrecondition => ErrorCode::OrderStatePrecondition,
            CommandErrorCode::UnknownStateKind => ErrorCode::UnknownStateKind,
            CommandErrorCode::ReconciliationMismatch => ErrorCode::ReconciliationMismatch,
            CommandErrorCode::ReturnAlreadyProcessed => ErrorCode::ReturnAlreadyProcessed,
            CommandErrorCode::InsufficientStock => ErrorCode::ProductOutOfStock,
            CommandErrorCode::InvalidOperation => ErrorCode::ValidationFailed,
            CommandErrorCode::DuplicateCommand => ErrorCode::AlreadyExists,
            CommandErrorCode::InternalError => ErrorCode::InternalError,
            CommandErrorCode::StorageFull => ErrorCode::StorageFull,
            CommandErrorCode::OutOfMemory => ErrorCode::OutOfMemory,
            CommandErrorCode::StorageCorrupted => ErrorCode::StorageCorrupted,
            CommandErrorCode::SystemBusy => ErrorCode::SystemBusy,
        }
    }
}
