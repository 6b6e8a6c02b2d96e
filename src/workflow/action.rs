use crate::model::quotation::{QuotationFile, QuotationStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Attachable document of the fulfillment workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Document {
    PurchaseOrder,
    Invoice,
}

impl Document {
    pub fn as_str(&self) -> &'static str {
        match self {
            Document::PurchaseOrder => "purchase-order",
            Document::Invoice => "invoice",
        }
    }

    pub fn attach_kind(&self) -> ActionKind {
        match self {
            Document::PurchaseOrder => ActionKind::AttachPurchaseOrder,
            Document::Invoice => ActionKind::AttachInvoice,
        }
    }

    pub fn attach(&self, file: QuotationFile) -> WorkflowAction {
        match self {
            Document::PurchaseOrder => WorkflowAction::AttachPurchaseOrder { file },
            Document::Invoice => WorkflowAction::AttachInvoice { file },
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload-free name of a workflow action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    SetStatus,
    AttachPurchaseOrder,
    RemovePurchaseOrder,
    AttachInvoice,
    RemoveInvoice,
    TogglePaid,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::SetStatus,
        ActionKind::AttachPurchaseOrder,
        ActionKind::RemovePurchaseOrder,
        ActionKind::AttachInvoice,
        ActionKind::RemoveInvoice,
        ActionKind::TogglePaid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::SetStatus => "setStatus",
            ActionKind::AttachPurchaseOrder => "attachPurchaseOrder",
            ActionKind::RemovePurchaseOrder => "removePurchaseOrder",
            ActionKind::AttachInvoice => "attachInvoice",
            ActionKind::RemoveInvoice => "removeInvoice",
            ActionKind::TogglePaid => "togglePaid",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested change to a quotation's workflow fields.
///
/// Serialized with an `action` tag, e.g.
/// `{"action":"setStatus","status":"approved"}` or `{"action":"togglePaid"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum WorkflowAction {
    SetStatus { status: QuotationStatus },
    AttachPurchaseOrder { file: QuotationFile },
    RemovePurchaseOrder,
    AttachInvoice { file: QuotationFile },
    RemoveInvoice,
    TogglePaid,
}

impl WorkflowAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            WorkflowAction::SetStatus { .. } => ActionKind::SetStatus,
            WorkflowAction::AttachPurchaseOrder { .. } => ActionKind::AttachPurchaseOrder,
            WorkflowAction::RemovePurchaseOrder => ActionKind::RemovePurchaseOrder,
            WorkflowAction::AttachInvoice { .. } => ActionKind::AttachInvoice,
            WorkflowAction::RemoveInvoice => ActionKind::RemoveInvoice,
            WorkflowAction::TogglePaid => ActionKind::TogglePaid,
        }
    }

    /// The document a removal action targets.
    pub fn removed_document(&self) -> Option<Document> {
        match self {
            WorkflowAction::RemovePurchaseOrder => Some(Document::PurchaseOrder),
            WorkflowAction::RemoveInvoice => Some(Document::Invoice),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("invalid transition {action}: {reason}")]
    InvalidTransition {
        action: ActionKind,
        reason: &'static str,
    },
    #[error("nothing to do for {0}: the document is not attached")]
    NothingToDo(ActionKind),
}

impl WorkflowError {
    pub fn action(&self) -> ActionKind {
        match self {
            WorkflowError::InvalidTransition { action, .. } => *action,
            WorkflowError::NothingToDo(action) => *action,
        }
    }
}
