use crate::model::quotation::{Quotation, QuotationStatus};
use crate::workflow::action::{ActionKind, Document};
use crate::workflow::engine;
use serde::Serialize;

const PURCHASE_ORDER_BLOCKED: &str = "quotation must be approved before issuing a purchase order";
const INVOICE_BLOCKED: &str = "a purchase order must be attached before generating the invoice";

/// Display label of a milestone. Derived from the quotation, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneStatus {
    Created,
    Generated,
    Paid,
    Pending,
    #[serde(rename = "n/a")]
    NotApplicable,
}

impl MilestoneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MilestoneStatus::Created => "created",
            MilestoneStatus::Generated => "generated",
            MilestoneStatus::Paid => "paid",
            MilestoneStatus::Pending => "pending",
            MilestoneStatus::NotApplicable => "n/a",
        }
    }
}

pub fn purchase_order_status(quotation: &Quotation) -> MilestoneStatus {
    if quotation.purchase_order_file.is_some() {
        MilestoneStatus::Created
    } else if quotation.status == QuotationStatus::Approved {
        MilestoneStatus::Pending
    } else {
        MilestoneStatus::NotApplicable
    }
}

pub fn invoice_status(quotation: &Quotation) -> MilestoneStatus {
    if quotation.invoice_file.is_some() {
        MilestoneStatus::Generated
    } else if quotation.purchase_order_file.is_some() && quotation.status == QuotationStatus::Approved {
        MilestoneStatus::Pending
    } else {
        MilestoneStatus::NotApplicable
    }
}

pub fn payment_status(quotation: &Quotation) -> MilestoneStatus {
    if quotation.invoice_paid {
        MilestoneStatus::Paid
    } else if quotation.invoice_file.is_some() {
        MilestoneStatus::Pending
    } else {
        MilestoneStatus::NotApplicable
    }
}

/// What removing a document takes down with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RemovalImpact {
    /// Only the document itself goes away.
    Direct,
    /// Removing the purchase order also deletes the invoice and resets payment.
    CascadeInvoiceAndPayment,
    /// Removing a paid invoice resets the payment state.
    ResetPayment,
}

impl RemovalImpact {
    pub fn requires_confirmation(&self) -> bool {
        !matches!(self, RemovalImpact::Direct)
    }

    pub fn warning(&self) -> Option<&'static str> {
        match self {
            RemovalImpact::Direct => None,
            RemovalImpact::CascadeInvoiceAndPayment => Some(
                "Removing the purchase order will also delete the associated invoice and reset the payment state.",
            ),
            RemovalImpact::ResetPayment => {
                Some("Removing the invoice will also reset the associated payment state.")
            }
        }
    }
}

/// Impact of removing `document`, or `None` when it is not attached.
pub fn removal_impact(quotation: &Quotation, document: Document) -> Option<RemovalImpact> {
    match document {
        Document::PurchaseOrder => quotation.purchase_order_file.as_ref().map(|_| {
            if quotation.invoice_file.is_some() {
                RemovalImpact::CascadeInvoiceAndPayment
            } else {
                RemovalImpact::Direct
            }
        }),
        Document::Invoice => quotation.invoice_file.as_ref().map(|_| {
            if quotation.invoice_paid {
                RemovalImpact::ResetPayment
            } else {
                RemovalImpact::Direct
            }
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneView {
    pub status: MilestoneStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalView {
    pub impact: RemovalImpact,
    pub requires_confirmation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

impl From<RemovalImpact> for RemovalView {
    fn from(impact: RemovalImpact) -> Self {
        RemovalView {
            impact,
            requires_confirmation: impact.requires_confirmation(),
            warning: impact.warning(),
        }
    }
}

/// Everything a client needs to render the workflow of one quotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowProgress {
    pub approval: QuotationStatus,
    pub purchase_order: MilestoneView,
    pub invoice: MilestoneView,
    pub payment: MilestoneView,
    pub permitted_actions: Vec<ActionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_order_removal: Option<RemovalView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_removal: Option<RemovalView>,
}

impl WorkflowProgress {
    pub fn of(quotation: &Quotation) -> Self {
        let approved = quotation.status == QuotationStatus::Approved;

        let purchase_order_blocked = if !approved && quotation.purchase_order_file.is_none() {
            Some(PURCHASE_ORDER_BLOCKED)
        } else {
            None
        };
        let invoice_blocked = if approved && quotation.purchase_order_file.is_none() {
            Some(INVOICE_BLOCKED)
        } else {
            None
        };

        WorkflowProgress {
            approval: quotation.status,
            purchase_order: MilestoneView {
                status: purchase_order_status(quotation),
                blocked_reason: purchase_order_blocked,
            },
            invoice: MilestoneView {
                status: invoice_status(quotation),
                blocked_reason: invoice_blocked,
            },
            payment: MilestoneView {
                status: payment_status(quotation),
                blocked_reason: None,
            },
            permitted_actions: engine::permitted_actions(quotation),
            purchase_order_removal: removal_impact(quotation, Document::PurchaseOrder).map(RemovalView::from),
            invoice_removal: removal_impact(quotation, Document::Invoice).map(RemovalView::from),
        }
    }
}
