//! Transition rules of the quotation workflow.
//!
//! Every function here is pure: it reads a snapshot and, for [`apply`],
//! returns a new one. Persisting the result is the caller's job.

use crate::model::quotation::{Quotation, QuotationStatus};
use crate::workflow::action::{ActionKind, WorkflowAction, WorkflowError};

const NOT_APPROVED: &str = "the quotation must be approved";
const PURCHASE_ORDER_MISSING: &str = "a purchase order must be attached first";
const PURCHASE_ORDER_PRESENT: &str = "a purchase order is already attached";
const INVOICE_PRESENT: &str = "an invoice is already attached";
const INVOICE_MISSING: &str = "no invoice has been generated";

fn invalid(action: ActionKind, reason: &'static str) -> WorkflowError {
    WorkflowError::InvalidTransition { action, reason }
}

/// Checks whether `kind` may be applied to `quotation` right now.
pub fn check(quotation: &Quotation, kind: ActionKind) -> Result<(), WorkflowError> {
    let approved = quotation.status == QuotationStatus::Approved;
    match kind {
        ActionKind::SetStatus => Ok(()),
        ActionKind::AttachPurchaseOrder => {
            if !approved {
                Err(invalid(kind, NOT_APPROVED))
            } else if quotation.purchase_order_file.is_some() {
                Err(invalid(kind, PURCHASE_ORDER_PRESENT))
            } else {
                Ok(())
            }
        }
        ActionKind::AttachInvoice => {
            if !approved {
                Err(invalid(kind, NOT_APPROVED))
            } else if quotation.purchase_order_file.is_none() {
                Err(invalid(kind, PURCHASE_ORDER_MISSING))
            } else if quotation.invoice_file.is_some() {
                Err(invalid(kind, INVOICE_PRESENT))
            } else {
                Ok(())
            }
        }
        ActionKind::RemovePurchaseOrder => match quotation.purchase_order_file {
            Some(_) => Ok(()),
            None => Err(WorkflowError::NothingToDo(kind)),
        },
        ActionKind::RemoveInvoice => match quotation.invoice_file {
            Some(_) => Ok(()),
            None => Err(WorkflowError::NothingToDo(kind)),
        },
        ActionKind::TogglePaid => match quotation.invoice_file {
            Some(_) => Ok(()),
            None => Err(invalid(kind, INVOICE_MISSING)),
        },
    }
}

/// Applies `action` and returns the resulting snapshot. The input is left
/// untouched, including on error.
pub fn apply(quotation: &Quotation, action: &WorkflowAction) -> Result<Quotation, WorkflowError> {
    check(quotation, action.kind())?;

    let mut next = quotation.clone();
    match action {
        WorkflowAction::SetStatus { status } => {
            next.status = *status;
        }
        WorkflowAction::AttachPurchaseOrder { file } => {
            next.purchase_order_file = Some(file.clone());
        }
        WorkflowAction::RemovePurchaseOrder => {
            next.purchase_order_file = None;
            next.invoice_file = None;
            next.invoice_paid = false;
        }
        WorkflowAction::AttachInvoice { file } => {
            next.invoice_file = Some(file.clone());
        }
        WorkflowAction::RemoveInvoice => {
            next.invoice_file = None;
            next.invoice_paid = false;
        }
        WorkflowAction::TogglePaid => {
            next.invoice_paid = !next.invoice_paid;
        }
    }
    Ok(next)
}

/// Action kinds whose preconditions currently hold.
pub fn permitted_actions(quotation: &Quotation) -> Vec<ActionKind> {
    ActionKind::ALL
        .into_iter()
        .filter(|kind| check(quotation, *kind).is_ok())
        .collect()
}

/// Validates a full-record replacement against the stored record.
///
/// A replacement may not introduce a document the workflow would have refused
/// to attach. Documents already on the stored record are kept as-is even if
/// the status has since moved away from `approved`.
pub fn check_replacement(current: &Quotation, incoming: &Quotation) -> Result<(), WorkflowError> {
    let approved = incoming.status == QuotationStatus::Approved;

    let new_purchase_order = match (&current.purchase_order_file, &incoming.purchase_order_file) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(old), Some(new)) => old.id != new.id,
    };
    if new_purchase_order && !approved {
        return Err(invalid(ActionKind::AttachPurchaseOrder, NOT_APPROVED));
    }

    let new_invoice = match (&current.invoice_file, &incoming.invoice_file) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(old), Some(new)) => old.id != new.id,
    };
    if new_invoice {
        if !approved {
            return Err(invalid(ActionKind::AttachInvoice, NOT_APPROVED));
        }
        if incoming.purchase_order_file.is_none() {
            return Err(invalid(ActionKind::AttachInvoice, PURCHASE_ORDER_MISSING));
        }
    }
    Ok(())
}
