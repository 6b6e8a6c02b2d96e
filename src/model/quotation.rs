use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Approval state of a quotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotationStatus {
    Pending,
    Approved,
    Rejected,
}

impl QuotationStatus {
    pub const ALL: [QuotationStatus; 3] = [
        QuotationStatus::Pending,
        QuotationStatus::Approved,
        QuotationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationStatus::Pending => "pending",
            QuotationStatus::Approved => "approved",
            QuotationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuotationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(QuotationStatus::Pending),
            "approved" => Ok(QuotationStatus::Approved),
            "rejected" => Ok(QuotationStatus::Rejected),
            other => Err(format!("unknown quotation status: {other}")),
        }
    }
}

/// Reference to a document attached to a quotation. `url` is an opaque
/// retrieval handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationFile {
    pub id: String,
    pub name: String,
    pub url: String,
    pub upload_date: DateTime<Utc>,
}

impl QuotationFile {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        QuotationFile {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            url: url.into(),
            upload_date: Utc::now(),
        }
    }
}

/// A priced proposal tracked through approval, procurement and billing.
///
/// Whether a purchase order was created or an invoice generated is derived
/// from the presence of the corresponding file; see
/// [`Quotation::purchase_order_created`] and [`Quotation::invoice_generated`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub id: String,
    pub title: String,
    pub client: String,
    pub description: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub status: QuotationStatus,
    #[serde(default)]
    pub purchase_order_file: Option<QuotationFile>,
    #[serde(default)]
    pub invoice_file: Option<QuotationFile>,
    #[serde(default)]
    pub invoice_paid: bool,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Optimistic-concurrency stamp. An update must carry the version it was
    /// based on.
    #[serde(default)]
    pub version: u64,
}

impl Quotation {
    /// Builds the initial snapshot for freshly submitted fields: pending, no
    /// documents, unpaid.
    pub fn from_new(id: impl Into<String>, fields: NewQuotation, owner_id: &str) -> Self {
        let now = Utc::now();
        Quotation {
            id: id.into(),
            title: fields.title,
            client: fields.client,
            description: fields.description,
            amount: fields.amount,
            date: fields.date,
            status: QuotationStatus::Pending,
            purchase_order_file: None,
            invoice_file: None,
            invoice_paid: false,
            created_by: Some(owner_id.to_string()),
            created_at: Some(now),
            updated_at: Some(now),
            version: 1,
        }
    }

    pub fn purchase_order_created(&self) -> bool {
        self.purchase_order_file.is_some()
    }

    pub fn invoice_generated(&self) -> bool {
        self.invoice_file.is_some()
    }

    /// Lists every invariant the snapshot breaks. An empty list means the
    /// record is consistent.
    ///
    /// Attaching an invoice also requires an approved status, but that is
    /// only enforced when the invoice is attached: status may move away from
    /// `approved` later without touching the documents.
    pub fn invariant_violations(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();
        if self.invoice_file.is_some() && self.purchase_order_file.is_none() {
            violations.push(InvariantViolation::InvoiceWithoutPurchaseOrder);
        }
        if self.invoice_paid && self.invoice_file.is_none() {
            violations.push(InvariantViolation::PaidWithoutInvoice);
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            violations.push(InvariantViolation::InvalidAmount);
        }
        violations
    }

    /// Checks externally stored milestone flags against document presence.
    pub fn check_flags(
        &self,
        purchase_order_created: bool,
        invoice_generated: bool,
    ) -> Result<(), InvariantViolation> {
        if purchase_order_created != self.purchase_order_created() {
            return Err(InvariantViolation::PurchaseOrderFlagMismatch);
        }
        if invoice_generated != self.invoice_generated() {
            return Err(InvariantViolation::InvoiceFlagMismatch);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("purchaseOrderCreated does not match the presence of the purchase order file")]
    PurchaseOrderFlagMismatch,
    #[error("invoiceGenerated does not match the presence of the invoice file")]
    InvoiceFlagMismatch,
    #[error("an invoice cannot exist without a purchase order")]
    InvoiceWithoutPurchaseOrder,
    #[error("a quotation cannot be paid without an invoice")]
    PaidWithoutInvoice,
    #[error("amount must be a non-negative number")]
    InvalidAmount,
}

/// Fields submitted when a quotation is created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuotation {
    pub title: String,
    pub client: String,
    pub description: String,
    pub amount: f64,
    pub date: NaiveDate,
}
