use bytes::Bytes;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::quotation::{NewQuotation, Quotation, QuotationFile, QuotationStatus};
use crate::workflow::WorkflowAction;

/// A file received from a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub content: Bytes,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuotationRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 200))]
    pub client: String,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[validate(range(min = 0.0))]
    pub amount: f64,
    pub date: NaiveDate,
}

impl From<CreateQuotationRequest> for NewQuotation {
    fn from(req: CreateQuotationRequest) -> Self {
        NewQuotation {
            title: req.title,
            client: req.client,
            description: req.description,
            amount: req.amount,
            date: req.date,
        }
    }
}

/// Full replacement of a quotation. `version` is the version the client read.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuotationRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 200))]
    pub client: String,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[validate(range(min = 0.0))]
    pub amount: f64,
    pub date: NaiveDate,
    pub status: QuotationStatus,
    #[serde(default)]
    pub purchase_order_file: Option<QuotationFile>,
    #[serde(default)]
    pub invoice_file: Option<QuotationFile>,
    #[serde(default)]
    pub invoice_paid: bool,
    pub version: u64,
}

impl UpdateQuotationRequest {
    /// Lays the submitted fields over the stored record. Ownership and
    /// timestamps always come from the store.
    pub fn into_quotation(self, id: &str, current: &Quotation) -> Quotation {
        Quotation {
            id: id.to_string(),
            title: self.title,
            client: self.client,
            description: self.description,
            amount: self.amount,
            date: self.date,
            status: self.status,
            purchase_order_file: self.purchase_order_file,
            invoice_file: self.invoice_file,
            invoice_paid: self.invoice_paid,
            created_by: current.created_by.clone(),
            created_at: current.created_at,
            updated_at: current.updated_at,
            version: self.version,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuotationsQuery {
    pub q: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowActionRequest {
    #[serde(flatten)]
    pub action: WorkflowAction,
    /// Acknowledges the warning of a cascading removal.
    #[serde(default)]
    pub confirm: bool,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationResponseDto {
    #[serde(flatten)]
    pub quotation: Quotation,
    pub purchase_order_created: bool,
    pub invoice_generated: bool,
}

impl From<Quotation> for QuotationResponseDto {
    fn from(quotation: Quotation) -> Self {
        QuotationResponseDto {
            purchase_order_created: quotation.purchase_order_created(),
            invoice_generated: quotation.invoice_generated(),
            quotation,
        }
    }
}
