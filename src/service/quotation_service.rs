use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, instrument, warn};

use crate::dto::quotation_dto::UploadedFile;
use crate::model::quotation::{NewQuotation, Quotation, QuotationFile};
use crate::repository::quotation_repo::QuotationRepository;
use crate::service::quotation_filter::{filter_quotations, status_counts, StatusCounts, StatusFilter};
use crate::util::error::ServiceError;
use crate::util::storage::FileStorage;
use crate::workflow::{self, removal_impact, Document, WorkflowAction, WorkflowProgress};

const PDF_CONTENT_TYPE: &str = "application/pdf";
const PDF_MAGIC: &[u8] = b"%PDF";

/// Caller-supplied guards for a workflow action.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionOptions {
    /// Acknowledges the warning of a removal that takes other milestones down.
    pub confirm: bool,
    /// Rejects the action when the stored record is at a different version.
    pub expected_version: Option<u64>,
}

#[async_trait]
pub trait QuotationService: Send + Sync {
    async fn list_quotations(&self, query: &str, filter: StatusFilter) -> Result<Vec<Quotation>, ServiceError>;
    async fn status_summary(&self) -> Result<StatusCounts, ServiceError>;
    async fn create_quotation(&self, fields: NewQuotation, owner_id: &str) -> Result<Quotation, ServiceError>;
    async fn get_quotation(&self, id: &str) -> Result<Quotation, ServiceError>;
    async fn update_quotation(&self, quotation: Quotation) -> Result<Quotation, ServiceError>;
    async fn delete_quotation(&self, id: &str) -> Result<(), ServiceError>;
    async fn workflow_progress(&self, id: &str) -> Result<WorkflowProgress, ServiceError>;
    async fn apply_action(
        &self,
        id: &str,
        action: WorkflowAction,
        options: ActionOptions,
    ) -> Result<Quotation, ServiceError>;
    /// Stores a PDF and attaches it as the given document.
    async fn upload_document(
        &self,
        id: &str,
        document: Document,
        file: UploadedFile,
        expected_version: Option<u64>,
    ) -> Result<Quotation, ServiceError>;
}

pub struct QuotationServiceImpl {
    pub quotation_repo: Arc<dyn QuotationRepository>,
    pub file_storage: Arc<dyn FileStorage>,
    pub max_upload_bytes: usize,
}

impl QuotationServiceImpl {
    pub fn new(
        quotation_repo: Arc<dyn QuotationRepository>,
        file_storage: Arc<dyn FileStorage>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            quotation_repo,
            file_storage,
            max_upload_bytes,
        }
    }

    fn ensure_consistent(quotation: &Quotation) -> Result<(), ServiceError> {
        let violations = quotation.invariant_violations();
        if violations.is_empty() {
            return Ok(());
        }
        let message = violations
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Err(ServiceError::InvalidInput(message))
    }

    fn ensure_version(quotation: &Quotation, expected: Option<u64>) -> Result<(), ServiceError> {
        match expected {
            Some(version) if version != quotation.version => {
                warn!(stored = quotation.version, expected = version, "Stale quotation version");
                Err(ServiceError::Conflict(format!(
                    "Quotation {} was modified by someone else; reload and try again",
                    quotation.id
                )))
            }
            _ => Ok(()),
        }
    }

    fn validate_upload(&self, file: &UploadedFile) -> Result<(), ServiceError> {
        if file.size() == 0 {
            return Err(ServiceError::InvalidInput("The uploaded file is empty".to_string()));
        }
        if file.size() > self.max_upload_bytes {
            return Err(ServiceError::InvalidInput(format!(
                "The file exceeds the maximum size of {} MB",
                self.max_upload_bytes / (1024 * 1024)
            )));
        }
        let declared_pdf = file
            .content_type
            .split(';')
            .next()
            .map(|ct| ct.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
            .unwrap_or(false);
        if !declared_pdf || !file.content.starts_with(PDF_MAGIC) {
            return Err(ServiceError::InvalidInput("Only PDF files are accepted".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl QuotationService for QuotationServiceImpl {
    #[instrument(skip(self))]
    async fn list_quotations(&self, query: &str, filter: StatusFilter) -> Result<Vec<Quotation>, ServiceError> {
        let all = self.quotation_repo.list().await.map_err(|e| {
            error!("Failed to list quotations: {e}");
            ServiceError::from(e)
        })?;
        let matching: Vec<Quotation> = filter_quotations(&all, query, filter).into_iter().cloned().collect();
        info!(total = all.len(), matching = matching.len(), "Quotations listed");
        Ok(matching)
    }

    #[instrument(skip(self))]
    async fn status_summary(&self) -> Result<StatusCounts, ServiceError> {
        let all = self.quotation_repo.list().await.map_err(|e| {
            error!("Failed to list quotations for summary: {e}");
            ServiceError::from(e)
        })?;
        Ok(status_counts(&all))
    }

    #[instrument(skip(self, fields), fields(title = %fields.title))]
    async fn create_quotation(&self, fields: NewQuotation, owner_id: &str) -> Result<Quotation, ServiceError> {
        if !fields.amount.is_finite() || fields.amount < 0.0 {
            return Err(ServiceError::InvalidInput("amount must be a non-negative number".to_string()));
        }
        let res = self.quotation_repo.create(fields, owner_id).await;
        match &res {
            Ok(q) => info!(id = %q.id, "Quotation created"),
            Err(e) => error!("Failed to create quotation: {e}"),
        }
        res.map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    async fn get_quotation(&self, id: &str) -> Result<Quotation, ServiceError> {
        let res = self.quotation_repo.get_by_id(id).await;
        if let Err(e) = &res {
            error!("Failed to fetch quotation: {e}");
        }
        res.map_err(ServiceError::from)
    }

    #[instrument(skip(self, quotation), fields(id = %quotation.id, version = quotation.version))]
    async fn update_quotation(&self, quotation: Quotation) -> Result<Quotation, ServiceError> {
        Self::ensure_consistent(&quotation)?;
        let current = self.quotation_repo.get_by_id(&quotation.id).await?;
        Self::ensure_version(&current, Some(quotation.version))?;
        workflow::check_replacement(&current, &quotation)?;

        let mut replacement = quotation;
        replacement.created_by = current.created_by;
        replacement.created_at = current.created_at;

        let res = self.quotation_repo.update(replacement).await;
        match &res {
            Ok(q) => info!(version = q.version, "Quotation updated"),
            Err(e) => error!("Failed to update quotation: {e}"),
        }
        res.map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    async fn delete_quotation(&self, id: &str) -> Result<(), ServiceError> {
        let res = self.quotation_repo.delete(id).await;
        match &res {
            Ok(_) => info!("Quotation deleted"),
            Err(e) => error!("Failed to delete quotation: {e}"),
        }
        res.map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    async fn workflow_progress(&self, id: &str) -> Result<WorkflowProgress, ServiceError> {
        let quotation = self.get_quotation(id).await?;
        Ok(WorkflowProgress::of(&quotation))
    }

    #[instrument(skip(self, action), fields(action = %action.kind()))]
    async fn apply_action(
        &self,
        id: &str,
        action: WorkflowAction,
        options: ActionOptions,
    ) -> Result<Quotation, ServiceError> {
        let current = self.quotation_repo.get_by_id(id).await?;
        Self::ensure_version(&current, options.expected_version)?;

        if let Some(document) = action.removed_document() {
            if let Some(impact) = removal_impact(&current, document) {
                if impact.requires_confirmation() && !options.confirm {
                    let warning = impact.warning().unwrap_or("This removal affects other milestones");
                    warn!(%document, "Removal needs confirmation");
                    return Err(ServiceError::ConfirmationRequired(warning.to_string()));
                }
            }
        }

        let next = workflow::apply(&current, &action).map_err(|e| {
            warn!("Workflow action rejected: {e}");
            ServiceError::from(e)
        })?;

        let res = self.quotation_repo.update(next).await;
        match &res {
            Ok(q) => info!(version = q.version, status = %q.status, "Workflow action applied"),
            Err(e) => error!("Failed to persist workflow action: {e}"),
        }
        res.map_err(ServiceError::from)
    }

    #[instrument(skip(self, file), fields(filename = %file.filename, size = file.size()))]
    async fn upload_document(
        &self,
        id: &str,
        document: Document,
        file: UploadedFile,
        expected_version: Option<u64>,
    ) -> Result<Quotation, ServiceError> {
        self.validate_upload(&file)?;

        // Preconditions are checked before anything is written to storage.
        let current = self.quotation_repo.get_by_id(id).await?;
        Self::ensure_version(&current, expected_version)?;
        workflow::check(&current, document.attach_kind())?;

        let object_name = format!("quotations/{}/{}-{}.pdf", id, document, uuid::Uuid::new_v4());
        let url = self
            .file_storage
            .put_object(&object_name, file.content.clone(), PDF_CONTENT_TYPE)
            .await
            .map_err(|e| {
                error!("Failed to store {document}: {e}");
                ServiceError::InternalError(format!("Storage error: {e}"))
            })?;

        let attachment = QuotationFile::new(file.filename, url);
        let version = current.version;
        self.apply_action(
            id,
            document.attach(attachment),
            ActionOptions {
                confirm: false,
                expected_version: Some(version),
            },
        )
        .await
    }
}
