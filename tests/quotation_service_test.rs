use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use quotation_tracker::dto::quotation_dto::UploadedFile;
use quotation_tracker::model::quotation::{NewQuotation, Quotation, QuotationStatus};
use quotation_tracker::repository::memory::InMemoryQuotationRepository;
use quotation_tracker::repository::quotation_repo::QuotationRepository;
use quotation_tracker::repository::repository_error::{RepositoryError, RepositoryResult};
use quotation_tracker::service::quotation_filter::StatusFilter;
use quotation_tracker::service::quotation_service::{ActionOptions, QuotationService, QuotationServiceImpl};
use quotation_tracker::util::error::ServiceError;
use quotation_tracker::util::storage::{FileStorage, StorageError};
use quotation_tracker::workflow::{Document, WorkflowAction, WorkflowError};

#[derive(Default)]
struct RecordingStorage {
    objects: Mutex<Vec<String>>,
}

#[async_trait]
impl FileStorage for RecordingStorage {
    async fn put_object(&self, object_name: &str, _content: Bytes, _content_type: &str) -> Result<String, StorageError> {
        self.objects.lock().unwrap().push(object_name.to_string());
        Ok(format!("mem://{}", object_name))
    }
}

/// Store whose reads always fail, as if the database were unreachable.
struct UnreachableRepository;

#[async_trait]
impl QuotationRepository for UnreachableRepository {
    async fn create(&self, _fields: NewQuotation, _owner_id: &str) -> RepositoryResult<Quotation> {
        Err(RepositoryError::connection("unreachable"))
    }
    async fn get_by_id(&self, _id: &str) -> RepositoryResult<Quotation> {
        Err(RepositoryError::connection("unreachable"))
    }
    async fn update(&self, _quotation: Quotation) -> RepositoryResult<Quotation> {
        Err(RepositoryError::connection("unreachable"))
    }
    async fn delete(&self, _id: &str) -> RepositoryResult<()> {
        Err(RepositoryError::connection("unreachable"))
    }
    async fn list(&self) -> RepositoryResult<Vec<Quotation>> {
        Err(RepositoryError::connection("unreachable"))
    }
}

struct Fixture {
    service: QuotationServiceImpl,
    storage: Arc<RecordingStorage>,
}

fn fixture() -> Fixture {
    let storage = Arc::new(RecordingStorage::default());
    let service = QuotationServiceImpl::new(
        Arc::new(InMemoryQuotationRepository::new()),
        storage.clone(),
        1024,
    );
    Fixture { service, storage }
}

fn fields(title: &str, client: &str) -> NewQuotation {
    NewQuotation {
        title: title.to_string(),
        client: client.to_string(),
        description: "scope".to_string(),
        amount: 250.0,
        date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
    }
}

fn pdf(name: &str) -> UploadedFile {
    UploadedFile {
        filename: name.to_string(),
        content_type: "application/pdf".to_string(),
        content: Bytes::from_static(b"%PDF-1.7\n%test"),
    }
}

async fn approved(service: &QuotationServiceImpl) -> Quotation {
    let q = service.create_quotation(fields("Fit-out", "Acme"), "owner-1").await.unwrap();
    service
        .apply_action(
            &q.id,
            WorkflowAction::SetStatus {
                status: QuotationStatus::Approved,
            },
            ActionOptions::default(),
        )
        .await
        .unwrap()
}

async fn fully_paid(service: &QuotationServiceImpl) -> Quotation {
    let q = approved(service).await;
    service
        .upload_document(&q.id, Document::PurchaseOrder, pdf("po.pdf"), None)
        .await
        .unwrap();
    service
        .upload_document(&q.id, Document::Invoice, pdf("invoice.pdf"), None)
        .await
        .unwrap();
    service
        .apply_action(&q.id, WorkflowAction::TogglePaid, ActionOptions::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn create_then_list_newest_first_with_filter() {
    let f = fixture();
    f.service.create_quotation(fields("Alpha", "Acme"), "u").await.unwrap();
    f.service.create_quotation(fields("Beta", "Zeta"), "u").await.unwrap();

    let all = f.service.list_quotations("", StatusFilter::All).await.unwrap();
    let titles: Vec<&str> = all.iter().map(|q| q.title.as_str()).collect();
    assert_eq!(titles, vec!["Beta", "Alpha"]);

    let acme = f.service.list_quotations("acme", StatusFilter::Pending).await.unwrap();
    assert_eq!(acme.len(), 1);
    assert_eq!(acme[0].created_by.as_deref(), Some("u"));

    let summary = f.service.status_summary().await.unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.pending, 2);
}

#[tokio::test]
async fn negative_amount_is_rejected() {
    let f = fixture();
    let mut bad = fields("Alpha", "Acme");
    bad.amount = -5.0;
    let err = f.service.create_quotation(bad, "u").await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn upload_attaches_purchase_order() {
    let f = fixture();
    let q = approved(&f.service).await;
    let updated = f
        .service
        .upload_document(&q.id, Document::PurchaseOrder, pdf("po.pdf"), Some(q.version))
        .await
        .unwrap();

    let attached = updated.purchase_order_file.expect("purchase order attached");
    assert_eq!(attached.name, "po.pdf");
    assert!(attached.url.starts_with("mem://quotations/"));
    assert_eq!(f.storage.objects.lock().unwrap().len(), 1);
    assert_eq!(updated.version, q.version + 1);
}

#[tokio::test]
async fn upload_before_approval_writes_nothing() {
    let f = fixture();
    let q = f.service.create_quotation(fields("Alpha", "Acme"), "u").await.unwrap();
    let err = f
        .service
        .upload_document(&q.id, Document::PurchaseOrder, pdf("po.pdf"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition(WorkflowError::InvalidTransition { .. })));
    assert!(f.storage.objects.lock().unwrap().is_empty());
}

#[tokio::test]
async fn non_pdf_and_oversize_uploads_are_rejected() {
    let f = fixture();
    let q = approved(&f.service).await;

    let png = UploadedFile {
        filename: "scan.png".to_string(),
        content_type: "image/png".to_string(),
        content: Bytes::from_static(b"\x89PNG"),
    };
    let err = f.service.upload_document(&q.id, Document::PurchaseOrder, png, None).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    let disguised = UploadedFile {
        filename: "fake.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        content: Bytes::from_static(b"not a pdf"),
    };
    let err = f.service.upload_document(&q.id, Document::PurchaseOrder, disguised, None).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    let mut big = b"%PDF".to_vec();
    big.resize(2048, b'x');
    let oversize = UploadedFile {
        filename: "big.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        content: Bytes::from(big),
    };
    let err = f.service.upload_document(&q.id, Document::PurchaseOrder, oversize, None).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    assert!(f.storage.objects.lock().unwrap().is_empty());
}

#[tokio::test]
async fn cascading_removal_needs_confirmation() {
    let f = fixture();
    let q = fully_paid(&f.service).await;

    let err = f
        .service
        .apply_action(&q.id, WorkflowAction::RemovePurchaseOrder, ActionOptions::default())
        .await
        .unwrap_err();
    match err {
        ServiceError::ConfirmationRequired(warning) => assert!(warning.contains("invoice")),
        other => panic!("expected ConfirmationRequired, got {other:?}"),
    }
    let unchanged = f.service.get_quotation(&q.id).await.unwrap();
    assert!(unchanged.invoice_paid);

    let removed = f
        .service
        .apply_action(
            &q.id,
            WorkflowAction::RemovePurchaseOrder,
            ActionOptions {
                confirm: true,
                expected_version: None,
            },
        )
        .await
        .unwrap();
    assert!(removed.purchase_order_file.is_none());
    assert!(removed.invoice_file.is_none());
    assert!(!removed.invoice_paid);
}

#[tokio::test]
async fn removing_absent_document_is_nothing_to_do() {
    let f = fixture();
    let q = f.service.create_quotation(fields("Alpha", "Acme"), "u").await.unwrap();
    let err = f
        .service
        .apply_action(&q.id, WorkflowAction::RemoveInvoice, ActionOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition(WorkflowError::NothingToDo(_))));
}

#[tokio::test]
async fn stale_version_is_a_conflict() {
    let f = fixture();
    let q = f.service.create_quotation(fields("Alpha", "Acme"), "u").await.unwrap();

    let mut first = q.clone();
    first.title = "Alpha v2".to_string();
    f.service.update_quotation(first).await.unwrap();

    let mut second = q.clone();
    second.title = "Alpha v2 from a stale tab".to_string();
    let err = f.service.update_quotation(second).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let err = f
        .service
        .apply_action(
            &q.id,
            WorkflowAction::SetStatus {
                status: QuotationStatus::Rejected,
            },
            ActionOptions {
                confirm: false,
                expected_version: Some(q.version),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn full_update_is_checked_against_invariants() {
    let f = fixture();
    let q = f.service.create_quotation(fields("Alpha", "Acme"), "owner-1").await.unwrap();

    let mut paid_without_invoice = q.clone();
    paid_without_invoice.invoice_paid = true;
    let err = f.service.update_quotation(paid_without_invoice).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    let mut hijack = q.clone();
    hijack.created_by = Some("someone-else".to_string());
    hijack.description = "updated".to_string();
    let stored = f.service.update_quotation(hijack).await.unwrap();
    assert_eq!(stored.created_by.as_deref(), Some("owner-1"));
    assert_eq!(stored.description, "updated");
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let f = fixture();
    let q = f.service.create_quotation(fields("Alpha", "Acme"), "u").await.unwrap();
    f.service.delete_quotation(&q.id).await.unwrap();
    assert!(matches!(f.service.get_quotation(&q.id).await, Err(ServiceError::NotFound(_))));
    assert!(matches!(f.service.delete_quotation(&q.id).await, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn list_failure_is_an_error_not_an_empty_list() {
    let service = QuotationServiceImpl::new(
        Arc::new(UnreachableRepository),
        Arc::new(RecordingStorage::default()),
        1024,
    );
    let err = service.list_quotations("", StatusFilter::All).await.unwrap_err();
    assert!(matches!(err, ServiceError::InternalError(_)));
}
