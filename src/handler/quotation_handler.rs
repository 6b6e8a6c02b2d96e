use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use bytes::BytesMut;
use tracing::{error, info};
use validator::Validate;

use crate::dto::quotation_dto::{
    CreateQuotationRequest, ListQuotationsQuery, QuotationResponseDto, UpdateQuotationRequest, UploadedFile,
    WorkflowActionRequest,
};
use crate::service::quotation_filter::StatusFilter;
use crate::service::quotation_service::{ActionOptions, QuotationService, QuotationServiceImpl};
use crate::util::error::HandlerError;
use crate::util::session::Session;
use crate::workflow::Document;

pub async fn list_quotations_handler(
    State(service): State<Arc<QuotationServiceImpl>>,
    Query(params): Query<ListQuotationsQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let filter = match params.status.as_deref() {
        Some(status) => status.parse::<StatusFilter>().map_err(HandlerError::bad_request)?,
        None => StatusFilter::All,
    };
    let query = params.q.unwrap_or_default();
    let quotations = service.list_quotations(&query, filter).await?;
    let body: Vec<QuotationResponseDto> = quotations.into_iter().map(QuotationResponseDto::from).collect();
    Ok(Json(body))
}

pub async fn quotation_summary_handler(
    State(service): State<Arc<QuotationServiceImpl>>,
) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.status_summary().await?))
}

pub async fn create_quotation_handler(
    State(service): State<Arc<QuotationServiceImpl>>,
    Extension(session): Extension<Session>,
    Json(payload): Json<CreateQuotationRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    payload.validate()?;
    let created = service.create_quotation(payload.into(), &session.user_id).await?;
    Ok((StatusCode::CREATED, Json(QuotationResponseDto::from(created))))
}

pub async fn get_quotation_handler(
    State(service): State<Arc<QuotationServiceImpl>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let quotation = service.get_quotation(&id).await?;
    Ok(Json(QuotationResponseDto::from(quotation)))
}

pub async fn update_quotation_handler(
    State(service): State<Arc<QuotationServiceImpl>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateQuotationRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    payload.validate()?;
    let current = service.get_quotation(&id).await?;
    let updated = service.update_quotation(payload.into_quotation(&id, &current)).await?;
    Ok(Json(QuotationResponseDto::from(updated)))
}

pub async fn delete_quotation_handler(
    State(service): State<Arc<QuotationServiceImpl>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    service.delete_quotation(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_workflow_handler(
    State(service): State<Arc<QuotationServiceImpl>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.workflow_progress(&id).await?))
}

pub async fn apply_workflow_action_handler(
    State(service): State<Arc<QuotationServiceImpl>>,
    Path(id): Path<String>,
    Json(payload): Json<WorkflowActionRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let options = ActionOptions {
        confirm: payload.confirm,
        expected_version: payload.expected_version,
    };
    let updated = service.apply_action(&id, payload.action, options).await?;
    Ok(Json(QuotationResponseDto::from(updated)))
}

/// Multipart form: a `file` part with the PDF and an optional
/// `expectedVersion` text part.
pub async fn upload_document_handler(
    State(service): State<Arc<QuotationServiceImpl>>,
    Path((id, document)): Path<(String, Document)>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HandlerError> {
    let mut upload: Option<UploadedFile> = None;
    let mut expected_version: Option<u64> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("Error getting next multipart field: {}", e);
        HandlerError::bad_request(format!("Failed to read multipart body: {}", e))
    })? {
        let name = field.name().map(|s| s.to_string()).unwrap_or_default();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().map(|s| s.to_string()).unwrap_or_else(|| format!("{}.pdf", document));
                let content_type = field.content_type().map(|s| s.to_string()).unwrap_or_default();
                let mut buf = BytesMut::new();
                let mut stream = field;
                while let Some(chunk) = stream.chunk().await.map_err(|e| {
                    error!("Error reading file chunk: {}", e);
                    HandlerError::bad_request(format!("Failed to read file: {}", e))
                })? {
                    buf.extend_from_slice(&chunk);
                }
                info!("Received {} ({} bytes)", filename, buf.len());
                upload = Some(UploadedFile {
                    filename,
                    content_type,
                    content: buf.freeze(),
                });
            }
            "expectedVersion" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| HandlerError::bad_request(format!("Failed to read expectedVersion: {}", e)))?;
                let version = text
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| HandlerError::bad_request("expectedVersion must be a number"))?;
                expected_version = Some(version);
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| HandlerError::bad_request("Missing file part"))?;
    let updated = service.upload_document(&id, document, upload, expected_version).await?;
    Ok(Json(QuotationResponseDto::from(updated)))
}
