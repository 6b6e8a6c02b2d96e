use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::handler::quotation_handler::{
    apply_workflow_action_handler, create_quotation_handler, delete_quotation_handler, get_quotation_handler,
    get_workflow_handler, list_quotations_handler, quotation_summary_handler, update_quotation_handler,
    upload_document_handler,
};
use crate::middlewares::auth_middleware::{require_session, AuthState};
use crate::service::quotation_service::QuotationServiceImpl;

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Every quotation route requires a signed-in user.
pub fn quotation_router(service: Arc<QuotationServiceImpl>, auth_state: Arc<AuthState>) -> Router {
    let upload_limit = service.max_upload_bytes + MULTIPART_OVERHEAD;

    let uploads = Router::new()
        .route("/quotations/{id}/documents/{document}", post(upload_document_handler))
        .layer(DefaultBodyLimit::max(upload_limit));

    Router::new()
        .route("/quotations", get(list_quotations_handler).post(create_quotation_handler))
        .route("/quotations/summary", get(quotation_summary_handler))
        .route(
            "/quotations/{id}",
            get(get_quotation_handler)
                .put(update_quotation_handler)
                .delete(delete_quotation_handler),
        )
        .route(
            "/quotations/{id}/workflow",
            get(get_workflow_handler).post(apply_workflow_action_handler),
        )
        .merge(uploads)
        .route_layer(middleware::from_fn_with_state(auth_state, require_session))
        .with_state(service)
}
