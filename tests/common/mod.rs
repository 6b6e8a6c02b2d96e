#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use quotation_tracker::app::build_router;
use quotation_tracker::config::{AdminUserConfig, JwtConfig, StorageConfig};
use quotation_tracker::middlewares::auth_middleware::AuthState;
use quotation_tracker::repository::memory::{InMemoryQuotationRepository, InMemoryUserRepository};
use quotation_tracker::service::quotation_service::QuotationServiceImpl;
use quotation_tracker::service::user_service::UserServiceImpl;
use quotation_tracker::util::jwt::{JwtTokenUtils, JwtTokenUtilsImpl};
use quotation_tracker::util::session::SessionRegistry;
use quotation_tracker::util::storage::{FileStorage, LocalFileStorage};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "changeme123";

/// Router wired to in-memory stores and a scratch upload directory.
pub async fn test_app() -> Router {
    let jwt_utils: Arc<dyn JwtTokenUtils> = Arc::new(JwtTokenUtilsImpl::new(JwtConfig::default()));
    let sessions = Arc::new(SessionRegistry::new());

    let storage_config = StorageConfig {
        upload_dir: std::env::temp_dir().join(format!("quotation-tracker-{}", uuid::Uuid::new_v4())),
        base_url: "/files".to_string(),
        max_upload_bytes: 64 * 1024,
    };
    let file_storage: Arc<dyn FileStorage> = Arc::new(LocalFileStorage::new(&storage_config));

    let user_service = Arc::new(UserServiceImpl::new(
        Arc::new(InMemoryUserRepository::new()),
        jwt_utils.clone(),
        sessions.clone(),
    ));
    user_service
        .bootstrap_admin(&AdminUserConfig {
            name: "Administrator".to_string(),
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
        })
        .await
        .expect("admin bootstrap");

    let quotation_service = Arc::new(QuotationServiceImpl::new(
        Arc::new(InMemoryQuotationRepository::new()),
        file_storage,
        storage_config.max_upload_bytes,
    ));
    let auth_state = Arc::new(AuthState { jwt_utils, sessions });

    build_router(quotation_service, user_service, auth_state)
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Logs in and returns the full auth response.
pub async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        json_request(
            "POST",
            "/users/login",
            None,
            json!({ "email": email, "password": password }),
        ),
    )
    .await
}

pub async fn admin_token(app: &Router) -> String {
    let (status, body) = login(app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["tokens"]["accessToken"].as_str().unwrap().to_string()
}
