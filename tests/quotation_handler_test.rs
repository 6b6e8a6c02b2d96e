mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{admin_token, empty_request, json_request, send, test_app};
use serde_json::{json, Value};

const BOUNDARY: &str = "quotation-test-boundary";

fn quotation_body(title: &str, client: &str) -> Value {
    json!({
        "title": title,
        "client": client,
        "description": "Supply and install",
        "amount": 1200.5,
        "date": "2024-05-20"
    })
}

fn upload_request(uri: &str, token: &str, filename: &str, content_type: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n").as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

async fn create(app: &Router, token: &str, title: &str, client: &str) -> Value {
    let (status, body) = send(app, json_request("POST", "/quotations", Some(token), quotation_body(title, client))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

async fn act(app: &Router, token: &str, id: &str, action: Value) -> (StatusCode, Value) {
    send(app, json_request("POST", &format!("/quotations/{id}/workflow"), Some(token), action)).await
}

#[tokio::test]
async fn routes_require_a_token() {
    let app = test_app().await;
    let (status, body) = send(&app, empty_request("GET", "/quotations", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = send(&app, empty_request("GET", "/quotations", Some("not-a-jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, empty_request("GET", "/health", None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn create_starts_pending_without_documents() {
    let app = test_app().await;
    let token = admin_token(&app).await;
    let body = create(&app, &token, "Roof repair", "Acme").await;

    assert_eq!(body["status"], "pending");
    assert_eq!(body["purchaseOrderCreated"], false);
    assert_eq!(body["invoiceGenerated"], false);
    assert_eq!(body["invoicePaid"], false);
    assert_eq!(body["version"], 1);
    assert!(body["purchaseOrderFile"].is_null());

    let id = body["id"].as_str().unwrap();
    let (status, fetched) = send(&app, empty_request("GET", &format!("/quotations/{id}"), Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "Roof repair");
}

#[tokio::test]
async fn create_rejects_invalid_fields() {
    let app = test_app().await;
    let token = admin_token(&app).await;
    let mut body = quotation_body("", "Acme");
    body["amount"] = json!(-1.0);
    let (status, body) = send(&app, json_request("POST", "/quotations", Some(&token), body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Validation");
}

#[tokio::test]
async fn list_filters_by_query_and_status() {
    let app = test_app().await;
    let token = admin_token(&app).await;
    let alpha = create(&app, &token, "Alpha", "Acme").await;
    create(&app, &token, "Beta", "Zeta").await;

    let (status, body) = send(&app, empty_request("GET", "/quotations?q=acme", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body.as_array().unwrap().iter().map(|q| q["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Alpha"]);

    let id = alpha["id"].as_str().unwrap();
    let (status, _) = act(&app, &token, id, json!({ "action": "setStatus", "status": "approved" })).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, empty_request("GET", "/quotations?status=approved", Some(&token))).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    let (_, body) = send(&app, empty_request("GET", "/quotations?status=all&q=", Some(&token))).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = send(&app, empty_request("GET", "/quotations?status=archived", Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, summary) = send(&app, empty_request("GET", "/quotations/summary", Some(&token))).await;
    assert_eq!(summary["total"], 2);
    assert_eq!(summary["approved"], 1);
    assert_eq!(summary["pending"], 1);
}

#[tokio::test]
async fn workflow_gates_and_cascade_confirmation() {
    let app = test_app().await;
    let token = admin_token(&app).await;
    let created = create(&app, &token, "Alpha", "Acme").await;
    let id = created["id"].as_str().unwrap().to_string();
    let po_uri = format!("/quotations/{id}/documents/purchase-order");
    let invoice_uri = format!("/quotations/{id}/documents/invoice");

    // not approved yet
    let (status, body) = send(&app, upload_request(&po_uri, &token, "po.pdf", "application/pdf", b"%PDF-1.4 po")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");

    act(&app, &token, &id, json!({ "action": "setStatus", "status": "approved" })).await;

    let (status, _) = send(&app, upload_request(&po_uri, &token, "scan.png", "image/png", b"\x89PNG")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, upload_request(&po_uri, &token, "po.pdf", "application/pdf", b"%PDF-1.4 po")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["purchaseOrderCreated"], true);
    assert_eq!(body["purchaseOrderFile"]["name"], "po.pdf");
    assert!(body["purchaseOrderFile"]["url"].as_str().unwrap().starts_with("/files/quotations/"));

    let (status, body) =
        send(&app, upload_request(&invoice_uri, &token, "inv.pdf", "application/pdf", b"%PDF-1.4 inv")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["invoiceGenerated"], true);

    let (status, body) = act(&app, &token, &id, json!({ "action": "togglePaid" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["invoicePaid"], true);

    let (status, progress) = send(&app, empty_request("GET", &format!("/quotations/{id}/workflow"), Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["payment"]["status"], "paid");
    assert_eq!(progress["purchaseOrderRemoval"]["requiresConfirmation"], true);

    let (status, body) = act(&app, &token, &id, json!({ "action": "removePurchaseOrder" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Confirmation required");
    assert!(body["details"].as_str().unwrap().contains("invoice"));

    let (status, body) = act(&app, &token, &id, json!({ "action": "removePurchaseOrder", "confirm": true })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["purchaseOrderCreated"], false);
    assert_eq!(body["invoiceGenerated"], false);
    assert_eq!(body["invoicePaid"], false);

    let (status, _) = act(&app, &token, &id, json!({ "action": "removePurchaseOrder", "confirm": true })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn stale_update_is_a_conflict() {
    let app = test_app().await;
    let token = admin_token(&app).await;
    let created = create(&app, &token, "Alpha", "Acme").await;
    let id = created["id"].as_str().unwrap();

    let mut update = quotation_body("Alpha (rev 2)", "Acme");
    update["status"] = json!("pending");
    update["version"] = json!(1);
    let (status, body) = send(&app, json_request("PUT", &format!("/quotations/{id}"), Some(&token), update.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["version"], 2);

    let (status, body) = send(&app, json_request("PUT", &format!("/quotations/{id}"), Some(&token), update)).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, _) = act(
        &app,
        &token,
        id,
        json!({ "action": "setStatus", "status": "rejected", "expectedVersion": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn delete_then_missing() {
    let app = test_app().await;
    let token = admin_token(&app).await;
    let created = create(&app, &token, "Alpha", "Acme").await;
    let uri = format!("/quotations/{}", created["id"].as_str().unwrap());

    let (status, _) = send(&app, empty_request("DELETE", &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, empty_request("GET", &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
