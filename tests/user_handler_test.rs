mod common;

use axum::http::StatusCode;
use axum::Router;
use common::{admin_token, empty_request, json_request, login, send, test_app, ADMIN_EMAIL};
use serde_json::{json, Value};

async fn create_user(app: &Router, token: &str, email: &str, role: &str) -> (StatusCode, Value) {
    send(
        app,
        json_request(
            "POST",
            "/users",
            Some(token),
            json!({
                "name": "Sam Field",
                "email": email,
                "password": "fieldwork42",
                "role": role
            }),
        ),
    )
    .await
}

#[tokio::test]
async fn test_login_handler() {
    let app = test_app().await;
    let (status, body) = login(&app, "ADMIN@example.com", common::ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user"]["email"], ADMIN_EMAIL);
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["tokens"]["accessToken"].as_str().is_some());
    assert!(body["tokens"]["refreshToken"].as_str().is_some());
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = test_app().await;
    let expected = "Invalid credentials. Check your email and password.";

    let (status, body) = login(&app, ADMIN_EMAIL, "wrong-password1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], expected);

    let (status, body) = login(&app, "nobody@example.com", "whatever123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], expected);

    let (status, body) = login(&app, "not-an-email", "whatever123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], expected);
}

#[tokio::test]
async fn test_refresh_token_handler() {
    let app = test_app().await;
    let (_, auth) = login(&app, ADMIN_EMAIL, common::ADMIN_PASSWORD).await;
    let refresh = auth["tokens"]["refreshToken"].as_str().unwrap();

    let (status, body) = send(
        &app,
        json_request("POST", "/users/refresh-token", None, json!({ "refreshToken": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let access = body["accessToken"].as_str().unwrap();

    let (status, me) = send(&app, empty_request("GET", "/users/me", Some(access))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], ADMIN_EMAIL);

    // an access token is not accepted as a refresh token
    let (status, _) = send(
        &app,
        json_request("POST", "/users/refresh-token", None, json!({ "refreshToken": access })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = test_app().await;
    let (_, auth) = login(&app, ADMIN_EMAIL, common::ADMIN_PASSWORD).await;
    let access = auth["tokens"]["accessToken"].as_str().unwrap();
    let refresh = auth["tokens"]["refreshToken"].as_str().unwrap();

    let (status, _) = send(&app, empty_request("POST", "/users/logout", Some(access))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, empty_request("GET", "/users/me", Some(access))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(
        &app,
        json_request("POST", "/users/refresh-token", None, json!({ "refreshToken": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_user_management() {
    let app = test_app().await;
    let token = admin_token(&app).await;

    let (status, created) = create_user(&app, &token, "Sam@Example.com", "user").await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["email"], "sam@example.com");
    assert_eq!(created["role"], "user");

    let (status, _) = create_user(&app, &token, "sam@example.com", "user").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, users) = send(&app, empty_request("GET", "/users", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);

    let id = created["id"].as_str().unwrap();
    let (status, updated) = send(
        &app,
        json_request("PATCH", &format!("/users/{id}"), Some(&token), json!({ "name": "Sam Fielding" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["name"], "Sam Fielding");

    let (status, _) = send(&app, empty_request("DELETE", &format!("/users/{id}"), Some(&token))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, empty_request("DELETE", &format!("/users/{id}"), Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let app = test_app().await;
    let (_, auth) = login(&app, ADMIN_EMAIL, common::ADMIN_PASSWORD).await;
    let token = auth["tokens"]["accessToken"].as_str().unwrap();
    let id = auth["user"]["id"].as_str().unwrap();

    let (status, body) = send(&app, empty_request("DELETE", &format!("/users/{id}"), Some(token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn test_weak_password_is_rejected() {
    let app = test_app().await;
    let token = admin_token(&app).await;
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/users",
            Some(&token),
            json!({ "name": "Weak", "email": "weak@example.com", "password": "abcdefgh" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_regular_user_is_forbidden_from_admin_routes() {
    let app = test_app().await;
    let token = admin_token(&app).await;
    let (status, created) = create_user(&app, &token, "sam@example.com", "user").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, auth) = login(&app, "sam@example.com", "fieldwork42").await;
    assert_eq!(status, StatusCode::OK);
    let user_token = auth["tokens"]["accessToken"].as_str().unwrap().to_string();

    let (status, body) = send(&app, empty_request("GET", "/users", Some(&user_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    // regular users still work with quotations
    let (status, _) = send(&app, empty_request("GET", "/quotations", Some(&user_token))).await;
    assert_eq!(status, StatusCode::OK);

    // promotion applies to the live session immediately
    let id = created["id"].as_str().unwrap();
    let (status, _) = send(
        &app,
        json_request("PATCH", &format!("/users/{id}"), Some(&token), json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, empty_request("GET", "/users", Some(&user_token))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_own_profile() {
    let app = test_app().await;
    let token = admin_token(&app).await;
    let (status, body) = send(
        &app,
        json_request("PUT", "/users/me", Some(&token), json!({ "name": "Head Office" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["name"], "Head Office");
    assert_eq!(body["role"], "admin");
}
