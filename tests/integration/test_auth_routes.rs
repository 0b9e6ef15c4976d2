//! Registration, login, session cookie and logout

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::{Value, json};

#[tokio::test]
async fn test_register_assigns_default_role() {
    let server = test_server().await;

    let response = server
        .post("/api/v1/auth/register")
        .json(&json!({ "name": "Ada", "email": "Ada@Example.com", "password": PASSWORD }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["code"], 20100);
    assert!(body["timestamp"].is_string());
    assert_eq!(body["data"]["email"], "ada@example.com");
    assert_eq!(body["data"]["roles"], json!(["viewer"]));
    assert!(body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_register_rejects_duplicate_email_and_short_password() {
    let server = test_server().await;
    register(&server, "Ada", "ada@example.com").await;

    let duplicate = server
        .post("/api/v1/auth/register")
        .json(&json!({ "name": "Ada", "email": "ada@example.com", "password": PASSWORD }))
        .await;
    assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);
    assert_eq!(duplicate.json::<Value>()["code"], 40900);

    let short = server
        .post("/api/v1/auth/register")
        .json(&json!({ "name": "Bob", "email": "bob@example.com", "password": "short" }))
        .await;
    assert_eq!(short.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let server = test_server().await;
    register(&server, "Ada", "ada@example.com").await;

    let response = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "ada@example.com", "password": "not-the-password" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body = response.json::<Value>();
    assert_eq!(body["code"], 40100);
    assert_eq!(body["message"], "Invalid email or password");
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test]
async fn test_login_sets_http_only_cookie_that_authenticates() {
    let server = test_server().await;
    register(&server, "Ada", "ada@example.com").await;

    let response = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "ada@example.com", "password": PASSWORD }))
        .await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["data"]["user"]["email"], "ada@example.com");
    assert!(body["data"]["expiresAt"].is_string());

    let cookie = response.cookie("token");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.value(), body["data"]["token"].as_str().unwrap());

    let me = server.get("/api/v1/auth/me").add_cookie(cookie).await;
    me.assert_status_ok();
    assert_eq!(me.json::<Value>()["data"]["name"], "Ada");
}

#[tokio::test]
async fn test_bearer_token_authenticates() {
    let server = test_server().await;
    let token = admin_token(&server).await;

    let me = server.get("/api/v1/auth/me").authorization_bearer(&token).await;
    me.assert_status_ok();
    let body = me.json::<Value>();
    assert_eq!(body["data"]["roles"], json!(["admin"]));
    assert_eq!(body["data"]["permissions"].as_array().unwrap().len(), 13);
}

#[tokio::test]
async fn test_me_requires_authentication() {
    let server = test_server().await;

    let anonymous = server.get("/api/v1/auth/me").await;
    assert_eq!(anonymous.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.json::<Value>()["code"], 40100);

    let forged = server
        .get("/api/v1/auth/me")
        .authorization_bearer("not-a-jwt")
        .await;
    assert_eq!(forged.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let server = test_server().await;
    register(&server, "Ada", "ada@example.com").await;

    let login = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "ada@example.com", "password": PASSWORD }))
        .await;
    let cookie = login.cookie("token");

    let logout = server.post("/api/v1/auth/logout").add_cookie(cookie).await;
    logout.assert_status_ok();
    assert_eq!(logout.json::<Value>()["message"], "Logged out successfully");

    let cleared = logout.cookie("token");
    assert_eq!(cleared.value(), "");
}

#[tokio::test]
async fn test_health_and_openapi() {
    let server = test_server().await;

    let health = server.get("/health").await;
    health.assert_status_ok();
    assert_eq!(health.json::<Value>()["data"]["storage"], "ok");

    let doc = server.get("/api/v1/openapi.json").await;
    doc.assert_status_ok();
    let doc = doc.json::<Value>();
    assert_eq!(doc["info"]["title"], "Form Platform API");
    assert!(doc["paths"]["/form"].is_object());
}
