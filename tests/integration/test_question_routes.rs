//! Question bank routes

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::{Value, json};

fn rating_question(tags: &[&str]) -> Value {
    json!({
        "question": { "id": "nps", "title": "How likely are you to recommend us?", "type": "rating", "min": 0, "max": 10 },
        "tags": tags
    })
}

#[tokio::test]
async fn test_saved_question_lifecycle() {
    let server = test_server().await;
    let admin = admin_token(&server).await;

    let created = server
        .post("/api/v1/question")
        .authorization_bearer(&admin)
        .json(&rating_question(&[" NPS ", "Feedback", "nps"]))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let created = created.json::<Value>();
    let id = created["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["data"]["tags"], json!(["feedback", "nps"]));
    assert_eq!(created["data"]["question"]["type"], "rating");

    let tagged = server
        .get("/api/v1/question?tag=NPS")
        .authorization_bearer(&admin)
        .await
        .json::<Value>();
    assert_eq!(tagged["data"].as_array().unwrap().len(), 1);

    let untagged = server
        .get("/api/v1/question?tag=onboarding")
        .authorization_bearer(&admin)
        .await
        .json::<Value>();
    assert_eq!(untagged["data"], json!([]));

    let mut update = rating_question(&["survey"]);
    update["id"] = json!(id);
    update["version"] = json!(1);
    let updated = server
        .put("/api/v1/question")
        .authorization_bearer(&admin)
        .json(&update)
        .await;
    updated.assert_status_ok();
    assert_eq!(updated.json::<Value>()["data"]["version"], 2);

    // Stale version
    let stale = server
        .put("/api/v1/question")
        .authorization_bearer(&admin)
        .json(&update)
        .await;
    assert_eq!(stale.status_code(), StatusCode::CONFLICT);

    server
        .delete(&format!("/api/v1/question/{}", id))
        .authorization_bearer(&admin)
        .await
        .assert_status_ok();
    let missing = server
        .get(&format!("/api/v1/question/{}", id))
        .authorization_bearer(&admin)
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_saved_question_is_rejected() {
    let server = test_server().await;
    let admin = admin_token(&server).await;

    let response = server
        .post("/api/v1/question")
        .authorization_bearer(&admin)
        .json(&json!({ "question": { "id": "bad", "type": "rating", "min": 5, "max": 1 } }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_question_bank_permissions() {
    let server = test_server().await;
    let reader = user_with_permissions(&server, "reader@example.com", &["VIEW_QUESTIONS"]).await;

    server
        .get("/api/v1/question")
        .authorization_bearer(&reader)
        .await
        .assert_status_ok();

    let denied = server
        .post("/api/v1/question")
        .authorization_bearer(&reader)
        .json(&rating_question(&[]))
        .await;
    assert_eq!(denied.status_code(), StatusCode::FORBIDDEN);

    register(&server, "Vera", "vera@example.com").await;
    let viewer = login(&server, "vera@example.com", PASSWORD).await;
    let viewer_list = server.get("/api/v1/question").authorization_bearer(&viewer).await;
    assert_eq!(viewer_list.status_code(), StatusCode::FORBIDDEN);
}
