//! Response submission, listing, deletion and export over HTTP

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::{Value, json};

fn submission(form_id: &str, mood: f64) -> Value {
    json!({
        "formId": form_id,
        "answers": [
            { "questionId": "mood", "value": mood },
            { "questionId": "colours", "value": ["Red", "Blue"] }
        ]
    })
}

#[tokio::test]
async fn test_anonymous_submit_to_open_form() {
    let server = test_server().await;
    let admin = admin_token(&server).await;
    let id = open_form(&server, &admin, form_body("Open survey")).await;

    let response = server
        .post("/api/v1/response/submit")
        .json(&submission(&id, 4.0))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["data"]["form"], id.as_str());
    assert_eq!(body["data"]["responder"], Value::Null);

    let form = server
        .get(&format!("/api/v1/form/{}", id))
        .authorization_bearer(&admin)
        .await
        .json::<Value>();
    assert_eq!(form["data"]["responses"][0], body["data"]["id"]);
}

#[tokio::test]
async fn test_submit_to_draft_is_rejected() {
    let server = test_server().await;
    let admin = admin_token(&server).await;
    let id = create_form(&server, &admin, form_body("Still a draft")).await;

    let response = server
        .post("/api/v1/response/submit")
        .json(&submission(&id, 4.0))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert!(
        response.json::<Value>()["message"]
            .as_str()
            .unwrap()
            .contains("not accepting responses")
    );
}

#[tokio::test]
async fn test_invalid_answers_list_every_problem() {
    let server = test_server().await;
    let admin = admin_token(&server).await;
    let id = open_form(&server, &admin, form_body("Strict")).await;

    let response = server
        .post("/api/v1/response/submit")
        .json(&json!({
            "formId": id,
            "answers": [
                { "questionId": "colours", "value": ["Green"] },
                { "questionId": "ghost", "value": "boo" }
            ]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["code"], 40000);
    let problems = body["data"].as_array().unwrap();
    assert_eq!(problems.len(), 3);
    assert!(problems.iter().any(|p| p.as_str().unwrap().contains("'mood' is required")));
}

#[tokio::test]
async fn test_authenticated_audience() {
    let server = test_server().await;
    let admin = admin_token(&server).await;

    let mut body = form_body("Members only");
    body["settings"] = json!({ "whoCanRespond": "authenticated" });
    let id = open_form(&server, &admin, body).await;

    let anonymous = server
        .post("/api/v1/response/submit")
        .json(&submission(&id, 2.0))
        .await;
    assert_eq!(anonymous.status_code(), StatusCode::UNAUTHORIZED);

    register(&server, "Ada", "ada@example.com").await;
    let token = login(&server, "ada@example.com", PASSWORD).await;
    let signed_in = server
        .post("/api/v1/response/submit")
        .authorization_bearer(&token)
        .json(&submission(&id, 2.0))
        .await;
    assert_eq!(signed_in.status_code(), StatusCode::CREATED);
    let response = signed_in.json::<Value>();
    let user_id = response["data"]["responder"].as_str().unwrap().to_string();

    // The responder can read their own submissions.
    let own = server
        .get(&format!("/api/v1/response/getByUserId?userId={}", user_id))
        .authorization_bearer(&token)
        .await;
    own.assert_status_ok();
    assert_eq!(own.json::<Value>()["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_response_limit() {
    let server = test_server().await;
    let admin = admin_token(&server).await;

    let mut body = form_body("Only one");
    body["settings"] = json!({ "limitResponses": true, "maxResponses": 1 });
    let id = open_form(&server, &admin, body).await;

    server
        .post("/api/v1/response/submit")
        .json(&submission(&id, 1.0))
        .await
        .assert_status(StatusCode::CREATED);

    let second = server
        .post("/api/v1/response/submit")
        .json(&submission(&id, 1.0))
        .await;
    assert_eq!(second.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_list_and_delete_permissions() {
    let server = test_server().await;
    let admin = admin_token(&server).await;
    let id = open_form(&server, &admin, form_body("Feedback")).await;

    for mood in [1.0, 5.0] {
        server
            .post("/api/v1/response/submit")
            .json(&submission(&id, mood))
            .await
            .assert_status(StatusCode::CREATED);
    }

    register(&server, "Vera", "vera@example.com").await;
    let viewer = login(&server, "vera@example.com", PASSWORD).await;

    let listed = server
        .get(&format!("/api/v1/response/getByFormId?formId={}", id))
        .authorization_bearer(&viewer)
        .await;
    listed.assert_status_ok();
    let listed = listed.json::<Value>();
    let responses = listed["data"].as_array().unwrap();
    assert_eq!(responses.len(), 2);
    let first_id = responses[0]["id"].as_str().unwrap().to_string();

    let denied = server
        .delete(&format!("/api/v1/response/delete?id={}", first_id))
        .authorization_bearer(&viewer)
        .await;
    assert_eq!(denied.status_code(), StatusCode::FORBIDDEN);

    server
        .delete(&format!("/api/v1/response/delete?id={}", first_id))
        .authorization_bearer(&admin)
        .await
        .assert_status_ok();

    let cleared = server
        .delete(&format!("/api/v1/response/deleteByFormId?formId={}", id))
        .authorization_bearer(&admin)
        .await;
    cleared.assert_status_ok();
    assert_eq!(cleared.json::<Value>()["data"]["deleted"], 1);
}

#[tokio::test]
async fn test_update_response_revalidates() {
    let server = test_server().await;
    let admin = admin_token(&server).await;
    let id = open_form(&server, &admin, form_body("Editable")).await;

    let submitted = server
        .post("/api/v1/response/submit")
        .json(&submission(&id, 2.0))
        .await
        .json::<Value>();
    let response_id = submitted["data"]["id"].as_str().unwrap();

    let updated = server
        .patch("/api/v1/response/update")
        .authorization_bearer(&admin)
        .json(&json!({ "id": response_id, "answers": [{ "questionId": "mood", "value": 5 }] }))
        .await;
    updated.assert_status_ok();
    let updated = updated.json::<Value>();
    assert_eq!(updated["data"]["answers"][0]["value"], 5.0);
    assert_eq!(updated["data"]["version"], 2);

    let invalid = server
        .patch("/api/v1/response/update")
        .authorization_bearer(&admin)
        .json(&json!({ "id": response_id, "answers": [{ "questionId": "mood", "value": 9 }] }))
        .await;
    assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_csv_download() {
    let server = test_server().await;
    let admin = admin_token(&server).await;
    let id = open_form(&server, &admin, form_body("Export me")).await;

    server
        .post("/api/v1/response/submit")
        .json(&submission(&id, 3.0))
        .await
        .assert_status(StatusCode::CREATED);

    let download = server
        .get(&format!("/api/v1/response/download/{}", id))
        .authorization_bearer(&admin)
        .await;
    download.assert_status_ok();
    assert!(
        download
            .header("content-type")
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    assert!(
        download
            .header("content-disposition")
            .to_str()
            .unwrap()
            .contains(&format!("responses-{}.csv", id))
    );

    let text = download.text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("Mood,Colours"));
    assert!(lines[1].ends_with(",3,Red; Blue"));

    let anonymous = server.get(&format!("/api/v1/response/download/{}", id)).await;
    assert_eq!(anonymous.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_export_link_works_without_session() {
    let server = test_server().await;
    let admin = admin_token(&server).await;
    let id = open_form(&server, &admin, form_body("Shared export")).await;

    server
        .post("/api/v1/response/submit")
        .json(&submission(&id, 5.0))
        .await
        .assert_status(StatusCode::CREATED);

    let link = server
        .post("/api/v1/response/export/link")
        .authorization_bearer(&admin)
        .json(&json!({ "formId": id, "format": "json" }))
        .await;
    link.assert_status_ok();
    let link = link.json::<Value>();
    let url = link["data"]["url"].as_str().unwrap();
    let token = link["data"]["token"].as_str().unwrap();
    assert!(url.starts_with(&format!("http://localhost/api/v1/response/download/{}", id)));

    let download = server
        .get(&format!("/api/v1/response/download/{}", id))
        .add_query_param("format", "json")
        .add_query_param("token", token)
        .await;
    download.assert_status_ok();
    let export = download.json::<Value>();
    assert_eq!(export["formId"], id.as_str());
    assert_eq!(export["responses"][0]["answers"][0]["type"], "rating");

    let tampered = server
        .get(&format!("/api/v1/response/download/{}", id))
        .add_query_param("token", "garbage")
        .await;
    assert_eq!(tampered.status_code(), StatusCode::FORBIDDEN);
}
