//! Role administration and permission enforcement

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::{Value, json};

#[tokio::test]
async fn test_default_roles_are_seeded() {
    let server = test_server().await;
    let admin = admin_token(&server).await;

    let response = server.get("/api/v1/role").authorization_bearer(&admin).await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["admin", "editor", "viewer"]);
}

#[tokio::test]
async fn test_viewer_cannot_manage_roles() {
    let server = test_server().await;
    register(&server, "Vera", "vera@example.com").await;
    let viewer = login(&server, "vera@example.com", PASSWORD).await;

    let list = server.get("/api/v1/role").authorization_bearer(&viewer).await;
    assert_eq!(list.status_code(), StatusCode::FORBIDDEN);

    let create = server
        .post("/api/v1/role")
        .authorization_bearer(&viewer)
        .json(&json!({ "name": "sneaky", "permissions": ["MANAGE_ROLES"] }))
        .await;
    assert_eq!(create.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_role_validates_permissions_and_name() {
    let server = test_server().await;
    let admin = admin_token(&server).await;

    let unknown = server
        .post("/api/v1/role")
        .authorization_bearer(&admin)
        .json(&json!({ "name": "auditor", "permissions": ["READ_MINDS"] }))
        .await;
    assert_eq!(unknown.status_code(), StatusCode::BAD_REQUEST);

    let taken = server
        .post("/api/v1/role")
        .authorization_bearer(&admin)
        .json(&json!({ "name": "Editor" }))
        .await;
    assert_eq!(taken.status_code(), StatusCode::CONFLICT);

    let created = server
        .post("/api/v1/role")
        .authorization_bearer(&admin)
        .json(&json!({ "name": "auditor", "permissions": ["VIEW_RESPONSES"] }))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    assert_eq!(created.json::<Value>()["data"]["permissions"], json!(["VIEW_RESPONSES"]));
}

#[tokio::test]
async fn test_add_and_remove_permissions() {
    let server = test_server().await;
    let admin = admin_token(&server).await;
    let role_id = create_role(&server, &admin, "auditor", &["VIEW_FORMS"]).await;

    let added = server
        .post("/api/v1/role/permissions/add")
        .authorization_bearer(&admin)
        .json(&json!({ "id": role_id, "permissions": ["EXPORT_RESPONSES", "VIEW_FORMS"] }))
        .await;
    added.assert_status_ok();
    let permissions = added.json::<Value>()["data"]["permissions"].clone();
    assert_eq!(permissions.as_array().unwrap().len(), 2);
    assert!(permissions.as_array().unwrap().contains(&json!("EXPORT_RESPONSES")));

    let removed = server
        .post("/api/v1/role/permissions/remove")
        .authorization_bearer(&admin)
        .json(&json!({ "id": role_id, "permissions": ["VIEW_FORMS"] }))
        .await;
    removed.assert_status_ok();
    assert_eq!(
        removed.json::<Value>()["data"]["permissions"],
        json!(["EXPORT_RESPONSES"])
    );
}

#[tokio::test]
async fn test_permission_catalog() {
    let server = test_server().await;
    let admin = admin_token(&server).await;

    let response = server
        .get("/api/v1/role/permissions/catalog")
        .authorization_bearer(&admin)
        .await;
    response.assert_status_ok();
    let catalog = response.json::<Value>()["data"].clone();
    assert_eq!(catalog.as_array().unwrap().len(), 13);
    assert_eq!(catalog[0], "VIEW_FORMS");
}

#[tokio::test]
async fn test_granted_permission_takes_effect_on_next_request() {
    let server = test_server().await;
    let token = user_with_permissions(&server, "maker@example.com", &["VIEW_FORMS"]).await;

    let denied = server
        .post("/api/v1/form")
        .authorization_bearer(&token)
        .json(&form_body("Mine"))
        .await;
    assert_eq!(denied.status_code(), StatusCode::FORBIDDEN);

    let admin = admin_token(&server).await;
    let roles = server
        .get("/api/v1/role")
        .authorization_bearer(&admin)
        .await
        .json::<Value>();
    let role_id = roles["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == "role-maker@example.com")
        .map(|r| r["id"].as_str().unwrap().to_string())
        .unwrap();
    server
        .post("/api/v1/role/permissions/add")
        .authorization_bearer(&admin)
        .json(&json!({ "id": role_id, "permissions": ["CREATE_FORM"] }))
        .await
        .assert_status_ok();

    let allowed = server
        .post("/api/v1/form")
        .authorization_bearer(&token)
        .json(&form_body("Mine"))
        .await;
    assert_eq!(allowed.status_code(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_deleting_role_detaches_it_from_users() {
    let server = test_server().await;
    let admin = admin_token(&server).await;

    let profile = register(&server, "Ada", "ada@example.com").await;
    let user_id = profile["data"]["id"].as_str().unwrap().to_string();
    let role_id = create_role(&server, &admin, "temporary", &["VIEW_ROLES"]).await;

    let assigned = server
        .put("/api/v1/role/assign")
        .authorization_bearer(&admin)
        .json(&json!({ "userId": user_id, "roleIds": [role_id] }))
        .await;
    assigned.assert_status_ok();
    assert_eq!(assigned.json::<Value>()["data"]["roles"], json!(["temporary"]));

    server
        .delete(&format!("/api/v1/role/{}", role_id))
        .authorization_bearer(&admin)
        .await
        .assert_status_ok();

    let token = login(&server, "ada@example.com", PASSWORD).await;
    let me = server
        .get("/api/v1/auth/me")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(me["data"]["roles"], json!([]));
    assert_eq!(me["data"]["permissions"], json!([]));
}
