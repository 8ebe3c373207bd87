//! REST API integration tests

use anyhow::Result;
use assessment::database::test_utils::setup_test_db;
use assessment::server::app::create_app;
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

async fn setup_test_server() -> Result<TestServer> {
    let db = setup_test_db().await?;
    let app = create_app(db, None).await?;
    Ok(TestServer::new(app)?)
}

async fn create_template(server: &TestServer, name: &str) -> i64 {
    let response = server
        .post("/api/v1/containers")
        .json(&json!({ "kind": "template", "name": name }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    body["container"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let server = setup_test_server().await?;

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["service"], "assessment-server");
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());

    Ok(())
}

#[tokio::test]
async fn test_level_crud_api() -> Result<()> {
    let server = setup_test_server().await?;
    let container_id = create_template(&server, "Template").await;
    let base = format!("/api/v1/containers/{}/categories", container_id);

    let response = server
        .post(&base)
        .json(&json!({ "name": "Governance" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let category: Value = response.json();
    let category_id = category["id"].as_i64().unwrap();
    assert_eq!(category["display_order"], 1);

    server
        .post(&base)
        .json(&json!({ "name": "Operations" }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .get(&base)
        .add_query_param("perPage", 1)
        .add_query_param("page", 2)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let page: Value = response.json();
    assert_eq!(page["totalItems"], 2);
    assert_eq!(page["perPage"], 1);
    assert_eq!(page["items"][0]["name"], "Operations");

    let response = server
        .put(&format!("{}/{}", base, category_id))
        .json(&json!({ "name": "Board governance", "description": "<p>Oversight</p>" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated: Value = response.json();
    assert_eq!(updated["name"], "Board governance");
    assert_eq!(updated["description"], "<p>Oversight</p>");

    let response = server
        .delete(&format!("{}/{}", base, category_id))
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let response = server.get(&format!("{}/{}", base, category_id)).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["fields"]["entity"], "category");

    Ok(())
}

#[tokio::test]
async fn test_validation_errors_name_the_field() -> Result<()> {
    let server = setup_test_server().await?;
    let container_id = create_template(&server, "Template").await;

    let response = server
        .post(&format!("/api/v1/containers/{}/contents", container_id))
        .json(&json!({ "category_id": 12345, "name": "Orphan" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "validation_failed");
    assert_eq!(body["fields"]["field"], "category_id");

    let response = server
        .get("/api/v1/containers")
        .add_query_param("kind", "draft")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_reorder_api() -> Result<()> {
    let server = setup_test_server().await?;
    let container_id = create_template(&server, "Template").await;
    let base = format!("/api/v1/containers/{}/topics", container_id);

    let mut ids = Vec::new();
    for name in ["Alpha", "Beta"] {
        let response = server.post(&base).json(&json!({ "name": name })).await;
        let topic: Value = response.json();
        ids.push(topic["id"].as_i64().unwrap());
    }
    ids.reverse();

    let response = server
        .post(&format!("{}/reorder", base))
        .json(&json!({ "ids": ids }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let page: Value = server.get(&base).await.json();
    assert_eq!(page["items"][0]["name"], "Beta");
    assert_eq!(page["items"][1]["name"], "Alpha");

    Ok(())
}

#[tokio::test]
async fn test_clone_endpoint() -> Result<()> {
    let server = setup_test_server().await?;
    let source = create_template(&server, "Source").await;
    let destination = create_template(&server, "Destination").await;

    let category: Value = server
        .post(&format!("/api/v1/containers/{}/categories", source))
        .json(&json!({ "name": "Governance" }))
        .await
        .json();
    server
        .post(&format!("/api/v1/containers/{}/contents", source))
        .json(&json!({ "category_id": category["id"], "name": "Owner" }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post("/api/v1/clone")
        .json(&json!({ "sourceContainerId": source, "destinationContainerId": destination }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let summary: Value = response.json();
    assert_eq!(summary["categoriesCloned"], 1);
    assert_eq!(summary["contentsCloned"], 1);
    assert!(summary["droppedContents"].as_array().unwrap().is_empty());

    let response = server
        .post("/api/v1/clone")
        .json(&json!({ "sourceContainerId": source, "destinationContainerId": source }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["fields"]["code"], "CLONE_SAME_CONTAINER");

    let response = server
        .post("/api/v1/clone")
        .json(&json!({ "sourceContainerId": source, "destinationContainerId": 999 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_assessment_from_template_api() -> Result<()> {
    let server = setup_test_server().await?;
    let template_id = create_template(&server, "Template").await;
    server
        .post(&format!("/api/v1/containers/{}/categories", template_id))
        .json(&json!({ "name": "Governance" }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post(&format!("/api/v1/containers/{}/assessments", template_id))
        .json(&json!({ "company_name": "Acme Ltd", "assessment_year": 2025 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let created: Value = response.json();
    assert_eq!(created["container"]["kind"], "assessment");
    assert_eq!(created["container"]["name"], "Acme Ltd 2025");
    assert_eq!(created["clone"]["categoriesCloned"], 1);

    let page: Value = server
        .get("/api/v1/containers")
        .add_query_param("kind", "assessment")
        .await
        .json();
    assert_eq!(page["totalItems"], 1);

    Ok(())
}

#[tokio::test]
async fn test_export_and_import_api() -> Result<()> {
    let server = setup_test_server().await?;
    let source = create_template(&server, "Source").await;
    let destination = create_template(&server, "Destination").await;
    server
        .post(&format!("/api/v1/containers/{}/categories", source))
        .json(&json!({ "name": "Governance" }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .get(&format!("/api/v1/containers/{}/export", source))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.header("content-type"),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let bytes = response.as_bytes().clone();

    let response = server
        .post(&format!("/api/v1/containers/{}/import", destination))
        .bytes(bytes)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let result: Value = response.json();
    assert_eq!(result["categoriesCreated"], 1);

    let response = server
        .get("/api/v1/containers/999/export")
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    Ok(())
}
