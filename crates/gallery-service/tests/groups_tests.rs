//! Group endpoint integration tests.
//!
//! Runs against a real server with an in-memory store and a mocked JWKS.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use anyhow::Result;
use gallery_test_utils::{bearer, TestGalleryServer, TestTokenBuilder, PRIMARY};
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

fn auth() -> String {
    bearer(&TestTokenBuilder::new().subject("auth0|alice").sign(&PRIMARY))
}

async fn create_group(server: &TestGalleryServer, body: Value) -> Result<Value> {
    let response = reqwest::Client::new()
        .post(format!("{}/groups", server.url()))
        .header("Authorization", auth())
        .json(&body)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    Ok(response.json().await?)
}

#[tokio::test]
async fn test_create_group_returns_new_item() -> Result<()> {
    let server = TestGalleryServer::spawn().await?;

    let body = create_group(&server, json!({ "name": "Holidays", "description": "2024" })).await?;

    let group = &body["newItem"];
    assert_eq!(group["name"], "Holidays");
    assert_eq!(group["description"], "2024");
    let id = group["id"].as_str().unwrap();
    assert!(Uuid::parse_str(id).is_ok(), "unexpected id {id}");
    Ok(())
}

#[tokio::test]
async fn test_client_supplied_id_is_replaced() -> Result<()> {
    let server = TestGalleryServer::spawn().await?;

    let body = create_group(&server, json!({ "id": "mine", "name": "Pets" })).await?;

    assert_ne!(body["newItem"]["id"], "mine");
    Ok(())
}

#[tokio::test]
async fn test_list_groups_returns_created_groups() -> Result<()> {
    let server = TestGalleryServer::spawn().await?;
    let first = create_group(&server, json!({ "name": "One" })).await?;
    let second = create_group(&server, json!({ "name": "Two" })).await?;

    let response = reqwest::Client::new()
        .get(format!("{}/groups", server.url()))
        .header("Authorization", auth())
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);

    let mut ids: Vec<&str> = items.iter().map(|g| g["id"].as_str().unwrap()).collect();
    ids.sort_unstable();
    let mut expected = vec![
        first["newItem"]["id"].as_str().unwrap(),
        second["newItem"]["id"].as_str().unwrap(),
    ];
    expected.sort_unstable();
    assert_eq!(ids, expected);
    Ok(())
}

#[tokio::test]
async fn test_list_groups_empty() -> Result<()> {
    let server = TestGalleryServer::spawn().await?;

    let body: Value = reqwest::Client::new()
        .get(format!("{}/groups", server.url()))
        .header("Authorization", auth())
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body, json!({ "items": [] }));
    Ok(())
}

#[tokio::test]
async fn test_delete_group_then_missing() -> Result<()> {
    let server = TestGalleryServer::spawn().await?;
    let client = reqwest::Client::new();
    let created = create_group(&server, json!({ "name": "Temp" })).await?;
    let id = created["newItem"]["id"].as_str().unwrap();

    let response = client
        .delete(format!("{}/groups/{}", server.url(), id))
        .header("Authorization", auth())
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.text().await?.is_empty());

    let body: Value = client
        .get(format!("{}/groups", server.url()))
        .header("Authorization", auth())
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["items"].as_array().unwrap().len(), 0);

    // Deleting again still succeeds
    let response = client
        .delete(format!("{}/groups/{}", server.url(), id))
        .header("Authorization", auth())
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn test_non_object_body_is_rejected() -> Result<()> {
    let server = TestGalleryServer::spawn().await?;
    let client = reqwest::Client::new();

    for body in ["", "not json", "[1,2]", "\"text\"", "null"] {
        let response = client
            .post(format!("{}/groups", server.url()))
            .header("Authorization", auth())
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body:?}");
        let json: Value = response.json().await?;
        assert!(json["error"].is_string());
    }
    Ok(())
}

#[tokio::test]
async fn test_responses_carry_cors_header() -> Result<()> {
    let server = TestGalleryServer::spawn().await?;
    let client = reqwest::Client::new();

    let ok = client
        .get(format!("{}/groups", server.url()))
        .header("Authorization", auth())
        .send()
        .await?;
    assert_eq!(ok.headers()["access-control-allow-origin"], "*");

    let created = client
        .post(format!("{}/groups", server.url()))
        .header("Authorization", auth())
        .json(&json!({ "name": "CORS" }))
        .send()
        .await?;
    assert_eq!(created.headers()["access-control-allow-origin"], "*");

    let bad = client
        .post(format!("{}/groups", server.url()))
        .header("Authorization", auth())
        .body("[]")
        .send()
        .await?;
    assert_eq!(bad.headers()["access-control-allow-origin"], "*");
    Ok(())
}
