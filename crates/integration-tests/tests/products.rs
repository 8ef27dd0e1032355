//! Integration tests for catalog management and the public product list.
//!
//! These tests require:
//! - A running `PostgreSQL` database with the farmstand schema
//! - The server running (cargo run -p farmstand-server)
//! - The seeded admin account (see crate docs)
//!
//! Run with: cargo test -p farmstand-integration-tests -- --ignored

use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::StatusCode;
use serde_json::{Value, json};

use farmstand_integration_tests::{admin_client, base_url, client};

/// A unique product name per test run, so repeated runs don't collide.
fn unique_name(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    format!("{prefix} {nanos}")
}

/// Create a product via the admin endpoint and return its JSON.
async fn create_test_product(admin: &reqwest::Client, name: &str, stock: i32) -> Value {
    let resp = admin
        .post(format!("{}/products", base_url()))
        .json(&json!({
            "name": name,
            "description": "Integration test jar of honey",
            "price": "9.99",
            "stock": stock,
            "imageUrl": null,
            "localPickupOnly": false,
            "displayOrder": 999,
            "weight": "12.00",
            "length": "3.00",
            "width": "3.00",
            "height": "5.00"
        }))
        .send()
        .await
        .expect("Failed to create test product");

    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Failed to parse created product")
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_admin_created_product_appears_in_public_list() {
    let admin = admin_client().await;
    let name = unique_name("Round Trip Honey");

    let created = create_test_product(&admin, &name, 5).await;
    assert_eq!(created["name"], name.as_str());

    // Public list, no auth
    let resp = client()
        .get(format!("{}/products", base_url()))
        .send()
        .await
        .expect("Failed to fetch public products");
    assert_eq!(resp.status(), StatusCode::OK);

    let products: Vec<Value> = resp.json().await.expect("Failed to parse product list");
    let found = products
        .iter()
        .find(|p| p["name"] == name.as_str())
        .expect("created product missing from public list");

    // Identical name/price/description round-trip
    assert_eq!(found["price"], created["price"]);
    assert_eq!(found["description"], created["description"]);
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_archived_product_hidden_from_public_list() {
    let admin = admin_client().await;
    let name = unique_name("Archived Honey");

    let created = create_test_product(&admin, &name, 5).await;
    let id = created["id"].as_i64().expect("product id");

    let resp = admin
        .put(format!("{}/products/{id}/archive", base_url()))
        .json(&json!({ "isArchived": true }))
        .send()
        .await
        .expect("Failed to archive product");
    assert_eq!(resp.status(), StatusCode::OK);

    let products: Vec<Value> = client()
        .get(format!("{}/products", base_url()))
        .send()
        .await
        .expect("Failed to fetch public products")
        .json()
        .await
        .expect("Failed to parse product list");

    assert!(
        !products.iter().any(|p| p["name"] == name.as_str()),
        "archived product still visible publicly"
    );

    // Admin list still sees it
    let all: Vec<Value> = admin
        .get(format!("{}/products/all", base_url()))
        .send()
        .await
        .expect("Failed to fetch admin products")
        .json()
        .await
        .expect("Failed to parse admin product list");
    assert!(all.iter().any(|p| p["name"] == name.as_str()));
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_admin_endpoints_reject_anonymous_clients() {
    let resp = client()
        .get(format!("{}/products/all", base_url()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
