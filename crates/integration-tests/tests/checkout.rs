//! Integration tests for order placement: stock decrements and atomicity.
//!
//! These tests require a running server and seeded database; see crate docs.
//! They use guest checkout so no customer account is needed.

use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::StatusCode;
use serde_json::{Value, json};

use farmstand_integration_tests::{admin_client, base_url, client};

fn unique_name(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    format!("{prefix} {nanos}")
}

async fn create_test_product(admin: &reqwest::Client, name: &str, stock: i32) -> i64 {
    let resp = admin
        .post(format!("{}/products", base_url()))
        .json(&json!({
            "name": name,
            "description": "Integration test produce",
            "price": "9.99",
            "stock": stock,
            "localPickupOnly": false,
            "displayOrder": 999,
            "weight": "8.00"
        }))
        .send()
        .await
        .expect("Failed to create test product");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let created: Value = resp.json().await.expect("Failed to parse product");
    created["id"].as_i64().expect("product id")
}

async fn stock_of(admin: &reqwest::Client, id: i64) -> i64 {
    let all: Vec<Value> = admin
        .get(format!("{}/products/all", base_url()))
        .send()
        .await
        .expect("Failed to fetch admin products")
        .json()
        .await
        .expect("Failed to parse admin product list");

    all.iter()
        .find(|p| p["id"].as_i64() == Some(id))
        .expect("product missing from admin list")["stockQty"]
        .as_i64()
        .expect("stockQty")
}

fn shipping_info() -> Value {
    json!({
        "fullName": "Ada Lovelace",
        "street": "1124 SE Division St",
        "city": "Portland",
        "state": "OR",
        "zip": "97202",
        "email": "ada@farmstand.test",
        "phone": "555-0100"
    })
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_checkout_decrements_stock_by_ordered_quantities() {
    let admin = admin_client().await;
    let first = create_test_product(&admin, &unique_name("Eggs"), 10).await;
    let second = create_test_product(&admin, &unique_name("Jam"), 10).await;

    let resp = client()
        .post(format!("{}/checkout", base_url()))
        .json(&json!({
            "shippingInfo": shipping_info(),
            "shippingMethod": "USPS Priority",
            "shippingCost": "5.00",
            "cartItems": [
                { "productId": first, "quantity": 2, "price": "9.99" },
                { "productId": second, "quantity": 3, "price": "9.99" }
            ]
        }))
        .send()
        .await
        .expect("Failed to place order");
    assert_eq!(resp.status(), StatusCode::OK);

    let order: Value = resp.json().await.expect("Failed to parse order");
    assert_eq!(order["status"], "Pending");
    assert_eq!(order["lines"].as_array().map(Vec::len), Some(2));

    // Each line's stock dropped by exactly its ordered quantity.
    assert_eq!(stock_of(&admin, first).await, 8);
    assert_eq!(stock_of(&admin, second).await, 7);
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_checkout_with_unknown_product_rolls_back_every_line() {
    let admin = admin_client().await;
    let good = create_test_product(&admin, &unique_name("Carrots"), 10).await;

    // The first line would succeed on its own; the bogus second line must
    // drag the whole transaction down with it.
    let resp = client()
        .post(format!("{}/checkout", base_url()))
        .json(&json!({
            "shippingInfo": shipping_info(),
            "shippingMethod": "USPS Priority",
            "shippingCost": "5.00",
            "cartItems": [
                { "productId": good, "quantity": 2, "price": "9.99" },
                { "productId": 999_999_999, "quantity": 1, "price": "1.00" }
            ]
        }))
        .send()
        .await
        .expect("Failed to send checkout");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // Atomicity: the "successful" first line left no trace.
    assert_eq!(stock_of(&admin, good).await, 10);
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_checkout_insufficient_stock_rolls_back() {
    let admin = admin_client().await;
    let scarce = create_test_product(&admin, &unique_name("Limited Syrup"), 1).await;

    let resp = client()
        .post(format!("{}/checkout", base_url()))
        .json(&json!({
            "shippingInfo": shipping_info(),
            "shippingCost": "5.00",
            "cartItems": [
                { "productId": scarce, "quantity": 2, "price": "9.99" }
            ]
        }))
        .send()
        .await
        .expect("Failed to send checkout");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // Stock never goes negative; the single unit is still there.
    assert_eq!(stock_of(&admin, scarce).await, 1);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_checkout_rejects_empty_cart_before_any_effect() {
    let resp = client()
        .post(format!("{}/checkout", base_url()))
        .json(&json!({
            "shippingInfo": shipping_info(),
            "shippingCost": "5.00",
            "cartItems": []
        }))
        .send()
        .await
        .expect("Failed to send checkout");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_checkout_rejects_missing_shipping_fields() {
    let resp = client()
        .post(format!("{}/checkout", base_url()))
        .json(&json!({
            "shippingInfo": {
                "fullName": "Ada Lovelace",
                "street": "",
                "city": "Portland",
                "state": "OR",
                "zip": "97202",
                "email": "ada@farmstand.test"
            },
            "shippingCost": "5.00",
            "cartItems": [
                { "productId": 1, "quantity": 1, "price": "9.99" }
            ]
        }))
        .send()
        .await
        .expect("Failed to send checkout");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
