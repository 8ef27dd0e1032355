//! Integration tests for Farmstand.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and the server, then:
//! FARMSTAND_BASE_URL=http://localhost:3001 \
//!     cargo test -p farmstand-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `products` - Admin catalog management and the public product list
//! - `checkout` - Order placement, stock decrements, atomicity
//! - `admin_orders` - Status transitions and at-most-once shipment email
//!
//! Tests log in through the same session-cookie endpoints the frontend uses;
//! the seeded database must contain the admin account named in
//! `ADMIN_EMAIL`/`ADMIN_PASSWORD` (defaults below).

use reqwest::Client;

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("FARMSTAND_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// Seeded admin credentials for admin-endpoint tests.
#[must_use]
pub fn admin_credentials() -> (String, String) {
    (
        std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@farmstand.test".to_string()),
        std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "integration-test-admin".to_string()),
    )
}

/// Create a cookie-holding client.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Create a client and log it in as the seeded admin.
///
/// # Panics
///
/// Panics if the login request fails or is rejected.
pub async fn admin_client() -> Client {
    let client = client();
    let (email, password) = admin_credentials();

    let resp = client
        .post(format!("{}/api/auth/login", base_url()))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    assert!(
        resp.status().is_success(),
        "admin login failed: {}",
        resp.status()
    );

    client
}
