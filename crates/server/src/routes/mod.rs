//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Smoke check
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (DB ping)
//!
//! # Auth (session cookie)
//! POST /api/auth/login         - Login
//! POST /api/auth/register      - Register (rejects duplicate email)
//! POST /api/auth/logout        - Destroy session
//! GET  /api/auth/me            - Current user (re-read from the database)
//! POST /api/auth/account/update - Update name/profile address
//!
//! # Products
//! GET    /products             - Active products by display order (public)
//! GET    /products/all         - Every product incl. archived (admin)
//! POST   /products             - Create product (admin)
//! PUT    /products/{id}        - Update product (admin)
//! PUT    /products/{id}/archive - Toggle archive flag (admin)
//! DELETE /products/{id}        - Hard delete (admin)
//!
//! # Checkout
//! POST /checkout               - Place an order (transactional)
//!
//! # Orders
//! GET  /api/admin/orders       - All orders joined (admin)
//! PUT  /api/admin/orders/{id}  - Update status/tracking (admin,
//!                                at-most-once shipment email)
//! GET  /api/orders             - Session user's orders
//! GET  /api/orders/last        - Session user's most recent order
//!
//! # Shipping
//! POST /api/shipping/validate-address - Verify + normalize an address
//! POST /api/shipping/rates     - Carrier rate options for a cart
//!
//! # Payment
//! POST /create-payment-intent  - Open a Stripe payment intent
//!
//! # Contact
//! POST /contact                - Relay a contact-form message
//! ```

pub mod auth;
pub mod checkout;
pub mod contact;
pub mod orders;
pub mod payment;
pub mod products;
pub mod shipping;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/account/update", post(auth::update_account))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list_active).post(products::create))
        .route("/all", get(products::list_all))
        .route(
            "/{id}",
            put(products::update).delete(products::delete),
        )
        .route("/{id}/archive", put(products::set_archived))
}

/// Create the admin order routes router.
pub fn admin_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list_all))
        .route("/{id}", put(orders::update_status))
}

/// Create the customer order routes router.
pub fn customer_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list_mine))
        .route("/last", get(orders::latest))
}

/// Create the shipping routes router.
pub fn shipping_routes() -> Router<AppState> {
    Router::new()
        .route("/validate-address", post(shipping::validate_address))
        .route("/rates", post(shipping::rates))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Auth routes
        .nest("/api/auth", auth_routes())
        // Product routes
        .nest("/products", product_routes())
        // Checkout
        .route("/checkout", post(checkout::checkout))
        // Order routes
        .nest("/api/admin/orders", admin_order_routes())
        .nest("/api/orders", customer_order_routes())
        // Shipping sub-endpoints
        .nest("/api/shipping", shipping_routes())
        // Payment intent
        .route("/create-payment-intent", post(payment::create_payment_intent))
        // Contact form
        .route("/contact", post(contact::submit))
}
