//! Checkout route handler.

use axum::{Json, extract::State};

use crate::error::Result;
use crate::middleware::OptionalUser;
use crate::models::OrderWithDetails;
use crate::services::CheckoutService;
use crate::services::checkout::CheckoutRequest;
use crate::state::AppState;

/// Place an order.
///
/// POST /checkout
///
/// The client has already validated the address, picked a rate, and
/// confirmed the payment intent; this endpoint runs the precondition checks
/// and the single atomic order transaction, then returns the joined order
/// record for the confirmation page. A logged-in session's email overrides
/// the guest email on the shipping info.
pub async fn checkout(
    State(state): State<AppState>,
    OptionalUser(current): OptionalUser,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<OrderWithDetails>> {
    let service = CheckoutService::new(state.pool(), state.email());
    let session_email = current.as_ref().map(|c| &c.email);
    let details = service.place_order(session_email, &req).await?;

    Ok(Json(details))
}
