//! Payment route handler.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Payment-intent request body: the charge amount in USD cents.
#[derive(Debug, Deserialize)]
pub struct PaymentIntentRequest {
    pub amount: i64,
}

/// Payment-intent response: the client secret the browser confirms with.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

/// Open a Stripe payment intent.
///
/// POST /create-payment-intent
///
/// The server never captures the charge itself; confirmation happens in the
/// browser with the returned secret before the client calls `/checkout`.
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(req): Json<PaymentIntentRequest>,
) -> Result<Json<PaymentIntentResponse>> {
    if req.amount <= 0 {
        return Err(AppError::BadRequest(
            "amount must be a positive number of cents".to_owned(),
        ));
    }

    let client_secret = state.stripe().create_payment_intent(req.amount).await?;

    Ok(Json(PaymentIntentResponse { client_secret }))
}
