//! Stripe API client for payment-intent creation.
//!
//! The server only opens a payment intent; the customer completes
//! confirmation in the browser with the returned client secret. No money
//! moves through this process.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::StripeConfig;

/// Stripe API base URL.
const BASE_URL: &str = "https://api.stripe.com/v1";

/// Errors that can occur when interacting with the Stripe API.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    secret_key: SecretString,
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Http` if the HTTP client fails to build.
    pub fn new(config: &StripeConfig) -> Result<Self, StripeError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            secret_key: config.secret_key.clone(),
        })
    }

    /// Create a payment intent for `amount_cents` USD cents and return its
    /// client secret for browser-side confirmation.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Api` if Stripe rejects the request.
    #[instrument(skip(self))]
    pub async fn create_payment_intent(&self, amount_cents: i64) -> Result<String, StripeError> {
        let params = [
            ("amount", amount_cents.to_string()),
            ("currency", "usd".to_owned()),
            ("automatic_payment_methods[enabled]", "true".to_owned()),
        ];

        let response = self
            .client
            .post(format!("{BASE_URL}/payment_intents"))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status, response.text().await.unwrap_or_default()));
        }

        let intent: PaymentIntentResponse = response
            .json()
            .await
            .map_err(|e| StripeError::Parse(e.to_string()))?;

        Ok(intent.client_secret)
    }
}

fn api_error(status: StatusCode, message: String) -> StripeError {
    StripeError::Api {
        status: status.as_u16(),
        message,
    }
}

#[derive(Debug, Deserialize)]
struct PaymentIntentResponse {
    client_secret: String,
}
