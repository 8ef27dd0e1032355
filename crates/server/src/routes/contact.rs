//! Contact form route handler.
//!
//! Relays storefront contact messages to the business inbox. This is the one
//! place an email failure fails the request: the message exists nowhere else,
//! so swallowing the error would silently drop it.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use farmstand_core::Email;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Response for form submission.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
}

/// Submit a contact-form message.
///
/// POST /contact
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn submit(
    State(state): State<AppState>,
    Json(form): Json<ContactRequest>,
) -> Result<Json<ContactResponse>> {
    let name = form.name.trim();
    let message = form.message.trim();

    if name.is_empty() || message.is_empty() || form.email.trim().is_empty() {
        return Err(AppError::BadRequest("All fields are required.".to_owned()));
    }

    let email = Email::parse(form.email.trim())
        .map_err(|_| AppError::BadRequest("Please enter a valid email address.".to_owned()))?;

    state
        .email()
        .send_contact_message(name, email.as_str(), message)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to relay contact message");
            AppError::Internal("failed to send contact message".to_owned())
        })?;

    tracing::info!(email = %email, "Contact message relayed");

    Ok(Json(ContactResponse { success: true }))
}
