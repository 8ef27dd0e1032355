//! Shipping route handlers: address validation and rate quoting.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::services::easypost::{Address, AddressVerdict, NormalizedAddress, Parcel, RateOption};
use crate::state::AppState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Address validation request body.
#[derive(Debug, Deserialize)]
pub struct ValidateAddressRequest {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// Address validation response.
#[derive(Debug, Serialize)]
pub struct ValidateAddressResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<NormalizedAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Rate quote request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatesRequest {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub cart_items: Vec<RatedCartItem>,
}

/// The slice of a cart line the rate quoter cares about.
///
/// Weight and quantity arrive as whatever the storefront had on hand (JSON
/// numbers or strings), so both are parsed leniently.
#[derive(Debug, Deserialize)]
pub struct RatedCartItem {
    #[serde(default)]
    pub weight: Option<serde_json::Value>,
    #[serde(default)]
    pub quantity: Option<serde_json::Value>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Verify a destination address for deliverability.
///
/// POST /api/shipping/validate-address
///
/// Returns 200 `{valid: true, address}` for deliverable (or unverifiable)
/// addresses and 400 `{valid: false, message}` when the upstream explicitly
/// rejects the address. Rejection is a hard checkout precondition; the
/// storefront must not proceed to payment past it.
pub async fn validate_address(
    State(state): State<AppState>,
    Json(req): Json<ValidateAddressRequest>,
) -> Result<(StatusCode, Json<ValidateAddressResponse>)> {
    require_address_fields(&req.street, &req.city, &req.state, &req.zip)?;

    let address = Address::us(&req.street, &req.city, &req.state, &req.zip);

    let response = match state.easypost().verify_address(&address).await? {
        AddressVerdict::Valid(normalized) => (
            StatusCode::OK,
            Json(ValidateAddressResponse {
                valid: true,
                address: Some(normalized),
                message: None,
            }),
        ),
        AddressVerdict::Invalid { message } => (
            StatusCode::BAD_REQUEST,
            Json(ValidateAddressResponse {
                valid: false,
                address: None,
                message: Some(message),
            }),
        ),
    };

    Ok(response)
}

/// Quote carrier rates for a cart shipped to an address.
///
/// POST /api/shipping/rates
///
/// The parcel weight is the sum of line weight x quantity over the cart;
/// lines without a numeric weight are skipped with a warning rather than
/// failing the quote. Upstream failure surfaces as an error the storefront
/// treats as "no rates" (local-pickup fallback).
pub async fn rates(
    State(state): State<AppState>,
    Json(req): Json<RatesRequest>,
) -> Result<Json<Vec<RateOption>>> {
    require_address_fields(&req.street, &req.city, &req.state, &req.zip)?;

    let to = Address::us(&req.street, &req.city, &req.state, &req.zip);
    let parcel = Parcel::boxed(parcel_weight_oz(&req.cart_items));

    let options = state.easypost().shipment_rates(&to, &parcel).await?;

    Ok(Json(options))
}

/// Reject blank address fields before any upstream call.
fn require_address_fields(street: &str, city: &str, state: &str, zip: &str) -> Result<()> {
    if [street, city, state, zip]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return Err(AppError::BadRequest(
            "street, city, state, and zip are required".to_owned(),
        ));
    }
    Ok(())
}

/// Total parcel weight in ounces: sum of weight x quantity over the cart.
///
/// A line with a missing or non-numeric weight contributes nothing and is
/// logged; a missing or non-numeric quantity counts as 1.
fn parcel_weight_oz(items: &[RatedCartItem]) -> f64 {
    items.iter().fold(0.0, |sum, item| {
        let Some(weight) = item.weight.as_ref().and_then(lenient_number) else {
            tracing::warn!(weight = ?item.weight, "Skipping cart line with non-numeric weight");
            return sum;
        };

        let quantity = item
            .quantity
            .as_ref()
            .and_then(lenient_number)
            .unwrap_or(1.0);

        sum + weight * quantity
    })
}

/// Parse a JSON number or numeric string.
fn lenient_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(weight: serde_json::Value, quantity: serde_json::Value) -> RatedCartItem {
        RatedCartItem {
            weight: Some(weight),
            quantity: Some(quantity),
        }
    }

    #[test]
    fn test_parcel_weight_sums_weight_times_quantity() {
        let items = vec![item(json!(8.0), json!(2)), item(json!(4.5), json!(1))];
        let total = parcel_weight_oz(&items);
        assert!((total - 20.5).abs() < 1e-9);
    }

    #[test]
    fn test_parcel_weight_parses_string_fields() {
        // Storefront forms submit strings; both fields parse leniently.
        let items = vec![item(json!("8"), json!("3"))];
        assert!((parcel_weight_oz(&items) - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_parcel_weight_skips_non_numeric_weight() {
        let items = vec![
            item(json!("n/a"), json!(2)),
            item(json!(6.0), json!(1)),
            RatedCartItem {
                weight: None,
                quantity: Some(json!(4)),
            },
        ];
        assert!((parcel_weight_oz(&items) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_parcel_weight_defaults_quantity_to_one() {
        let items = vec![RatedCartItem {
            weight: Some(json!(7.25)),
            quantity: None,
        }];
        assert!((parcel_weight_oz(&items) - 7.25).abs() < 1e-9);
    }

    #[test]
    fn test_parcel_weight_empty_cart_is_zero() {
        assert!((parcel_weight_oz(&[]) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_require_address_fields_rejects_blank() {
        assert!(require_address_fields("1 Main St", "Portland", "", "97201").is_err());
        assert!(require_address_fields("1 Main St", "Portland", "OR", "97201").is_ok());
    }
}
