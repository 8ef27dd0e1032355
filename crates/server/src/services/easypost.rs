//! `EasyPost` API client for address verification and shipping rates.
//!
//! Both calls normalize full US state names to their two-letter postal
//! abbreviations before leaving the process, because the upstream rejects
//! spelled-out states.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::config::EasyPostConfig;

/// `EasyPost` API base URL.
const BASE_URL: &str = "https://api.easypost.com/v2";

/// Fixed box dimensions (inches) for the synthetic rate-quote parcel.
const PARCEL_BOX_INCHES: f64 = 6.0;

/// Errors that can occur when interacting with the `EasyPost` API.
#[derive(Debug, Error)]
pub enum EasyPostError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// API returned 2xx but embedded an error object.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Failed to parse response.
    #[error("parse error: {0}")]
    Parse(String),
}

/// A US postal address in `EasyPost`'s wire shape.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub street1: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: &'static str,
}

impl Address {
    /// Build a US address, normalizing the state name.
    #[must_use]
    pub fn us(street: &str, city: &str, state: &str, zip: &str) -> Self {
        Self {
            street1: street.to_owned(),
            city: city.to_owned(),
            state: normalize_state(state).to_owned(),
            zip: zip.to_owned(),
            country: "US",
        }
    }
}

/// The synthetic parcel submitted for rate quoting: summed cart weight in a
/// fixed-size box.
#[derive(Debug, Clone, Serialize)]
pub struct Parcel {
    /// Weight in ounces.
    pub weight: f64,
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Parcel {
    /// A standard box holding `weight_oz` ounces, weight kept to 2 decimals.
    #[must_use]
    pub fn boxed(weight_oz: f64) -> Self {
        Self {
            weight: (weight_oz * 100.0).round() / 100.0,
            length: PARCEL_BOX_INCHES,
            width: PARCEL_BOX_INCHES,
            height: PARCEL_BOX_INCHES,
        }
    }
}

/// Outcome of a delivery verification.
#[derive(Debug, Clone)]
pub enum AddressVerdict {
    /// Deliverable (or the upstream produced no verification data, which is
    /// deliberately treated as deliverable for sandbox keys).
    Valid(NormalizedAddress),
    /// The upstream explicitly rejected the address.
    Invalid { message: String },
}

/// The normalized form of a verified address.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// One carrier rate option.
#[derive(Debug, Clone, Serialize)]
pub struct RateOption {
    pub carrier: String,
    pub service: String,
    pub rate: f64,
    pub delivery_days: Option<i32>,
    pub rate_id: String,
}

/// `EasyPost` API client.
#[derive(Clone)]
pub struct EasyPostClient {
    client: reqwest::Client,
    api_key: SecretString,
    from_address: Address,
}

impl EasyPostClient {
    /// Create a new `EasyPost` client.
    ///
    /// The configured ship-from address is normalized once here.
    ///
    /// # Errors
    ///
    /// Returns `EasyPostError::Http` if the HTTP client fails to build.
    pub fn new(config: &EasyPostConfig) -> Result<Self, EasyPostError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            from_address: Address::us(
                &config.ship_from_street,
                &config.ship_from_city,
                &config.ship_from_state,
                &config.ship_from_zip,
            ),
        })
    }

    /// Verify a destination address for deliverability.
    ///
    /// # Errors
    ///
    /// Returns `EasyPostError` if the request fails or the response cannot be
    /// parsed. An address the upstream *rejects* is not an error; it comes
    /// back as [`AddressVerdict::Invalid`].
    #[instrument(skip(self), fields(city = %address.city, state = %address.state))]
    pub async fn verify_address(&self, address: &Address) -> Result<AddressVerdict, EasyPostError> {
        let body = VerifyAddressBody {
            address: VerifyAddress {
                street1: &address.street1,
                city: &address.city,
                state: &address.state,
                zip: &address.zip,
                country: "US",
                verify: ["delivery"],
            },
        };

        let response = self
            .client
            .post(format!("{BASE_URL}/addresses"))
            .basic_auth(self.api_key.expose_secret(), Some(""))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status, response.text().await.unwrap_or_default()));
        }

        let created: CreatedAddress = response
            .json()
            .await
            .map_err(|e| EasyPostError::Parse(e.to_string()))?;

        Ok(verdict_for(created, address))
    }

    /// Request carrier rate options for a parcel shipped to `to`.
    ///
    /// # Errors
    ///
    /// Returns `EasyPostError` if the request fails, the upstream embeds an
    /// error object, or a rate price cannot be parsed.
    #[instrument(skip(self), fields(weight_oz = parcel.weight, city = %to.city))]
    pub async fn shipment_rates(
        &self,
        to: &Address,
        parcel: &Parcel,
    ) -> Result<Vec<RateOption>, EasyPostError> {
        let body = ShipmentBody {
            shipment: Shipment {
                to_address: to,
                from_address: &self.from_address,
                parcel,
            },
        };

        let response = self
            .client
            .post(format!("{BASE_URL}/shipments"))
            .basic_auth(self.api_key.expose_secret(), Some(""))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status, response.text().await.unwrap_or_default()));
        }

        let shipment: ShipmentResponse = response
            .json()
            .await
            .map_err(|e| EasyPostError::Parse(e.to_string()))?;

        if let Some(err) = shipment.error {
            return Err(EasyPostError::Upstream(err.message));
        }

        shipment
            .rates
            .into_iter()
            .map(|r| {
                let rate = r
                    .rate
                    .parse::<f64>()
                    .map_err(|_| EasyPostError::Parse(format!("unparseable rate: {}", r.rate)))?;
                Ok(RateOption {
                    carrier: r.carrier,
                    service: r.service,
                    rate,
                    delivery_days: r.delivery_days,
                    rate_id: r.id,
                })
            })
            .collect()
    }
}

fn api_error(status: StatusCode, message: String) -> EasyPostError {
    EasyPostError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Decide the verdict for a created-address response.
///
/// An absent or empty verification object is treated as valid: test-mode API
/// keys return no verification data, and blocking every sandbox checkout is
/// worse than letting an unverifiable address through. This is intentional.
fn verdict_for(created: CreatedAddress, requested: &Address) -> AddressVerdict {
    let Some(delivery) = created.verifications.and_then(|v| v.delivery) else {
        return AddressVerdict::Valid(normalized(created.address, requested));
    };

    if delivery.success {
        return AddressVerdict::Valid(normalized(created.address, requested));
    }

    let message = delivery
        .errors
        .into_iter()
        .next()
        .map_or_else(|| "Invalid address".to_owned(), |e| e.message);

    AddressVerdict::Invalid { message }
}

/// Prefer the upstream's corrected fields, falling back to what was sent.
fn normalized(fields: AddressFields, requested: &Address) -> NormalizedAddress {
    NormalizedAddress {
        street: fields.street1.unwrap_or_else(|| requested.street1.clone()),
        city: fields.city.unwrap_or_else(|| requested.city.clone()),
        state: fields.state.unwrap_or_else(|| requested.state.clone()),
        zip: fields.zip.unwrap_or_else(|| requested.zip.clone()),
    }
}

/// Convert a full US state name to its two-letter postal abbreviation.
///
/// Unrecognized input (already-abbreviated codes, territories, typos) passes
/// through unchanged.
#[must_use]
pub fn normalize_state(state: &str) -> &str {
    STATE_ABBREVIATIONS
        .iter()
        .find(|(name, _)| *name == state)
        .map_or(state, |(_, abbr)| abbr)
}

/// Full state name -> USPS abbreviation, all 50 states.
const STATE_ABBREVIATIONS: &[(&str, &str)] = &[
    ("Alabama", "AL"),
    ("Alaska", "AK"),
    ("Arizona", "AZ"),
    ("Arkansas", "AR"),
    ("California", "CA"),
    ("Colorado", "CO"),
    ("Connecticut", "CT"),
    ("Delaware", "DE"),
    ("Florida", "FL"),
    ("Georgia", "GA"),
    ("Hawaii", "HI"),
    ("Idaho", "ID"),
    ("Illinois", "IL"),
    ("Indiana", "IN"),
    ("Iowa", "IA"),
    ("Kansas", "KS"),
    ("Kentucky", "KY"),
    ("Louisiana", "LA"),
    ("Maine", "ME"),
    ("Maryland", "MD"),
    ("Massachusetts", "MA"),
    ("Michigan", "MI"),
    ("Minnesota", "MN"),
    ("Mississippi", "MS"),
    ("Missouri", "MO"),
    ("Montana", "MT"),
    ("Nebraska", "NE"),
    ("Nevada", "NV"),
    ("New Hampshire", "NH"),
    ("New Jersey", "NJ"),
    ("New Mexico", "NM"),
    ("New York", "NY"),
    ("North Carolina", "NC"),
    ("North Dakota", "ND"),
    ("Ohio", "OH"),
    ("Oklahoma", "OK"),
    ("Oregon", "OR"),
    ("Pennsylvania", "PA"),
    ("Rhode Island", "RI"),
    ("South Carolina", "SC"),
    ("South Dakota", "SD"),
    ("Tennessee", "TN"),
    ("Texas", "TX"),
    ("Utah", "UT"),
    ("Vermont", "VT"),
    ("Virginia", "VA"),
    ("Washington", "WA"),
    ("West Virginia", "WV"),
    ("Wisconsin", "WI"),
    ("Wyoming", "WY"),
];

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Serialize)]
struct VerifyAddressBody<'a> {
    address: VerifyAddress<'a>,
}

#[derive(Serialize)]
struct VerifyAddress<'a> {
    street1: &'a str,
    city: &'a str,
    state: &'a str,
    zip: &'a str,
    country: &'static str,
    verify: [&'static str; 1],
}

#[derive(Debug, Deserialize)]
struct CreatedAddress {
    #[serde(flatten)]
    address: AddressFields,
    #[serde(default)]
    verifications: Option<Verifications>,
}

#[derive(Debug, Default, Deserialize)]
struct AddressFields {
    #[serde(default)]
    street1: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    zip: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Verifications {
    #[serde(default)]
    delivery: Option<DeliveryVerification>,
}

#[derive(Debug, Deserialize)]
struct DeliveryVerification {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<VerificationMessage>,
}

#[derive(Debug, Deserialize)]
struct VerificationMessage {
    message: String,
}

#[derive(Serialize)]
struct ShipmentBody<'a> {
    shipment: Shipment<'a>,
}

#[derive(Serialize)]
struct Shipment<'a> {
    to_address: &'a Address,
    from_address: &'a Address,
    parcel: &'a Parcel,
}

#[derive(Debug, Deserialize)]
struct ShipmentResponse {
    #[serde(default)]
    rates: Vec<RateRow>,
    #[serde(default)]
    error: Option<UpstreamError>,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct RateRow {
    id: String,
    carrier: String,
    service: String,
    rate: String,
    #[serde(default)]
    delivery_days: Option<i32>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_full_state_name() {
        assert_eq!(normalize_state("California"), "CA");
        assert_eq!(normalize_state("New Hampshire"), "NH");
        assert_eq!(normalize_state("Wyoming"), "WY");
    }

    #[test]
    fn test_normalize_passes_abbreviations_through() {
        assert_eq!(normalize_state("CA"), "CA");
        assert_eq!(normalize_state("OR"), "OR");
    }

    #[test]
    fn test_normalize_passes_unrecognized_through() {
        // Lookup is exact; casing variants and territories are untouched.
        assert_eq!(normalize_state("california"), "california");
        assert_eq!(normalize_state("Puerto Rico"), "Puerto Rico");
        assert_eq!(normalize_state(""), "");
    }

    #[test]
    fn test_address_us_normalizes_state() {
        let addr = Address::us("1 Main St", "Portland", "Oregon", "97201");
        assert_eq!(addr.state, "OR");
        assert_eq!(addr.country, "US");
    }

    #[test]
    fn test_parcel_boxed_rounds_weight() {
        let parcel = Parcel::boxed(12.3456);
        assert!((parcel.weight - 12.35).abs() < f64::EPSILON);
        assert!((parcel.length - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_verdict_lenient_when_verifications_absent() {
        let requested = Address::us("1 Main St", "Portland", "OR", "97201");
        let created = CreatedAddress {
            address: AddressFields::default(),
            verifications: None,
        };
        assert!(matches!(
            verdict_for(created, &requested),
            AddressVerdict::Valid(_)
        ));
    }

    #[test]
    fn test_verdict_lenient_when_verifications_empty() {
        let requested = Address::us("1 Main St", "Portland", "OR", "97201");
        let created = CreatedAddress {
            address: AddressFields::default(),
            verifications: Some(Verifications { delivery: None }),
        };
        assert!(matches!(
            verdict_for(created, &requested),
            AddressVerdict::Valid(_)
        ));
    }

    #[test]
    fn test_verdict_valid_on_delivery_success() {
        let requested = Address::us("1 Main St", "Portland", "OR", "97201");
        let created = CreatedAddress {
            address: AddressFields {
                street1: Some("1 MAIN ST".to_owned()),
                city: Some("PORTLAND".to_owned()),
                state: Some("OR".to_owned()),
                zip: Some("97201-1234".to_owned()),
            },
            verifications: Some(Verifications {
                delivery: Some(DeliveryVerification {
                    success: true,
                    errors: vec![],
                }),
            }),
        };
        match verdict_for(created, &requested) {
            AddressVerdict::Valid(addr) => {
                assert_eq!(addr.street, "1 MAIN ST");
                assert_eq!(addr.zip, "97201-1234");
            }
            AddressVerdict::Invalid { .. } => panic!("expected valid"),
        }
    }

    #[test]
    fn test_verdict_invalid_carries_upstream_message() {
        let requested = Address::us("1 Nowhere", "Portland", "OR", "97201");
        let created = CreatedAddress {
            address: AddressFields::default(),
            verifications: Some(Verifications {
                delivery: Some(DeliveryVerification {
                    success: false,
                    errors: vec![VerificationMessage {
                        message: "Address not found".to_owned(),
                    }],
                }),
            }),
        };
        match verdict_for(created, &requested) {
            AddressVerdict::Invalid { message } => assert_eq!(message, "Address not found"),
            AddressVerdict::Valid(_) => panic!("expected invalid"),
        }
    }

    #[test]
    fn test_verdict_invalid_default_message() {
        let requested = Address::us("1 Nowhere", "Portland", "OR", "97201");
        let created = CreatedAddress {
            address: AddressFields::default(),
            verifications: Some(Verifications {
                delivery: Some(DeliveryVerification {
                    success: false,
                    errors: vec![],
                }),
            }),
        };
        match verdict_for(created, &requested) {
            AddressVerdict::Invalid { message } => assert_eq!(message, "Invalid address"),
            AddressVerdict::Valid(_) => panic!("expected invalid"),
        }
    }
}
