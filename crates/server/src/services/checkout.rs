//! Checkout orchestrator.
//!
//! The browser drives the earlier steps of a checkout (address validation,
//! rate selection, payment-intent confirmation); this service owns the final
//! one: the fast precondition checks, the single atomic place-order
//! transaction, and the best-effort confirmation email after commit.
//!
//! A payment already captured out-of-band is NOT voided when the transaction
//! fails; the expected capture amount is logged at commit so a failed pairing
//! can be reconciled by hand.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use farmstand_core::{Email, ProductId};

use crate::db::{OrderRepository, RepositoryError};
use crate::models::{NewOrderLine, NewShippingDetail, OrderWithDetails, PlaceOrder};
use crate::services::email::EmailService;

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Empty cart, rejected before any external call.
    #[error("cart must contain at least one item")]
    EmptyCart,

    /// Incomplete recipient name/address, rejected before any external call.
    #[error("shipping name and address are required")]
    MissingShippingInfo,

    /// No session email and no guest email to reach the customer at.
    #[error("a contact email is required")]
    MissingRecipientEmail,

    /// A line asked for zero or negative units.
    #[error("line quantities must be positive")]
    InvalidQuantity,

    /// A line carried a negative unit price.
    #[error("line prices must not be negative")]
    InvalidUnitPrice,

    /// The order transaction failed and rolled back.
    #[error("order transaction failed: {0}")]
    Repository(#[from] RepositoryError),
}

/// One cart line as submitted by the storefront.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product_id: ProductId,
    pub quantity: i32,
    /// Unit price as shown to the customer; snapshotted onto the order line.
    pub price: Decimal,
}

/// The checkout request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub shipping_info: NewShippingDetail,
    #[serde(default)]
    pub shipping_method: Option<String>,
    #[serde(default)]
    pub shipping_cost: Decimal,
    pub cart_items: Vec<CartLineItem>,
}

/// Checkout orchestrator: preconditions, the atomic order write, and the
/// post-commit confirmation email.
pub struct CheckoutService<'a> {
    orders: OrderRepository<'a>,
    email: &'a EmailService,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, email: &'a EmailService) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            email,
        }
    }

    /// Place an order.
    ///
    /// On success the order is durably committed, stock is decremented per
    /// line, and the returned aggregate is what the caller shows the
    /// customer. Email failure after commit is logged and swallowed.
    ///
    /// # Errors
    ///
    /// Precondition violations come back as the matching `CheckoutError`
    /// variant; a failed transaction comes back as
    /// `CheckoutError::Repository` with nothing persisted.
    pub async fn place_order(
        &self,
        session_email: Option<&Email>,
        req: &CheckoutRequest,
    ) -> Result<OrderWithDetails, CheckoutError> {
        validate_request(req)?;

        let recipient =
            resolve_recipient(session_email, req.shipping_info.email.as_deref())
                .ok_or(CheckoutError::MissingRecipientEmail)?;

        let lines: Vec<NewOrderLine> = req
            .cart_items
            .iter()
            .map(|item| NewOrderLine {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.price,
            })
            .collect();

        let subtotal: Decimal = lines
            .iter()
            .map(|l| Decimal::from(l.quantity) * l.unit_price)
            .sum();
        let amount_cents = authorized_amount_cents(subtotal, req.shipping_cost);

        let place = PlaceOrder {
            full_name: req.shipping_info.full_name.clone(),
            street: req.shipping_info.street.clone(),
            city: req.shipping_info.city.clone(),
            state: req.shipping_info.state.clone(),
            zip: req.shipping_info.zip.clone(),
            email: recipient.clone(),
            phone: req.shipping_info.phone.clone().unwrap_or_default(),
            shipping_method: req.shipping_method.clone(),
            shipping_cost: req.shipping_cost,
            lines,
        };

        let order_id = self.orders.place_order(&place).await?;

        // The capture happened client-side against the payment intent; log
        // the amount this order expects so a mismatch can be reconciled.
        tracing::info!(
            order_id = %order_id,
            amount_cents,
            "order committed; payment captured out-of-band for this amount"
        );

        let details = self
            .orders
            .get_with_details(order_id)
            .await?
            .ok_or(CheckoutError::Repository(RepositoryError::NotFound))?;

        // Best-effort: the order is already durable, a lost email must not
        // fail the checkout.
        if let Err(e) = self.email.send_order_confirmation(&recipient, &details).await {
            tracing::error!(
                order_id = %order_id,
                error = %e,
                "Failed to send order confirmation email"
            );
        }

        Ok(details)
    }
}

/// Fast precondition checks, run before any external effect.
fn validate_request(req: &CheckoutRequest) -> Result<(), CheckoutError> {
    if req.cart_items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let s = &req.shipping_info;
    if [&s.full_name, &s.street, &s.city, &s.state, &s.zip]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return Err(CheckoutError::MissingShippingInfo);
    }

    for item in &req.cart_items {
        if item.quantity <= 0 {
            return Err(CheckoutError::InvalidQuantity);
        }
        if item.price < Decimal::ZERO {
            return Err(CheckoutError::InvalidUnitPrice);
        }
    }

    Ok(())
}

/// Resolve the confirmation recipient: the authenticated session's email
/// wins, a guest-supplied shipping email is the fallback.
fn resolve_recipient(session_email: Option<&Email>, guest_email: Option<&str>) -> Option<String> {
    if let Some(email) = session_email {
        return Some(email.as_str().to_owned());
    }

    guest_email
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_owned)
}

/// The amount the payment intent is expected to capture, in USD cents:
/// round((subtotal + shipping) * 100), half away from zero.
#[must_use]
pub fn authorized_amount_cents(subtotal: Decimal, shipping_cost: Decimal) -> i64 {
    ((subtotal + shipping_cost) * Decimal::from(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(i64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(cart: Vec<CartLineItem>) -> CheckoutRequest {
        CheckoutRequest {
            shipping_info: NewShippingDetail {
                full_name: "Ada Lovelace".to_owned(),
                street: "1 Main St".to_owned(),
                city: "Portland".to_owned(),
                state: "OR".to_owned(),
                zip: "97201".to_owned(),
                email: Some("ada@example.com".to_owned()),
                phone: None,
            },
            shipping_method: Some("USPS Priority".to_owned()),
            shipping_cost: Decimal::new(500, 2),
            cart_items: cart,
        }
    }

    fn line(quantity: i32, price: Decimal) -> CartLineItem {
        CartLineItem {
            product_id: ProductId::new(1),
            quantity,
            price,
        }
    }

    #[test]
    fn test_authorized_amount_two_lines_plus_shipping() {
        // 2 x 9.99 + 5.00 shipping = 24.98 -> 2498 cents
        let subtotal = Decimal::from(2) * Decimal::new(999, 2);
        assert_eq!(authorized_amount_cents(subtotal, Decimal::new(500, 2)), 2498);
    }

    #[test]
    fn test_authorized_amount_rounds_half_away_from_zero() {
        // 0.005 dollars -> 0.5 cents -> 1 cent
        assert_eq!(
            authorized_amount_cents(Decimal::new(5, 3), Decimal::ZERO),
            1
        );
    }

    #[test]
    fn test_authorized_amount_zero_cart() {
        assert_eq!(authorized_amount_cents(Decimal::ZERO, Decimal::ZERO), 0);
    }

    #[test]
    fn test_validate_rejects_empty_cart() {
        let req = request(vec![]);
        assert!(matches!(
            validate_request(&req),
            Err(CheckoutError::EmptyCart)
        ));
    }

    #[test]
    fn test_validate_rejects_blank_shipping_fields() {
        let mut req = request(vec![line(1, Decimal::ONE)]);
        req.shipping_info.city = "  ".to_owned();
        assert!(matches!(
            validate_request(&req),
            Err(CheckoutError::MissingShippingInfo)
        ));
    }

    #[test]
    fn test_validate_rejects_nonpositive_quantity() {
        let req = request(vec![line(0, Decimal::ONE)]);
        assert!(matches!(
            validate_request(&req),
            Err(CheckoutError::InvalidQuantity)
        ));
    }

    #[test]
    fn test_validate_rejects_negative_price() {
        let req = request(vec![line(1, Decimal::NEGATIVE_ONE)]);
        assert!(matches!(
            validate_request(&req),
            Err(CheckoutError::InvalidUnitPrice)
        ));
    }

    #[test]
    fn test_validate_accepts_well_formed_request() {
        let req = request(vec![line(2, Decimal::new(999, 2))]);
        assert!(validate_request(&req).is_ok());
    }

    #[test]
    fn test_recipient_prefers_session_email() {
        let session = Email::parse("account@example.com").unwrap();
        let resolved = resolve_recipient(Some(&session), Some("guest@example.com"));
        assert_eq!(resolved.as_deref(), Some("account@example.com"));
    }

    #[test]
    fn test_recipient_falls_back_to_guest_email() {
        let resolved = resolve_recipient(None, Some(" guest@example.com "));
        assert_eq!(resolved.as_deref(), Some("guest@example.com"));
    }

    #[test]
    fn test_recipient_none_when_absent() {
        assert!(resolve_recipient(None, None).is_none());
        assert!(resolve_recipient(None, Some("   ")).is_none());
    }
}
