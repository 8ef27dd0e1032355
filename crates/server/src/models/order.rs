//! Order aggregate: shipping detail, order header, and order lines.
//!
//! One `Order` is created per checkout and owns a collection of `OrderLine`
//! rows, so the shipping method and cost live exactly once per order while
//! each line snapshots the unit price it was bought at.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use farmstand_core::{OrderId, OrderLineId, OrderStatus, ProductId, ShippingDetailId};

/// Recipient name/address captured once per checkout. Immutable thereafter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetail {
    pub id: ShippingDetailId,
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

/// Order header.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub shipping_detail_id: ShippingDetailId,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub shipping_method: Option<String>,
    pub shipping_cost: Decimal,
    /// Set once, on the first transition into `Shipped`.
    pub shipped_at: Option<DateTime<Utc>>,
    /// Guards the at-most-once shipment notification.
    pub shipping_email_sent: bool,
    pub created_at: DateTime<Utc>,
}

/// One cart line of an order, with the unit price snapshotted at purchase
/// time (decoupled from the product's current price).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// An order line joined with its product's display name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineDetail {
    #[serde(flatten)]
    pub line: OrderLine,
    pub product_name: String,
}

/// An order joined with its shipping detail and lines, the shape returned to
/// checkout callers, the admin order list, and the email builder.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithDetails {
    #[serde(flatten)]
    pub order: Order,
    pub shipping: ShippingDetail,
    pub lines: Vec<OrderLineDetail>,
}

impl OrderWithDetails {
    /// Cart subtotal: sum of quantity x unit price over the lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines
            .iter()
            .map(|l| Decimal::from(l.line.quantity) * l.line.unit_price)
            .sum()
    }

    /// Order total: subtotal plus the shipping cost.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.subtotal() + self.order.shipping_cost
    }
}

/// Input for the shipping detail insert at checkout.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShippingDetail {
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    /// Guest email; a logged-in session's email takes precedence.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// One cart line of a checkout request.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Everything the ledger needs to place an order in one transaction.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub email: String,
    pub phone: String,
    pub shipping_method: Option<String>,
    pub shipping_cost: Decimal,
    pub lines: Vec<NewOrderLine>,
}
