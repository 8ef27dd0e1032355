//! Product model and admin write inputs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use farmstand_core::ProductId;

/// A catalog product.
///
/// Products are archived rather than deleted once referenced by an order, so
/// order history keeps its product rows. Dimensions and weight feed the rate
/// quoter (ounces and inches).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock_qty: i32,
    pub image_url: Option<String>,
    pub local_pickup_only: bool,
    pub display_order: i32,
    pub is_archived: bool,
    pub weight: Option<Decimal>,
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub height: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a product (admin).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
    #[serde(default)]
    pub local_pickup_only: bool,
    #[serde(default)]
    pub display_order: i32,
    pub weight: Option<Decimal>,
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub height: Option<Decimal>,
}

/// Full-row update for a product (admin).
///
/// Every field is written; the admin form always submits the whole record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductChanges {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
    #[serde(default)]
    pub local_pickup_only: bool,
    #[serde(default)]
    pub display_order: i32,
    pub weight: Option<Decimal>,
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub height: Option<Decimal>,
}
