//! Product route handlers.
//!
//! The public list serves active products in display order; everything else
//! is admin-only catalog management.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use farmstand_core::ProductId;

use crate::db::ProductRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::{NewProduct, Product, ProductChanges};
use crate::state::AppState;

/// Archive-toggle request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRequest {
    pub is_archived: bool,
}

/// List active (non-archived) products ordered for display.
///
/// GET /products
pub async fn list_active(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list_active().await?;
    Ok(Json(products))
}

/// List every product, archived included.
///
/// GET /products/all (admin)
pub async fn list_all(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list_all().await?;
    Ok(Json(products))
}

/// Create a product.
///
/// POST /products (admin)
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = ProductRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Update every editable field of a product.
///
/// PUT /products/{id} (admin)
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(changes): Json<ProductChanges>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool())
        .update(ProductId::new(id), &changes)
        .await?;
    Ok(StatusCode::OK)
}

/// Archive or unarchive a product.
///
/// PUT /products/{id}/archive (admin)
pub async fn set_archived(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<ArchiveRequest>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool())
        .set_archived(ProductId::new(id), req.is_archived)
        .await?;
    Ok(StatusCode::OK)
}

/// Hard-delete a product with no order references.
///
/// DELETE /products/{id} (admin)
pub async fn delete(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool())
        .delete(ProductId::new(id))
        .await?;
    Ok(StatusCode::OK)
}
