//! Product repository for database operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use farmstand_core::ProductId;

use super::RepositoryError;
use crate::models::{NewProduct, Product, ProductChanges};

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: Decimal,
    stock_qty: i32,
    image_url: Option<String>,
    local_pickup_only: bool,
    display_order: i32,
    is_archived: bool,
    weight: Option<Decimal>,
    length: Option<Decimal>,
    width: Option<Decimal>,
    height: Option<Decimal>,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            stock_qty: row.stock_qty,
            image_url: row.image_url,
            local_pickup_only: row.local_pickup_only,
            display_order: row.display_order,
            is_archived: row.is_archived,
            weight: row.weight,
            length: row.length,
            width: row.width,
            height: row.height,
            created_at: row.created_at,
        }
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active (non-archived) products ordered for display.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, stock_qty, image_url,
                   local_pickup_only, display_order, is_archived,
                   weight, length, width, height, created_at
            FROM products
            WHERE is_archived = FALSE
            ORDER BY display_order ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// List every product, archived included (admin view).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, stock_qty, image_url,
                   local_pickup_only, display_order, is_archived,
                   weight, length, width, height, created_at
            FROM products
            ORDER BY display_order ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, input: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO products (
                name, description, price, stock_qty, image_url,
                local_pickup_only, display_order, weight, length, width, height
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, name, description, price, stock_qty, image_url,
                      local_pickup_only, display_order, is_archived,
                      weight, length, width, height, created_at
            ",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.stock)
        .bind(&input.image_url)
        .bind(input.local_pickup_only)
        .bind(input.display_order)
        .bind(input.weight)
        .bind(input.length)
        .bind(input.width)
        .bind(input.height)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update every editable field of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET name = $2,
                description = $3,
                price = $4,
                stock_qty = $5,
                image_url = $6,
                local_pickup_only = $7,
                display_order = $8,
                weight = $9,
                length = $10,
                width = $11,
                height = $12
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.price)
        .bind(changes.stock)
        .bind(&changes.image_url)
        .bind(changes.local_pickup_only)
        .bind(changes.display_order)
        .bind(changes.weight)
        .bind(changes.length)
        .bind(changes.width)
        .bind(changes.height)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Archive or unarchive a product.
    ///
    /// Archiving hides a product from the public list while keeping its row
    /// for order-history joins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_archived(
        &self,
        id: ProductId,
        is_archived: bool,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET is_archived = $2
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .bind(is_archived)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Hard-delete a product.
    ///
    /// Only valid for products no order line references; referenced products
    /// should be archived instead.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if order lines still reference it.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict(
                        "product is referenced by existing orders; archive it instead".to_owned(),
                    );
                }
                RepositoryError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
