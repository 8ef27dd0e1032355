//! Order ledger: the transactional place-order write and the status-update
//! path, plus the joined reads the API serves.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use farmstand_core::{
    OrderId, OrderLineId, OrderStatus, ProductId, ShippingDetailId, TransitionPlan,
};

use super::RepositoryError;
use crate::models::{Order, OrderLine, OrderLineDetail, OrderWithDetails, PlaceOrder, ShippingDetail};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for order-with-shipping queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderDetailRow {
    id: i32,
    shipping_detail_id: i32,
    status: String,
    tracking_number: Option<String>,
    shipping_method: Option<String>,
    shipping_cost: Decimal,
    shipped_at: Option<DateTime<Utc>>,
    shipping_email_sent: bool,
    created_at: DateTime<Utc>,
    ship_full_name: String,
    ship_street: String,
    ship_city: String,
    ship_state: String,
    ship_zip: String,
    ship_email: String,
    ship_phone: String,
    ship_created_at: DateTime<Utc>,
}

impl TryFrom<OrderDetailRow> for (Order, ShippingDetail) {
    type Error = RepositoryError;

    fn try_from(row: OrderDetailRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row.status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;

        let order = Order {
            id: OrderId::new(row.id),
            shipping_detail_id: ShippingDetailId::new(row.shipping_detail_id),
            status,
            tracking_number: row.tracking_number,
            shipping_method: row.shipping_method,
            shipping_cost: row.shipping_cost,
            shipped_at: row.shipped_at,
            shipping_email_sent: row.shipping_email_sent,
            created_at: row.created_at,
        };

        let shipping = ShippingDetail {
            id: ShippingDetailId::new(row.shipping_detail_id),
            full_name: row.ship_full_name,
            street: row.ship_street,
            city: row.ship_city,
            state: row.ship_state,
            zip: row.ship_zip,
            email: row.ship_email,
            phone: row.ship_phone,
            created_at: row.ship_created_at,
        };

        Ok((order, shipping))
    }
}

/// Internal row type for order lines joined with product names.
#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    quantity: i32,
    unit_price: Decimal,
    product_name: String,
}

impl From<LineRow> for OrderLineDetail {
    fn from(row: LineRow) -> Self {
        Self {
            line: OrderLine {
                id: OrderLineId::new(row.id),
                order_id: OrderId::new(row.order_id),
                product_id: ProductId::new(row.product_id),
                quantity: row.quantity,
                unit_price: row.unit_price,
            },
            product_name: row.product_name,
        }
    }
}

const ORDER_DETAIL_QUERY: &str = r"
    SELECT o.id, o.shipping_detail_id, o.status, o.tracking_number,
           o.shipping_method, o.shipping_cost, o.shipped_at,
           o.shipping_email_sent, o.created_at,
           s.full_name AS ship_full_name,
           s.street AS ship_street,
           s.city AS ship_city,
           s.state AS ship_state,
           s.zip AS ship_zip,
           s.email AS ship_email,
           s.phone AS ship_phone,
           s.created_at AS ship_created_at
    FROM orders o
    JOIN shipping_details s ON o.shipping_detail_id = s.id
";

const LINE_DETAIL_QUERY: &str = r"
    SELECT l.id, l.order_id, l.product_id, l.quantity, l.unit_price,
           p.name AS product_name
    FROM order_lines l
    JOIN products p ON l.product_id = p.id
";

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order: one transaction covering the shipping-detail insert,
    /// the order and order-line inserts, and a guarded stock decrement per
    /// line. Nothing survives a failure on any line.
    ///
    /// The stock decrement is conditional (`stock_qty >= quantity`); a miss
    /// means the product is gone or oversold, and the whole order aborts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InsufficientStock` if any line cannot be
    /// covered by current stock.
    /// Returns `RepositoryError::Conflict` if a cart line names a product
    /// that does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn place_order(&self, input: &PlaceOrder) -> Result<OrderId, RepositoryError> {
        // Any early return before commit() drops the transaction, which
        // rolls it back.
        let mut tx = self.pool.begin().await?;

        let (shipping_id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO shipping_details (full_name, street, city, state, zip, email, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(&input.full_name)
        .bind(&input.street)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.zip)
        .bind(&input.email)
        .bind(&input.phone)
        .fetch_one(&mut *tx)
        .await?;

        let (order_id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO orders (shipping_detail_id, status, shipping_method, shipping_cost)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(shipping_id)
        .bind(OrderStatus::Pending.as_str())
        .bind(&input.shipping_method)
        .bind(input.shipping_cost)
        .fetch_one(&mut *tx)
        .await?;

        for line in &input.lines {
            sqlx::query(
                r"
                INSERT INTO order_lines (order_id, product_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(order_id)
            .bind(line.product_id.as_i32())
            .bind(line.quantity)
            .bind(line.unit_price)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict(format!(
                        "cart references unknown product {}",
                        line.product_id
                    ));
                }
                RepositoryError::Database(e)
            })?;

            let result = sqlx::query(
                r"
                UPDATE products
                SET stock_qty = stock_qty - $2
                WHERE id = $1 AND stock_qty >= $2
                ",
            )
            .bind(line.product_id.as_i32())
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::InsufficientStock(line.product_id));
            }
        }

        tx.commit().await?;

        Ok(OrderId::new(order_id))
    }

    /// Get an order joined with its shipping detail and lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored status is invalid.
    pub async fn get_with_details(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderWithDetails>, RepositoryError> {
        let sql = format!("{ORDER_DETAIL_QUERY} WHERE o.id = $1");
        let row = sqlx::query_as::<_, OrderDetailRow>(&sql)
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let (order, shipping) = row.try_into()?;
        let lines = self.lines_for_orders(&[id.as_i32()]).await?;
        let lines = lines.into_values().flatten().collect();

        Ok(Some(OrderWithDetails {
            order,
            shipping,
            lines,
        }))
    }

    /// List every order with shipping and line data, newest first (admin).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all_with_details(&self) -> Result<Vec<OrderWithDetails>, RepositoryError> {
        let sql = format!("{ORDER_DETAIL_QUERY} ORDER BY o.created_at DESC");
        let rows = sqlx::query_as::<_, OrderDetailRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        self.assemble(rows).await
    }

    /// List a customer's orders by their shipping email, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_by_email(&self, email: &str) -> Result<Vec<OrderWithDetails>, RepositoryError> {
        let sql = format!("{ORDER_DETAIL_QUERY} WHERE s.email = $1 ORDER BY o.created_at DESC");
        let rows = sqlx::query_as::<_, OrderDetailRow>(&sql)
            .bind(email)
            .fetch_all(self.pool)
            .await?;

        self.assemble(rows).await
    }

    /// The customer's most recent order, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn latest_by_email(
        &self,
        email: &str,
    ) -> Result<Option<OrderWithDetails>, RepositoryError> {
        let sql =
            format!("{ORDER_DETAIL_QUERY} WHERE s.email = $1 ORDER BY o.created_at DESC LIMIT 1");
        let row = sqlx::query_as::<_, OrderDetailRow>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let (order, shipping) = row.try_into()?;
        let lines = self.lines_for_orders(&[order.id.as_i32()]).await?;
        let lines = lines.into_values().flatten().collect();

        Ok(Some(OrderWithDetails {
            order,
            shipping,
            lines,
        }))
    }

    /// Apply a validated status change.
    ///
    /// `shipped_at` is assigned in SQL only when the plan enters `Shipped`
    /// and the column is still NULL, so the first shipped timestamp survives
    /// every later save.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_status(
        &self,
        id: OrderId,
        plan: TransitionPlan,
        tracking_number: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = $2,
                tracking_number = $3,
                shipped_at = CASE
                                 WHEN $4 AND shipped_at IS NULL THEN NOW()
                                 ELSE shipped_at
                             END
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .bind(plan.next.as_str())
        .bind(tracking_number)
        .bind(plan.entering_shipped)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Record that the shipment notice went out.
    ///
    /// Only called after a successful send, so a failed send leaves the flag
    /// unset and a later re-entry into `Shipped` can try again.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn mark_shipping_email_sent(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET shipping_email_sent = TRUE
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Fetch the lines for a set of orders, grouped by order id.
    async fn lines_for_orders(
        &self,
        order_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<OrderLineDetail>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!("{LINE_DETAIL_QUERY} WHERE l.order_id = ANY($1) ORDER BY l.id ASC");
        let rows = sqlx::query_as::<_, LineRow>(&sql)
            .bind(order_ids)
            .fetch_all(self.pool)
            .await?;

        let mut grouped: HashMap<i32, Vec<OrderLineDetail>> = HashMap::new();
        for row in rows {
            grouped.entry(row.order_id).or_default().push(row.into());
        }

        Ok(grouped)
    }

    /// Stitch detail rows and their lines into aggregates.
    async fn assemble(
        &self,
        rows: Vec<OrderDetailRow>,
    ) -> Result<Vec<OrderWithDetails>, RepositoryError> {
        let order_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut lines = self.lines_for_orders(&order_ids).await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let order_id = row.id;
            let (order, shipping) = row.try_into()?;
            out.push(OrderWithDetails {
                order,
                shipping,
                lines: lines.remove(&order_id).unwrap_or_default(),
            });
        }

        Ok(out)
    }
}
