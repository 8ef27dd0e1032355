//! Order route handlers: the admin order book and the customer's own
//! order history.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use farmstand_core::{OrderId, OrderStatus, plan_transition};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::OrderWithDetails;
use crate::routes::auth::MessageResponse;
use crate::state::AppState;

/// Admin status/tracking update request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub order_status: OrderStatus,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

/// List every order with shipping and line data, newest first.
///
/// GET /api/admin/orders (admin)
pub async fn list_all(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderWithDetails>>> {
    let orders = OrderRepository::new(state.pool())
        .list_all_with_details()
        .await?;
    Ok(Json(orders))
}

/// Update an order's status and tracking number.
///
/// PUT /api/admin/orders/{id} (admin)
///
/// The transition is validated against the order's current status, the
/// shipped-at timestamp is assigned at most once, and the shipment notice
/// goes out at most once per order: only on a transition *into* Shipped,
/// only if it has never been sent, and reflecting the tracking number of the
/// triggering save. Email failure is logged and does not fail the update.
pub async fn update_status(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<Json<MessageResponse>> {
    let repo = OrderRepository::new(state.pool());

    let details = repo
        .get_with_details(OrderId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    let plan = plan_transition(details.order.status, req.order_status)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let tracking = req
        .tracking_number
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    repo.update_status(details.order.id, plan, tracking).await?;

    if plan.entering_shipped && !details.order.shipping_email_sent {
        notify_shipped(&state, &repo, &details, tracking).await;
    }

    Ok(Json(MessageResponse {
        message: "Order updated successfully",
    }))
}

/// Send the shipment notice and record it, best-effort.
///
/// The sent flag is only set after a successful send; a transient SMTP
/// failure leaves it unset so a later re-entry into Shipped can try again.
async fn notify_shipped(
    state: &AppState,
    repo: &OrderRepository<'_>,
    details: &OrderWithDetails,
    tracking: Option<&str>,
) {
    match state
        .email()
        .send_shipment_notice(&details.shipping.email, details, tracking)
        .await
    {
        Ok(()) => {
            if let Err(e) = repo.mark_shipping_email_sent(details.order.id).await {
                tracing::error!(
                    order_id = %details.order.id,
                    error = %e,
                    "Shipment notice sent but the sent flag could not be recorded"
                );
            }
        }
        Err(e) => {
            tracing::error!(
                order_id = %details.order.id,
                error = %e,
                "Failed to send shipment notice"
            );
        }
    }
}

/// List the session user's orders by their shipping email, newest first.
///
/// GET /api/orders
pub async fn list_mine(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderWithDetails>>> {
    let orders = OrderRepository::new(state.pool())
        .list_by_email(user.email.as_str())
        .await?;
    Ok(Json(orders))
}

/// The session user's most recent order.
///
/// GET /api/orders/last
pub async fn latest(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<OrderWithDetails>> {
    let order = OrderRepository::new(state.pool())
        .latest_by_email(user.email.as_str())
        .await?
        .ok_or_else(|| AppError::NotFound("no orders found for this user".to_owned()))?;
    Ok(Json(order))
}
