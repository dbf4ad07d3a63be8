//! Generic order resource.
//!
//! Customers place product orders; every caller lists the orders they have
//! a claim on; admins update and delete.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use keik_core::OrderId;

use crate::error::{ApiJson, MsgBody, Result, msg};
use crate::middleware::Authenticated;
use crate::models::Order;
use crate::policy::{Operation, authorize};
use crate::services::OrderService;
use crate::services::orders::{ProductOrderInput, StatusUpdate};
use crate::state::AppState;

use super::parse_id;

const ORDER_NOT_FOUND: &str = "Order not found";

/// POST /api/orders
#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    ApiJson(input): ApiJson<ProductOrderInput>,
) -> Result<(StatusCode, Json<Order>)> {
    authorize(Operation::PlaceProductOrder, &session)?;
    let order = OrderService::new(state.pool())
        .create_product_order(session.identity_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> Result<Json<Vec<Order>>> {
    authorize(Operation::ListOrders, &session)?;
    Ok(Json(OrderService::new(state.pool()).list_for(&session).await?))
}

/// GET /api/orders/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<Order>> {
    authorize(Operation::GetOrder, &session)?;
    let id: OrderId = parse_id(&id, ORDER_NOT_FOUND)?;
    Ok(Json(OrderService::new(state.pool()).get(id, &session).await?))
}

/// PUT /api/orders/{id}
#[instrument(skip(state, update))]
pub async fn update(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> Result<Json<Order>> {
    authorize(Operation::UpdateOrder, &session)?;
    let id: OrderId = parse_id(&id, ORDER_NOT_FOUND)?;
    Ok(Json(OrderService::new(state.pool()).update(id, update).await?))
}

/// DELETE /api/orders/{id}
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<MsgBody>> {
    authorize(Operation::DeleteOrder, &session)?;
    let id: OrderId = parse_id(&id, ORDER_NOT_FOUND)?;
    OrderService::new(state.pool()).delete(id).await?;
    Ok(msg("Order removed"))
}
