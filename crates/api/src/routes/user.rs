//! Customer endpoints: baker directory and cake orders.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use crate::db::OrderScope;
use crate::error::{ApiJson, Result};
use crate::middleware::Authenticated;
use crate::models::{Baker, Order};
use crate::policy::{Operation, authorize};
use crate::services::orders::CakeOrderInput;
use crate::services::{BakerService, OrderService};
use crate::state::AppState;

/// GET /api/user/bakers
#[instrument(skip(state))]
pub async fn active_bakers(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> Result<Json<Vec<Baker>>> {
    authorize(Operation::ListActiveBakers, &session)?;
    Ok(Json(BakerService::new(state.pool()).list_active().await?))
}

/// POST /api/user/order
#[instrument(skip(state))]
pub async fn place_order(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    ApiJson(input): ApiJson<CakeOrderInput>,
) -> Result<(StatusCode, Json<Order>)> {
    authorize(Operation::PlaceCakeOrder, &session)?;
    let order = OrderService::new(state.pool())
        .create_cake_order(session.identity_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/user/orders
#[instrument(skip(state))]
pub async fn orders(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> Result<Json<Vec<Order>>> {
    authorize(Operation::ListPlacedOrders, &session)?;
    Ok(Json(
        OrderService::new(state.pool())
            .list(OrderScope::PlacedBy(session.identity_id))
            .await?,
    ))
}
