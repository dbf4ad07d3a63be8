//! Admin directory and order oversight.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use keik_core::{IdentityId, OrderId, Role};

use crate::error::{ApiJson, MsgBody, Result, msg};
use crate::middleware::Authenticated;
use crate::models::{Baker, Identity, Order};
use crate::policy::{Operation, authorize};
use crate::services::orders::StatusUpdate;
use crate::services::{BakerService, OrderService};
use crate::state::AppState;

use super::parse_id;

const BAKER_NOT_FOUND: &str = "Home Baker not found";
const USER_NOT_FOUND: &str = "User not found";

/// GET /api/admin/homebakers
#[instrument(skip(state))]
pub async fn list_bakers(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> Result<Json<Vec<Baker>>> {
    authorize(Operation::ListBakers, &session)?;
    Ok(Json(BakerService::new(state.pool()).list_all().await?))
}

/// DELETE /api/admin/homebakers/{id}
#[instrument(skip(state))]
pub async fn delete_baker(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<MsgBody>> {
    authorize(Operation::DeleteBaker, &session)?;
    let id: IdentityId = parse_id(&id, BAKER_NOT_FOUND)?;

    BakerService::new(state.pool())
        .remove_identity(Role::Baker, id, BAKER_NOT_FOUND)
        .await?;
    Ok(msg("Home Baker removed"))
}

/// GET /api/admin/users
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> Result<Json<Vec<Identity>>> {
    authorize(Operation::ListCustomers, &session)?;
    Ok(Json(BakerService::new(state.pool()).list_customers().await?))
}

/// DELETE /api/admin/users/{id}
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<MsgBody>> {
    authorize(Operation::DeleteCustomer, &session)?;
    let id: IdentityId = parse_id(&id, USER_NOT_FOUND)?;

    BakerService::new(state.pool())
        .remove_identity(Role::Customer, id, USER_NOT_FOUND)
        .await?;
    Ok(msg("User removed"))
}

/// GET /api/admin/orders
#[instrument(skip(state))]
pub async fn list_orders(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> Result<Json<Vec<Order>>> {
    authorize(Operation::ListAllOrders, &session)?;
    Ok(Json(
        OrderService::new(state.pool())
            .list(crate::db::OrderScope::All)
            .await?,
    ))
}

/// PUT /api/admin/orders/{id}
#[instrument(skip(state, update))]
pub async fn update_order(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> Result<Json<Order>> {
    authorize(Operation::AdminUpdateOrder, &session)?;
    let id: OrderId = parse_id(&id, "Order not found")?;

    Ok(Json(
        OrderService::new(state.pool()).admin_update(id, update).await?,
    ))
}
