//! Product catalog: public browsing, admin mutation.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use keik_core::ProductId;

use crate::error::{ApiJson, MsgBody, Result, msg};
use crate::middleware::Authenticated;
use crate::models::Product;
use crate::policy::{Operation, authorize};
use crate::services::CatalogService;
use crate::services::catalog::ProductInput;
use crate::state::AppState;

use super::parse_id;

const PRODUCT_NOT_FOUND: &str = "Product not found";

/// GET /api/products
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(CatalogService::new(state.pool()).list().await?))
}

/// GET /api/products/{id}
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Product>> {
    let id: ProductId = parse_id(&id, PRODUCT_NOT_FOUND)?;
    Ok(Json(CatalogService::new(state.pool()).get(id).await?))
}

/// POST /api/products
#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    authorize(Operation::CreateProduct, &session)?;
    let product = CatalogService::new(state.pool()).create(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/products/{id}
#[instrument(skip(state, input))]
pub async fn update(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<Product>> {
    authorize(Operation::UpdateProduct, &session)?;
    let id: ProductId = parse_id(&id, PRODUCT_NOT_FOUND)?;
    Ok(Json(
        CatalogService::new(state.pool()).update(id, input).await?,
    ))
}

/// DELETE /api/products/{id}
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<MsgBody>> {
    authorize(Operation::DeleteProduct, &session)?;
    let id: ProductId = parse_id(&id, PRODUCT_NOT_FOUND)?;
    CatalogService::new(state.pool()).delete(id).await?;
    Ok(msg("Product removed"))
}
