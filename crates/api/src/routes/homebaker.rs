//! Baker self-service: profile, portfolio and assigned orders.
//!
//! The baker is always the caller; no handler accepts a baker id.

use axum::{
    Json,
    extract::{
        Multipart, Path, State,
        multipart::{MultipartError, MultipartRejection},
    },
};
use serde::Serialize;
use tracing::instrument;

use keik_core::OrderId;

use crate::db::OrderScope;
use crate::error::{ApiJson, AppError, Result};
use crate::middleware::Authenticated;
use crate::models::{Baker, Order, PortfolioEntry, ProfileUpdate};
use crate::policy::{Operation, authorize};
use crate::services::images::{ImageUpload, MAX_IMAGES_PER_UPLOAD};
use crate::services::orders::StatusUpdate;
use crate::services::{BakerService, OrderService};
use crate::state::AppState;

use super::parse_id;

/// Multipart field carrying the images.
const IMAGES_FIELD: &str = "images";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub msg: &'static str,
    pub past_works: Vec<PortfolioEntry>,
}

/// GET /api/homebaker/profile
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> Result<Json<Baker>> {
    authorize(Operation::GetOwnProfile, &session)?;
    Ok(Json(
        BakerService::new(state.pool())
            .profile(session.identity_id)
            .await?,
    ))
}

/// PUT /api/homebaker/profile
#[instrument(skip(state, update))]
pub async fn update_profile(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<Baker>> {
    authorize(Operation::UpdateOwnProfile, &session)?;
    Ok(Json(
        BakerService::new(state.pool())
            .update_profile(session.identity_id, update)
            .await?,
    ))
}

/// POST /api/homebaker/upload
#[instrument(skip(state, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    authorize(Operation::UploadPortfolio, &session)?;
    let mut multipart = multipart.map_err(|e| AppError::Validation(e.body_text()))?;

    let mut images = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGES_FIELD) {
            continue;
        }
        if images.len() == MAX_IMAGES_PER_UPLOAD {
            return Err(AppError::Validation(format!(
                "At most {MAX_IMAGES_PER_UPLOAD} images can be uploaded at once"
            )));
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        images.push(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    let past_works = BakerService::new(state.pool())
        .upload(session.identity_id, state.images(), images)
        .await?;

    Ok(Json(UploadResponse {
        msg: "Images uploaded successfully",
        past_works,
    }))
}

/// GET /api/homebaker/pastworks
#[instrument(skip(state))]
pub async fn past_works(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> Result<Json<Vec<PortfolioEntry>>> {
    authorize(Operation::ListPortfolio, &session)?;
    Ok(Json(
        BakerService::new(state.pool())
            .portfolio(session.identity_id)
            .await?,
    ))
}

/// GET /api/homebaker/orders
#[instrument(skip(state))]
pub async fn list_orders(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> Result<Json<Vec<Order>>> {
    authorize(Operation::ListAssignedOrders, &session)?;
    Ok(Json(
        OrderService::new(state.pool())
            .list(OrderScope::AssignedTo(session.identity_id))
            .await?,
    ))
}

/// PUT /api/homebaker/orders/{id}
#[instrument(skip(state, update))]
pub async fn update_order(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> Result<Json<Order>> {
    authorize(Operation::BakerUpdateOrder, &session)?;
    let id: OrderId = parse_id(&id, "Order not found")?;

    Ok(Json(
        OrderService::new(state.pool())
            .baker_update(session.identity_id, id, update)
            .await?,
    ))
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::Validation(err.body_text())
}
