//! Simulated subscription payment.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::Authenticated;
use crate::policy::{Operation, authorize};
use crate::services::BakerService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub msg: &'static str,
    pub subscription_expiry: DateTime<Utc>,
}

/// POST /api/payment/subscribe
///
/// No payment provider is involved: each call records one paid month.
#[instrument(skip(state))]
pub async fn subscribe(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> Result<Json<SubscriptionResponse>> {
    authorize(Operation::Subscribe, &session)?;
    let subscription_expiry = BakerService::new(state.pool())
        .subscribe(session.identity_id)
        .await?;

    Ok(Json(SubscriptionResponse {
        msg: "Subscription activated successfully",
        subscription_expiry,
    }))
}
