//! Contact form handler.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::{ApiJson, MsgBody, Result, msg};
use crate::services::ContactService;
use crate::services::contact::ContactInput;
use crate::state::AppState;

/// POST /api/contact
///
/// Stores the message, then forwards it by email in the background.
#[instrument(skip(state, input), fields(email = %input.email))]
pub async fn submit(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ContactInput>,
) -> Result<Json<MsgBody>> {
    ContactService::new(state.pool(), state.email())
        .submit(input)
        .await?;
    Ok(msg("Your message has been sent successfully!"))
}
