//! Registration and login.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use keik_core::Role;

use crate::error::{ApiJson, AppError, Result, msg};
use crate::services::AuthService;
use crate::state::AppState;

/// Registration body. `role` is `admin`, `homebaker` or `user`.
#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Login body.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
}

/// POST /api/auth/register
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<RegisterForm>,
) -> Result<impl IntoResponse> {
    if [&form.name, &form.email, &form.password]
        .iter()
        .any(|f| f.trim().is_empty())
    {
        return Err(AppError::Validation(
            "Please provide all required fields".to_string(),
        ));
    }
    let role = Role::from_registration(form.role.as_deref());

    let identity = AuthService::new(state.pool())
        .register(&form.name, &form.email, &form.password, role)
        .await?;
    tracing::info!(identity_id = %identity.id, role = %role, "Identity registered");

    Ok((
        StatusCode::CREATED,
        msg(format!("{} registered successfully", role.label())),
    ))
}

/// POST /api/auth/login
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<LoginForm>,
) -> Result<Json<LoginResponse>> {
    let role = Role::from_registration(form.role.as_deref());

    let identity = AuthService::new(state.pool())
        .verify(&form.email, &form.password, role)
        .await?;
    let token = state.tokens().issue(identity.id, identity.role)?;
    tracing::info!(identity_id = %identity.id, role = %role, "Login succeeded");

    Ok(Json(LoginResponse {
        token,
        role: identity.role,
    }))
}
