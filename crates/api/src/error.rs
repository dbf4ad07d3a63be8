//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Each error becomes a JSON body
//! `{ "msg": string }`; server-side failures are logged and captured to Sentry
//! and reach the client only as `"Server error"`.

use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::images::ImageStoreError;

/// Message shown to clients for every server-side failure.
pub const SERVER_ERROR_MSG: &str = "Server error";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing, invalid or expired session token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated caller lacks the required role or ownership.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Referenced entity absent or identifier malformed.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate registration.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unexpected failure.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),
}

/// JSON body `{ "msg": ... }` of error and message-only responses.
#[derive(Debug, Serialize)]
pub struct MsgBody {
    pub msg: String,
}

/// JSON message body `{ "msg": ... }`, also used for success responses that
/// carry only a message.
#[must_use]
pub fn msg(text: impl Into<String>) -> Json<MsgBody> {
    Json(MsgBody { msg: text.into() })
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::BAD_REQUEST,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Validation(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Conflict(m) => m.clone(),
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(m)) => m.clone(),
            Self::Internal(_) | Self::Database(_) => SERVER_ERROR_MSG.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, msg(self.client_message())).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Validation("Invalid credentials".to_string()),
            AuthError::UserAlreadyExists => Self::Conflict("User already exists".to_string()),
            AuthError::WeakPassword(m) => Self::Validation(m),
            AuthError::InvalidEmail(_) => {
                Self::Validation("Please enter a valid email address.".to_string())
            }
            AuthError::MissingToken => {
                Self::Unauthorized("No token, authorization denied".to_string())
            }
            AuthError::InvalidToken(_) => Self::Unauthorized("Token is not valid".to_string()),
            AuthError::Repository(e) => Self::Database(e),
            e @ (AuthError::TokenSigning(_) | AuthError::PasswordHash) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

impl From<ImageStoreError> for AppError {
    fn from(err: ImageStoreError) -> Self {
        match err {
            ImageStoreError::UnsupportedType | ImageStoreError::TooLarge => {
                Self::Validation(err.to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// `Json` extractor whose rejections use the `{ "msg": ... }` error body.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the authenticated caller.
pub fn set_sentry_user(user_id: &impl ToString, role: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            other: std::iter::once(("role".to_string(), role.into())).collect(),
            ..Default::default()
        }));
    });
}
