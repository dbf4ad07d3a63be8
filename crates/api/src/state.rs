//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::auth::TokenIssuer;
use crate::services::email::EmailService;
use crate::services::images::{ImageStore, ImageStoreError};

/// Error building the application state from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("email service: {0}")]
    Email(#[from] lettre::transport::smtp::Error),
    #[error("image store: {0}")]
    Images(#[from] ImageStoreError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    tokens: TokenIssuer,
    email: Option<EmailService>,
    images: Option<ImageStore>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Optional integrations (SMTP, image hosting) are built only when
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured integration cannot be initialised.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, StateError> {
        let tokens = TokenIssuer::new(&config.jwt_secret);
        let email = config.email.as_ref().map(EmailService::new).transpose()?;
        let images = config.images.as_ref().map(ImageStore::new).transpose()?;

        if email.is_none() {
            tracing::warn!("SMTP not configured; contact notifications are disabled");
        }
        if images.is_none() {
            tracing::warn!("Image hosting not configured; portfolio uploads will fail");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                email,
                images,
            }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the session token issuer.
    #[must_use]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.inner.tokens
    }

    /// Get the email service, if SMTP is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    /// Get the image store, if image hosting is configured.
    #[must_use]
    pub fn images(&self) -> Option<&ImageStore> {
        self.inner.images.as_ref()
    }
}
