//! Admin account management.
//!
//! # Usage
//!
//! ```bash
//! KEIK_ADMIN_PASSWORD='...' keik admin create -n "Admin Name" -e admin@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `KEIK_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `KEIK_ADMIN_PASSWORD` - Password for the new account
//!
//! The password is read from the environment so it never lands in shell history.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use keik_api::db;
use keik_api::services::AuthService;
use keik_api::services::auth::AuthError;
use keik_core::{IdentityId, Role};

const PASSWORD_VAR: &str = "KEIK_ADMIN_PASSWORD";

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// An admin with this email already exists.
    #[error("Admin already exists with email: {0}")]
    UserExists(String),

    /// Registration rejected the input.
    #[error("{0}")]
    Registration(AuthError),
}

/// Create an admin account.
///
/// # Errors
///
/// Returns an error if configuration is missing, the email or password is
/// rejected, or an admin with this email already exists.
pub async fn create(name: &str, email: &str) -> Result<IdentityId, AdminError> {
    let database_url =
        super::database_url().ok_or(AdminError::MissingEnvVar(super::DATABASE_URL_VAR))?;
    let password = std::env::var(PASSWORD_VAR)
        .ok()
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
        .ok_or(AdminError::MissingEnvVar(PASSWORD_VAR))?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Creating admin: {}", email);

    let identity = AuthService::new(&pool)
        .register(name, email, password.expose_secret(), Role::Admin)
        .await
        .map_err(|e| match e {
            AuthError::UserAlreadyExists => AdminError::UserExists(email.to_owned()),
            other => AdminError::Registration(other),
        })?;

    tracing::info!(
        "Admin created successfully! ID: {}, Email: {}",
        identity.id,
        identity.email
    );

    Ok(identity.id)
}
