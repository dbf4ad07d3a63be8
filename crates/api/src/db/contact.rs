//! Contact message repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use keik_core::{ContactMessageId, Email};

use super::RepositoryError;
use crate::models::{ContactMessage, NewContactMessage};

#[derive(Debug, sqlx::FromRow)]
struct ContactMessageRow {
    id: i32,
    name: String,
    email: String,
    subject: String,
    body: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ContactMessageRow> for ContactMessage {
    type Error = RepositoryError;

    fn try_from(row: ContactMessageRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: ContactMessageId::new(row.id),
            name: row.name,
            email,
            subject: row.subject,
            message: row.body,
            created_at: row.created_at,
        })
    }
}

/// Repository for contact form submissions.
pub struct ContactRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactRepository<'a> {
    /// Create a new contact repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a submission.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, msg: &NewContactMessage) -> Result<ContactMessage, RepositoryError> {
        let row = sqlx::query_as::<_, ContactMessageRow>(
            "INSERT INTO contact_message (name, email, subject, body) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, name, email, subject, body, created_at",
        )
        .bind(&msg.name)
        .bind(&msg.email)
        .bind(&msg.subject)
        .bind(&msg.message)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }
}
