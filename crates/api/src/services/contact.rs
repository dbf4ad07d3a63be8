//! Contact form intake.

use serde::Deserialize;
use sqlx::PgPool;

use keik_core::Email;

use crate::db::ContactRepository;
use crate::error::AppError;
use crate::models::{ContactMessage, NewContactMessage};
use crate::services::email::EmailService;

/// Body of `POST /api/contact`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl ContactInput {
    /// Check that every field is filled and the email is well formed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` with the message shown to the visitor.
    pub fn validate(self) -> Result<NewContactMessage, AppError> {
        let name = self.name.trim();
        let email = self.email.trim();
        let subject = self.subject.trim();
        let message = self.message.trim();

        if [name, email, subject, message].iter().any(|f| f.is_empty()) {
            return Err(AppError::Validation("Please fill in all fields.".to_string()));
        }
        let email = Email::parse(email).map_err(|_| {
            AppError::Validation("Please enter a valid email address.".to_string())
        })?;

        Ok(NewContactMessage {
            name: name.to_string(),
            email,
            subject: subject.to_string(),
            message: message.to_string(),
        })
    }
}

/// Persists submissions and forwards them by email when configured.
pub struct ContactService<'a> {
    messages: ContactRepository<'a>,
    email: Option<&'a EmailService>,
}

impl<'a> ContactService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, email: Option<&'a EmailService>) -> Self {
        Self {
            messages: ContactRepository::new(pool),
            email,
        }
    }

    /// Validate and store a submission, then notify in the background.
    ///
    /// The notification outcome never affects the result.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for bad input, `AppError::Database` if
    /// the insert fails.
    pub async fn submit(&self, input: ContactInput) -> Result<ContactMessage, AppError> {
        let new = input.validate()?;
        let saved = self.messages.create(&new).await?;
        tracing::info!(contact_id = %saved.id, "Contact message stored");

        match self.email {
            Some(email) => email.notify_contact(&saved),
            None => tracing::debug!(contact_id = %saved.id, "Email not configured, skipping notification"),
        }
        Ok(saved)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(name: &str, email: &str, subject: &str, message: &str) -> ContactInput {
        ContactInput {
            name: name.into(),
            email: email.into(),
            subject: subject.into(),
            message: message.into(),
        }
    }

    #[test]
    fn test_valid_submission() {
        let msg = input(" Ada ", "ada@keik.test", "Hi", "Hello").validate().unwrap();
        assert_eq!(msg.name, "Ada");
        assert_eq!(msg.email.as_str(), "ada@keik.test");
    }

    #[test]
    fn test_missing_field() {
        let err = input("Ada", "ada@keik.test", "  ", "Hello").validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "Please fill in all fields."));
    }

    #[test]
    fn test_bad_email() {
        let err = input("A", "bad-email", "s", "m").validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "Please enter a valid email address."));
    }

    #[test]
    fn test_missing_keys_count_as_empty() {
        let parsed: ContactInput = serde_json::from_str(r#"{"name":"A"}"#).unwrap();
        assert!(parsed.validate().is_err());
    }
}
