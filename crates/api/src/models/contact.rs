//! Contact form messages.

use chrono::{DateTime, Utc};
use serde::Serialize;

use keik_core::{ContactMessageId, Email};

/// A persisted contact form submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: ContactMessageId,
    pub name: String,
    pub email: Email,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// A validated submission, ready to persist.
#[derive(Debug, Clone)]
pub struct NewContactMessage {
    pub name: String,
    pub email: Email,
    pub subject: String,
    pub message: String,
}
