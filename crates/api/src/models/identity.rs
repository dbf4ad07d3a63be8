//! Identity domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use keik_core::{Email, IdentityId, Role};

/// An account in one of the three role partitions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: IdentityId,
    pub role: Role,
    pub name: String,
    pub email: Email,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Display fields of the counterpart identity joined onto orders and products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Party {
    pub id: IdentityId,
    pub name: String,
    pub email: String,
}
