//! Baker subscription arithmetic.
//!
//! A baker is visible to customers, and can receive baker-targeted orders,
//! only while their subscription expiry lies in the future. Each simulated
//! payment buys one calendar month.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

/// A baker's subscription state, as stored on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subscription {
    expiry: Option<DateTime<Utc>>,
}

impl Subscription {
    /// Length of one paid period.
    pub const PERIOD: Months = Months::new(1);

    /// Wrap a stored expiry timestamp (`None` = never subscribed).
    #[must_use]
    pub const fn new(expiry: Option<DateTime<Utc>>) -> Self {
        Self { expiry }
    }

    /// The stored expiry, if any.
    #[must_use]
    pub const fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry
    }

    /// Whether the baker is listed for customers at `now`.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_some_and(|expiry| expiry > now)
    }

    /// Whether the subscription ran out before `now`.
    ///
    /// A baker who never subscribed has not expired: only a recorded expiry
    /// in the past blocks new orders.
    #[must_use]
    pub fn has_lapsed_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_some_and(|expiry| expiry < now)
    }

    /// Apply one paid period.
    ///
    /// The new period starts at the current expiry while that is still in
    /// the future, so early renewals compound; otherwise it starts at `now`.
    #[must_use]
    pub fn extended_at(&self, now: DateTime<Utc>) -> Self {
        let base = match self.expiry {
            Some(expiry) if expiry > now => expiry,
            _ => now,
        };
        let expiry = base
            .checked_add_months(Self::PERIOD)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            expiry: Some(expiry),
        }
    }
}
