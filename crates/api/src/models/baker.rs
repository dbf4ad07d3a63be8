//! Baker profile domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keik_core::{PortfolioEntryId, Subscription};

use super::Identity;

/// A baker identity together with its profile attributes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Baker {
    #[serde(flatten)]
    pub identity: Identity,
    pub bank_details: Option<String>,
    pub address_proofs: Option<String>,
    pub past_orders: Vec<PastOrder>,
    pub past_works: Vec<PortfolioEntry>,
    pub subscription_expiry: Option<DateTime<Utc>>,
}

impl Baker {
    /// Subscription state derived from the stored expiry.
    #[must_use]
    pub const fn subscription(&self) -> Subscription {
        Subscription::new(self.subscription_expiry)
    }
}

/// A self-reported past order shown on the baker's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PastOrder {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "Utc::now")]
    pub date: DateTime<Utc>,
}

/// An uploaded image of past work.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioEntry {
    pub id: PortfolioEntryId,
    pub image_url: String,
    pub description: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Fields a baker may change on their own profile. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub bank_details: Option<String>,
    pub address_proofs: Option<String>,
    pub past_orders: Option<Vec<PastOrder>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_past_order_date_defaults_to_now() {
        let before = Utc::now();
        let entry: PastOrder =
            serde_json::from_str(r#"{"image":"https://img/1.png","description":"tiered"}"#)
                .unwrap();
        assert!(entry.date >= before);
        assert_eq!(entry.description.as_deref(), Some("tiered"));
    }

    #[test]
    fn test_profile_update_absent_fields_are_none() {
        let update: ProfileUpdate = serde_json::from_str(r#"{"bankDetails":"IBAN 1"}"#).unwrap();
        assert_eq!(update.bank_details.as_deref(), Some("IBAN 1"));
        assert!(update.address_proofs.is_none());
        assert!(update.past_orders.is_none());
    }
}
