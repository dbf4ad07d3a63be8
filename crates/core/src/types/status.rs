//! Order lifecycle status.
//!
//! ```text
//! Pending ──> InProgress ──> Completed
//!    │            │
//!    └────────────┴────────> Cancelled
//! ```
//!
//! `Completed` and `Cancelled` are terminal. The graph is advisory: status
//! updates are validated against the role's allowed set, not against the
//! current status (see [`OrderStatus::allows_transition_to`]).

use serde::{Deserialize, Serialize};

/// Error returned when a status string is not part of the enumeration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid order status: {0}")]
pub struct OrderStatusError(pub String);

/// Order status.
///
/// Serialized with the display names the web client renders
/// (`"Pending"`, `"In Progress"`, `"Completed"`, `"Cancelled"`).
/// `"Processing"` is accepted on input as a synonym for `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
pub enum OrderStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress", alias = "Processing")]
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Statuses a baker may set on an order assigned to them.
    pub const BAKER_SETTABLE: [Self; 3] = [Self::InProgress, Self::Completed, Self::Cancelled];

    /// Display name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Whether moving from `self` to `next` follows the lifecycle graph.
    ///
    /// Setting the current status again is always allowed.
    #[must_use]
    pub const fn allows_transition_to(&self, next: Self) -> bool {
        match (self, next) {
            (Self::Pending, Self::Pending | Self::InProgress | Self::Cancelled)
            | (Self::InProgress, Self::InProgress | Self::Completed | Self::Cancelled)
            | (Self::Completed, Self::Completed)
            | (Self::Cancelled, Self::Cancelled) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "In Progress" | "Processing" => Ok(Self::InProgress),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            _ => Err(OrderStatusError(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display_names() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_processing_is_in_progress() {
        assert_eq!(
            "Processing".parse::<OrderStatus>().unwrap(),
            OrderStatus::InProgress
        );
        assert_eq!(
            serde_json::from_str::<OrderStatus>("\"Processing\"").unwrap(),
            OrderStatus::InProgress
        );
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("pending".parse::<OrderStatus>().is_err());
        assert!("Shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serializes_display_name() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
    }

    #[test]
    fn test_default_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_transition_graph() {
        use OrderStatus::{Cancelled, Completed, InProgress, Pending};

        assert!(Pending.allows_transition_to(InProgress));
        assert!(Pending.allows_transition_to(Cancelled));
        assert!(!Pending.allows_transition_to(Completed));
        assert!(InProgress.allows_transition_to(Completed));
        assert!(!Completed.allows_transition_to(Pending));
        assert!(!Cancelled.allows_transition_to(InProgress));
    }

    #[test]
    fn test_baker_cannot_reset_to_pending() {
        assert!(!OrderStatus::BAKER_SETTABLE.contains(&OrderStatus::Pending));
    }
}
