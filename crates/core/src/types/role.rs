//! Identity roles.
//!
//! Every account belongs to exactly one role partition. The wire names
//! (`admin`, `homebaker`, `user`) are the ones the web client sends on
//! registration and login and the ones embedded in session tokens.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown role name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct RoleError(pub String);

/// The role an identity acts under.
///
/// Email addresses are unique within a role, not across roles, so the same
/// person may hold a customer account and a baker account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "identity_role", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Marketplace operator with full access.
    Admin,
    /// Independent home baker selling through the marketplace.
    #[serde(rename = "homebaker")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "homebaker"))]
    Baker,
    /// Customer placing orders.
    #[serde(rename = "user")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "user"))]
    Customer,
}

impl Role {
    /// All roles, in partition order.
    pub const ALL: [Self; 3] = [Self::Admin, Self::Baker, Self::Customer];

    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Baker => "homebaker",
            Self::Customer => "user",
        }
    }

    /// Human-readable label used in response messages.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Baker => "Homebaker",
            Self::Customer => "User",
        }
    }

    /// Resolve the role named at registration.
    ///
    /// Anything other than `admin` or `homebaker` (including no role at all)
    /// registers a customer account.
    #[must_use]
    pub fn from_registration(role: Option<&str>) -> Self {
        role.and_then(|r| r.parse().ok()).unwrap_or(Self::Customer)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "homebaker" => Ok(Self::Baker),
            "user" => Ok(Self::Customer),
            _ => Err(RoleError(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Baker).unwrap(), "\"homebaker\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"user\"").unwrap(),
            Role::Customer
        );
    }

    #[test]
    fn test_registration_falls_back_to_customer() {
        assert_eq!(Role::from_registration(Some("admin")), Role::Admin);
        assert_eq!(Role::from_registration(Some("homebaker")), Role::Baker);
        assert_eq!(Role::from_registration(Some("superuser")), Role::Customer);
        assert_eq!(Role::from_registration(None), Role::Customer);
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        assert_eq!(
            "baker".parse::<Role>().unwrap_err(),
            RoleError("baker".to_string())
        );
    }
}
