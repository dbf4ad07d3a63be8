//! Validated email address.
//!
//! The check is shallow: `local@domain.tld`, no whitespace, a single `@`.
//! Case is preserved as entered, so lookups match the address exactly as it
//! was registered.

use core::fmt;

use serde::Serialize;

/// Why a string is not an acceptable [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {} characters", Email::MAX_LENGTH)]
    TooLong,
    #[error("email must look like name@domain.tld")]
    Malformed,
}

/// An email address that passed [`Email::parse`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// Validate an address.
    ///
    /// ```
    /// use keik_core::Email;
    ///
    /// assert!(Email::parse("ada+cakes@kitchen.co.uk").is_ok());
    /// assert!(Email::parse("bad-email").is_err());
    /// assert!(Email::parse("ada@localhost").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Empty`, `EmailError::TooLong`, or
    /// `EmailError::Malformed` when the shape is wrong.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::Malformed);
        }

        let Some((local, domain)) = s.split_once('@') else {
            return Err(EmailError::Malformed);
        };
        let dotted = domain
            .split_once('.')
            .is_some_and(|(host, _)| !host.is_empty())
            && !domain.ends_with('.');
        if local.is_empty() || domain.contains('@') || !dotted {
            return Err(EmailError::Malformed);
        }

        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Email {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Email {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_shapes() {
        for ok in [
            "ada@keik.test",
            "ada.lovelace+orders@kitchen.co.uk",
            "a@b.c",
        ] {
            assert!(Email::parse(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        for bad in [
            "bad-email",
            "@keik.test",
            "ada@",
            "ada@localhost",
            "ada@keik.",
            "ada@.test",
            "a@b@keik.test",
            "ada lovelace@keik.test",
        ] {
            assert_eq!(Email::parse(bad), Err(EmailError::Malformed), "{bad}");
        }
    }

    #[test]
    fn test_length_limit() {
        let long = format!("{}@keik.test", "a".repeat(250));
        assert_eq!(Email::parse(&long), Err(EmailError::TooLong));
    }

    #[test]
    fn test_case_is_preserved() {
        let email = Email::parse("Ada@Keik.Test").unwrap();
        assert_eq!(email.as_str(), "Ada@Keik.Test");
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"Ada@Keik.Test\"");
    }
}
