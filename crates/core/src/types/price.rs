//! Type-safe price representation using decimal arithmetic.
//!
//! Amounts are stored as `NUMERIC(12, 2)`: at most two decimal places and
//! strictly below [`Price::LIMIT`]. Anything outside that range is rejected
//! here rather than rounded or overflowed by the database.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is zero or negative.
    #[error("Price must be greater than zero")]
    NotPositive,

    /// The amount has more than [`Price::SCALE`] decimal places.
    #[error("Price must have at most 2 decimal places")]
    TooPrecise,

    /// The amount is not below [`Price::LIMIT`].
    #[error("Price must be less than 10000000000")]
    TooLarge,
}

/// A strictly positive amount in the marketplace currency.
///
/// Serializes as a JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Decimal places kept by the store.
    pub const SCALE: u32 = 2;

    /// Exclusive upper bound of any stored amount, prices and order totals alike.
    pub const LIMIT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

    /// Create a price, rejecting amounts the store cannot hold exactly.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::NotPositive` if `amount <= 0`,
    /// `PriceError::TooPrecise` for more than two decimal places, and
    /// `PriceError::TooLarge` if `amount >= Price::LIMIT`.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount <= Decimal::ZERO {
            return Err(PriceError::NotPositive);
        }
        if amount.normalize().scale() > Self::SCALE {
            return Err(PriceError::TooPrecise);
        }
        if amount >= Self::LIMIT {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(amount))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price multiplied by a quantity, or `None` on overflow.
    #[must_use]
    pub fn times(&self, quantity: i32) -> Option<Decimal> {
        self.0.checked_mul(Decimal::from(quantity))
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_and_negative() {
        assert_eq!(Price::new(Decimal::ZERO), Err(PriceError::NotPositive));
        assert_eq!(Price::new(Decimal::new(-100, 2)), Err(PriceError::NotPositive));
    }

    #[test]
    fn test_limit_is_ten_billion() {
        assert_eq!(Price::LIMIT, Decimal::new(10_000_000_000, 0));
    }

    #[test]
    fn test_rejects_amounts_the_store_cannot_hold() {
        assert_eq!(Price::new(Decimal::new(1005, 3)), Err(PriceError::TooPrecise));
        assert_eq!(
            Price::new(Decimal::new(100_000_000_000, 0)),
            Err(PriceError::TooLarge)
        );
        assert_eq!(Price::new(Price::LIMIT), Err(PriceError::TooLarge));
        assert!(Price::new(Decimal::new(999_999_999_999, 2)).is_ok());
        // Trailing zeros do not count as precision.
        assert!(Price::new(Decimal::new(18_500, 3)).is_ok());
    }

    #[test]
    fn test_times_quantity() {
        let price = Price::new(Decimal::new(1250, 2)).unwrap();
        assert_eq!(price.times(3), Some(Decimal::new(3750, 2)));
    }

    #[test]
    fn test_deserialize_number() {
        let price: Price = serde_json::from_str("24.5").unwrap();
        assert_eq!(price.amount(), Decimal::new(245, 1));
        assert!(serde_json::from_str::<Price>("0").is_err());
    }

    #[test]
    fn test_display_two_places() {
        let price = Price::new(Decimal::new(5, 0)).unwrap();
        assert_eq!(price.to_string(), "5.00");
    }
}
