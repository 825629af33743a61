//! Non-negative item price using decimal arithmetic.
//!
//! Prices are stored in the shop's single currency, so no currency code is
//! carried alongside the amount.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when constructing a [`Price`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price must not be negative")]
    Negative,

    /// The amount has more than [`Price::SCALE`] fractional digits.
    #[error("price must have at most {} decimal places", Price::SCALE)]
    TooPrecise,

    /// The amount exceeds [`Price::MAX`].
    #[error("price must not exceed {}", Price::MAX)]
    TooLarge,

    /// The input is not a decimal number.
    #[error("price is not a number: {0}")]
    Invalid(String),
}

/// An item price. Always `>= 0`, at most [`Price::MAX`], with at most
/// [`Price::SCALE`] fractional digits so it fits `NUMERIC(12, 2)` exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest storable amount, 9999999999.99.
    pub const MAX: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

    /// Maximum number of fractional digits.
    pub const SCALE: u32 = 2;

    /// Create a price, rejecting amounts the price column cannot hold
    /// exactly.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount` is below zero,
    /// `PriceError::TooLarge` above [`Price::MAX`] and
    /// `PriceError::TooPrecise` with more than two significant decimals.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount > Self::MAX {
            return Err(PriceError::TooLarge);
        }
        // Trailing zeros don't count: "1.500" is still 1.50
        if amount.normalize().scale() > Self::SCALE {
            return Err(PriceError::TooPrecise);
        }
        Ok(Self(amount))
    }

    /// Create a price from a whole number of currency units.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `units` is below zero.
    pub fn from_units(units: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::from(units))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|e| PriceError::Invalid(e.to_string()))?;
        Self::new(amount)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
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
    fn test_zero_is_allowed() {
        assert_eq!(Price::from_units(0).unwrap(), Price::ZERO);
    }

    #[test]
    fn test_negative_is_rejected() {
        assert_eq!(Price::from_units(-1), Err(PriceError::Negative));
    }

    #[test]
    fn test_parse_decimal_string() {
        let price: Price = "200000".parse().unwrap();
        assert_eq!(price.amount(), Decimal::from(200_000));

        let price: Price = " 19.99 ".parse().unwrap();
        assert_eq!(price.to_string(), "19.99");
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(matches!("abc".parse::<Price>(), Err(PriceError::Invalid(_))));
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        // Decimals travel as strings on the wire
        let price: Price = serde_json::from_str("\"1500\"").unwrap();
        assert_eq!(price, Price::from_units(1500).unwrap());

        let result: Result<Price, _> = serde_json::from_str("\"-5\"");
        assert!(result.is_err());

        let result: Result<Price, _> = serde_json::from_str("\"1.005\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_max_boundary() {
        let max: Price = "9999999999.99".parse().unwrap();
        assert_eq!(max.amount(), Price::MAX);
        assert_eq!(
            "10000000000".parse::<Price>(),
            Err(PriceError::TooLarge)
        );
        assert_eq!(
            "9999999999.991".parse::<Price>(),
            Err(PriceError::TooLarge)
        );
    }

    #[test]
    fn test_scale_boundary() {
        assert_eq!("1.01".parse::<Price>().unwrap().to_string(), "1.01");
        assert!("1.500".parse::<Price>().is_ok());
        assert_eq!("1.005".parse::<Price>(), Err(PriceError::TooPrecise));
    }
}
