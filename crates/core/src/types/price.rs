//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are carried for display only; the cart performs no totals, tax or
//! currency logic. They serialize as JSON numbers so carts written by older
//! clients (`"price": 9.99`) keep loading. The number is written with the
//! exact decimal digits, never through `f64`, so every price survives a
//! save and reload unchanged.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A unit price in the store's currency.
///
/// ## Examples
///
/// ```
/// use go_marketplace_core::Price;
/// use rust_decimal::Decimal;
///
/// let price = Price::new(Decimal::new(999, 2)).unwrap();
/// assert_eq!(price.to_string(), "9.99");
///
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::arbitrary_precision")] Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the price satisfies the constructor rules.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.0.is_sign_negative() || self.0.is_zero()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Price {
    type Err = PriceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = s.trim().parse::<Decimal>()?;
        Ok(Self::new(amount)?)
    }
}

/// Errors that can occur when parsing a [`Price`] from text.
#[derive(thiserror::Error, Debug)]
pub enum PriceParseError {
    /// The input is not a decimal number.
    #[error("invalid price: {0}")]
    Decimal(#[from] rust_decimal::Error),
    /// The number is not a valid price.
    #[error(transparent)]
    Price(#[from] PriceError),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_negative() {
        assert!(matches!(
            Price::new(Decimal::new(-5, 1)),
            Err(PriceError::Negative(_))
        ));
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_serializes_as_number() {
        let price = Price::new(Decimal::new(999, 2)).unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "9.99");
    }

    #[test]
    fn test_deserializes_float_and_integer() {
        let price: Price = serde_json::from_str("9.99").unwrap();
        assert_eq!(price.amount(), Decimal::new(999, 2));

        let price: Price = serde_json::from_str("12").unwrap();
        assert_eq!(price.amount(), Decimal::new(12, 0));
    }

    #[test]
    fn test_keeps_digits_beyond_f64() {
        for raw in ["0.123456789012345678", "12345678901234567890", "19.90"] {
            let price: Price = raw.parse().unwrap();
            let json = serde_json::to_string(&price).unwrap();
            assert_eq!(json, raw);

            let parsed: Price = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, price);
            assert_eq!(parsed.to_string(), raw);
        }
    }

    #[test]
    fn test_deserialized_negative_is_invalid() {
        let price: Price = serde_json::from_str("-1.5").unwrap();
        assert!(!price.is_valid());
    }

    #[test]
    fn test_from_str() {
        let price: Price = "19.90".parse().unwrap();
        assert_eq!(price.amount(), Decimal::new(1990, 2));
        assert!("abc".parse::<Price>().is_err());
        assert!("-2".parse::<Price>().is_err());
    }
}
