//! Currency identifiers and validated exchange rates.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decimal::{parse_decimal, reciprocal};
use crate::error::InvalidValue;
use crate::factor::Factor;

/// Currency identifier.
///
/// Opaque and case-sensitive: `"btc"` and `"BTC"` are different currencies.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from its identifier.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Currency {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A directed currency pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Base currency (1 unit of it is priced).
    pub base: Currency,
    /// Quote currency (the unit of the price).
    pub quote: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(base: impl Into<Currency>, quote: impl Into<Currency>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }

    /// Whether base and quote are the same currency.
    pub fn is_identity(&self) -> bool {
        self.base == self.quote
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// A published exchange rate: 1 unit of base is worth `value` units of quote.
///
/// Always strictly positive with a representable reciprocal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    value: Decimal,
    inverse: Decimal,
    factor: Factor,
}

impl Rate {
    /// Validate a decoded rate.
    pub fn new(value: Decimal) -> Result<Self, InvalidValue> {
        if value <= Decimal::ZERO {
            return Err(InvalidValue::NotPositive(value));
        }

        let inverse = reciprocal(value).ok_or(InvalidValue::NotInvertible(value))?;
        if inverse.is_zero() {
            return Err(InvalidValue::NotInvertible(value));
        }

        let factor = Factor::from_decimal(value).ok_or(InvalidValue::NotPositive(value))?;

        Ok(Self {
            value,
            inverse,
            factor,
        })
    }

    /// Decode and validate a rate from its external representation.
    pub fn parse(input: &str) -> Result<Self, InvalidValue> {
        Self::new(parse_decimal(input)?)
    }

    /// The rate as published.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// The rate of the reverse direction.
    pub fn reciprocal(&self) -> Decimal {
        self.inverse
    }

    /// The rate as a path factor.
    pub fn factor(&self) -> Factor {
        self.factor
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_is_case_sensitive() {
        assert_ne!(Currency::new("btc"), Currency::new("BTC"));
        assert_eq!(Currency::from("BTC").as_str(), "BTC");
    }

    #[test]
    fn test_currency_serializes_as_string() {
        let json = serde_json::to_string(&Currency::new("EUR")).unwrap();
        assert_eq!(json, "\"EUR\"");
    }

    #[test]
    fn test_pair_display() {
        let pair = CurrencyPair::new("BTC", "EUR");
        assert_eq!(pair.to_string(), "BTC/EUR");
        assert!(!pair.is_identity());
        assert!(CurrencyPair::new("EUR", "EUR").is_identity());
    }

    #[test]
    fn test_rate_validation() {
        let rate = Rate::parse("50000.0000").unwrap();
        assert_eq!(rate.value(), dec!(50000));
        assert_eq!(rate.reciprocal(), dec!(0.00002));
        assert_eq!(rate.factor().recip().to_decimal(), Some(dec!(0.00002)));

        assert!(matches!(Rate::new(Decimal::ZERO), Err(InvalidValue::NotPositive(_))));
        assert!(matches!(Rate::new(dec!(-1.5)), Err(InvalidValue::NotPositive(_))));
        assert!(matches!(Rate::parse("1,5"), Err(InvalidValue::Malformed(_))));
    }

    #[test]
    fn test_rate_equality_is_numeric() {
        assert_eq!(Rate::parse("1.5").unwrap().value(), Rate::parse("1.5000").unwrap().value());
    }
}
