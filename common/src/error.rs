//! Error types for RateMesh value validation.

use rust_decimal::Decimal;
use thiserror::Error;

/// A numeric value that cannot be used as a rate or amount.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidValue {
    /// The external representation is not a decimal number.
    #[error("Malformed decimal value: {0:?}")]
    Malformed(String),

    /// Rates must be strictly positive.
    #[error("Rate must be positive, got {0}")]
    NotPositive(Decimal),

    /// The reciprocal of the value is not representable.
    #[error("Rate {0} cannot be inverted")]
    NotInvertible(Decimal),
}

impl InvalidValue {
    /// Get error code for boundary messages.
    pub fn error_code(&self) -> &'static str {
        match self {
            InvalidValue::Malformed(_) => "MALFORMED_DECIMAL",
            InvalidValue::NotPositive(_) => "NON_POSITIVE_RATE",
            InvalidValue::NotInvertible(_) => "NON_INVERTIBLE_RATE",
        }
    }
}
