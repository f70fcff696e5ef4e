//! FX service error types.

use ratemesh_common::{Currency, InvalidValue};
use ratemesh_graph::GraphError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in the FX service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FxError {
    /// Currency never published as part of any rate.
    #[error("Currency {0} was not found")]
    CurrencyNotFound(Currency),

    /// Both currencies are known but no chain of rates connects them.
    #[error("Rate {from}-{to} was not found")]
    RateNotFound { from: Currency, to: Currency },

    /// Malformed or out-of-range input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The converted amount does not fit in a decimal.
    #[error("Conversion of {amount} {from} to {to} overflowed")]
    ArithmeticOverflow {
        from: Currency,
        to: Currency,
        amount: Decimal,
    },
}

impl FxError {
    /// Whether the error means a currency or rate is unknown.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FxError::CurrencyNotFound(_) | FxError::RateNotFound { .. }
        )
    }

    /// Get error code for boundary messages.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::CurrencyNotFound(_) => "CURRENCY_NOT_FOUND",
            FxError::RateNotFound { .. } => "RATE_NOT_FOUND",
            FxError::InvalidInput(_) => "INVALID_INPUT",
            FxError::ArithmeticOverflow { .. } => "ARITHMETIC_OVERFLOW",
        }
    }
}

impl From<GraphError> for FxError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::VertexNotFound(currency) => FxError::CurrencyNotFound(currency),
            GraphError::PathNotFound { from, to } => FxError::RateNotFound { from, to },
        }
    }
}

impl From<InvalidValue> for FxError {
    fn from(err: InvalidValue) -> Self {
        FxError::InvalidInput(err.to_string())
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_errors_are_relabelled() {
        let missing = FxError::from(GraphError::VertexNotFound(Currency::new("test")));
        assert_eq!(missing, FxError::CurrencyNotFound(Currency::new("test")));
        assert_eq!(missing.to_string(), "Currency test was not found");

        let no_path = FxError::from(GraphError::PathNotFound {
            from: Currency::new("JPY"),
            to: Currency::new("BTC"),
        });
        assert_eq!(no_path.to_string(), "Rate JPY-BTC was not found");
        assert!(no_path.is_not_found());
        assert_eq!(no_path.error_code(), "RATE_NOT_FOUND");
    }

    #[test]
    fn test_invalid_value_is_invalid_input() {
        let err = FxError::from(InvalidValue::Malformed("abc".to_string()));
        assert!(matches!(err, FxError::InvalidInput(_)));
        assert!(!err.is_not_found());
    }
}
