//! Decimal policy shared by rate validation and conversion output.
//!
//! Path arithmetic runs on [`Factor`](crate::Factor) without rounding; only
//! comparisons and converted amounts are rounded, to 4 fractional digits
//! half-up.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::InvalidValue;

/// Fractional digits used when deciding whether a path improved.
pub const COMPARISON_SCALE: u32 = 4;

/// Fractional digits of a converted amount.
pub const OUTPUT_SCALE: u32 = 4;

/// `1 / value` at full precision.
///
/// Returns `None` for zero or when the quotient does not fit.
pub fn reciprocal(value: Decimal) -> Option<Decimal> {
    if value.is_zero() {
        return None;
    }
    Decimal::ONE.checked_div(value)
}

/// Round half-up to `scale` digits and pad so exactly `scale` digits are shown.
pub fn round_half_up(value: Decimal, scale: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(scale);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded
}

/// Round a converted amount for output.
pub fn round_output(value: Decimal) -> Decimal {
    round_half_up(value, OUTPUT_SCALE)
}

/// Decode a decimal from its external representation.
///
/// Plain notation is parsed exactly; scientific notation (`1.5e3`) is
/// accepted as well.
pub fn parse_decimal(input: &str) -> Result<Decimal, InvalidValue> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InvalidValue::Malformed(input.to_string()));
    }

    Decimal::from_str_exact(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| InvalidValue::Malformed(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn assert_inverse(value: Decimal) {
        let inverse = reciprocal(value).unwrap();
        let error = (inverse * value - Decimal::ONE).abs();
        assert!(error < dec!(0.00000000000000000001), "{value}: {inverse}");
    }

    #[test]
    fn test_reciprocal() {
        assert_eq!(reciprocal(dec!(50000.0000)).unwrap(), dec!(0.00002));
        assert_eq!(reciprocal(dec!(0.04)).unwrap(), dec!(25));
        assert_inverse(dec!(1.2));
        assert_inverse(dec!(3));
        assert_inverse(dec!(152.14));
        assert!(reciprocal(Decimal::ZERO).is_none());
    }

    #[test]
    fn test_round_output() {
        assert_eq!(round_output(dec!(0.00018)).to_string(), "0.0002");
        assert_eq!(round_output(dec!(0.000018)).to_string(), "0.0000");
        assert_eq!(round_output(dec!(1)).to_string(), "1.0000");
        assert_eq!(round_output(dec!(0.99995)).to_string(), "1.0000");
        assert_eq!(round_output(dec!(-0.00001)).to_string(), "0.0000");
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("50000.0000").unwrap(), dec!(50000.0000));
        assert_eq!(parse_decimal(" 1.5 ").unwrap(), dec!(1.5));
        assert_eq!(parse_decimal("1.5e3").unwrap(), dec!(1500));
        assert!(matches!(parse_decimal("abc"), Err(InvalidValue::Malformed(_))));
        assert!(matches!(parse_decimal(""), Err(InvalidValue::Malformed(_))));
    }
}
