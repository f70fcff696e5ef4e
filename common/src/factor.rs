//! Conversion factors with an unbounded decimal exponent.
//!
//! A path can chain any number of rates, so its factor can leave the range
//! of a plain `Decimal` in either direction. `Factor` keeps the significant
//! digits in a `Decimal` mantissa normalised to `[1, 10)` and the magnitude
//! in a separate power of ten. Products and reciprocals therefore keep
//! about 28 significant digits at any magnitude and never overflow.

use std::cmp::Ordering;
use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::decimal::COMPARISON_SCALE;

/// Largest scale a `Decimal` can carry.
const MAX_SCALE: u32 = 28;

/// A strictly positive conversion factor: `mantissa * 10^exponent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Factor {
    /// Significant digits, `1 <= mantissa < 10`.
    mantissa: Decimal,
    exponent: i64,
}

impl Factor {
    /// The factor of a path from a currency to itself.
    pub const ONE: Factor = Factor {
        mantissa: Decimal::ONE,
        exponent: 0,
    };

    /// Factor of a positive decimal. `None` for zero or negative values.
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        if value <= Decimal::ZERO {
            return None;
        }
        Some(Self::normalized(value, 0))
    }

    fn normalized(mut mantissa: Decimal, mut exponent: i64) -> Self {
        // a value >= 10 never carries the full 28 fractional digits, so
        // each division by ten is exact
        while mantissa >= Decimal::TEN {
            mantissa /= Decimal::TEN;
            exponent += 1;
        }
        while mantissa < Decimal::ONE {
            mantissa *= Decimal::TEN;
            exponent -= 1;
        }
        Self {
            mantissa: mantissa.normalize(),
            exponent,
        }
    }

    /// Factor of a path followed by `next`.
    pub fn compose(self, next: Factor) -> Self {
        // both mantissas are below 10, so the product stays below 100
        Self::normalized(self.mantissa * next.mantissa, self.exponent + next.exponent)
    }

    /// Factor of the reverse direction, `1 / self`.
    pub fn recip(self) -> Self {
        // 10 / m lands in (1, 10] and keeps one more digit than 1 / m
        Self::normalized(Decimal::TEN / self.mantissa, -self.exponent - 1)
    }

    /// Whether `self` beats `current` once the difference is rounded
    /// half-up to [`COMPARISON_SCALE`] fractional digits.
    ///
    /// Differences below half a unit of the fourth digit never count, so
    /// republishing an equal rate in another representation is a no-op.
    pub fn exceeds(&self, current: &Factor) -> bool {
        if self <= current {
            return false;
        }

        let half_unit = Factor {
            mantissa: Decimal::new(5, 0),
            exponent: -i64::from(COMPARISON_SCALE) - 1,
        };

        // self > current, so its exponent is at least as large
        let shift = self.exponent - current.exponent;
        let Ok(shift) = u32::try_from(shift) else {
            return *self >= half_unit;
        };
        if shift > MAX_SCALE {
            // current is lost below the significant digits of self
            return *self >= half_unit;
        }

        let difference = self.mantissa - shift_right(current.mantissa, shift);
        if difference <= Decimal::ZERO {
            return false;
        }
        Self::normalized(difference, self.exponent) >= half_unit
    }

    /// The factor as a plain decimal.
    ///
    /// `None` when it exceeds the `Decimal` range. Values below
    /// `10^-28` come out as zero.
    pub fn to_decimal(&self) -> Option<Decimal> {
        if self.exponent >= 0 {
            let mut value = self.mantissa;
            for _ in 0..self.exponent {
                value = value.checked_mul(Decimal::TEN)?;
            }
            return Some(value);
        }

        match u32::try_from(-self.exponent) {
            Ok(shift) if shift <= MAX_SCALE => Some(shift_right(self.mantissa, shift)),
            _ => Some(Decimal::ZERO),
        }
    }

    /// `amount * self` as a plain decimal, without rounding.
    ///
    /// The product is formed before leaving the unbounded representation,
    /// so a tiny factor applied to a large amount keeps its digits. `None`
    /// when the result exceeds the `Decimal` range.
    pub fn apply(&self, amount: Decimal) -> Option<Decimal> {
        let Some(magnitude) = Factor::from_decimal(amount.abs()) else {
            return Some(Decimal::ZERO);
        };

        let mut converted = magnitude.compose(*self).to_decimal()?;
        if amount.is_sign_negative() {
            converted.set_sign_negative(true);
        }
        Some(converted)
    }
}

/// `value / 10^shift`, rounded half-up where the digits do not fit.
fn shift_right(value: Decimal, shift: u32) -> Decimal {
    let keep = MAX_SCALE.saturating_sub(shift);
    let mut shifted = value.round_dp_with_strategy(keep, RoundingStrategy::MidpointAwayFromZero);
    let scale = shifted.scale() + shift;
    if shifted.set_scale(scale).is_err() {
        return Decimal::ZERO;
    }
    shifted
}

impl Ord for Factor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.exponent
            .cmp(&other.exponent)
            .then_with(|| self.mantissa.cmp(&other.mantissa))
    }
}

impl PartialOrd for Factor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plain = (-(MAX_SCALE as i64)..=MAX_SCALE as i64).contains(&self.exponent)
            && i64::from(self.mantissa.scale()) - self.exponent <= i64::from(MAX_SCALE);
        match self.to_decimal() {
            Some(value) if plain => write!(f, "{}", value.normalize()),
            _ => write!(f, "{}e{}", self.mantissa, self.exponent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn factor(value: Decimal) -> Factor {
        Factor::from_decimal(value).unwrap()
    }

    fn assert_close(actual: Factor, expected: Factor) {
        let ratio = actual.compose(expected.recip()).to_decimal().unwrap();
        assert!(
            (ratio - Decimal::ONE).abs() < dec!(0.0000000000000000000001),
            "{actual} vs {expected}"
        );
    }

    #[test]
    fn test_from_decimal() {
        assert_eq!(factor(dec!(50000.0000)).to_decimal().unwrap(), dec!(50000));
        assert_eq!(factor(dec!(0.04)).to_decimal().unwrap(), dec!(0.04));
        assert_eq!(factor(dec!(1)), Factor::ONE);
        assert!(Factor::from_decimal(Decimal::ZERO).is_none());
        assert!(Factor::from_decimal(dec!(-2)).is_none());
    }

    #[test]
    fn test_recip() {
        assert_eq!(factor(dec!(50000)).recip().to_decimal().unwrap(), dec!(0.00002));
        assert_eq!(factor(dec!(0.04)).recip().to_decimal().unwrap(), dec!(25));
        assert_eq!(Factor::ONE.recip(), Factor::ONE);

        for value in [dec!(1.2), dec!(3), dec!(152.14), dec!(0.0000000123456789)] {
            assert_close(factor(value).recip().recip(), factor(value));
            assert_close(factor(value).compose(factor(value).recip()), Factor::ONE);
        }
    }

    #[test]
    fn test_compose() {
        assert_eq!(
            factor(dec!(50000)).compose(factor(dec!(1.5))).to_decimal().unwrap(),
            dec!(75000)
        );
    }

    #[test]
    fn test_compose_beyond_decimal_range() {
        let big = factor(dec!(1000000000000000)).compose(factor(dec!(1000000000000000)));
        assert!(big.to_decimal().is_none());
        assert_eq!(big.to_string(), "1e30");
        assert_eq!(big.recip().to_string(), "1e-30");
        assert!(big > factor(Decimal::MAX));

        // four hops of 1e-8 and back again
        let step = factor(dec!(0.00000001));
        let tiny = step.compose(step).compose(step).compose(step);
        assert_eq!(tiny.to_decimal().unwrap(), Decimal::ZERO);
        assert_eq!(tiny.recip(), factor(dec!(1)).compose(big).compose(factor(dec!(100))));
        assert!(tiny > Factor::ONE.recip().compose(big.recip()).compose(big.recip()));
    }

    #[test]
    fn test_small_factors_keep_significant_digits() {
        let path = factor(dec!(0.0000000123456789)).compose(factor(dec!(0.0000000987654321)));
        let back = path.recip();

        // 1 / (0.0000000123456789 * 0.0000000987654321) = 820125007452886.0053...
        let rounded = crate::round_output(back.to_decimal().unwrap());
        assert_eq!(rounded, dec!(820125007452886.0053));
    }

    #[test]
    fn test_ordering() {
        assert!(factor(dec!(2)) > factor(dec!(1.5)));
        assert!(factor(dec!(10)) > factor(dec!(9.99)));
        assert!(factor(dec!(0.1)) < factor(dec!(0.11)));
        assert_eq!(factor(dec!(1.50)).cmp(&factor(dec!(1.5))), Ordering::Equal);
    }

    #[test]
    fn test_exceeds() {
        assert!(factor(dec!(1.0001)).exceeds(&factor(dec!(1.0000))));
        assert!(factor(dec!(1.00005)).exceeds(&factor(dec!(1.0000))));
        assert!(!factor(dec!(1.00004)).exceeds(&factor(dec!(1.0000))));
        assert!(!factor(dec!(1.0000)).exceeds(&factor(dec!(1.0000))));
        assert!(!factor(dec!(0.9)).exceeds(&factor(dec!(1.0000))));

        // across a change of exponent
        assert!(factor(dec!(10.00005)).exceeds(&factor(dec!(9.99999))));
        assert!(!factor(dec!(10.00002)).exceeds(&factor(dec!(9.99999))));

        // tiny factors never move the fourth digit
        assert!(!factor(dec!(0.00004)).exceeds(&factor(dec!(0.000001))));
        assert!(factor(dec!(0.00006)).exceeds(&factor(dec!(0.000001))));

        let big = factor(dec!(1000000000000000)).compose(factor(dec!(1000000000000000)));
        assert!(big.compose(factor(dec!(1.0000000000000000000000001))).exceeds(&big));
        assert!(big.exceeds(&Factor::ONE));
    }

    #[test]
    fn test_apply() {
        let rate = factor(dec!(60000));
        assert_eq!(rate.apply(dec!(0.000000003)).unwrap(), dec!(0.00018));
        assert_eq!(rate.apply(Decimal::ZERO).unwrap(), Decimal::ZERO);
        assert_eq!(rate.apply(dec!(-2)).unwrap(), dec!(-120000));

        // the amount is applied before the factor is narrowed
        let tiny = factor(dec!(0.0000000000000001)).compose(factor(dec!(0.0000000000000001)));
        let huge = dec!(10000000000000000000000000000);
        assert_eq!(tiny.apply(huge).unwrap(), dec!(0.0001));

        let big = factor(dec!(1000000000000000)).compose(factor(dec!(1000000000000000)));
        assert!(big.apply(dec!(1)).is_none());
    }
}
