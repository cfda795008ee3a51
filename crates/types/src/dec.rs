//! Exact decimal arithmetic for prices, rates, and vesting weights.
//!
//! All consensus-critical fractional values go through [`Dec`]. Quantities of
//! selling coin are always floored to whole units; conversions into paying
//! coin use a ceiling so that a bidder's payment never exceeds their escrow.
//! Ratios (the extended-round shrink factor) are computed at scale 18 with
//! floor rounding. No floating point is involved anywhere.

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use bigdecimal::{BigDecimal, One, ParseBigDecimalError, RoundingMode, Signed, ToPrimitive, Zero};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Scale used for division results.
const RATIO_SCALE: i64 = 18;

/// An exact, arbitrary-precision decimal value.
///
/// Persisted (borsh) as its exact decimal string, which round-trips
/// losslessly.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dec(BigDecimal);

impl Dec {
    pub fn zero() -> Self {
        Dec(BigDecimal::zero())
    }

    pub fn one() -> Self {
        Dec(BigDecimal::one())
    }

    pub fn from_int(value: u128) -> Self {
        Dec(BigDecimal::from(value))
    }

    /// `numerator / denominator` at scale 18, floored.
    ///
    /// Panics on a zero denominator; callers guard it.
    pub fn from_ratio(numerator: u128, denominator: u128) -> Self {
        if denominator == 0 {
            panic!("division by zero in decimal ratio");
        }
        let quotient = BigDecimal::from(numerator) / BigDecimal::from(denominator);
        Dec(quotient.with_scale_round(RATIO_SCALE, RoundingMode::Floor))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    /// `⌊self × amount⌋`, or `None` if the result does not fit in `u128`
    /// or is negative.
    pub fn mul_floor(&self, amount: u128) -> Option<u128> {
        let product = &self.0 * BigDecimal::from(amount);
        product.with_scale_round(0, RoundingMode::Floor).to_u128()
    }

    /// `⌈self × amount⌉`, or `None` if the result does not fit in `u128`
    /// or is negative.
    pub fn mul_ceil(&self, amount: u128) -> Option<u128> {
        let product = &self.0 * BigDecimal::from(amount);
        product.with_scale_round(0, RoundingMode::Ceiling).to_u128()
    }

    /// `⌊amount / price⌋`, or `None` if `price` is not positive or the
    /// quotient does not fit in `u128`.
    pub fn div_floor(amount: u128, price: &Dec) -> Option<u128> {
        if !price.is_positive() {
            return None;
        }
        let quotient = BigDecimal::from(amount) / &price.0;
        quotient.with_scale_round(0, RoundingMode::Floor).to_u128()
    }
}

impl Add for Dec {
    type Output = Dec;

    fn add(self, rhs: Dec) -> Dec {
        Dec(self.0 + rhs.0)
    }
}

impl Sub for Dec {
    type Output = Dec;

    fn sub(self, rhs: Dec) -> Dec {
        Dec(self.0 - rhs.0)
    }
}

impl FromStr for Dec {
    type Err = ParseBigDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Dec(BigDecimal::from_str(s)?))
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl BorshSerialize for Dec {
    fn serialize<W: borsh::io::Write>(&self, writer: &mut W) -> borsh::io::Result<()> {
        BorshSerialize::serialize(&self.0.to_string(), writer)
    }
}

impl BorshDeserialize for Dec {
    fn deserialize_reader<R: borsh::io::Read>(reader: &mut R) -> borsh::io::Result<Self> {
        let repr = String::deserialize_reader(reader)?;
        repr.parse().map_err(|err: ParseBigDecimalError| {
            borsh::io::Error::new(borsh::io::ErrorKind::InvalidData, err.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Dec {
        s.parse().unwrap()
    }

    #[test]
    fn test_mul_floor_and_ceil() {
        let price = dec("1.5");
        assert_eq!(price.mul_floor(333), Some(499));
        assert_eq!(price.mul_ceil(333), Some(500));
        assert_eq!(price.mul_floor(400), Some(600));
        assert_eq!(price.mul_ceil(400), Some(600));
    }

    #[test]
    fn test_div_floor() {
        assert_eq!(Dec::div_floor(700, &dec("1.0")), Some(700));
        assert_eq!(Dec::div_floor(1000, &dec("3")), Some(333));
        assert_eq!(Dec::div_floor(750, &dec("1.5")), Some(500));
        assert_eq!(Dec::div_floor(1, &Dec::zero()), None);
    }

    #[test]
    fn test_from_ratio() {
        assert_eq!(Dec::from_ratio(5, 10), dec("0.5"));
        assert_eq!(Dec::one() - Dec::from_ratio(5, 10), dec("0.5"));
        assert_eq!(Dec::from_ratio(1, 3), dec("0.333333333333333333"));
    }

    #[test]
    fn test_equality_ignores_trailing_zeros() {
        assert_eq!(dec("1.50"), dec("1.5"));
        assert_eq!(dec("0.4") + dec("0.6"), Dec::one());
    }

    #[test]
    fn test_borsh_round_trip() {
        let original = dec("123.000000000000000456");
        let encoded = borsh::to_vec(&original).unwrap();
        let decoded: Dec = borsh::from_slice(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_negative_diff_is_comparable() {
        // matched set can grow between rounds, making the shrink factor
        // negative; it still has to compare below any non-negative rate
        let diff = Dec::one() - Dec::from_ratio(12, 10);
        assert!(diff < dec("0.3"));
    }
}
