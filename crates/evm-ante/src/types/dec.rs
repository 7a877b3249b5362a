//! Fixed-point decimal with 18 digits of precision.

use core::{fmt, str::FromStr};

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of decimal places a [`Dec`] carries.
pub const DEC_PRECISION: usize = 18;

/// `10^18`, the raw representation of `1`.
const ONE_RAW: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Half of [`ONE_RAW`], used for rounding.
const HALF_RAW: U256 = U256::from_limbs([500_000_000_000_000_000, 0, 0, 0]);

/// A non-negative decimal number with 18 digits of precision, stored as an integer scaled by
/// `10^18`.
///
/// Gas prices and fee multipliers are configured as decimals. Arithmetic is checked: every
/// operation that could overflow returns `None` instead of wrapping.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dec(U256);

/// Error returned when parsing a [`Dec`] from a string fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecParseError {
    /// The input is empty.
    #[error("decimal string is empty")]
    Empty,
    /// The input has more than 18 fractional digits.
    #[error("too many decimal places: {0} > 18")]
    TooPrecise(usize),
    /// The input contains a character other than digits and a single `.`.
    #[error("invalid decimal string: {0}")]
    Invalid(String),
    /// The value does not fit into 256 bits once scaled.
    #[error("decimal out of range: {0}")]
    OutOfRange(String),
}

impl Dec {
    /// Zero.
    pub const ZERO: Self = Self(U256::ZERO);

    /// One.
    pub const ONE: Self = Self(ONE_RAW);

    /// Creates a decimal from its raw representation, i.e. the value scaled by `10^18`.
    pub const fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    /// Returns the raw representation, i.e. the value scaled by `10^18`.
    pub const fn raw(&self) -> U256 {
        self.0
    }

    /// Creates a decimal from an integer. Returns `None` if the scaled value overflows.
    pub fn checked_from_int(value: U256) -> Option<Self> {
        value.checked_mul(ONE_RAW).map(Self)
    }

    /// Returns `true` if the value is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checked addition.
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction. Returns `None` if the result would be negative.
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Multiplies by an integer.
    pub fn checked_mul_int(self, value: U256) -> Option<Self> {
        self.0.checked_mul(value).map(Self)
    }

    /// Divides by an integer, truncating. Returns `None` on division by zero.
    pub fn checked_quo_int(self, value: U256) -> Option<Self> {
        self.0.checked_div(value).map(Self)
    }

    /// Multiplies two decimals. The result is rounded half to even at the 18th decimal place.
    pub fn checked_mul(self, other: Self) -> Option<Self> {
        let product = self.0.checked_mul(other.0)?;
        Some(Self(round_half_even(product)))
    }

    /// Returns the smallest integer greater than or equal to the value.
    pub fn ceil(&self) -> U256 {
        let (quotient, remainder) = self.0.div_rem(ONE_RAW);
        if remainder.is_zero() {
            quotient
        } else {
            // cannot overflow: quotient <= U256::MAX / 10^18
            quotient + U256::from(1)
        }
    }

    /// Returns the integer part of the value.
    pub fn truncate(&self) -> U256 {
        self.0 / ONE_RAW
    }
}

/// Divides `value` by `10^18`, rounding half to even.
fn round_half_even(value: U256) -> U256 {
    let (quotient, remainder) = value.div_rem(ONE_RAW);
    let round_up = match remainder.cmp(&HALF_RAW) {
        core::cmp::Ordering::Less => false,
        core::cmp::Ordering::Greater => true,
        core::cmp::Ordering::Equal => quotient.bit(0),
    };
    if round_up {
        quotient + U256::from(1)
    } else {
        quotient
    }
}

impl From<u64> for Dec {
    fn from(value: u64) -> Self {
        // u64::MAX * 10^18 < 2^128
        Self(U256::from(value) * ONE_RAW)
    }
}

impl FromStr for Dec {
    type Err = DecParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(DecParseError::Empty);
        }
        let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(DecParseError::Invalid(s.to_string()));
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(DecParseError::Invalid(s.to_string()));
        }
        if frac_part.len() > DEC_PRECISION {
            return Err(DecParseError::TooPrecise(frac_part.len()));
        }

        let int = if int_part.is_empty() {
            U256::ZERO
        } else {
            U256::from_str_radix(int_part, 10)
                .map_err(|_| DecParseError::OutOfRange(s.to_string()))?
        };
        let frac = if frac_part.is_empty() {
            0
        } else {
            let padded = format!("{frac_part:0<width$}", width = DEC_PRECISION);
            padded.parse::<u64>().map_err(|_| DecParseError::Invalid(s.to_string()))?
        };

        int.checked_mul(ONE_RAW)
            .and_then(|scaled| scaled.checked_add(U256::from(frac)))
            .map(Self)
            .ok_or_else(|| DecParseError::OutOfRange(s.to_string()))
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (int, frac) = self.0.div_rem(ONE_RAW);
        // frac < 10^18 fits into the lowest limb
        write!(f, "{int}.{:018}", frac.as_limbs()[0])
    }
}

impl fmt::Debug for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dec({self})")
    }
}

impl Serialize for Dec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Dec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let dec: Dec = "0.5".parse().unwrap();
        assert_eq!(dec.raw(), U256::from(500_000_000_000_000_000u64));
        assert_eq!(dec.to_string(), "0.500000000000000000");

        let dec: Dec = "12".parse().unwrap();
        assert_eq!(dec, Dec::from(12));
        assert_eq!(dec.to_string(), "12.000000000000000000");

        let dec: Dec = ".25".parse().unwrap();
        assert_eq!(dec.to_string(), "0.250000000000000000");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Dec>(), Err(DecParseError::Empty));
        assert!(matches!("1.2.3".parse::<Dec>(), Err(DecParseError::Invalid(_))));
        assert!(matches!("-1".parse::<Dec>(), Err(DecParseError::Invalid(_))));
        assert!(matches!(".".parse::<Dec>(), Err(DecParseError::Invalid(_))));
        assert_eq!(
            "0.0000000000000000001".parse::<Dec>(),
            Err(DecParseError::TooPrecise(19))
        );
    }

    #[test]
    fn test_ceil_and_truncate() {
        let dec: Dec = "2.000000000000000001".parse().unwrap();
        assert_eq!(dec.ceil(), U256::from(3));
        assert_eq!(dec.truncate(), U256::from(2));

        let dec = Dec::from(7);
        assert_eq!(dec.ceil(), U256::from(7));
        assert_eq!(dec.truncate(), U256::from(7));
        assert_eq!(Dec::ZERO.ceil(), U256::ZERO);
    }

    #[test]
    fn test_mul_rounds_half_to_even() {
        let half: Dec = "0.5".parse().unwrap();
        let tiny = Dec::from_raw(U256::from(1));
        // 1e-18 * 0.5 = 5e-19, rounds to the even neighbour 0
        assert_eq!(tiny.checked_mul(half), Some(Dec::ZERO));
        let three = Dec::from_raw(U256::from(3));
        // 3e-18 * 0.5 = 1.5e-18, rounds to 2e-18
        assert_eq!(three.checked_mul(half), Some(Dec::from_raw(U256::from(2))));
        assert_eq!(Dec::from(10).checked_mul(half), Some(Dec::from(5)));
    }

    #[test]
    fn test_checked_ops() {
        assert_eq!(Dec::from(1).checked_sub(Dec::from(2)), None);
        assert_eq!(Dec::from(3).checked_quo_int(U256::ZERO), None);
        assert_eq!(Dec::from(3).checked_mul_int(U256::from(4)), Some(Dec::from(12)));
        assert_eq!(Dec::checked_from_int(U256::MAX), None);
    }

    #[test]
    fn test_serde_as_string() {
        let dec: Dec = serde_json::from_str("\"0.25\"").unwrap();
        assert_eq!(dec, "0.25".parse().unwrap());
        assert_eq!(serde_json::to_string(&dec).unwrap(), "\"0.250000000000000000\"");
    }
}
