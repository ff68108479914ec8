// ABOUTME: Fixed-point price type stored as an integer count of minor currency units.
// ABOUTME: Parses cleaned price text ("1234.56") and formats with two fractional digits.

//! Exact money amounts.
//!
//! Prices are kept as whole paise so that "changed vs unchanged" is an
//! integer comparison. Text is accepted with at most two fractional digits.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// Number of minor units in one major unit.
const MINOR_PER_MAJOR: i64 = 100;

/// A price in minor currency units (paise).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(i64);

/// Reasons price text was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceParseError {
    #[error("empty price text")]
    Empty,
    #[error("non-numeric price text {0:?}")]
    Invalid(String),
    #[error("more than two fractional digits in {0:?}")]
    Precision(String),
    #[error("price {0:?} is out of range")]
    Overflow(String),
}

impl Price {
    /// Builds a price from minor units.
    pub const fn from_minor(minor: i64) -> Self {
        Price(minor)
    }

    /// Builds a price from whole major units.
    pub const fn from_major(major: i64) -> Self {
        Price(major * MINOR_PER_MAJOR)
    }
}

impl FromStr for Price {
    type Err = PriceParseError;

    /// Parses `digits[.digits]`; `"949"`, `"949."`, `"949.5"`, `".5"` are all valid.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PriceParseError::Empty);
        }

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
            return Err(PriceParseError::Invalid(s.to_string()));
        }
        if frac.len() > 2 {
            return Err(PriceParseError::Precision(s.to_string()));
        }

        let overflow = || PriceParseError::Overflow(s.to_string());
        let major: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        let minor: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| overflow())? * 10,
            _ => frac.parse().map_err(|_| overflow())?,
        };

        major
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|m| m.checked_add(minor))
            .map(Price)
            .ok_or_else(overflow)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(
            f,
            "{}{}.{:02}",
            sign,
            abs / MINOR_PER_MAJOR as u64,
            abs % MINOR_PER_MAJOR as u64
        )
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
