//! # Money Module
//!
//! Provides the `Money` type for monetary values in order records and metrics.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DECIMAL STRINGS IN, INTEGER CENTS INSIDE                               │
//! │                                                                         │
//! │  The commerce platform reports amounts as decimal strings ("49.95").    │
//! │  Summing thousands of them as floats drifts:                            │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  Amounts are parsed once into integer cents and summed exactly. A      │
//! │  float appears only when a ratio (percent change) is needed.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pulse_core::money::Money;
//!
//! let line = Money::parse_decimal("49.95").unwrap();
//! let total = line + Money::from_cents(500);
//! assert_eq!(total.cents(), 5495);
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// Signed so that deltas between periods can be negative; order and line
/// amounts themselves are validated to be non-negative on ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// ```rust
    /// use pulse_core::money::Money;
    ///
    /// let line_total = Money::from_cents(4995);
    /// assert_eq!(line_total.dollars(), 49);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole dollars, truncated toward zero.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Parses a decimal amount string as reported by the commerce platform.
    ///
    /// Accepts an optional leading `-`, up to two fractional digits and
    /// surrounding whitespace. Anything else is a validation error, never a
    /// silent zero.
    ///
    /// ## Example
    /// ```rust
    /// use pulse_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("12.5").unwrap().cents(), 1250);
    /// assert_eq!(Money::parse_decimal("7").unwrap().cents(), 700);
    /// assert!(Money::parse_decimal("12.345").is_err());
    /// assert!(Money::parse_decimal("").is_err());
    /// ```
    pub fn parse_decimal(input: &str) -> Result<Money, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: format!("'{}': {}", input, reason),
        };

        let trimmed = input.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (major, minor) = match digits.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (digits, ""),
        };

        if major.is_empty() && minor.is_empty() {
            return Err(invalid("empty amount"));
        }
        if minor.len() > 2 {
            return Err(invalid("more than two decimal places"));
        }
        if !major.chars().chain(minor.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid("not a decimal number"));
        }

        let major_value: i64 = if major.is_empty() {
            0
        } else {
            major.parse().map_err(|_| invalid("amount out of range"))?
        };
        let minor_value: i64 = match minor.len() {
            0 => 0,
            1 => minor.parse::<i64>().map_err(|_| invalid("bad fraction"))? * 10,
            _ => minor.parse().map_err(|_| invalid("bad fraction"))?,
        };

        let cents = major_value
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor_value))
            .ok_or_else(|| invalid("amount out of range"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Divides by a count, rounding half away from zero.
    ///
    /// Returns zero when `count` is zero (an average over nothing).
    ///
    /// ## Example
    /// ```rust
    /// use pulse_core::money::Money;
    ///
    /// // Average order value: $10.00 over 3 orders
    /// assert_eq!(Money::from_cents(1000).divide_rounded(3).cents(), 333);
    /// assert_eq!(Money::from_cents(1000).divide_rounded(0).cents(), 0);
    /// ```
    pub fn divide_rounded(&self, count: i64) -> Money {
        if count == 0 {
            return Money::zero();
        }
        let amount = self.0 as i128;
        let count = count as i128;
        // Integer division truncates toward zero, so bias by half the divisor
        // in the direction of the quotient's sign.
        let bias = if (amount < 0) == (count < 0) { count.abs() } else { -count.abs() };
        Money(((2 * amount + bias) / (2 * count)) as i64)
    }

    /// Plain two-decimal amount with no currency symbol (`12.50`, `-5.50`).
    ///
    /// ```rust
    /// use pulse_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1250).to_decimal_string(), "12.50");
    /// assert_eq!(Money::from_cents(-7).to_decimal_string(), "-0.07");
    /// ```
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }

}

/// Reads an order amount as the platform sends it: a decimal string
/// (`"49.95"`), or integer cents (`4995`) as this crate writes it back out.
///
/// Use with `#[serde(deserialize_with = "deserialize_amount")]`.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<Money, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Cents(i64),
        Decimal(String),
    }

    match RawAmount::deserialize(deserializer)? {
        RawAmount::Cents(cents) => Ok(Money(cents)),
        RawAmount::Decimal(text) => Money::parse_decimal(&text).map_err(serde::de::Error::custom),
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly display (`$10.99`, `-$5.50`). The UI owns localisation.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
