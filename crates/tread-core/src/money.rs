//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing installments as floats:                                        │
//! │    57.1 + 57.1 + 57.1 = 171.29999999999998  ❌ WRONG!                  │
//! │                                                                         │
//! │  A balance that should be exactly 0 ends up as 0.0000000001 and the    │
//! │  sale never flips to "completed".                                       │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (cents)                              │
//! │    5710 + 5710 + 5710 = 17130 cents, exactly                            │
//! │    Addition is associative, so summation order never matters           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tread_core::money::Money;
//!
//! let installment = Money::from_major(57);      // Rs. 57.00
//! let total = installment * 3;                  // Rs. 171.00
//! assert_eq!(total.cents(), 17_100);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents; 100 = Rs. 1.00).
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate results such as `total - paid` may go
///   negative before being clamped
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serializes as a bare integer**: the database and the presentation
///   layer both store cents
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  unit price × quantity + service charge ──► Sale.total_amount           │
/// │                                                                         │
/// │  Sale.initial_payment + Σ Payment.amount ──► total paid                 │
/// │                                                                         │
/// │  max(0, total_amount - total paid) ──────► Sale.remaining_balance       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use tread_core::money::Money;
    ///
    /// let fee = Money::from_cents(25_000); // Rs. 250.00
    /// assert_eq!(fee.cents(), 25_000);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole rupees.
    ///
    /// ## Example
    /// ```rust
    /// use tread_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(5700).cents(), 570_000);
    /// ```
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Example
    /// ```rust
    /// use tread_core::money::Money;
    ///
    /// let amount = Money::from_major_minor(57, 50); // Rs. 57.50
    /// assert_eq!(amount.cents(), 5750);
    ///
    /// let negative = Money::from_major_minor(-5, 50);
    /// assert_eq!(negative.cents(), -550);
    /// ```
    ///
    /// ## Note
    /// For negative amounts only the major unit carries the sign.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    ///
    /// ## Example
    /// ```rust
    /// use tread_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(5750).minor_part(), 50);
    /// assert_eq!(Money::from_cents(-550).minor_part(), 50);
    /// ```
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns `self`, or zero if `self` is negative.
    ///
    /// ## Example
    /// ```rust
    /// use tread_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-1).clamp_non_negative(), Money::zero());
    /// assert_eq!(Money::from_cents(42).clamp_non_negative().cents(), 42);
    /// ```
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Addition that stops at `i64::MAX` / `i64::MIN` instead of overflowing.
    #[inline]
    pub const fn saturating_add(self, other: Money) -> Self {
        Money(self.0.saturating_add(other.0))
    }

    /// Subtraction that stops at `i64::MAX` / `i64::MIN` instead of overflowing.
    #[inline]
    pub const fn saturating_sub(self, other: Money) -> Self {
        Money(self.0.saturating_sub(other.0))
    }

    /// Multiplies money by a quantity, saturating instead of overflowing.
    ///
    /// ## Example
    /// ```rust
    /// use tread_core::money::Money;
    ///
    /// let tyre = Money::from_major(5000);
    /// assert_eq!(tyre.multiply_quantity(2), Money::from_major(10_000));
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount the way receipts and tables print it.
///
/// ## Note
/// Debugging and log output only. The presentation layer formats for users.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}Rs. {}.{:02}",
            sign,
            self.major().abs(),
            self.minor_part()
        )
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

/// Multiplication by integer (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Saturating sum, so a runaway ledger cannot panic the derivation.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Money::saturating_add)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(5750);
        assert_eq!(money.cents(), 5750);
        assert_eq!(money.major(), 57);
        assert_eq!(money.minor_part(), 50);
    }

    #[test]
    fn test_from_major() {
        assert_eq!(Money::from_major(610).cents(), 61_000);
        assert_eq!(Money::from_major(-3).cents(), -300);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_major(5090)), "Rs. 5090.00");
        assert_eq!(format!("{}", Money::from_cents(5705)), "Rs. 57.05");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-Rs. 5.50");
        assert_eq!(format!("{}", Money::zero()), "Rs. 0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_major(100);
        let b = Money::from_major(40);

        assert_eq!(a + b, Money::from_major(140));
        assert_eq!(a - b, Money::from_major(60));
        assert_eq!(b * 3, Money::from_major(120));

        let mut c = a;
        c += b;
        c -= Money::from_major(20);
        assert_eq!(c, Money::from_major(120));
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(Money::from_cents(-500).clamp_non_negative(), Money::zero());
        assert_eq!(Money::zero().clamp_non_negative(), Money::zero());
        assert_eq!(Money::from_cents(500).clamp_non_negative().cents(), 500);
    }

    #[test]
    fn test_sum_is_order_independent() {
        let amounts = [
            Money::from_cents(5710),
            Money::from_cents(1),
            Money::from_cents(99_999),
        ];
        let forward: Money = amounts.iter().sum();
        let backward: Money = amounts.iter().rev().sum();
        assert_eq!(forward, backward);
        assert_eq!(forward.cents(), 105_710);
    }

    #[test]
    fn test_sum_saturates_instead_of_overflowing() {
        let huge = [Money::from_cents(i64::MAX), Money::from_cents(1)];
        let total: Money = huge.iter().sum();
        assert_eq!(total.cents(), i64::MAX);
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(1).is_positive());
        assert!(Money::from_cents(-1).is_negative());
        assert_eq!(Money::from_cents(-1).abs().cents(), 1);
    }

    #[test]
    fn test_serializes_as_plain_cents() {
        let json = serde_json::to_string(&Money::from_major(57)).unwrap();
        assert_eq!(json, "5700");
    }
}
