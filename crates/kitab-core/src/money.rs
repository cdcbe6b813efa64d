//! # Money Module
//!
//! Provides the `Money` and `Rate` types for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In a storefront that stacks three discounts per order, binary floats  │
//! │  drift by a paisa here and there until totals stop reconciling.        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paisa                                            │
//! │    Rs 49.99 = 4999 paisa. Every subtotal, fee, and discount is an      │
//! │    exact integer; the single rounding step (rate application) is       │
//! │    explicit and tested.                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kitab_core::money::{Money, Rate};
//!
//! // Create from paisa (preferred) or whole rupees
//! let price = Money::from_paisa(49_999); // Rs 499.99
//! let threshold = Money::from_rupees(5_000);
//!
//! // Arithmetic operations
//! let line = price * 3;
//! let discount = line.apply_rate(Rate::from_percent(15));
//!
//! // NEVER do this:
//! // let bad = Money::from_float(499.99); // NO SUCH METHOD EXISTS!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (paisa, 1/100 rupee).
///
/// ## Design Decisions
/// - **i64 (signed)**: totals can legitimately go negative when stacked
///   discounts exceed subtotal plus shipping (documented engine behavior)
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: serializes as a bare integer, so every amount crosses
///   the interface as exact paisa
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Book.price ──► cart line subtotal ──► cart subtotal                    │
/// │                                          │                              │
/// │              shipping fee ◄──────────────┼──────────► discount amounts  │
/// │                                          ▼                              │
/// │              Order totals (frozen) ──► Payment.amount                   │
/// │                                                                         │
/// │  EVERY monetary value in the system flows through this type             │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Zero money value, usable in const contexts.
    pub const ZERO: Money = Money(0);

    /// Creates a Money value from paisa (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use kitab_core::money::Money;
    ///
    /// let price = Money::from_paisa(4999); // Represents Rs 49.99
    /// assert_eq!(price.paisa(), 4999);
    /// ```
    #[inline]
    pub const fn from_paisa(paisa: i64) -> Self {
        Money(paisa)
    }

    /// Creates a Money value from whole rupees.
    ///
    /// Convenient for business constants (thresholds, fees), which the
    /// storefront states in whole rupees.
    ///
    /// ## Example
    /// ```rust
    /// use kitab_core::money::Money;
    ///
    /// let fee = Money::from_rupees(50);
    /// assert_eq!(fee.paisa(), 5000);
    /// ```
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Returns the value in paisa (smallest currency unit).
    #[inline]
    pub const fn paisa(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (rupees) portion.
    ///
    /// ## Example
    /// ```rust
    /// use kitab_core::money::Money;
    ///
    /// assert_eq!(Money::from_paisa(4999).rupees(), 49);
    /// assert_eq!(Money::from_paisa(-550).rupees(), -5);
    /// ```
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (paisa) portion (always 0-99).
    #[inline]
    pub const fn paisa_part(&self) -> i64 {
        (self.0 % 100).abs()
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

    /// Returns the smaller of two amounts.
    ///
    /// Used to cap fixed coupon discounts at the subtotal: a Rs 1000
    /// voucher against a Rs 600 cart discounts exactly Rs 600.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use kitab_core::money::Money;
    ///
    /// let unit_price = Money::from_paisa(29_900); // Rs 299.00
    /// let line_subtotal = unit_price.multiply_quantity(3);
    /// assert_eq!(line_subtotal.paisa(), 89_700); // Rs 897.00
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Applies a percentage rate and returns the resulting portion,
    /// rounding half away from zero.
    ///
    /// This is the ONLY place monetary rounding happens. Every discount
    /// (order-value tier, first-time buyer, percentage coupon) flows
    /// through it.
    ///
    /// ## Implementation
    /// Integer math in `i128` to prevent overflow on large amounts:
    /// `(paisa * bps + 5000) / 10000`. The +5000 provides the rounding
    /// (5000/10000 = 0.5).
    ///
    /// ## Example
    /// ```rust
    /// use kitab_core::money::{Money, Rate};
    ///
    /// let subtotal = Money::from_rupees(6000);
    /// let discount = subtotal.apply_rate(Rate::from_percent(15));
    /// assert_eq!(discount, Money::from_rupees(900));
    ///
    /// // Half rounds up: Rs 49.99 at 5% = Rs 2.4995 → Rs 2.50
    /// let odd = Money::from_paisa(4999).apply_rate(Rate::from_percent(5));
    /// assert_eq!(odd.paisa(), 250);
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        let portion = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_paisa(portion as i64)
    }
}

// =============================================================================
// Rate Type
// =============================================================================

/// A percentage rate in basis points (1/100 of a percent).
///
/// ## Why Basis Points?
/// ```text
/// 1500 bps = 15.00%     500 bps = 5.00%     25 bps = 0.25%
/// ```
/// Storing rates as integers keeps `Money::apply_rate` in pure integer
/// math; a rate written as `0.15_f64` would reintroduce binary floats
/// into monetary calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rate(u32);

impl Rate {
    /// Zero rate (no discount).
    pub const ZERO: Rate = Rate(0);

    /// One hundred percent.
    pub const FULL: Rate = Rate(10_000);

    /// Creates a rate from basis points.
    ///
    /// ## Example
    /// ```rust
    /// use kitab_core::money::Rate;
    ///
    /// let rate = Rate::from_bps(1250); // 12.5%
    /// assert_eq!(rate.bps(), 1250);
    /// ```
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from whole percent.
    ///
    /// The storefront's discount tiers are stated in whole percent
    /// (5%, 10%, 15%), so this is the common constructor.
    #[inline]
    pub const fn from_percent(percent: u32) -> Self {
        Rate(percent * 100)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Whether the rate is at most 100%.
    ///
    /// Percentage coupons above 100% would discount more than the
    /// subtotal; `Coupon::new` rejects them.
    #[inline]
    pub const fn is_at_most_full(&self) -> bool {
        self.0 <= 10_000
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and receipts. Presentation layers format amounts
/// themselves from the raw paisa value.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Rs {}.{:02}", sign, self.rupees().abs(), self.paisa_part())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::ZERO
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}%", self.0 / 100)
        } else {
            write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
        }
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Summation over line amounts (cart subtotals, restored stock values).
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paisa() {
        let money = Money::from_paisa(4999);
        assert_eq!(money.paisa(), 4999);
        assert_eq!(money.rupees(), 49);
        assert_eq!(money.paisa_part(), 99);
    }

    #[test]
    fn test_from_rupees() {
        assert_eq!(Money::from_rupees(50).paisa(), 5000);
        assert_eq!(Money::from_rupees(-5).paisa(), -500);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_paisa(4999)), "Rs 49.99");
        assert_eq!(format!("{}", Money::from_rupees(500)), "Rs 500.00");
        assert_eq!(format!("{}", Money::from_paisa(-550)), "-Rs 5.50");
        assert_eq!(format!("{}", Money::ZERO), "Rs 0.00");
    }

    #[test]
    fn test_rate_display() {
        assert_eq!(format!("{}", Rate::from_percent(15)), "15%");
        assert_eq!(format!("{}", Rate::from_bps(825)), "8.25%");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_paisa(1000);
        let b = Money::from_paisa(500);

        assert_eq!((a + b).paisa(), 1500);
        assert_eq!((a - b).paisa(), 500);
        assert_eq!((a * 3).paisa(), 3000);

        let mut acc = Money::ZERO;
        acc += a;
        acc -= b;
        assert_eq!(acc.paisa(), 500);
    }

    #[test]
    fn test_sum_of_lines() {
        let lines = [
            Money::from_paisa(4999),
            Money::from_paisa(29_900),
            Money::from_paisa(101),
        ];
        let subtotal: Money = lines.iter().copied().sum();
        assert_eq!(subtotal.paisa(), 35_000);
    }

    #[test]
    fn test_apply_rate_basic() {
        // Rs 6000 at 15% = Rs 900 (the headline stacking example)
        let subtotal = Money::from_rupees(6000);
        let discount = subtotal.apply_rate(Rate::from_percent(15));
        assert_eq!(discount, Money::from_rupees(900));
    }

    #[test]
    fn test_apply_rate_rounds_half_up() {
        // Rs 49.99 at 5% = 249.95 paisa → 250
        let amount = Money::from_paisa(4999);
        assert_eq!(amount.apply_rate(Rate::from_percent(5)).paisa(), 250);

        // 1 paisa at 50% = 0.5 paisa → 1 (half rounds away from zero)
        assert_eq!(Money::from_paisa(1).apply_rate(Rate::from_percent(50)).paisa(), 1);

        // 333 paisa at 10% = 33.3 → 33
        assert_eq!(Money::from_paisa(333).apply_rate(Rate::from_percent(10)).paisa(), 33);
    }

    #[test]
    fn test_min_caps_fixed_vouchers() {
        let voucher = Money::from_rupees(1000);
        let small_cart = Money::from_rupees(600);
        assert_eq!(voucher.min(small_cart), small_cart);
        assert_eq!(small_cart.min(voucher), small_cart);
    }

    #[test]
    fn test_multiply_quantity() {
        let unit_price = Money::from_paisa(29_900);
        assert_eq!(unit_price.multiply_quantity(3).paisa(), 89_700);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::ZERO;
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::from_paisa(100);
        assert!(positive.is_positive());

        let negative = Money::from_paisa(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().paisa(), 100);
    }

    #[test]
    fn test_rate_bounds() {
        assert!(Rate::from_percent(100).is_at_most_full());
        assert!(!Rate::from_bps(10_001).is_at_most_full());
        assert!(Rate::ZERO.is_zero());
        assert_eq!(Rate::FULL.bps(), 10_000);
    }
}
