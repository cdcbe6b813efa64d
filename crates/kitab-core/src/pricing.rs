//! # Pricing Calculator
//!
//! Pure functions computing every monetary figure a cart or order carries:
//! subtotal, shipping fee, and the three stacked discounts.
//!
//! ## The Breakdown
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    From Lines to Total                                  │
//! │                                                                         │
//! │  [(unit_price, qty), ...]                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  subtotal = Σ unit_price × qty                                          │
//! │       │                                                                 │
//! │       ├──► shipping_fee        (free ≥ Rs 5000, else base + bulk)       │
//! │       ├──► order_value_discount (ONE tier: ≥5000→15% ≥2000→10% ≥1000→5%)│
//! │       ├──► first_time_discount  (15% on the first-ever order)           │
//! │       └──► coupon_discount      (valid + min purchase met)              │
//! │                                                                         │
//! │  total_discount = coupon + order_value + first_time   (all stack)       │
//! │  total_amount   = subtotal − total_discount + shipping_fee              │
//! │                   (NOT floored at zero; see the documented test)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Purity
//! No clocks, no state, no I/O. The validity instant is a parameter, so
//! recomputing with the same inputs always yields the same breakdown;
//! carts recompute on every view and never store totals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::{Money, Rate};
use crate::types::Coupon;

// =============================================================================
// Line Item
// =============================================================================

/// One priced cart or order line, as the calculator sees it.
///
/// The caller resolves books to prices (live for carts, frozen for
/// orders); the calculator never looks anything up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub unit_price: Money,
    pub quantity: i64,
}

impl LineItem {
    /// `unit_price × quantity`.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// Sum of line subtotals.
pub fn subtotal(lines: &[LineItem]) -> Money {
    lines.iter().map(LineItem::subtotal).sum()
}

/// Total copies across all lines (drives the bulk shipping surcharge).
pub fn total_item_count(lines: &[LineItem]) -> i64 {
    lines.iter().map(|line| line.quantity).sum()
}

// =============================================================================
// Pricing Config
// =============================================================================

/// One order-value discount tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueTier {
    /// Lowest subtotal (inclusive) at which this tier applies.
    pub min_subtotal: Money,
    pub rate: Rate,
}

/// The business knobs of the calculator.
///
/// Thresholds and rates are configuration, not hardcoded law; tests and
/// deployments can tune them. `Default` carries the storefront values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Orders at or above this subtotal ship free.
    pub free_shipping_threshold: Money,

    /// Flat fee below the free-shipping threshold.
    pub base_shipping_fee: Money,

    /// Copies beyond this count attract the per-item surcharge.
    pub bulk_item_threshold: i64,

    /// Surcharge per copy over the bulk threshold.
    pub per_extra_item_fee: Money,

    /// Order-value tiers. Exactly one applies: the highest threshold met.
    pub value_tiers: Vec<ValueTier>,

    /// Discount rate on a customer's first-ever order.
    pub first_time_rate: Rate,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            free_shipping_threshold: Money::from_rupees(5000),
            base_shipping_fee: Money::from_rupees(50),
            bulk_item_threshold: 5,
            per_extra_item_fee: Money::from_rupees(10),
            value_tiers: vec![
                ValueTier {
                    min_subtotal: Money::from_rupees(5000),
                    rate: Rate::from_percent(15),
                },
                ValueTier {
                    min_subtotal: Money::from_rupees(2000),
                    rate: Rate::from_percent(10),
                },
                ValueTier {
                    min_subtotal: Money::from_rupees(1000),
                    rate: Rate::from_percent(5),
                },
            ],
            first_time_rate: Rate::from_percent(15),
        }
    }
}

impl PricingConfig {
    /// The single tier rate for a subtotal: the highest threshold met,
    /// regardless of how the tier table is ordered. Tiers never sum.
    pub fn order_value_rate(&self, subtotal: Money) -> Rate {
        self.value_tiers
            .iter()
            .filter(|tier| subtotal >= tier.min_subtotal)
            .max_by_key(|tier| tier.min_subtotal)
            .map(|tier| tier.rate)
            .unwrap_or(Rate::ZERO)
    }
}

// =============================================================================
// Component Functions
// =============================================================================

/// Shipping fee for a subtotal and copy count.
///
/// Free at or above the threshold; otherwise the base fee plus a
/// surcharge per copy beyond the bulk threshold.
///
/// ## Example
/// ```rust
/// use kitab_core::money::Money;
/// use kitab_core::pricing::{shipping_fee, PricingConfig};
///
/// let config = PricingConfig::default();
/// assert_eq!(shipping_fee(Money::from_rupees(5000), 3, &config), Money::ZERO);
/// assert_eq!(
///     shipping_fee(Money::from_rupees(4999), 8, &config),
///     Money::from_rupees(80) // 50 base + 10 × (8 − 5)
/// );
/// ```
pub fn shipping_fee(subtotal: Money, item_count: i64, config: &PricingConfig) -> Money {
    if subtotal >= config.free_shipping_threshold {
        return Money::ZERO;
    }

    let mut fee = config.base_shipping_fee;
    if item_count > config.bulk_item_threshold {
        fee += config
            .per_extra_item_fee
            .multiply_quantity(item_count - config.bulk_item_threshold);
    }
    fee
}

/// Tiered order-value discount. Exactly one tier applies.
pub fn order_value_discount(subtotal: Money, config: &PricingConfig) -> Money {
    subtotal.apply_rate(config.order_value_rate(subtotal))
}

/// First-order discount; zero once the buyer flag has flipped.
pub fn first_time_discount(subtotal: Money, is_first_time: bool, config: &PricingConfig) -> Money {
    if is_first_time {
        subtotal.apply_rate(config.first_time_rate)
    } else {
        Money::ZERO
    }
}

/// Coupon discount against a subtotal.
///
/// Zero unless a coupon is present AND valid at `at` AND the subtotal
/// meets its minimum purchase. An invalid coupon contributes nothing
/// here; whether it may still be *redeemed* is the Settlement
/// Workflow's question, not the calculator's.
pub fn coupon_discount(subtotal: Money, coupon: Option<&Coupon>, at: DateTime<Utc>) -> Money {
    match coupon {
        Some(coupon) if coupon.validate(at).is_ok() && subtotal >= coupon.min_purchase => {
            coupon.discount_on(subtotal)
        }
        _ => Money::ZERO,
    }
}

// =============================================================================
// Price Breakdown
// =============================================================================

/// Every monetary component of a cart or order, computed together.
///
/// Carts serve this live on every view; the Settlement Workflow freezes
/// one onto the Order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub coupon_discount: Money,
    pub order_value_discount: Money,
    pub first_time_discount: Money,
}

impl PriceBreakdown {
    /// Sum of the three discount components (they always stack).
    pub fn total_discount(&self) -> Money {
        self.coupon_discount + self.order_value_discount + self.first_time_discount
    }

    /// `subtotal − total_discount + shipping_fee`. Not floored at zero.
    pub fn total_amount(&self) -> Money {
        self.subtotal - self.total_discount() + self.shipping_fee
    }
}

/// Computes the full breakdown for a set of lines.
///
/// Pure function of its arguments; calling it twice with the same inputs
/// yields identical breakdowns.
pub fn price_cart(
    lines: &[LineItem],
    is_first_time: bool,
    coupon: Option<&Coupon>,
    config: &PricingConfig,
    at: DateTime<Utc>,
) -> PriceBreakdown {
    let subtotal = subtotal(lines);
    let item_count = total_item_count(lines);

    PriceBreakdown {
        subtotal,
        shipping_fee: shipping_fee(subtotal, item_count, config),
        coupon_discount: coupon_discount(subtotal, coupon, at),
        order_value_discount: order_value_discount(subtotal, config),
        first_time_discount: first_time_discount(subtotal, is_first_time, config),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Discount;
    use chrono::Duration;

    fn at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn line(rupees: i64, quantity: i64) -> LineItem {
        LineItem {
            unit_price: Money::from_rupees(rupees),
            quantity,
        }
    }

    fn coupon(discount: Discount, min_purchase: Money) -> Coupon {
        Coupon::new(
            "TEST",
            discount,
            10,
            min_purchase,
            at() + Duration::days(30),
            at(),
        )
        .unwrap()
    }

    #[test]
    fn test_subtotal_and_item_count() {
        let lines = [line(850, 2), line(1300, 1)];
        assert_eq!(subtotal(&lines), Money::from_rupees(3000));
        assert_eq!(total_item_count(&lines), 3);

        assert_eq!(subtotal(&[]), Money::ZERO);
        assert_eq!(total_item_count(&[]), 0);
    }

    #[test]
    fn test_order_value_discount_step_function() {
        let config = PricingConfig::default();
        let discount = |rupees| order_value_discount(Money::from_rupees(rupees), &config);

        // Breakpoints at exactly 1000, 2000, 5000
        assert_eq!(discount(999), Money::ZERO);
        assert_eq!(discount(1000), Money::from_rupees(50)); // 5%
        assert_eq!(discount(1999), Money::from_paisa(9995)); // 5% of 1999
        assert_eq!(discount(2000), Money::from_rupees(200)); // 10%
        assert_eq!(discount(4999), Money::from_paisa(49_990)); // 10% of 4999
        assert_eq!(discount(5000), Money::from_rupees(750)); // 15%
    }

    #[test]
    fn test_tiers_never_sum() {
        let config = PricingConfig::default();
        // At Rs 6000 all three thresholds are met; only the 15% tier applies
        assert_eq!(
            order_value_discount(Money::from_rupees(6000), &config),
            Money::from_rupees(900)
        );
        // not 900 + 600 + 300
    }

    #[test]
    fn test_order_value_discount_monotonic() {
        let config = PricingConfig::default();
        let mut prev = Money::ZERO;
        for rupees in [0, 500, 999, 1000, 1500, 1999, 2000, 3000, 4999, 5000, 9000] {
            let d = order_value_discount(Money::from_rupees(rupees), &config);
            assert!(d >= prev, "discount decreased at subtotal {rupees}");
            prev = d;
        }
    }

    #[test]
    fn test_shipping_fee_cases() {
        let config = PricingConfig::default();

        // Free at the threshold
        assert_eq!(shipping_fee(Money::from_rupees(5000), 3, &config), Money::ZERO);
        assert_eq!(shipping_fee(Money::from_rupees(9000), 20, &config), Money::ZERO);

        // Base fee below it
        assert_eq!(
            shipping_fee(Money::from_rupees(4999), 5, &config),
            Money::from_rupees(50)
        );

        // Bulk surcharge per copy over 5
        assert_eq!(
            shipping_fee(Money::from_rupees(4999), 8, &config),
            Money::from_rupees(80)
        );
        assert_eq!(
            shipping_fee(Money::from_rupees(100), 6, &config),
            Money::from_rupees(60)
        );
    }

    #[test]
    fn test_first_time_discount() {
        let config = PricingConfig::default();
        assert_eq!(
            first_time_discount(Money::from_rupees(6000), true, &config),
            Money::from_rupees(900)
        );
        assert_eq!(
            first_time_discount(Money::from_rupees(6000), false, &config),
            Money::ZERO
        );
    }

    #[test]
    fn test_fixed_coupon_never_exceeds_subtotal() {
        let c = coupon(Discount::Fixed(Money::from_rupees(1000)), Money::ZERO);
        assert_eq!(
            coupon_discount(Money::from_rupees(600), Some(&c), at()),
            Money::from_rupees(600)
        );
    }

    #[test]
    fn test_percentage_coupon() {
        let c = coupon(Discount::Percentage(Rate::from_percent(10)), Money::ZERO);
        assert_eq!(
            coupon_discount(Money::from_rupees(2500), Some(&c), at()),
            Money::from_rupees(250)
        );
    }

    #[test]
    fn test_coupon_below_min_purchase_contributes_nothing() {
        let c = coupon(
            Discount::Fixed(Money::from_rupees(100)),
            Money::from_rupees(2000),
        );
        assert_eq!(
            coupon_discount(Money::from_rupees(1999), Some(&c), at()),
            Money::ZERO
        );
        assert_eq!(
            coupon_discount(Money::from_rupees(2000), Some(&c), at()),
            Money::from_rupees(100)
        );
    }

    #[test]
    fn test_invalid_coupon_contributes_nothing() {
        let mut c = coupon(Discount::Fixed(Money::from_rupees(100)), Money::ZERO);

        assert_eq!(
            coupon_discount(Money::from_rupees(3000), Some(&c), c.expires_at + Duration::days(1)),
            Money::ZERO
        );

        c.is_active = false;
        assert_eq!(
            coupon_discount(Money::from_rupees(3000), Some(&c), at()),
            Money::ZERO
        );

        c.is_active = true;
        c.current_usage = c.max_usage;
        assert_eq!(
            coupon_discount(Money::from_rupees(3000), Some(&c), at()),
            Money::ZERO
        );

        assert_eq!(coupon_discount(Money::from_rupees(3000), None, at()), Money::ZERO);
    }

    #[test]
    fn test_discounts_stack() {
        // Rs 6000 cart, first-time buyer: 15% tier + 15% first-time
        let lines = [line(2000, 3)];
        let breakdown = price_cart(&lines, true, None, &PricingConfig::default(), at());

        assert_eq!(breakdown.subtotal, Money::from_rupees(6000));
        assert_eq!(breakdown.order_value_discount, Money::from_rupees(900));
        assert_eq!(breakdown.first_time_discount, Money::from_rupees(900));
        assert_eq!(breakdown.coupon_discount, Money::ZERO);
        assert_eq!(breakdown.total_discount(), Money::from_rupees(1800));
        // Free shipping at this subtotal
        assert_eq!(breakdown.shipping_fee, Money::ZERO);
        assert_eq!(breakdown.total_amount(), Money::from_rupees(4200));
    }

    #[test]
    fn test_all_three_discounts_present() {
        let c = coupon(Discount::Fixed(Money::from_rupees(200)), Money::ZERO);
        let lines = [line(1250, 2)]; // Rs 2500
        let breakdown = price_cart(&lines, true, Some(&c), &PricingConfig::default(), at());

        assert_eq!(breakdown.coupon_discount, Money::from_rupees(200));
        assert_eq!(breakdown.order_value_discount, Money::from_rupees(250)); // 10%
        assert_eq!(breakdown.first_time_discount, Money::from_rupees(375)); // 15%
        assert_eq!(breakdown.total_discount(), Money::from_rupees(825));
        assert_eq!(breakdown.shipping_fee, Money::from_rupees(50));
        assert_eq!(breakdown.total_amount(), Money::from_rupees(1725));
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let c = coupon(Discount::Percentage(Rate::from_percent(10)), Money::ZERO);
        let lines = [line(850, 2), line(1300, 4)];
        let config = PricingConfig::default();

        let first = price_cart(&lines, true, Some(&c), &config, at());
        let second = price_cart(&lines, true, Some(&c), &config, at());
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_cart_breakdown() {
        let breakdown = price_cart(&[], true, None, &PricingConfig::default(), at());
        assert_eq!(breakdown.subtotal, Money::ZERO);
        // Base fee applies below the free-shipping threshold, even at zero;
        // the Settlement Workflow rejects empty carts before this matters.
        assert_eq!(breakdown.shipping_fee, Money::from_rupees(50));
        assert_eq!(breakdown.total_discount(), Money::ZERO);
    }

    /// Stacked discounts can exceed subtotal plus shipping; the total goes
    /// negative and nothing clamps it. This documents intentional behavior.
    #[test]
    fn test_total_can_go_negative_documented() {
        let c = coupon(Discount::Fixed(Money::from_rupees(950)), Money::ZERO);
        let lines = [line(1000, 1)];
        let breakdown = price_cart(&lines, true, Some(&c), &PricingConfig::default(), at());

        assert_eq!(breakdown.subtotal, Money::from_rupees(1000));
        assert_eq!(breakdown.coupon_discount, Money::from_rupees(950));
        assert_eq!(breakdown.order_value_discount, Money::from_rupees(50)); // 5%
        assert_eq!(breakdown.first_time_discount, Money::from_rupees(150)); // 15%
        assert_eq!(breakdown.shipping_fee, Money::from_rupees(50));

        // 1000 − 1150 + 50 = −100
        let total = breakdown.total_amount();
        assert!(total.is_negative());
        assert_eq!(total, Money::from_rupees(-100));
    }

    #[test]
    fn test_config_knobs_are_respected() {
        let config = PricingConfig {
            free_shipping_threshold: Money::from_rupees(1000),
            base_shipping_fee: Money::from_rupees(25),
            bulk_item_threshold: 2,
            per_extra_item_fee: Money::from_rupees(5),
            value_tiers: vec![ValueTier {
                min_subtotal: Money::from_rupees(500),
                rate: Rate::from_percent(20),
            }],
            first_time_rate: Rate::from_percent(10),
        };

        assert_eq!(shipping_fee(Money::from_rupees(1000), 1, &config), Money::ZERO);
        assert_eq!(
            shipping_fee(Money::from_rupees(999), 4, &config),
            Money::from_rupees(35)
        );
        assert_eq!(
            order_value_discount(Money::from_rupees(500), &config),
            Money::from_rupees(100)
        );
        assert_eq!(
            first_time_discount(Money::from_rupees(500), true, &config),
            Money::from_rupees(50)
        );
    }
}
