//! # Domain Types
//!
//! Core domain types used throughout the Kitab storefront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Book       │   │     Coupon      │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  title, author  │   │  code (unique)  │   │  name, phone    │       │
//! │  │  price (Money)  │   │  discount       │   │  address        │       │
//! │  │  stock (>= 0)   │   │  usage counters │   │  first-time flag│       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │   OrderItem     │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  frozen totals  │   │  frozen price   │   │  method, status │       │
//! │  │  status machine │   │  snapshot       │   │  transaction id │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Live vs Frozen
//! Cart-side figures are always recomputed from current book prices; the
//! Order family snapshots everything at settlement time and never
//! recomputes. Both worlds meet in the Settlement Workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CouponRejection;
use crate::money::{Money, Rate};
use crate::validation::{self, ValidationResult};

// =============================================================================
// Book
// =============================================================================

/// A book in the catalog.
///
/// Created and edited by catalog management; the engine only reads the
/// price and moves `stock` through the Stock Ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display title, shown in carts and frozen onto order lines.
    pub title: String,

    /// Author name.
    pub author: String,

    /// Current sale price. Cart lines always read this live.
    pub price: Money,

    /// Copies available. Never negative; mutated only by the ledger.
    pub stock: i64,

    /// When the book entered the catalog.
    pub created_at: DateTime<Utc>,
}

impl Book {
    /// Creates a catalog entry, validating the fields.
    pub fn new(
        title: &str,
        author: &str,
        price: Money,
        stock: i64,
        at: DateTime<Utc>,
    ) -> ValidationResult<Self> {
        validation::validate_title(title)?;
        validation::validate_author(author)?;
        validation::validate_price(price)?;
        validation::validate_stock(stock)?;

        Ok(Book {
            id: Uuid::new_v4().to_string(),
            title: title.trim().to_string(),
            author: author.trim().to_string(),
            price,
            stock,
            created_at: at,
        })
    }

    /// Checks whether the catalog can supply `quantity` copies right now.
    #[inline]
    pub fn has_stock(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A storefront customer.
///
/// Identity and authentication live elsewhere; the engine cares about the
/// delivery defaults and the first-time-buyer flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub address: String,

    /// True until the customer's first successful settlement, then false
    /// forever. Cancelling that order does NOT restore the flag; the
    /// first-purchase discount is consumed by the settlement itself.
    pub is_first_time_buyer: bool,

    pub registered_at: DateTime<Utc>,
}

impl Customer {
    /// Registers a customer. New customers always start as first-time buyers.
    pub fn new(name: &str, phone: &str, address: &str, at: DateTime<Utc>) -> ValidationResult<Self> {
        validation::validate_customer_name(name)?;
        validation::validate_phone(phone)?;
        validation::validate_address(address)?;

        Ok(Customer {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            phone: phone.trim().to_string(),
            address: address.trim().to_string(),
            is_first_time_buyer: true,
            registered_at: at,
        })
    }
}

// =============================================================================
// Discount
// =============================================================================

/// The two coupon discount shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Discount {
    /// A fixed amount off, capped at the subtotal so a large voucher
    /// never takes a cart negative on its own.
    Fixed(Money),
    /// A percentage of the subtotal.
    Percentage(Rate),
}

impl Discount {
    /// The discount amount this shape yields against a subtotal.
    pub fn amount_for(&self, subtotal: Money) -> Money {
        match self {
            Discount::Fixed(value) => (*value).min(subtotal),
            Discount::Percentage(rate) => subtotal.apply_rate(*rate),
        }
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// A discount coupon.
///
/// `current_usage` moves only through the Coupon Registry: +1 on
/// redemption, -1 on cancellation reversal, each paired 1:1 with a
/// [`CouponUsage`] record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub id: String,

    /// Unique code, stored uppercase. Lookups normalize the same way.
    pub code: String,

    pub discount: Discount,

    /// How many redemptions the coupon allows in total.
    pub max_usage: u32,

    /// Redemptions consumed so far. Invariant: `<= max_usage`.
    pub current_usage: u32,

    /// Minimum cart subtotal required to apply the coupon.
    pub min_purchase: Money,

    pub expires_at: DateTime<Utc>,

    /// Kill switch for catalog management; checked before anything else.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Creates a coupon, validating and normalizing the fields.
    pub fn new(
        code: &str,
        discount: Discount,
        max_usage: u32,
        min_purchase: Money,
        expires_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> ValidationResult<Self> {
        let code = validation::normalize_coupon_code(code)?;
        validation::validate_discount(&discount)?;
        validation::validate_max_usage(max_usage)?;
        validation::validate_min_purchase(min_purchase)?;

        Ok(Coupon {
            id: Uuid::new_v4().to_string(),
            code,
            discount,
            max_usage,
            current_usage: 0,
            min_purchase,
            expires_at,
            is_active: true,
            created_at: at,
        })
    }

    /// Checks whether the coupon can be used at the given instant.
    ///
    /// Reasons are checked in a fixed order and the first failure wins:
    /// inactive, then usage limit, then expiry. The order is observable
    /// (an inactive AND expired coupon reports "inactive") and tested.
    pub fn validate(&self, at: DateTime<Utc>) -> Result<(), CouponRejection> {
        if !self.is_active {
            return Err(CouponRejection::Inactive);
        }
        if self.current_usage >= self.max_usage {
            return Err(CouponRejection::UsageLimitReached);
        }
        if at > self.expires_at {
            return Err(CouponRejection::Expired);
        }
        Ok(())
    }

    /// The discount amount against a subtotal, ignoring validity and
    /// minimum purchase. Callers gate on [`Coupon::validate`] and
    /// `min_purchase` first; the Pricing Calculator does both.
    #[inline]
    pub fn discount_on(&self, subtotal: Money) -> Money {
        self.discount.amount_for(subtotal)
    }
}

// =============================================================================
// Coupon Usage
// =============================================================================

/// Join record tying one redemption to one order.
///
/// At most one exists per (coupon, order) pair; the registry checks
/// before inserting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponUsage {
    pub id: String,
    pub coupon_id: String,
    pub customer_id: String,
    pub order_id: String,
    pub used_at: DateTime<Utc>,
}

// =============================================================================
// Delivery Details
// =============================================================================

/// Where and to whom an order ships.
///
/// Validated by [`crate::validation::validate_delivery`] before
/// settlement touches any state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryDetails {
    pub recipient: String,
    pub phone: String,
    pub address: String,
    pub notes: Option<String>,
}

// =============================================================================
// Order Status
// =============================================================================

/// The order lifecycle.
///
/// ```text
/// Pending ──► Confirmed ──► Shipped ──► Delivered (terminal)
///    │            │
///    └────────────┴──► Cancelled (terminal, workflow only)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, payment not yet confirmed.
    Pending,
    /// Payment confirmed (card settled, or cash collected later).
    Confirmed,
    /// Handed to the courier.
    Shipped,
    /// Received by the customer.
    Delivered,
    /// Reversed by the Cancellation Workflow.
    Cancelled,
}

impl OrderStatus {
    /// Whether the cancellation workflow may take this order.
    #[inline]
    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    /// Whether the status is terminal.
    #[inline]
    pub fn is_final(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Delivered)
    }

    /// Whether the state machine allows moving to `next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Shipped)
                | (Confirmed, Cancelled)
                | (Shipped, Delivered)
        )
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A settled order. Immutable snapshot apart from status moves and
/// cancellation metadata.
///
/// The three discount amounts and the shipping fee are frozen at
/// settlement; later coupon or customer changes never touch them. The
/// derived accessors sum only frozen fields, so they are stable too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,

    /// Human-facing sequential reference ("ORD-1001").
    pub order_number: String,

    pub customer_id: String,
    pub status: OrderStatus,
    pub delivery: DeliveryDetails,

    /// Frozen at settlement.
    pub shipping_fee: Money,

    /// Registry reference, kept for cancellation reversal.
    pub coupon_id: Option<String>,

    /// Code text frozen at settlement, for receipts and history even if
    /// the coupon is later renamed or deleted.
    pub coupon_code: Option<String>,

    /// Frozen discount components.
    pub coupon_discount: Money,
    pub order_value_discount: Money,
    pub first_time_discount: Money,

    pub items: Vec<OrderItem>,

    pub placed_at: DateTime<Utc>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Sum of the frozen line subtotals.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(|item| item.subtotal).sum()
    }

    /// Sum of the three frozen discount components.
    pub fn total_discount(&self) -> Money {
        self.coupon_discount + self.order_value_discount + self.first_time_discount
    }

    /// `subtotal - total_discount + shipping_fee`. Not floored at zero.
    pub fn total_amount(&self) -> Money {
        self.subtotal() - self.total_discount() + self.shipping_fee
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A frozen order line.
/// Uses the snapshot pattern: title and unit price are captured at
/// settlement and never follow later catalog edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub book_id: String,
    /// Title at settlement time (frozen).
    pub title: String,
    /// Copies ordered.
    pub quantity: i64,
    /// Price per copy at settlement time (frozen).
    pub unit_price: Money,
    /// `unit_price × quantity` (frozen).
    pub subtotal: Money,
}

// =============================================================================
// Payment Types
// =============================================================================

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery.
    Cash,
    /// Card, validated by the external card collaborator.
    Card,
}

/// Payment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Failed,
    Refunded,
}

/// The payment record, 1:1 with its order, created once at settlement.
///
/// A Paid status at settlement triggers the explicit Pending → Confirmed
/// transition on the order. Cancellation leaves the record untouched;
/// refunds are outside the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Present for card payments: "CARD-{order_id}-{timestamp}".
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
