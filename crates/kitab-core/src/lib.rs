//! # kitab-core: Pure Business Logic for the Kitab Bookstore
//!
//! This crate is the **heart** of the storefront's pricing and settlement
//! engine. It contains all business logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Kitab Storefront Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Presentation (web / admin)                     │   │
//! │  │    Browse ──► Cart UI ──► Checkout UI ──► Order History         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               kitab-checkout (Settlement Engine)                │   │
//! │  │    carts, stock ledger, coupon registry, settlement,            │   │
//! │  │    cancellation - one store lock, atomic workflows              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kitab-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │ validation│  │   │
//! │  │   │   Book    │  │   Money   │  │ tiers     │  │   rules   │  │   │
//! │  │   │  Coupon   │  │   Rate    │  │ shipping  │  │  checks   │  │   │
//! │  │   │   Order   │  │ rounding  │  │ stacking  │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CLOCK READS • NO SHARED STATE • PURE FUNCTIONS   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Book, Coupon, Order, Payment, etc.)
//! - [`money`] - Money and Rate types with integer arithmetic (no floats!)
//! - [`pricing`] - The Pricing Calculator: shipping and the three discounts
//! - [`error`] - The domain error taxonomy
//! - [`validation`] - Field validation and normalization
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic; the validity instant is always a
//!    parameter, never read from a clock
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are paisa (i64); rates are
//!    basis points (u32)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use kitab_core::money::Money;
//! use kitab_core::pricing::{price_cart, LineItem, PricingConfig};
//!
//! let lines = [LineItem {
//!     unit_price: Money::from_rupees(2000),
//!     quantity: 3,
//! }];
//!
//! // Rs 6000, first-time buyer: 15% tier and 15% first-time stack
//! let breakdown = price_cart(&lines, true, None, &PricingConfig::default(), Utc::now());
//! assert_eq!(breakdown.order_value_discount, Money::from_rupees(900));
//! assert_eq!(breakdown.first_time_discount, Money::from_rupees(900));
//! assert_eq!(breakdown.total_amount(), Money::from_rupees(4200));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use kitab_core::Money` instead of
// `use kitab_core::money::Money`

pub use error::{CoreError, CoreResult, CouponRejection, ErrorKind, ValidationError};
pub use money::{Money, Rate};
pub use pricing::{LineItem, PriceBreakdown, PricingConfig};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and keeps settlement transactions bounded.
pub const MAX_CART_LINES: usize = 50;

/// Maximum copies of a single book per cart line
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 100 instead of 10);
/// wholesale orders go through a different channel.
pub const MAX_COPIES_PER_LINE: i64 = 99;
