//! # kitab-checkout: Stateful Checkout Layer for Kitab
//!
//! This crate holds everything that changes: the shared store state,
//! carts, the stock ledger, the coupon registry, and the checkout
//! engine that drives settlement and cancellation. All pricing math
//! comes from `kitab-core`; this crate decides WHEN it runs and makes
//! the results stick atomically.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kitab Checkout Flow                              │
//! │                                                                         │
//! │  Caller (HTTP handler, CLI, test)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  kitab-checkout (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌─────────────┐  │   │
//! │  │   │ CheckoutEngine│    │ Store           │    │ card seam   │  │   │
//! │  │   │ (checkout.rs) │───►│ Mutex<StoreState│◄───│ (card.rs)   │  │   │
//! │  │   │               │    │ (store.rs)      │    │             │  │   │
//! │  │   │ carts, coupons│    │ stock ledger    │    │ dyn trait,  │  │   │
//! │  │   │ settle, cancel│    │ coupon registry │    │ injected    │  │   │
//! │  │   └───────────────┘    └────────────────┘    └─────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  kitab-core (Money, pricing, entities, validation, errors)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`checkout`] - The engine: every public workflow
//! - [`cart`] - Cart state and the priced cart view
//! - [`card`] - Card-validation collaborator seam
//! - `store` - Shared state and the lock (crate-internal)
//! - `stock` - Stock ledger operations (crate-internal)
//! - `coupons` - Redemption registry (crate-internal)
//!
//! ## Usage
//!
//! ```rust
//! use kitab_checkout::{CheckoutEngine, PaymentInstruction};
//! use kitab_core::{DeliveryDetails, Money};
//!
//! let engine = CheckoutEngine::default();
//! let customer = engine.add_customer("Ayesha Khan", "03001234567", "12-B Mall Road, Lahore")?;
//! let book = engine.add_book("Raja Gidh", "Bano Qudsia", Money::from_rupees(1200), 10)?;
//!
//! engine.add_to_cart(&customer.id, &book.id, 1)?;
//! let receipt = engine.settle_order(
//!     &customer.id,
//!     DeliveryDetails {
//!         recipient: "Ayesha Khan".to_string(),
//!         phone: "03001234567".to_string(),
//!         address: "12-B Mall Road, Lahore".to_string(),
//!         notes: None,
//!     },
//!     PaymentInstruction::Cash,
//! )?;
//! assert_eq!(receipt.order_number, "ORD-1001");
//! # Ok::<(), kitab_core::CoreError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod card;
pub mod cart;
pub mod checkout;

mod coupons;
mod stock;
mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use card::{ApproveAll, CardDecline, CardDetails, CardValidator};
pub use cart::{Cart, CartItem, CartLine, CartView};
pub use checkout::{
    CheckoutEngine, PaymentInstruction, PaymentSummary, ReceiptLine, SettlementReceipt,
};
