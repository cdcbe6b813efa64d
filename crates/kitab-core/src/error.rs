//! # Error Types
//!
//! Domain-specific error types for kitab-core.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kitab-core errors (this file)                                          │
//! │  ├── CoreError        - Domain errors (one enum, whole engine)          │
//! │  ├── ValidationError  - Input validation failures (nested via #[from])  │
//! │  └── CouponRejection  - Why a coupon failed its validity check          │
//! │                                                                         │
//! │  Classification: CoreError::kind() → ErrorKind                          │
//! │  ├── Validation    - bad input, nothing changed          (400-ish)      │
//! │  ├── BusinessRule  - rule violated, workflow aborted     (422-ish)      │
//! │  └── NotFound      - unknown book/customer/order/code    (404-ish)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (book title, order id, amounts)
//! 3. Errors are enum variants, never String
//! 4. Every abort path leaves previously committed state unchanged;
//!    the error only describes what was rejected

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations, missing entities, or
/// rejected input. They should be caught and translated to user-facing
/// messages by the presentation layer, using [`CoreError::kind`] for the
/// response class.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Book cannot be found in the catalog.
    #[error("Book not found: {0}")]
    BookNotFound(String),

    /// Customer cannot be found.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Order cannot be found, or belongs to a different customer.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Payment record cannot be found for the order.
    #[error("Payment not found for order: {0}")]
    PaymentNotFound(String),

    /// Coupon code does not resolve to any coupon.
    #[error("Invalid coupon code: {0}")]
    CouponCodeInvalid(String),

    /// Coupon exists but failed its validity check.
    ///
    /// ## When This Occurs
    /// - Applying a coupon that is inactive, exhausted, or expired
    /// - Settling a cart whose coupon went invalid after it was applied
    ///   (the settlement aborts rather than silently dropping the discount)
    #[error("Coupon cannot be used: {0}")]
    CouponNotValid(CouponRejection),

    /// Cart subtotal is below the coupon's minimum purchase.
    #[error("Minimum purchase of {required} required to use this coupon (cart subtotal is {subtotal})")]
    CouponBelowMinPurchase { required: Money, subtotal: Money },

    /// A usage record already exists for this (coupon, order) pair.
    ///
    /// Redemption is exactly-once per order; fresh order ids make this
    /// unreachable in normal sequencing, but the registry defends anyway.
    #[error("Coupon {coupon_id} already redeemed against order {order_id}")]
    DuplicateCouponUsage { coupon_id: String, order_id: String },

    /// Insufficient stock to settle the order.
    ///
    /// ## When This Occurs
    /// - A cart line requests more copies than the catalog holds
    /// - Raising a cart line's quantity past available stock
    ///
    /// ## User Workflow
    /// ```text
    /// Settle order (3 copies of "Raja Gidh")
    ///      │
    ///      ▼
    /// Ledger check: available=1
    ///      │
    ///      ▼
    /// InsufficientStock { title: "Raja Gidh", available: 1, requested: 3 }
    ///      │
    ///      ▼
    /// Whole settlement aborts; no stock moved, no order created
    /// ```
    #[error("Not enough stock for {title}: available {available}, requested {requested}")]
    InsufficientStock {
        title: String,
        available: i64,
        requested: i64,
    },

    /// Cart has no line for the given book.
    #[error("No cart line for book: {0}")]
    CartItemNotFound(String),

    /// Cart has exceeded the maximum number of distinct lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Settlement requires at least one cart line.
    #[error("Cart is empty")]
    EmptyCart,

    /// Order is in a state the cancellation workflow cannot touch.
    ///
    /// Only Pending and Confirmed orders can be cancelled; Shipped,
    /// Delivered, and already-Cancelled orders stay as they are.
    #[error("Order {order_id} is {status}, cannot be cancelled")]
    NotCancellable { order_id: String, status: String },

    /// Requested order status change is not a legal transition.
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        order_id: String,
        from: String,
        to: String,
    },

    /// The card-validation collaborator declined the card.
    ///
    /// The engine never inspects card numbers itself; it carries the
    /// collaborator's verdict through untouched.
    #[error("Card validation failed: {reason}")]
    CardValidationFailed { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Classifies the error for the presentation layer.
    ///
    /// ## Contract
    /// - `Validation` and `BusinessRule` errors guarantee no state change
    /// - `NotFound` maps to a 404-equivalent
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::BookNotFound(_)
            | CoreError::CustomerNotFound(_)
            | CoreError::OrderNotFound(_)
            | CoreError::PaymentNotFound(_)
            | CoreError::CouponCodeInvalid(_)
            | CoreError::CartItemNotFound(_) => ErrorKind::NotFound,

            CoreError::Validation(_) | CoreError::CardValidationFailed { .. } => {
                ErrorKind::Validation
            }

            CoreError::CouponNotValid(_)
            | CoreError::CouponBelowMinPurchase { .. }
            | CoreError::DuplicateCouponUsage { .. }
            | CoreError::InsufficientStock { .. }
            | CoreError::CartTooLarge { .. }
            | CoreError::EmptyCart
            | CoreError::NotCancellable { .. }
            | CoreError::InvalidStatusTransition { .. } => ErrorKind::BusinessRule,
        }
    }
}

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse error classification for presentation layers.
///
/// Serialized SCREAMING_SNAKE_CASE so HTTP/UI layers can switch on a
/// stable wire value rather than parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Bad user input; nothing was changed.
    Validation,
    /// A business rule rejected the operation; workflow aborted atomically.
    BusinessRule,
    /// Referenced entity does not exist.
    NotFound,
}

// =============================================================================
// Coupon Rejection
// =============================================================================

/// Why a coupon failed its validity check.
///
/// Checked in this fixed order; the first failing check wins:
/// inactive, then usage limit, then expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CouponRejection {
    /// Coupon was deactivated by catalog management.
    #[error("this coupon is inactive")]
    Inactive,

    /// `current_usage` has reached `max_usage`.
    #[error("coupon usage limit reached")]
    UsageLimitReached,

    /// The validity instant is past the coupon's expiry.
    #[error("this coupon has expired")]
    Expired,
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs, and by entity
/// constructors (`Book::new`, `Coupon::new`) to keep invalid records
/// unrepresentable.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Duplicate value (e.g., duplicate coupon code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            title: "Raja Gidh".to_string(),
            available: 1,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "Not enough stock for Raja Gidh: available 1, requested 3"
        );

        let err = CoreError::CouponBelowMinPurchase {
            required: Money::from_rupees(2000),
            subtotal: Money::from_paisa(149_900),
        };
        assert_eq!(
            err.to_string(),
            "Minimum purchase of Rs 2000.00 required to use this coupon (cart subtotal is Rs 1499.00)"
        );
    }

    #[test]
    fn test_coupon_rejection_messages() {
        assert_eq!(
            CoreError::CouponNotValid(CouponRejection::Expired).to_string(),
            "Coupon cannot be used: this coupon has expired"
        );
        assert_eq!(
            CouponRejection::UsageLimitReached.to_string(),
            "coupon usage limit reached"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "recipient".to_string(),
        };
        assert_eq!(err.to_string(), "recipient is required");

        let err = ValidationError::TooLong {
            field: "phone".to_string(),
            max: 15,
        };
        assert_eq!(err.to_string(), "phone must be at most 15 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "address".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            CoreError::BookNotFound("b1".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoreError::CouponCodeInvalid("SAVE50".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(CoreError::EmptyCart.kind(), ErrorKind::BusinessRule);
        assert_eq!(
            CoreError::CardValidationFailed {
                reason: "card number failed checksum".into()
            }
            .kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_error_kind_wire_format() {
        let json = serde_json::to_string(&ErrorKind::BusinessRule).unwrap();
        assert_eq!(json, "\"BUSINESS_RULE\"");
    }
}
