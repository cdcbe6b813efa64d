//! # Validation Module
//!
//! Input validation utilities for the Kitab storefront.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Presentation (web form / admin screen)                        │
//! │  ├── Basic format checks (empty, length)                                │
//! │  └── Immediate user feedback                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE + entity constructors                             │
//! │  ├── Field rules (required, bounds, normalization)                      │
//! │  └── Runs BEFORE any workflow touches state, so a rejection             │
//! │      never leaves partial effects                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Business rules (engine workflows)                             │
//! │  ├── Stock sufficiency, coupon validity, status transitions             │
//! │  └── Typed CoreError variants, atomic aborts                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kitab_core::validation::{normalize_coupon_code, validate_quantity};
//!
//! let code = normalize_coupon_code("  bookworm10 ").unwrap();
//! assert_eq!(code, "BOOKWORM10");
//!
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{DeliveryDetails, Discount};
use crate::MAX_COPIES_PER_LINE;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn require(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a book title.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_title(title: &str) -> ValidationResult<()> {
    require("title", title, 200)
}

/// Validates an author name.
pub fn validate_author(author: &str) -> ValidationResult<()> {
    require("author", author, 120)
}

/// Validates a customer name.
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    require("name", name, 100)
}

/// Validates a contact phone number.
///
/// Length only; number format belongs to the presentation layer, which
/// knows the local conventions.
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    require("phone", phone, 15)
}

/// Validates a delivery address.
pub fn validate_address(address: &str) -> ValidationResult<()> {
    require("address", address, 500)
}

/// Normalizes and validates a coupon code.
///
/// Codes are matched case-insensitively: both registration and lookup
/// funnel through this, so "bookworm10" and "BOOKWORM10" are the same
/// coupon.
///
/// ## Returns
/// The trimmed, uppercased code.
///
/// ## Example
/// ```rust
/// use kitab_core::validation::normalize_coupon_code;
///
/// assert_eq!(normalize_coupon_code(" save50 ").unwrap(), "SAVE50");
/// assert!(normalize_coupon_code("   ").is_err());
/// ```
pub fn normalize_coupon_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "coupon code".to_string(),
        });
    }

    if code.len() > 40 {
        return Err(ValidationError::TooLong {
            field: "coupon code".to_string(),
            max: 40,
        });
    }

    Ok(code.to_uppercase())
}

// =============================================================================
// Delivery Validator
// =============================================================================

/// Validates a full set of delivery details.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Checkout form submitted                                                │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_delivery(&details) ← THIS FUNCTION                            │
/// │       │                                                                 │
/// │       ├── recipient empty? → "recipient is required"                    │
/// │       ├── phone > 15 chars? → "phone must be at most 15 characters"     │
/// │       ├── address empty?   → "address is required"                      │
/// │       │                                                                 │
/// │       └── OK → settlement proceeds (no state touched before this)       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_delivery(details: &DeliveryDetails) -> ValidationResult<()> {
    require("recipient", &details.recipient, 100)?;
    validate_phone(&details.phone)?;
    validate_address(&details.address)?;

    if let Some(notes) = &details.notes {
        if notes.len() > 500 {
            return Err(ValidationError::TooLong {
                field: "notes".to_string(),
                max: 500,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_COPIES_PER_LINE (99)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_COPIES_PER_LINE {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_COPIES_PER_LINE,
        });
    }

    Ok(())
}

/// Validates a book price.
///
/// ## Rules
/// - Must be non-negative (zero allowed: promotional freebies)
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates an initial stock level.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "stock".to_string(),
        });
    }

    Ok(())
}

/// Validates a coupon's discount shape.
///
/// ## Rules
/// - Fixed: the amount off must be positive
/// - Percentage: 0.01% to 100% (1 to 10000 basis points); more than
///   100% would discount beyond the subtotal
pub fn validate_discount(discount: &Discount) -> ValidationResult<()> {
    match discount {
        Discount::Fixed(value) => {
            if !value.is_positive() {
                return Err(ValidationError::MustBePositive {
                    field: "discount value".to_string(),
                });
            }
        }
        Discount::Percentage(rate) => {
            if rate.is_zero() || !rate.is_at_most_full() {
                return Err(ValidationError::OutOfRange {
                    field: "discount rate".to_string(),
                    min: 1,
                    max: 10_000,
                });
            }
        }
    }

    Ok(())
}

/// Validates a coupon's usage allowance.
pub fn validate_max_usage(max_usage: u32) -> ValidationResult<()> {
    if max_usage == 0 {
        return Err(ValidationError::MustBePositive {
            field: "max usage".to_string(),
        });
    }

    Ok(())
}

/// Validates a coupon's minimum purchase threshold.
pub fn validate_min_purchase(min_purchase: Money) -> ValidationResult<()> {
    if min_purchase.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: "minimum purchase".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
