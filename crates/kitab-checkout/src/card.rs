//! # Card Validation Seam
//!
//! Card-number rules (checksum, expiry windows, CVV shapes, brand
//! detection) live in an external collaborator. The engine consumes a
//! pass/fail verdict through the [`CardValidator`] trait and never
//! inspects the number itself; the only thing it keeps is the masked
//! form for the receipt.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  settle_order(..., Card(details))                                       │
//! │       │                                                                 │
//! │       ├── details.validate_presence()      (fields filled in at all?)   │
//! │       │                                                                 │
//! │       ├── CardValidator::validate(&details) ──► Err(CardDecline)        │
//! │       │         (external collaborator)           │                     │
//! │       │                                           ▼                     │
//! │       │                              abort BEFORE any state change      │
//! │       ▼                                                                 │
//! │  proceed; receipt carries details.masked_number() only                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use kitab_core::validation::ValidationResult;
use kitab_core::ValidationError;

// =============================================================================
// Card Details
// =============================================================================

/// Raw card fields as submitted at checkout.
///
/// Holds the PAN in memory only for the duration of the settlement call;
/// nothing in the engine stores or serializes it.
#[derive(Clone, Deserialize)]
pub struct CardDetails {
    pub number: String,
    pub holder_name: String,
    /// "MM/YY" as typed; the collaborator parses it.
    pub expiry: String,
    pub cvv: String,
}

impl CardDetails {
    /// Checks that every field was submitted at all.
    ///
    /// Anything beyond presence (checksum, expiry in the past, CVV
    /// length) is the collaborator's job.
    pub fn validate_presence(&self) -> ValidationResult<()> {
        for (field, value) in [
            ("card number", &self.number),
            ("card holder name", &self.holder_name),
            ("card expiry", &self.expiry),
            ("card cvv", &self.cvv),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }

    /// The only form of the number that leaves this type:
    /// `**** **** **** 1234`.
    pub fn masked_number(&self) -> String {
        let digits: String = self.number.chars().filter(|c| c.is_ascii_digit()).collect();
        let last4 = &digits[digits.len().saturating_sub(4)..];
        format!("**** **** **** {last4}")
    }
}

/// Debug masks the PAN and CVV so traces never carry them.
impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &self.masked_number())
            .field("holder_name", &self.holder_name)
            .field("expiry", &self.expiry)
            .field("cvv", &"***")
            .finish()
    }
}

// =============================================================================
// Validator Trait
// =============================================================================

/// Why the collaborator declined a card.
///
/// The reason taxonomy belongs to the collaborator; the engine carries
/// the text through into `CoreError::CardValidationFailed` untouched.
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct CardDecline {
    pub reason: String,
}

impl CardDecline {
    pub fn new(reason: impl Into<String>) -> Self {
        CardDecline {
            reason: reason.into(),
        }
    }
}

/// The external card-validation collaborator.
///
/// Injected into the engine as `Arc<dyn CardValidator>`; `Send + Sync`
/// because settlements run from any thread.
pub trait CardValidator: Send + Sync {
    fn validate(&self, card: &CardDetails) -> Result<(), CardDecline>;
}

/// Approves every card.
///
/// Gateway integration is out of scope; deployments without a real
/// validator (and most tests) plug this in, matching the storefront's
/// fabricated-approval behavior.
pub struct ApproveAll;

impl CardValidator for ApproveAll {
    fn validate(&self, _card: &CardDetails) -> Result<(), CardDecline> {
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> CardDetails {
        CardDetails {
            number: "4111 1111 1111 1111".to_string(),
            holder_name: "Ayesha Khan".to_string(),
            expiry: "12/27".to_string(),
            cvv: "123".to_string(),
        }
    }

    #[test]
    fn test_masked_number_keeps_last_four() {
        assert_eq!(card().masked_number(), "**** **** **** 1111");

        let short = CardDetails {
            number: "42".to_string(),
            ..card()
        };
        assert_eq!(short.masked_number(), "**** **** **** 42");
    }

    #[test]
    fn test_presence_validation() {
        assert!(card().validate_presence().is_ok());

        let missing = CardDetails {
            holder_name: "  ".to_string(),
            ..card()
        };
        let err = missing.validate_presence().unwrap_err();
        assert_eq!(err.to_string(), "card holder name is required");
    }

    #[test]
    fn test_debug_never_shows_pan_or_cvv() {
        let rendered = format!("{:?}", card());
        assert!(!rendered.contains("4111 1111 1111 1111"));
        assert!(!rendered.contains("123"));
        assert!(rendered.contains("**** **** **** 1111"));
    }

    #[test]
    fn test_approve_all() {
        assert!(ApproveAll.validate(&card()).is_ok());
    }
}
