//! # Stock Ledger
//!
//! Inventory lives on the catalog entry itself (`Book::stock`); these
//! operations are the only code that moves it. All of them run under
//! the store lock, so check-then-decrement cannot interleave and the
//! level never goes below zero.

use tracing::{debug, warn};

use kitab_core::{CoreError, CoreResult, ValidationError};

use crate::store::StoreState;

impl StoreState {
    /// Takes copies out of stock for one order line.
    ///
    /// Fails with the shortfall if the catalog cannot supply the
    /// quantity; on failure nothing changes.
    pub(crate) fn reserve_stock(&mut self, book_id: &str, quantity: i64) -> CoreResult<()> {
        let book = self.book_mut(book_id)?;
        if !book.has_stock(quantity) {
            return Err(CoreError::InsufficientStock {
                title: book.title.clone(),
                available: book.stock,
                requested: quantity,
            });
        }
        book.stock -= quantity;
        debug!(book_id, quantity, remaining = book.stock, "stock reserved");
        Ok(())
    }

    /// Puts copies back when an order is cancelled.
    ///
    /// A book that has left the catalog since settlement is skipped;
    /// the rest of the cancellation proceeds.
    pub(crate) fn restore_stock(&mut self, book_id: &str, quantity: i64) {
        match self.books.get_mut(book_id) {
            Some(book) => {
                book.stock += quantity;
                debug!(book_id, quantity, level = book.stock, "stock restored");
            }
            None => {
                warn!(book_id, quantity, "book gone from catalog, stock not restored");
            }
        }
    }

    /// Admin restock: adds a delivery to the shelf and returns the new
    /// level.
    pub(crate) fn restock(&mut self, book_id: &str, quantity: i64) -> CoreResult<i64> {
        if quantity <= 0 {
            return Err(CoreError::Validation(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }));
        }
        let book = self.book_mut(book_id)?;
        book.stock += quantity;
        debug!(book_id, quantity, level = book.stock, "restocked");
        Ok(book.stock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use kitab_core::{Book, Money};

    fn base_time() -> DateTime<Utc> {
        "2025-06-01T12:00:00Z".parse().unwrap()
    }

    fn state_with_book(stock: i64) -> (StoreState, String) {
        let mut state = StoreState::new();
        let book =
            Book::new("Udaas Naslain", "Abdullah Hussain", Money::from_rupees(799), stock, base_time())
                .unwrap();
        let id = state.insert_book(book).id;
        (state, id)
    }

    #[test]
    fn test_reserve_decrements() {
        let (mut state, id) = state_with_book(5);
        state.reserve_stock(&id, 3).unwrap();
        assert_eq!(state.book(&id).unwrap().stock, 2);
    }

    #[test]
    fn test_reserve_shortfall_changes_nothing() {
        let (mut state, id) = state_with_book(1);
        let err = state.reserve_stock(&id, 3).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 1,
                requested: 3,
                ..
            }
        ));
        assert_eq!(state.book(&id).unwrap().stock, 1);
    }

    #[test]
    fn test_restore_increments() {
        let (mut state, id) = state_with_book(5);
        state.reserve_stock(&id, 3).unwrap();
        state.restore_stock(&id, 3);
        assert_eq!(state.book(&id).unwrap().stock, 5);
    }

    #[test]
    fn test_restore_skips_vanished_book() {
        let (mut state, id) = state_with_book(5);
        state.books.remove(&id);
        // Must not panic or resurrect the entry.
        state.restore_stock(&id, 3);
        assert!(state.book(&id).is_err());
    }

    #[test]
    fn test_restock() {
        let (mut state, id) = state_with_book(2);
        let level = state.restock(&id, 10).unwrap();
        assert_eq!(level, 12);

        let err = state.restock(&id, 0).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_reserve_unknown_book() {
        let mut state = StoreState::new();
        assert!(matches!(
            state.reserve_stock("ghost", 1).unwrap_err(),
            CoreError::BookNotFound(_)
        ));
    }
}
