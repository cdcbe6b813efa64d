//! # Shopping Cart
//!
//! One cart per customer, created with the customer and reused across
//! orders (settlement empties it rather than deleting it).
//!
//! ## Live Pricing
//! Cart lines hold a book id and a quantity, never a price. Prices are
//! resolved against the catalog every time the cart is viewed or
//! settled, so a price change between adding and paying shows up
//! immediately; totals only freeze onto the order at settlement.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Operations                                   │
//! │                                                                         │
//! │  Storefront Action         Engine Call              Cart Change         │
//! │  ─────────────────         ───────────              ───────────         │
//! │                                                                         │
//! │  Add to cart ────────────► add_to_cart() ─────────► merge + stock cap   │
//! │                                                                         │
//! │  Change quantity ────────► update_cart_quantity() ► set (0 removes)     │
//! │                                                                         │
//! │  Remove line ────────────► remove_from_cart() ────► items.retain(..)    │
//! │                                                                         │
//! │  Apply coupon ───────────► apply_coupon() ────────► applied_coupon=id   │
//! │                                                                         │
//! │  Place order ────────────► settle_order() ────────► clear()             │
//! │                                                                         │
//! │  NOTE: every operation runs under the store-wide lock; the cart is      │
//! │        never touched outside it.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kitab_core::{
    validation, Book, CoreError, CoreResult, Money, PriceBreakdown, MAX_CART_LINES,
    MAX_COPIES_PER_LINE,
};

// =============================================================================
// Cart Item
// =============================================================================

/// One cart line.
///
/// ## Design Notes
/// - `book_id`: reference into the catalog, resolved on every view
/// - No price snapshot. The storefront quotes live prices until the
///   moment of settlement; only the order freezes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    /// Book ID (UUID)
    pub book_id: String,

    /// Copies requested
    pub quantity: i64,

    /// When this line was first added
    pub added_at: DateTime<Utc>,
}

// =============================================================================
// Cart
// =============================================================================

/// A customer's shopping cart.
///
/// ## Invariants
/// - Lines are unique by `book_id` (adding the same book merges)
/// - Line quantity is at least 1 (setting 0 removes the line)
/// - At most `MAX_CART_LINES` lines, `MAX_COPIES_PER_LINE` copies each
/// - `applied_coupon` holds a coupon id, not a code; the code is
///   re-resolved and re-validated at settlement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Owning customer (UUID)
    pub customer_id: String,

    /// Lines in the cart
    pub items: Vec<CartItem>,

    /// Coupon attached via apply_coupon, if any
    pub applied_coupon: Option<String>,

    /// When the cart was created/last cleared
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty cart for a customer.
    pub fn new(customer_id: &str, at: DateTime<Utc>) -> Self {
        Cart {
            customer_id: customer_id.to_string(),
            items: Vec::new(),
            applied_coupon: None,
            created_at: at,
        }
    }

    /// Adds copies of a book, merging with an existing line.
    ///
    /// ## Behavior
    /// - Book already in cart: merge quantities, capped at live stock
    ///   and at the per-line ceiling. A line already at (or past, after
    ///   stock drift) the stock level stays unchanged; the add is a
    ///   quiet no-op, as on the shelves page ("stock limit reached").
    /// - New line: quantity capped at live stock; a book with no stock
    ///   at all is rejected instead of entering the cart at zero.
    ///
    /// ## Returns
    /// The resulting line quantity.
    pub fn add_item(&mut self, book: &Book, quantity: i64, at: DateTime<Utc>) -> CoreResult<i64> {
        validation::validate_quantity(quantity)?;

        if let Some(item) = self.items.iter_mut().find(|i| i.book_id == book.id) {
            if item.quantity >= book.stock {
                return Ok(item.quantity);
            }
            let merged = item.quantity + quantity;
            item.quantity = merged.min(book.stock).min(MAX_COPIES_PER_LINE);
            return Ok(item.quantity);
        }

        if self.items.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }
        if book.stock <= 0 {
            return Err(CoreError::InsufficientStock {
                title: book.title.clone(),
                available: book.stock,
                requested: quantity,
            });
        }

        let capped = quantity.min(book.stock);
        self.items.push(CartItem {
            book_id: book.id.clone(),
            quantity: capped,
            added_at: at,
        });
        Ok(capped)
    }

    /// Sets a line's quantity outright.
    ///
    /// ## Behavior
    /// - Quantity 0: removes the line
    /// - Line absent: error, before any quantity checks run
    /// - Quantity above live stock: rejected with the shortfall
    pub fn update_quantity(&mut self, book: &Book, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(&book.id);
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.book_id == book.id)
            .ok_or_else(|| CoreError::CartItemNotFound(book.id.clone()))?;

        validation::validate_quantity(quantity)?;
        if quantity > book.stock {
            return Err(CoreError::InsufficientStock {
                title: book.title.clone(),
                available: book.stock,
                requested: quantity,
            });
        }

        item.quantity = quantity;
        Ok(())
    }

    /// Removes a line by book ID.
    pub fn remove_item(&mut self, book_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.book_id != book_id);

        if self.items.len() == initial_len {
            Err(CoreError::CartItemNotFound(book_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Empties the cart and drops any attached coupon.
    ///
    /// Settlement calls this after the order is written; the coupon
    /// does not survive into the next shopping session.
    pub fn clear(&mut self, at: DateTime<Utc>) {
        self.items.clear();
        self.applied_coupon = None;
        self.created_at = at;
    }

    /// Returns the number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total copies across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Looks up the quantity of a line, if present.
    pub fn quantity_of(&self, book_id: &str) -> Option<i64> {
        self.items
            .iter()
            .find(|i| i.book_id == book_id)
            .map(|i| i.quantity)
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Cart View DTO
// =============================================================================

/// One priced line in a cart view, resolved against the live catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub line_subtotal: Money,
}

/// Fully priced cart snapshot for API responses.
///
/// Totals come from the Pricing Calculator; this struct only lays them
/// out. Valid for the instant it was assembled: prices, stock, and
/// coupon state may drift afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total_quantity: i64,
    pub applied_coupon_code: Option<String>,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub coupon_discount: Money,
    pub order_value_discount: Money,
    pub first_time_discount: Money,
    pub total_discount: Money,
    pub total_amount: Money,
}

impl CartView {
    /// Lays a computed price breakdown over resolved lines.
    pub fn from_parts(
        lines: Vec<CartLine>,
        applied_coupon_code: Option<String>,
        breakdown: &PriceBreakdown,
    ) -> Self {
        CartView {
            total_quantity: lines.iter().map(|l| l.quantity).sum(),
            lines,
            applied_coupon_code,
            subtotal: breakdown.subtotal,
            shipping_fee: breakdown.shipping_fee,
            coupon_discount: breakdown.coupon_discount,
            order_value_discount: breakdown.order_value_discount,
            first_time_discount: breakdown.first_time_discount,
            total_discount: breakdown.total_discount(),
            total_amount: breakdown.total_amount(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kitab_core::Money;

    fn base_time() -> DateTime<Utc> {
        "2025-06-01T12:00:00Z".parse().unwrap()
    }

    fn test_book(id: &str, price_paisa: i64, stock: i64) -> Book {
        Book {
            id: id.to_string(),
            title: format!("Book {}", id),
            author: "Test Author".to_string(),
            price: Money::from_paisa(price_paisa),
            stock,
            created_at: base_time(),
        }
    }

    #[test]
    fn test_add_item_merges_quantities() {
        let mut cart = Cart::new("cust-1", base_time());
        let book = test_book("b1", 99_900, 10);

        cart.add_item(&book, 2, base_time()).unwrap();
        cart.add_item(&book, 3, base_time()).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_add_item_caps_at_stock() {
        let mut cart = Cart::new("cust-1", base_time());
        let book = test_book("b1", 99_900, 3);

        let qty = cart.add_item(&book, 5, base_time()).unwrap();
        assert_eq!(qty, 3);

        // Already at the stock level: quiet no-op.
        let qty = cart.add_item(&book, 1, base_time()).unwrap();
        assert_eq!(qty, 3);
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_add_out_of_stock_book_rejected() {
        let mut cart = Cart::new("cust-1", base_time());
        let book = test_book("b1", 99_900, 0);

        let err = cart.add_item(&book, 1, base_time()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 0, .. }
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_zero_removes_line() {
        let mut cart = Cart::new("cust-1", base_time());
        let book = test_book("b1", 99_900, 10);

        cart.add_item(&book, 2, base_time()).unwrap();
        cart.update_quantity(&book, 0).unwrap();

        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_bounded_by_stock() {
        let mut cart = Cart::new("cust-1", base_time());
        let book = test_book("b1", 99_900, 4);

        cart.add_item(&book, 2, base_time()).unwrap();
        let err = cart.update_quantity(&book, 5).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 4,
                requested: 5,
                ..
            }
        ));
        assert_eq!(cart.quantity_of("b1"), Some(2));

        cart.update_quantity(&book, 4).unwrap();
        assert_eq!(cart.quantity_of("b1"), Some(4));
    }

    #[test]
    fn test_update_quantity_absent_line_reported_first() {
        let mut cart = Cart::new("cust-1", base_time());
        let book = test_book("b1", 99_900, 3);

        // The miss wins even when the quantity would also fail the
        // stock check.
        let err = cart.update_quantity(&book, 5).unwrap_err();
        assert!(matches!(err, CoreError::CartItemNotFound(_)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_missing_line_errors() {
        let mut cart = Cart::new("cust-1", base_time());
        let err = cart.remove_item("nope").unwrap_err();
        assert!(matches!(err, CoreError::CartItemNotFound(_)));
    }

    #[test]
    fn test_clear_drops_coupon() {
        let mut cart = Cart::new("cust-1", base_time());
        let book = test_book("b1", 99_900, 10);

        cart.add_item(&book, 2, base_time()).unwrap();
        cart.applied_coupon = Some("coupon-1".to_string());

        cart.clear(base_time());
        assert!(cart.is_empty());
        assert!(cart.applied_coupon.is_none());
    }

    #[test]
    fn test_line_cap() {
        let mut cart = Cart::new("cust-1", base_time());
        for n in 0..MAX_CART_LINES {
            let book = test_book(&format!("b{}", n), 10_000, 5);
            cart.add_item(&book, 1, base_time()).unwrap();
        }

        let one_too_many = test_book("overflow", 10_000, 5);
        let err = cart.add_item(&one_too_many, 1, base_time()).unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { .. }));
    }
}
