//! # Store State
//!
//! All storefront state behind one lock.
//!
//! ## Thread Safety
//! Every entity map lives in a single `StoreState` guarded by one
//! `Mutex`:
//! 1. Settlement must read AND write books, coupons, carts, orders,
//!    and payments as one atomic step
//! 2. A single lock makes every workflow a serializable transaction;
//!    there is no lock ordering to get wrong
//! 3. Workflows are short and purely in-memory, so the coarse lock is
//!    not a practical bottleneck
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Mutex<StoreState>                                  │
//! │                                                                         │
//! │   books      HashMap<book_id, Book>         (stock ledger lives here)   │
//! │   customers  HashMap<customer_id, Customer>                             │
//! │   coupons    HashMap<coupon_id, Coupon>     (usage counter lives here)  │
//! │   usages     Vec<CouponUsage>               (one row per redemption)    │
//! │   carts      HashMap<customer_id, Cart>     (exactly one per customer)  │
//! │   orders     HashMap<order_id, Order>                                   │
//! │   payments   HashMap<order_id, Payment>     (exactly one per order)     │
//! │   order_seq  u64                            (human-facing numbering)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use kitab_core::{
    Book, Coupon, CouponUsage, CoreError, CoreResult, Customer, Order, Payment, ValidationError,
};

use crate::cart::Cart;

// =============================================================================
// State Container
// =============================================================================

/// Everything the storefront knows, in one place.
///
/// ## Invariants
/// - `carts` has exactly one entry per customer, created with the
///   customer and emptied (never removed) by settlement
/// - `payments` is keyed by order id; every order has exactly one
/// - `order_seq` is bumped inside the apply phase, after validation,
///   so a rejected settlement does not burn a number
#[derive(Debug)]
pub(crate) struct StoreState {
    pub(crate) books: HashMap<String, Book>,
    pub(crate) customers: HashMap<String, Customer>,
    pub(crate) coupons: HashMap<String, Coupon>,
    pub(crate) usages: Vec<CouponUsage>,
    pub(crate) carts: HashMap<String, Cart>,
    pub(crate) orders: HashMap<String, Order>,
    pub(crate) payments: HashMap<String, Payment>,
    order_seq: u64,
}

impl StoreState {
    pub(crate) fn new() -> Self {
        StoreState {
            books: HashMap::new(),
            customers: HashMap::new(),
            coupons: HashMap::new(),
            usages: Vec::new(),
            carts: HashMap::new(),
            orders: HashMap::new(),
            payments: HashMap::new(),
            order_seq: 1000,
        }
    }

    /// Issues the next human-facing order number (`ORD-1001`, ...).
    pub(crate) fn next_order_number(&mut self) -> String {
        self.order_seq += 1;
        format!("ORD-{}", self.order_seq)
    }

    // ===== Entity Accessors =====

    pub(crate) fn book(&self, book_id: &str) -> CoreResult<&Book> {
        self.books
            .get(book_id)
            .ok_or_else(|| CoreError::BookNotFound(book_id.to_string()))
    }

    pub(crate) fn book_mut(&mut self, book_id: &str) -> CoreResult<&mut Book> {
        self.books
            .get_mut(book_id)
            .ok_or_else(|| CoreError::BookNotFound(book_id.to_string()))
    }

    pub(crate) fn customer(&self, customer_id: &str) -> CoreResult<&Customer> {
        self.customers
            .get(customer_id)
            .ok_or_else(|| CoreError::CustomerNotFound(customer_id.to_string()))
    }

    pub(crate) fn customer_mut(&mut self, customer_id: &str) -> CoreResult<&mut Customer> {
        self.customers
            .get_mut(customer_id)
            .ok_or_else(|| CoreError::CustomerNotFound(customer_id.to_string()))
    }

    pub(crate) fn order(&self, order_id: &str) -> CoreResult<&Order> {
        self.orders
            .get(order_id)
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))
    }

    pub(crate) fn order_mut(&mut self, order_id: &str) -> CoreResult<&mut Order> {
        self.orders
            .get_mut(order_id)
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))
    }

    pub(crate) fn payment_for_order(&self, order_id: &str) -> CoreResult<&Payment> {
        self.payments
            .get(order_id)
            .ok_or_else(|| CoreError::PaymentNotFound(order_id.to_string()))
    }

    pub(crate) fn payment_for_order_mut(&mut self, order_id: &str) -> CoreResult<&mut Payment> {
        self.payments
            .get_mut(order_id)
            .ok_or_else(|| CoreError::PaymentNotFound(order_id.to_string()))
    }

    /// The customer's cart. Exists for every registered customer, so a
    /// miss means the customer is unknown.
    pub(crate) fn cart_for(&self, customer_id: &str) -> CoreResult<&Cart> {
        self.customer(customer_id)?;
        self.carts
            .get(customer_id)
            .ok_or_else(|| CoreError::CustomerNotFound(customer_id.to_string()))
    }

    pub(crate) fn cart_for_mut(&mut self, customer_id: &str) -> CoreResult<&mut Cart> {
        self.customer(customer_id)?;
        self.carts
            .get_mut(customer_id)
            .ok_or_else(|| CoreError::CustomerNotFound(customer_id.to_string()))
    }

    // ===== Registration =====

    pub(crate) fn insert_book(&mut self, book: Book) -> Book {
        self.books.insert(book.id.clone(), book.clone());
        book
    }

    /// Registers a customer and creates their (empty) cart with them.
    pub(crate) fn insert_customer(&mut self, customer: Customer, at: DateTime<Utc>) -> Customer {
        self.carts
            .insert(customer.id.clone(), Cart::new(&customer.id, at));
        self.customers.insert(customer.id.clone(), customer.clone());
        customer
    }

    /// Registers a coupon. Codes are unique storewide.
    pub(crate) fn insert_coupon(&mut self, coupon: Coupon) -> CoreResult<Coupon> {
        if self.coupons.values().any(|c| c.code == coupon.code) {
            return Err(CoreError::Validation(ValidationError::Duplicate {
                field: "code".to_string(),
                value: coupon.code,
            }));
        }
        self.coupons.insert(coupon.id.clone(), coupon.clone());
        Ok(coupon)
    }
}

// =============================================================================
// Lock Wrapper
// =============================================================================

/// The engine's handle on the shared state.
///
/// ## Thread Safety
/// Uses `Arc<Mutex<StoreState>>`:
/// - `Arc`: shared ownership across the threads driving the engine
/// - `Mutex`: one workflow in the store at a time
///
/// ## Poisoning
/// A panic while holding the lock poisons it, and every later access
/// panics too. That is deliberate: a panic mid-settlement could leave
/// stock moved but no order written, and serving from that state would
/// be worse than serving nothing.
#[derive(Debug, Clone)]
pub(crate) struct Store {
    state: Arc<Mutex<StoreState>>,
}

impl Store {
    pub(crate) fn new() -> Self {
        Store {
            state: Arc::new(Mutex::new(StoreState::new())),
        }
    }

    /// Executes a function with read access to the state.
    pub(crate) fn with_state<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&StoreState) -> R,
    {
        let state = self.state.lock().expect("Store mutex poisoned");
        f(&state)
    }

    /// Executes a function with write access to the state.
    ///
    /// The closure is the transaction: everything it does is atomic
    /// with respect to every other workflow.
    pub(crate) fn with_state_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut StoreState) -> R,
    {
        let mut state = self.state.lock().expect("Store mutex poisoned");
        f(&mut state)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kitab_core::{Discount, Money, Rate};

    fn base_time() -> DateTime<Utc> {
        "2025-06-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_customer_registration_creates_cart() {
        let mut state = StoreState::new();
        let customer = Customer::new("Ayesha Khan", "03001234567", "12-B Mall Road, Lahore", base_time())
            .unwrap();
        let customer = state.insert_customer(customer, base_time());

        let cart = state.cart_for(&customer.id).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.customer_id, customer.id);
    }

    #[test]
    fn test_duplicate_coupon_code_rejected() {
        let mut state = StoreState::new();
        let expires = "2025-12-31T23:59:59Z".parse().unwrap();

        let first = Coupon::new(
            "EID20",
            Discount::Percentage(Rate::from_percent(20)),
            100,
            Money::ZERO,
            expires,
            base_time(),
        )
        .unwrap();
        state.insert_coupon(first).unwrap();

        // Same code after normalization.
        let second = Coupon::new(
            "  eid20 ",
            Discount::Fixed(Money::from_rupees(100)),
            10,
            Money::ZERO,
            expires,
            base_time(),
        )
        .unwrap();
        let err = state.insert_coupon(second).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: code 'EID20' already exists");
    }

    #[test]
    fn test_order_numbers_are_sequential() {
        let mut state = StoreState::new();
        assert_eq!(state.next_order_number(), "ORD-1001");
        assert_eq!(state.next_order_number(), "ORD-1002");
        assert_eq!(state.next_order_number(), "ORD-1003");
    }

    #[test]
    fn test_missing_entities_report_typed_errors() {
        let state = StoreState::new();
        assert!(matches!(
            state.book("nope").unwrap_err(),
            CoreError::BookNotFound(_)
        ));
        assert!(matches!(
            state.order("nope").unwrap_err(),
            CoreError::OrderNotFound(_)
        ));
        assert!(matches!(
            state.cart_for("nope").unwrap_err(),
            CoreError::CustomerNotFound(_)
        ));
        assert!(matches!(
            state.payment_for_order("nope").unwrap_err(),
            CoreError::PaymentNotFound(_)
        ));
    }

    #[test]
    fn test_store_lock_round_trip() {
        let store = Store::new();
        let book = Book::new("Aag Ka Darya", "Qurratulain Hyder", Money::from_rupees(899), 5, base_time())
            .unwrap();
        let id = store.with_state_mut(|state| state.insert_book(book).id);

        let stock = store.with_state(|state| state.book(&id).unwrap().stock);
        assert_eq!(stock, 5);
    }
}
