//! # Checkout Engine
//!
//! The public surface of the storefront: carts, coupons, settlement,
//! cancellation, and the order/payment queries around them. One engine
//! instance serves every customer; share it as `Arc<CheckoutEngine>`.
//!
//! ## Settlement Shape
//! Settlement is validate-all-then-apply inside a single lock hold.
//! Nothing is written until every check has passed, so a failed
//! settlement leaves the store exactly as it found it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  settle_order(customer, delivery, payment)                              │
//! │                                                                         │
//! │   outside the lock (pure):                                              │
//! │     delivery fields ── card presence ── card collaborator verdict       │
//! │                                                                         │
//! │   under the lock:                                                       │
//! │     VALIDATE   customer ─ cart non-empty ─ freeze lines against         │
//! │                catalog ─ stock per line ─ coupon still valid            │
//! │                │                                                        │
//! │                ├── any failure ──► Err, store untouched                 │
//! │                ▼                                                        │
//! │     APPLY      reserve stock ─ redeem coupon ─ write order ─ write      │
//! │                payment ─ first purchase completes ─ clear cart          │
//! │                │                                                        │
//! │                ▼                                                        │
//! │     SettlementReceipt (frozen totals, masked card, transaction id)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use kitab_core::{
    pricing, validation, Book, CoreError, CoreResult, Coupon, Customer, DeliveryDetails, Discount,
    LineItem, Money, Order, OrderItem, OrderStatus, Payment, PaymentMethod, PaymentStatus,
    PricingConfig,
};

use crate::card::{CardDetails, CardValidator};
use crate::cart::{CartLine, CartView};
use crate::store::{Store, StoreState};

// =============================================================================
// Payment Instruction
// =============================================================================

/// How the customer wants to pay.
///
/// Cash settles as an unpaid Pending order (cash on delivery); Card
/// goes through the validation collaborator and settles paid and
/// Confirmed.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "method", content = "card", rename_all = "snake_case")]
pub enum PaymentInstruction {
    Cash,
    Card(CardDetails),
}

impl PaymentInstruction {
    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentInstruction::Cash => PaymentMethod::Cash,
            PaymentInstruction::Card(_) => PaymentMethod::Card,
        }
    }
}

// =============================================================================
// Settlement Receipt
// =============================================================================

/// One frozen order line on a receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub book_id: String,
    pub title: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_subtotal: Money,
}

/// Payment facts on a receipt. `card_number` is always the masked form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub card_number: Option<String>,
}

/// What a successful settlement hands back.
///
/// Everything here is frozen at settlement; later price or coupon
/// changes never alter it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReceipt {
    pub order_id: String,
    pub order_number: String,
    pub placed_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub lines: Vec<ReceiptLine>,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub coupon_code: Option<String>,
    pub coupon_discount: Money,
    pub order_value_discount: Money,
    pub first_time_discount: Money,
    pub total_discount: Money,
    pub total_amount: Money,
    pub payment: PaymentSummary,
}

// =============================================================================
// Engine
// =============================================================================

/// The storefront engine.
///
/// Every operation locks the store for its whole duration, which is
/// what makes each one a serializable transaction; see `store.rs`.
pub struct CheckoutEngine {
    store: Store,
    pricing: PricingConfig,
    card_validator: Arc<dyn CardValidator>,
}

impl CheckoutEngine {
    pub fn new(pricing: PricingConfig, card_validator: Arc<dyn CardValidator>) -> Self {
        CheckoutEngine {
            store: Store::new(),
            pricing,
            card_validator,
        }
    }
}

/// Default pricing rules with the approve-everything card seam.
impl Default for CheckoutEngine {
    fn default() -> Self {
        Self::new(PricingConfig::default(), Arc::new(crate::card::ApproveAll))
    }
}

// ===== Catalog and Registration =====

impl CheckoutEngine {
    /// Adds a book to the catalog.
    pub fn add_book(
        &self,
        title: &str,
        author: &str,
        price: Money,
        stock: i64,
    ) -> CoreResult<Book> {
        let book = Book::new(title, author, price, stock, Utc::now())?;
        let book = self.store.with_state_mut(|state| state.insert_book(book));
        info!(book_id = %book.id, title = %book.title, "book added");
        Ok(book)
    }

    pub fn get_book(&self, book_id: &str) -> CoreResult<Book> {
        self.store
            .with_state(|state| state.book(book_id).cloned())
    }

    /// Adds a stock delivery; returns the new level.
    pub fn restock(&self, book_id: &str, quantity: i64) -> CoreResult<i64> {
        self.store
            .with_state_mut(|state| state.restock(book_id, quantity))
    }

    /// Catalog price change. Carts quote the new price immediately;
    /// settled orders keep their frozen one.
    pub fn set_book_price(&self, book_id: &str, price: Money) -> CoreResult<Book> {
        validation::validate_price(price)?;
        self.store.with_state_mut(|state| {
            let book = state.book_mut(book_id)?;
            book.price = price;
            Ok(book.clone())
        })
    }

    /// Registers a customer. Their cart is created with them.
    pub fn add_customer(&self, name: &str, phone: &str, address: &str) -> CoreResult<Customer> {
        let customer = Customer::new(name, phone, address, Utc::now())?;
        let customer = self
            .store
            .with_state_mut(|state| state.insert_customer(customer, Utc::now()));
        info!(customer_id = %customer.id, "customer registered");
        Ok(customer)
    }

    pub fn get_customer(&self, customer_id: &str) -> CoreResult<Customer> {
        self.store
            .with_state(|state| state.customer(customer_id).cloned())
    }

    /// Creates a coupon. Codes are normalized and unique storewide.
    pub fn add_coupon(
        &self,
        code: &str,
        discount: Discount,
        max_usage: u32,
        min_purchase: Money,
        expires_at: DateTime<Utc>,
    ) -> CoreResult<Coupon> {
        let coupon = Coupon::new(code, discount, max_usage, min_purchase, expires_at, Utc::now())?;
        let coupon = self
            .store
            .with_state_mut(|state| state.insert_coupon(coupon))?;
        info!(coupon_id = %coupon.id, code = %coupon.code, "coupon created");
        Ok(coupon)
    }

    pub fn get_coupon(&self, code: &str) -> CoreResult<Coupon> {
        self.store
            .with_state(|state| state.coupon_by_code(code).cloned())
    }
}

// ===== Cart Operations =====

impl CheckoutEngine {
    /// The customer's cart, fully priced against the live catalog.
    pub fn cart_view(&self, customer_id: &str) -> CoreResult<CartView> {
        let now = Utc::now();
        self.store
            .with_state(|state| assemble_view(state, customer_id, &self.pricing, now))
    }

    /// Adds copies of a book to the cart; returns the re-priced view.
    pub fn add_to_cart(
        &self,
        customer_id: &str,
        book_id: &str,
        quantity: i64,
    ) -> CoreResult<CartView> {
        debug!(customer_id, book_id, quantity, "adding to cart");
        let now = Utc::now();
        self.store.with_state_mut(|state| {
            let book = state.book(book_id)?.clone();
            state.cart_for_mut(customer_id)?.add_item(&book, quantity, now)?;
            assemble_view(state, customer_id, &self.pricing, now)
        })
    }

    /// Sets a cart line's quantity (0 removes it); returns the view.
    pub fn update_cart_quantity(
        &self,
        customer_id: &str,
        book_id: &str,
        quantity: i64,
    ) -> CoreResult<CartView> {
        debug!(customer_id, book_id, quantity, "updating cart quantity");
        let now = Utc::now();
        self.store.with_state_mut(|state| {
            let book = state.book(book_id)?.clone();
            state.cart_for_mut(customer_id)?.update_quantity(&book, quantity)?;
            assemble_view(state, customer_id, &self.pricing, now)
        })
    }

    /// Drops a cart line; returns the view.
    pub fn remove_from_cart(&self, customer_id: &str, book_id: &str) -> CoreResult<CartView> {
        debug!(customer_id, book_id, "removing from cart");
        let now = Utc::now();
        self.store.with_state_mut(|state| {
            state.cart_for_mut(customer_id)?.remove_item(book_id)?;
            assemble_view(state, customer_id, &self.pricing, now)
        })
    }

    /// Attaches a coupon to the cart.
    ///
    /// The coupon must resolve, be valid right now, and the current
    /// subtotal must meet its minimum purchase. Only the reference is
    /// stored; everything is re-checked at settlement.
    pub fn apply_coupon(&self, customer_id: &str, code: &str) -> CoreResult<CartView> {
        debug!(customer_id, code, "applying coupon");
        let now = Utc::now();
        let view = self.store.with_state_mut(|state| {
            let cart = state.cart_for(customer_id)?;
            let mut subtotal = Money::ZERO;
            for line in &cart.items {
                let book = state.book(&line.book_id)?;
                subtotal += book.price.multiply_quantity(line.quantity);
            }

            let coupon = state.coupon_by_code(code)?;
            coupon.validate(now).map_err(CoreError::CouponNotValid)?;
            if subtotal < coupon.min_purchase {
                return Err(CoreError::CouponBelowMinPurchase {
                    required: coupon.min_purchase,
                    subtotal,
                });
            }

            let coupon_id = coupon.id.clone();
            state.cart_for_mut(customer_id)?.applied_coupon = Some(coupon_id);
            assemble_view(state, customer_id, &self.pricing, now)
        })?;
        info!(customer_id, code, "coupon applied");
        Ok(view)
    }

    /// Detaches any coupon from the cart. Succeeds when none is
    /// attached; no usage is consumed either way before settlement.
    pub fn remove_coupon(&self, customer_id: &str) -> CoreResult<CartView> {
        debug!(customer_id, "removing coupon");
        let now = Utc::now();
        self.store.with_state_mut(|state| {
            state.cart_for_mut(customer_id)?.applied_coupon = None;
            assemble_view(state, customer_id, &self.pricing, now)
        })
    }
}

// ===== Settlement and Cancellation =====

impl CheckoutEngine {
    /// Turns the cart into an order: the one workflow that moves stock,
    /// coupon usage, order, payment, cart, and the first-time flag
    /// together.
    ///
    /// ## Failure Behavior
    /// Any error leaves the store untouched. The cart survives the
    /// failure, so the customer can adjust it and retry.
    ///
    /// ## Coupon Drift
    /// A coupon that went invalid since `apply_coupon` aborts the
    /// settlement. A coupon still valid but below whose minimum the
    /// cart has since shrunk does NOT abort: it freezes a zero discount
    /// and still consumes a usage, as the storefront always has.
    pub fn settle_order(
        &self,
        customer_id: &str,
        delivery: DeliveryDetails,
        instruction: PaymentInstruction,
    ) -> CoreResult<SettlementReceipt> {
        debug!(customer_id, method = ?instruction.method(), "settling order");

        // Pure checks before touching state.
        validation::validate_delivery(&delivery)?;
        let masked_card = match &instruction {
            PaymentInstruction::Cash => None,
            PaymentInstruction::Card(card) => {
                card.validate_presence()?;
                self.card_validator
                    .validate(card)
                    .map_err(|decline| CoreError::CardValidationFailed {
                        reason: decline.reason,
                    })?;
                Some(card.masked_number())
            }
        };
        let method = instruction.method();
        let now = Utc::now();

        let receipt = self.store.with_state_mut(|state| {
            // ----- validate phase: no writes -----
            let is_first_time = state.customer(customer_id)?.is_first_time_buyer;
            let cart = state.cart_for(customer_id)?;
            if cart.is_empty() {
                return Err(CoreError::EmptyCart);
            }

            // Freeze lines against the live catalog.
            let mut items = Vec::with_capacity(cart.items.len());
            for line in &cart.items {
                let book = state.book(&line.book_id)?;
                if !book.has_stock(line.quantity) {
                    return Err(CoreError::InsufficientStock {
                        title: book.title.clone(),
                        available: book.stock,
                        requested: line.quantity,
                    });
                }
                items.push(OrderItem {
                    book_id: book.id.clone(),
                    title: book.title.clone(),
                    quantity: line.quantity,
                    unit_price: book.price,
                    subtotal: book.price.multiply_quantity(line.quantity),
                });
            }

            // The attached coupon may have expired, been exhausted, or
            // been deactivated since apply_coupon; that aborts here.
            let coupon = match cart.applied_coupon.as_deref() {
                Some(coupon_id) => {
                    let coupon = state
                        .coupon(coupon_id)
                        .ok_or_else(|| CoreError::CouponCodeInvalid(coupon_id.to_string()))?;
                    coupon.validate(now).map_err(CoreError::CouponNotValid)?;
                    Some(coupon)
                }
                None => None,
            };

            let lines: Vec<LineItem> = items
                .iter()
                .map(|i| LineItem {
                    unit_price: i.unit_price,
                    quantity: i.quantity,
                })
                .collect();
            let breakdown = pricing::price_cart(&lines, is_first_time, coupon, &self.pricing, now);
            let coupon_ref = coupon.map(|c| (c.id.clone(), c.code.clone()));

            // ----- apply phase -----
            // Every check below was proven under this same lock hold.
            let order_id = Uuid::new_v4().to_string();
            let order_number = state.next_order_number();

            for item in &items {
                state.reserve_stock(&item.book_id, item.quantity)?;
            }
            if let Some((coupon_id, _)) = &coupon_ref {
                state.redeem_coupon(coupon_id, customer_id, &order_id, now)?;
            }

            let (payment_status, transaction_id) = match method {
                PaymentMethod::Cash => (PaymentStatus::Unpaid, None),
                PaymentMethod::Card => (
                    PaymentStatus::Paid,
                    Some(format!("CARD-{}-{}", order_id, now.format("%Y%m%d%H%M%S"))),
                ),
            };
            let status = match method {
                PaymentMethod::Cash => OrderStatus::Pending,
                PaymentMethod::Card => OrderStatus::Confirmed,
            };

            let receipt = SettlementReceipt {
                order_id: order_id.clone(),
                order_number: order_number.clone(),
                placed_at: now,
                status,
                lines: items
                    .iter()
                    .map(|i| ReceiptLine {
                        book_id: i.book_id.clone(),
                        title: i.title.clone(),
                        quantity: i.quantity,
                        unit_price: i.unit_price,
                        line_subtotal: i.subtotal,
                    })
                    .collect(),
                subtotal: breakdown.subtotal,
                shipping_fee: breakdown.shipping_fee,
                coupon_code: coupon_ref.as_ref().map(|(_, code)| code.clone()),
                coupon_discount: breakdown.coupon_discount,
                order_value_discount: breakdown.order_value_discount,
                first_time_discount: breakdown.first_time_discount,
                total_discount: breakdown.total_discount(),
                total_amount: breakdown.total_amount(),
                payment: PaymentSummary {
                    method,
                    status: payment_status,
                    transaction_id: transaction_id.clone(),
                    card_number: masked_card,
                },
            };

            let order = Order {
                id: order_id.clone(),
                order_number,
                customer_id: customer_id.to_string(),
                status,
                delivery,
                shipping_fee: breakdown.shipping_fee,
                coupon_id: coupon_ref.as_ref().map(|(id, _)| id.clone()),
                coupon_code: coupon_ref.map(|(_, code)| code),
                coupon_discount: breakdown.coupon_discount,
                order_value_discount: breakdown.order_value_discount,
                first_time_discount: breakdown.first_time_discount,
                items,
                placed_at: now,
                cancellation_reason: None,
                cancelled_at: None,
            };
            let payment = Payment {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.clone(),
                amount: breakdown.total_amount(),
                method,
                status: payment_status,
                transaction_id,
                created_at: now,
            };

            if is_first_time {
                state.customer_mut(customer_id)?.is_first_time_buyer = false;
            }
            state.cart_for_mut(customer_id)?.clear(now);
            state.orders.insert(order_id.clone(), order);
            state.payments.insert(order_id, payment);
            Ok(receipt)
        })?;

        info!(
            order_id = %receipt.order_id,
            order_number = %receipt.order_number,
            total = %receipt.total_amount,
            method = ?method,
            "order settled"
        );
        Ok(receipt)
    }

    /// Cancels an order, restoring what settlement took.
    ///
    /// Stock goes back line by line and the coupon usage is reversed.
    /// The first-time flag stays spent and the payment record stays as
    /// it is; refunds are a separate, manual concern.
    pub fn cancel_order(
        &self,
        customer_id: &str,
        order_id: &str,
        reason: Option<String>,
    ) -> CoreResult<Order> {
        debug!(customer_id, order_id, "cancelling order");
        let now = Utc::now();
        let order = self.store.with_state_mut(|state| {
            let order = state.order(order_id)?;
            // Customers see only their own orders.
            if order.customer_id != customer_id {
                return Err(CoreError::OrderNotFound(order_id.to_string()));
            }
            if !order.status.is_cancellable() {
                return Err(CoreError::NotCancellable {
                    order_id: order_id.to_string(),
                    status: order.status.to_string(),
                });
            }

            let restitutions: Vec<(String, i64)> = order
                .items
                .iter()
                .map(|i| (i.book_id.clone(), i.quantity))
                .collect();
            for (book_id, quantity) in &restitutions {
                state.restore_stock(book_id, *quantity);
            }
            state.reverse_coupon(order_id);

            let order = state.order_mut(order_id)?;
            order.status = OrderStatus::Cancelled;
            order.cancellation_reason = reason;
            order.cancelled_at = Some(now);
            Ok(order.clone())
        })?;
        info!(order_id, order_number = %order.order_number, "order cancelled");
        Ok(order)
    }
}

// ===== Order and Payment Queries =====

impl CheckoutEngine {
    /// One order, scoped to its owner.
    pub fn get_order(&self, customer_id: &str, order_id: &str) -> CoreResult<Order> {
        self.store.with_state(|state| {
            let order = state.order(order_id)?;
            if order.customer_id != customer_id {
                return Err(CoreError::OrderNotFound(order_id.to_string()));
            }
            Ok(order.clone())
        })
    }

    /// The customer's orders, newest first.
    pub fn order_history(&self, customer_id: &str) -> CoreResult<Vec<Order>> {
        self.store.with_state(|state| {
            state.customer(customer_id)?;
            let mut orders: Vec<Order> = state
                .orders
                .values()
                .filter(|o| o.customer_id == customer_id)
                .cloned()
                .collect();
            orders.sort_by(|a, b| {
                b.placed_at
                    .cmp(&a.placed_at)
                    .then_with(|| b.order_number.cmp(&a.order_number))
            });
            Ok(orders)
        })
    }

    /// The payment attached to an order, scoped to the order's owner.
    pub fn get_payment(&self, customer_id: &str, order_id: &str) -> CoreResult<Payment> {
        self.store.with_state(|state| {
            let order = state.order(order_id)?;
            if order.customer_id != customer_id {
                return Err(CoreError::OrderNotFound(order_id.to_string()));
            }
            state.payment_for_order(order_id).cloned()
        })
    }

    /// Records cash collection. The payment flips to Paid and a still
    /// Pending order confirms; repeated calls are no-ops.
    pub fn mark_payment_paid(&self, order_id: &str) -> CoreResult<Order> {
        let order = self.store.with_state_mut(|state| -> CoreResult<Order> {
            state.payment_for_order_mut(order_id)?.status = PaymentStatus::Paid;
            let order = state.order_mut(order_id)?;
            if order.status == OrderStatus::Pending {
                order.status = OrderStatus::Confirmed;
            }
            Ok(order.clone())
        })?;
        info!(order_id, status = %order.status, "payment collected");
        Ok(order)
    }

    /// Moves an order along the fulfilment path.
    ///
    /// Cancellation is not reachable from here; it has its own workflow
    /// with stock and coupon restitution.
    pub fn update_order_status(&self, order_id: &str, status: OrderStatus) -> CoreResult<Order> {
        let order = self.store.with_state_mut(|state| {
            let order = state.order_mut(order_id)?;
            if status == OrderStatus::Cancelled || !order.status.can_transition_to(status) {
                return Err(CoreError::InvalidStatusTransition {
                    order_id: order_id.to_string(),
                    from: order.status.to_string(),
                    to: status.to_string(),
                });
            }
            order.status = status;
            Ok(order.clone())
        })?;
        info!(order_id, status = %order.status, "order status updated");
        Ok(order)
    }
}

// =============================================================================
// View Assembly
// =============================================================================

/// Builds the priced cart view: resolve every line against the live
/// catalog, then run the full pricing pass.
fn assemble_view(
    state: &StoreState,
    customer_id: &str,
    config: &PricingConfig,
    at: DateTime<Utc>,
) -> CoreResult<CartView> {
    let is_first_time = state.customer(customer_id)?.is_first_time_buyer;
    let cart = state.cart_for(customer_id)?;

    let mut lines = Vec::with_capacity(cart.items.len());
    for item in &cart.items {
        let book = state.book(&item.book_id)?;
        lines.push(CartLine {
            book_id: book.id.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            unit_price: book.price,
            quantity: item.quantity,
            line_subtotal: book.price.multiply_quantity(item.quantity),
        });
    }

    let coupon = cart
        .applied_coupon
        .as_deref()
        .and_then(|id| state.coupon(id));
    let pricing_lines: Vec<LineItem> = lines
        .iter()
        .map(|l| LineItem {
            unit_price: l.unit_price,
            quantity: l.quantity,
        })
        .collect();
    let breakdown = pricing::price_cart(&pricing_lines, is_first_time, coupon, config, at);

    Ok(CartView::from_parts(
        lines,
        coupon.map(|c| c.code.clone()),
        &breakdown,
    ))
}

// =============================================================================
// Unit Tests
// =============================================================================
