//! # Coupon Registry
//!
//! Redemption bookkeeping: the usage counter on the coupon and the
//! per-order usage rows. Both move only under the store lock, which is
//! what keeps `current_usage` from ever passing `max_usage` when two
//! settlements race for the last slot.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use kitab_core::{CoreError, CoreResult, Coupon, CouponRejection, CouponUsage};

use crate::store::StoreState;

impl StoreState {
    /// Resolves a customer-typed code to a coupon.
    ///
    /// The code is normalized (trimmed, uppercased) first; anything
    /// that does not land on a known coupon is an invalid code, the
    /// same answer for "no such code" and "not even a plausible code".
    pub(crate) fn coupon_by_code(&self, code: &str) -> CoreResult<&Coupon> {
        let normalized = kitab_core::validation::normalize_coupon_code(code)
            .map_err(|_| CoreError::CouponCodeInvalid(code.trim().to_string()))?;
        self.coupons
            .values()
            .find(|c| c.code == normalized)
            .ok_or(CoreError::CouponCodeInvalid(normalized))
    }

    pub(crate) fn coupon(&self, coupon_id: &str) -> Option<&Coupon> {
        self.coupons.get(coupon_id)
    }

    /// Records a redemption against an order.
    ///
    /// Guards, in order: no second redemption for the same (coupon,
    /// order) pair, and head-room on the usage counter. On success the
    /// counter moves and a usage row is written, atomically with the
    /// rest of the settlement.
    pub(crate) fn redeem_coupon(
        &mut self,
        coupon_id: &str,
        customer_id: &str,
        order_id: &str,
        at: DateTime<Utc>,
    ) -> CoreResult<()> {
        if self
            .usages
            .iter()
            .any(|u| u.coupon_id == coupon_id && u.order_id == order_id)
        {
            return Err(CoreError::DuplicateCouponUsage {
                coupon_id: coupon_id.to_string(),
                order_id: order_id.to_string(),
            });
        }

        let coupon = self
            .coupons
            .get_mut(coupon_id)
            .ok_or_else(|| CoreError::CouponCodeInvalid(coupon_id.to_string()))?;
        if coupon.current_usage >= coupon.max_usage {
            return Err(CoreError::CouponNotValid(CouponRejection::UsageLimitReached));
        }

        coupon.current_usage += 1;
        debug!(
            coupon_id,
            order_id,
            usage = coupon.current_usage,
            "coupon redeemed"
        );
        self.usages.push(CouponUsage {
            id: Uuid::new_v4().to_string(),
            coupon_id: coupon_id.to_string(),
            customer_id: customer_id.to_string(),
            order_id: order_id.to_string(),
            used_at: at,
        });
        Ok(())
    }

    /// Undoes the redemption recorded against an order, if any.
    ///
    /// The counter never goes below zero, and a coupon that has left
    /// the store skips the counter but still loses its usage rows.
    pub(crate) fn reverse_coupon(&mut self, order_id: &str) {
        let reversed: Vec<String> = self
            .usages
            .iter()
            .filter(|u| u.order_id == order_id)
            .map(|u| u.coupon_id.clone())
            .collect();

        for coupon_id in &reversed {
            match self.coupons.get_mut(coupon_id) {
                Some(coupon) => {
                    coupon.current_usage = coupon.current_usage.saturating_sub(1);
                    debug!(coupon_id, order_id, usage = coupon.current_usage, "redemption reversed");
                }
                None => {
                    warn!(coupon_id, order_id, "coupon gone from store, counter not reversed");
                }
            }
        }
        self.usages.retain(|u| u.order_id != order_id);
    }
}
