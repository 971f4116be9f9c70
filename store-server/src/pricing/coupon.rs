//! Coupon registry
//!
//! Coupons are catalog data maintained by the back office; the workflow
//! core only needs to resolve a code at checkout time. Lookup is
//! case-insensitive (codes are stored uppercase).

use parking_lot::RwLock;
use shared::models::Coupon;
use std::collections::HashMap;
use thiserror::Error;

/// Pricing errors
#[derive(Debug, Error)]
pub enum PricingError {
    /// Unknown or malformed coupon code; checkout proceeds with zero
    /// discount and surfaces this as a warning
    #[error("invalid coupon code: {0}")]
    InvalidCoupon(String),
}

/// In-memory coupon registry shared across checkout requests
#[derive(Debug, Default)]
pub struct CouponBook {
    coupons: RwLock<HashMap<String, Coupon>>,
}

impl CouponBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a coupon
    pub fn register(&self, coupon: Coupon) {
        let mut coupons = self.coupons.write();
        coupons.insert(coupon.code.clone(), coupon);
    }

    /// Resolve a code to its discount rule
    pub fn resolve(&self, code: &str) -> Result<Coupon, PricingError> {
        let normalized = code.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(PricingError::InvalidCoupon(code.to_string()));
        }
        let coupons = self.coupons.read();
        coupons
            .get(&normalized)
            .cloned()
            .ok_or_else(|| PricingError::InvalidCoupon(normalized))
    }
}
