//! Pure quote computation

use crate::core::Config;
use shared::models::{Coupon, CouponKind, LineItem, PriceBreakdown};

/// Pricing knobs, snapshot of the relevant [`Config`] fields
#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub tax_rate_percent: f64,
    pub delivery_fee: f64,
    pub free_delivery_threshold: f64,
}

impl PricingConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tax_rate_percent: config.tax_rate_percent,
            delivery_fee: config.delivery_fee,
            free_delivery_threshold: config.free_delivery_threshold,
        }
    }
}

/// Round a monetary value to 2 decimals, half-up
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Computes order totals from a line-item set and an optional coupon
///
/// Pure and stateless: no storage access, no clock.
#[derive(Debug, Clone)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    /// Compute the full breakdown for a cart
    ///
    /// The coupon has already been resolved; its min-order gate is checked
    /// here. Tax applies to the subtotal independently of the discount.
    pub fn quote(&self, items: &[LineItem], coupon: Option<&Coupon>) -> PriceBreakdown {
        let subtotal = round2(items.iter().map(LineItem::line_total).sum());

        let delivery_fee = if subtotal >= self.config.free_delivery_threshold {
            0.0
        } else {
            self.config.delivery_fee
        };

        let discount = match coupon {
            Some(coupon) if subtotal >= coupon.min_order => {
                let raw = match coupon.kind {
                    CouponKind::Percentage(pct) => subtotal * pct / 100.0,
                    CouponKind::Fixed(amount) => amount,
                };
                // A discount can never exceed what the items are worth
                round2(raw.min(subtotal))
            }
            _ => 0.0,
        };

        let tax = round2(subtotal * self.config.tax_rate_percent / 100.0);
        let total = round2((subtotal - discount + delivery_fee + tax).max(0.0));

        PriceBreakdown {
            subtotal,
            discount,
            delivery_fee,
            tax,
            total,
        }
    }
}
