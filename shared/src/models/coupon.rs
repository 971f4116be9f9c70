use serde::{Deserialize, Serialize};

/// Discount rule attached to a coupon code
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CouponKind {
    /// Percentage of the subtotal (0-100)
    Percentage(f64),
    /// Flat amount off the subtotal
    Fixed(f64),
}

/// A named discount rule gated by a minimum order value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coupon {
    /// Coupon code as entered at checkout (stored uppercase)
    pub code: String,
    pub kind: CouponKind,
    /// Minimum subtotal required for the discount to apply
    pub min_order: f64,
}

impl Coupon {
    pub fn percentage(code: impl Into<String>, pct: f64, min_order: f64) -> Self {
        Self {
            code: code.into().to_uppercase(),
            kind: CouponKind::Percentage(pct),
            min_order,
        }
    }

    pub fn fixed(code: impl Into<String>, amount: f64, min_order: f64) -> Self {
        Self {
            code: code.into().to_uppercase(),
            kind: CouponKind::Fixed(amount),
            min_order,
        }
    }
}
