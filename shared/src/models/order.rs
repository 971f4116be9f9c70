use super::LineItem;
use serde::{Deserialize, Serialize};

/// Pricing breakdown computed at checkout
///
/// Derived from the line items and coupon, never stored as a
/// client-supplied value. Discount and tax are independent line items:
/// tax applies to the subtotal before the discount is subtracted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PriceBreakdown {
    /// Σ(unit price × quantity)
    pub subtotal: f64,
    /// Coupon discount (0 when no coupon applied)
    pub discount: f64,
    /// Flat fee, waived above the free-delivery threshold
    pub delivery_fee: f64,
    /// Fixed percentage of the subtotal
    pub tax: f64,
    /// subtotal − discount + delivery fee + tax, clamped at ≥ 0
    pub total: f64,
}

/// Customer contact snapshot captured at checkout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    /// Delivery address
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Domain payload of an order workflow record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderPayload {
    pub customer: CustomerInfo,
    pub items: Vec<LineItem>,
    pub pricing: PriceBreakdown,
    /// Coupon code that was actually applied (None if absent or invalid)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
}
