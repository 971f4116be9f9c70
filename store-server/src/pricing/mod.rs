//! Checkout pricing
//!
//! - **engine**: pure quote computation (subtotal, discount, delivery, tax)
//! - **coupon**: in-memory coupon registry with code resolution
//!
//! The engine does no I/O; the same inputs always yield the same quote.
//! The persisted order total is recomputed here from the line items and is
//! never taken from the client.

pub mod coupon;
pub mod engine;

pub use coupon::{CouponBook, PricingError};
pub use engine::{PricingConfig, PricingEngine, round2};
