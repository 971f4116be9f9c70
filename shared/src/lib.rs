//! Shared types for the storefront workflow core
//!
//! Common types used across the workspace: workflow status enums,
//! order/application payloads, coupons, and timestamp utilities.

pub mod models;
pub mod status;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use models::{
    ApplicantDetails, ApplicationPayload, Coupon, CouponKind, CustomerInfo, DocumentRef, LineItem,
    OrderPayload, PriceBreakdown, VerifyChannel, VerifyPurpose,
};
pub use status::{ApplicationStatus, OrderStatus};
