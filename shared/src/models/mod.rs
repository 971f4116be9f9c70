//! Domain payload models
//!
//! Serializable value types carried by workflow records and exchanged with
//! the (out-of-scope) UI and auth collaborators.

pub mod application;
pub mod coupon;
pub mod line_item;
pub mod order;
pub mod verification;

// Re-exports
pub use application::{ApplicantDetails, ApplicationPayload, DocumentRef};
pub use coupon::{Coupon, CouponKind};
pub use line_item::LineItem;
pub use order::{CustomerInfo, OrderPayload, PriceBreakdown};
pub use verification::{VerifyChannel, VerifyPurpose};
