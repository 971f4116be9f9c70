//! Orchestration services
//!
//! - **events**: status-change broadcast consumed by notification workers
//! - **order_service**: checkout → stock → pricing → mint → workflow
//! - **application_service**: Jan Seva application intake and processing
//!
//! Everything downstream of a successful transition (push/WhatsApp/SMS,
//! dashboards) hangs off the broadcast channel and is fire-and-forget.

pub mod application_service;
pub mod events;
pub mod order_service;

pub use application_service::{ApplicationError, ApplicationRequest, ApplicationService};
pub use events::StatusChanged;
pub use order_service::{CheckoutError, CheckoutRequest, OrderConfirmation, OrderService};
