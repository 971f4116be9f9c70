//! Storefront workflow core
//!
//! Transactional heart of the storefront and Jan Seva back office. The
//! rendering layer, payment gateway, and notification delivery live in
//! external collaborators; this crate owns everything that must stay
//! correct under concurrent writers:
//!
//! - **sequence**: date-scoped identifier minting (order/application numbers)
//! - **verification**: one-time codes with TTL and attempt ceiling
//! - **pricing**: pure checkout quote computation (coupon, delivery, tax)
//! - **stock**: all-or-nothing inventory reservation
//! - **workflow**: generic status state machine with append-only audit trail
//! - **services**: Order/Application orchestration over the above
//!
//! # Module structure
//!
//! ```text
//! store-server/src/
//! ├── core/          # configuration
//! ├── storage.rs     # redb tables and transactions
//! ├── sequence/      # identifier minting
//! ├── verification/  # OTP issue/verify
//! ├── pricing/       # quote computation, coupon book
//! ├── stock/         # inventory ledger
//! ├── workflow/      # state machine + audit trail
//! └── services/      # orchestration + event broadcast
//! ```

pub mod core;
pub mod pricing;
pub mod sequence;
pub mod services;
pub mod stock;
pub mod storage;
pub mod verification;
pub mod workflow;

// Re-export public types
pub use crate::core::Config;
pub use pricing::{CouponBook, PricingConfig, PricingEngine, PricingError};
pub use sequence::{MintError, SequenceMinter};
pub use services::{
    ApplicationService, CheckoutError, CheckoutRequest, OrderConfirmation, OrderService,
    StatusChanged,
};
pub use stock::{StockError, StockLedger, StockRequest};
pub use storage::{CoreStorage, StorageError, StorageResult};
pub use verification::{IssuedCode, VerificationCodeService, VerificationError, VerifyOutcome};
pub use workflow::{StatusEntry, WorkflowEngine, WorkflowError, WorkflowRecord, WorkflowState};
