//! Workflow state machine with append-only audit trail
//!
//! One generic engine drives both record kinds (orders, applications); the
//! permitted transitions come from the state type, not from duplicated
//! per-entity machines.
//!
//! - **state**: the [`WorkflowState`] trait and its implementations for
//!   the order and application status enums
//! - **record**: the persisted record shape (status + history + version)
//! - **engine**: create/transition/get over redb
//!
//! # Invariants
//!
//! - `status` always equals the status of the last history entry
//! - history is never edited or reordered, only appended
//! - records are never deleted, only terminally statused
//! - a transition either fully commits (entry appended, version bumped)
//!   or leaves the record untouched

pub mod engine;
pub mod record;
pub mod state;

pub use engine::{WorkflowEngine, WorkflowError, WorkflowResult};
pub use record::{StatusEntry, WorkflowRecord};
pub use state::WorkflowState;
