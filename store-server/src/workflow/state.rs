//! Workflow state trait and transition tables

use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::status::{ApplicationStatus, OrderStatus};

/// A status enum usable by the generic workflow engine
///
/// The transition table lives with the state type; the engine only asks
/// whether a move is legal.
pub trait WorkflowState:
    Copy
    + Eq
    + std::fmt::Debug
    + std::fmt::Display
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// State a record is created in
    fn initial() -> Self;

    /// Whether `next` is a permitted successor of `self`
    fn can_transition(self, next: Self) -> bool;

    /// Terminal states accept no further transitions
    fn is_terminal(self) -> bool;

    /// Whether first entry into this state stamps `completed_at`
    fn stamps_completion(self) -> bool;
}

impl WorkflowState for OrderStatus {
    fn initial() -> Self {
        OrderStatus::Placed
    }

    fn can_transition(self, next: Self) -> bool {
        use OrderStatus::*;
        // Fulfilment moves one step at a time; Cancelled is reachable
        // from every non-terminal state
        match (self, next) {
            (Placed, Confirmed)
            | (Confirmed, Processing)
            | (Processing, Packed)
            | (Packed, OutForDelivery)
            | (OutForDelivery, Delivered) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    fn stamps_completion(self) -> bool {
        matches!(self, OrderStatus::Delivered)
    }
}

impl WorkflowState for ApplicationStatus {
    fn initial() -> Self {
        ApplicationStatus::Pending
    }

    fn can_transition(self, next: Self) -> bool {
        use ApplicationStatus::*;
        match (self, next) {
            (Pending, InReview)
            | (InReview, Approved)
            | (InReview, Rejected)
            | (Approved, Completed) => true,
            (Pending, Cancelled) | (InReview, Cancelled) => true,
            _ => false,
        }
    }

    fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Completed
                | ApplicationStatus::Rejected
                | ApplicationStatus::Cancelled
        )
    }

    fn stamps_completion(self) -> bool {
        matches!(self, ApplicationStatus::Completed)
    }
}
