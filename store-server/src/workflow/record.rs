//! Persisted workflow record shape

use serde::{Deserialize, Serialize};

/// One audit-trail entry
///
/// Entries are append-only; an existing entry is never edited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusEntry<S> {
    pub status: S,
    /// Milliseconds since epoch
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Who drove the change (admin user, "system", payment callback)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
}

/// A workflow record: durable identifier, current status, audit trail,
/// and the domain payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowRecord<S, P> {
    /// Minted identifier, e.g. `ORD2501140001`
    pub id: String,
    /// Always equals the status of the last history entry
    pub status: S,
    /// Append-only status history; first entry is the initial status
    pub history: Vec<StatusEntry<S>>,
    /// Optimistic lock; bumped on every transition
    pub version: u64,
    pub created_at: i64,
    /// Stamped exactly once, on first entry to a completion-stamped state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    pub payload: P,
}
