//! Status-change event broadcast

use serde::Serialize;

/// Broadcast channel capacity; notification consumers are slow but few
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Emitted after every successful record creation or transition
///
/// Consumers (notification delivery, dashboards) subscribe via the owning
/// service; a lagging or absent consumer never blocks the workflow.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChanged {
    pub event_id: String,
    /// Order or application number
    pub record_id: String,
    /// New status wire string, e.g. "out_for_delivery"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    pub timestamp: i64,
}

impl StatusChanged {
    pub fn new(
        record_id: &str,
        status: String,
        note: Option<String>,
        actor: Option<String>,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            record_id: record_id.to_string(),
            status,
            note,
            actor,
            timestamp: shared::util::now_millis(),
        }
    }
}
