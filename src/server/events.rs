use serde::{Deserialize, Serialize};

use crate::history::HistoryEntry;

// SSE Event types
pub const HISTORY_RECORDED: &str = "history_recorded";
pub const HISTORY_CLEARED: &str = "history_cleared";
pub const HEARTBEAT: &str = "heartbeat";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub event_type: String,
    pub data: HistoryEventData,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HistoryEventData {
    pub entry: Option<HistoryEntry>,
    pub removed: Option<usize>,
    pub total: Option<usize>,
    pub message: Option<String>,
}

impl HistoryEvent {
    pub fn recorded(entry: HistoryEntry, total: usize) -> Self {
        Self {
            event_type: HISTORY_RECORDED.to_string(),
            data: HistoryEventData {
                entry: Some(entry),
                total: Some(total),
                ..Default::default()
            },
        }
    }

    pub fn cleared(removed: usize) -> Self {
        Self {
            event_type: HISTORY_CLEARED.to_string(),
            data: HistoryEventData {
                removed: Some(removed),
                total: Some(0),
                ..Default::default()
            },
        }
    }

    pub fn heartbeat() -> Self {
        Self {
            event_type: HEARTBEAT.to_string(),
            data: HistoryEventData {
                message: Some("SSE connection alive".to_string()),
                ..Default::default()
            },
        }
    }
}
