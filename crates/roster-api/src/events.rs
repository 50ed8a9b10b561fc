//! Push events broadcast whenever a mutation changes persisted state
//!
//! The realtime transport itself lives outside this system; these payloads
//! are what crosses the in-process update bus.

use serde::{Deserialize, Serialize};

use crate::{StatusSnapshot, TimerSnapshot};

/// Which part of the state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Status,
    Timers,
}

/// A state-change notification with its fresh projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    Status { status: StatusSnapshot },
    Timers { snapshot: TimerSnapshot },
}

impl PushEvent {
    pub fn kind(&self) -> UpdateKind {
        match self {
            PushEvent::Status { .. } => UpdateKind::Status,
            PushEvent::Timers { .. } => UpdateKind::Timers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;

    #[test]
    fn push_event_tags_by_type() {
        let event = PushEvent::Status {
            status: Document::default().status(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "status");
        assert_eq!(event.kind(), UpdateKind::Status);
    }

    #[test]
    fn timers_event_carries_server_time() {
        let event = PushEvent::Timers {
            snapshot: TimerSnapshot {
                server_time: 1_700_000_000_000,
                timers: vec![],
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "timers");
        assert_eq!(json["snapshot"]["serverTime"], 1_700_000_000_000i64);
    }
}
