//! Timer entries and their client-facing projections

use roster_util::TimerId;
use serde::{Deserialize, Serialize};

/// A named countdown timer as stored in the document.
///
/// Invariants (enforced by validation and the timer engine):
/// - `0 <= remaining_ms <= duration_ms <= 12h`
/// - `started_at` is `Some` if and only if `is_running` is true
/// - `is_running` implies `remaining_ms > 0`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub id: TimerId,
    pub name: String,
    /// Nominal countdown length
    pub duration_ms: i64,
    /// Time left as of the last mutation (while running, the live value is
    /// `remaining_ms - (now - started_at)`)
    pub remaining_ms: i64,
    pub is_running: bool,
    /// Epoch millis of the last start; null while stopped
    pub started_at: Option<i64>,
    /// Restart from full duration on expiry instead of stopping
    pub repeat: bool,
    /// Epoch millis of the last mutation, for observability
    pub updated_at: Option<i64>,
}

/// Client projection of a timer, reconciled against a snapshot's `now`.
///
/// `remaining_ms` here is authoritative as of the snapshot timestamp:
/// already reduced for elapsed running time, so clients only need a local
/// wall-clock offset to render a live countdown between polls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerView {
    pub id: TimerId,
    pub name: String,
    pub duration_ms: i64,
    pub remaining_ms: i64,
    pub is_running: bool,
    pub started_at: Option<i64>,
    pub repeat: bool,
    pub updated_at: Option<i64>,
}

/// Point-in-time projection of all timers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    /// The server's clock when the snapshot was taken, so clients can
    /// interpolate without drift.
    pub server_time: i64,
    pub timers: Vec<TimerView>,
}
