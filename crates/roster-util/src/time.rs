//! Time utilities for rosterd
//!
//! Timers are stored with absolute epoch-millisecond timestamps and
//! reconciled lazily against "now" on every read, so everything here works
//! in plain `i64` milliseconds rather than richer clock types.

use chrono::Utc;
use std::time::Duration;

/// Hard cap on a timer's nominal duration: 12 hours.
pub const MAX_TIMER_DURATION_MS: i64 = 1000 * 60 * 60 * 12;

/// Current wall-clock time as epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Clamp a millisecond duration into the valid timer range `[0, 12h]`.
pub fn clamp_duration_ms(ms: i64) -> i64 {
    ms.clamp(0, MAX_TIMER_DURATION_MS)
}

/// Helper to format millisecond durations in human-readable form (for logs)
pub fn format_duration_ms(ms: i64) -> String {
    format_duration(Duration::from_millis(ms.max(0) as u64))
}

/// Helper to format durations in human-readable form
pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_duration() {
        assert_eq!(clamp_duration_ms(-5), 0);
        assert_eq!(clamp_duration_ms(0), 0);
        assert_eq!(clamp_duration_ms(60_000), 60_000);
        assert_eq!(clamp_duration_ms(MAX_TIMER_DURATION_MS), MAX_TIMER_DURATION_MS);
        assert_eq!(clamp_duration_ms(MAX_TIMER_DURATION_MS + 1), MAX_TIMER_DURATION_MS);
        assert_eq!(clamp_duration_ms(i64::MAX), MAX_TIMER_DURATION_MS);
    }

    #[test]
    fn test_now_ms_is_reasonable() {
        let t = now_ms();
        // After 2020-01-01, before 2100-01-01
        assert!(t > 1_577_836_800_000);
        assert!(t < 4_102_444_800_000);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m 1s");
    }

    #[test]
    fn test_format_duration_ms_negative() {
        assert_eq!(format_duration_ms(-100), "0s");
        assert_eq!(format_duration_ms(5000), "5s");
    }
}
