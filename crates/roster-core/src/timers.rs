//! Shared countdown timer engine
//!
//! Timers live inside the persisted document and never tick on the server:
//! each stores an absolute `started_at`, and every read reconciles it
//! against the caller's `now`. Expired repeating timers are caught up with
//! a single modulo, so a timer that expired hours ago costs the same as one
//! that expired once.
//!
//! All mutations run under one async gate held across the read-modify-write
//! cycle, so concurrent requests cannot overwrite each other's changes.

use std::sync::Arc;

use roster_api::{Timer, TimerSnapshot, TimerView};
use roster_store::JsonStore;
use roster_util::{clamp_duration_ms, format_duration_ms, Result, RosterError, TimerId};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Duration used when a new timer specifies none: 5 minutes.
pub const DEFAULT_TIMER_DURATION_MS: i64 = 5 * 60 * 1000;

/// Display name used when a timer specifies none.
pub const DEFAULT_TIMER_NAME: &str = "새 타이머";

/// Maximum timer display-name length in characters.
pub const MAX_TIMER_NAME_LEN: usize = 60;

const MAX_DURATION_MINUTES: i64 = 720;

/// Parameters for creating a timer. Absent fields fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTimer {
    pub name: Option<String>,
    pub minutes: Option<i64>,
    pub seconds: Option<i64>,
    #[serde(default)]
    pub repeat: bool,
}

/// Partial metadata update. Absent fields are left untouched; supplying
/// minutes or seconds overrides the duration, which stops and resets the
/// timer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimerPatch {
    pub name: Option<String>,
    pub minutes: Option<i64>,
    pub seconds: Option<i64>,
    pub repeat: Option<bool>,
}

/// Result of a timer mutation: the fresh client projection plus whether
/// anything was actually persisted.
#[derive(Debug, Clone)]
pub struct TimerUpdate {
    pub timer: TimerView,
    pub changed: bool,
}

/// The timer engine. Share behind an `Arc`; all operations take `&self`.
///
/// Every operation takes `now_ms` from the caller so tests can drive the
/// clock deterministically.
pub struct TimerEngine {
    store: Arc<JsonStore>,
    gate: Mutex<()>,
}

impl TimerEngine {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self {
            store,
            gate: Mutex::new(()),
        }
    }

    /// Reconcile every timer against `now_ms` and return the projections.
    /// Reconciliation results (expiries, repeat catch-ups) are persisted so
    /// the document on disk never falls far behind observed time.
    pub async fn snapshot(&self, now_ms: i64) -> TimerSnapshot {
        let _gate = self.gate.lock().await;

        let mut doc = self.store.read(true).await;
        let mut changed = false;
        for timer in &mut doc.timers {
            changed |= reconcile(timer, now_ms);
        }

        if changed && !self.store.save(&doc).await {
            warn!("Failed to persist reconciled timers, serving snapshot anyway");
        }

        TimerSnapshot {
            server_time: now_ms,
            timers: doc.timers.iter().map(|t| project(t, now_ms)).collect(),
        }
    }

    /// Create a stopped timer with full remaining time.
    pub async fn create(&self, now_ms: i64, req: NewTimer) -> Result<TimerUpdate> {
        let _gate = self.gate.lock().await;

        let duration_ms =
            parse_duration(req.minutes, req.seconds).unwrap_or(DEFAULT_TIMER_DURATION_MS);
        let timer = Timer {
            id: TimerId::generate(),
            name: sanitize_name(req.name.as_deref()),
            duration_ms,
            remaining_ms: duration_ms,
            is_running: false,
            started_at: None,
            repeat: req.repeat,
            updated_at: Some(now_ms),
        };

        let mut doc = self.store.read(true).await;
        doc.timers.push(timer.clone());
        self.persist(&doc).await?;

        info!(
            timer_id = %timer.id,
            name = %timer.name,
            duration = %format_duration_ms(duration_ms),
            "Timer created"
        );
        Ok(TimerUpdate {
            timer: project(&timer, now_ms),
            changed: true,
        })
    }

    /// Update name, repeat flag, and/or duration. A no-op patch is not
    /// persisted and leaves `updated_at` untouched.
    pub async fn update_meta(
        &self,
        now_ms: i64,
        id: &TimerId,
        patch: TimerPatch,
    ) -> Result<TimerUpdate> {
        let _gate = self.gate.lock().await;

        let mut doc = self.store.read(true).await;
        let timer = find_timer(&mut doc.timers, id)?;
        let mut changed = false;

        if let Some(name) = patch.name.as_deref() {
            let name = sanitize_name(Some(name));
            if name != timer.name {
                timer.name = name;
                changed = true;
            }
        }

        if let Some(repeat) = patch.repeat
            && repeat != timer.repeat
        {
            timer.repeat = repeat;
            changed = true;
        }

        // A duration override stops the timer and rearms it to full, even
        // when the supplied value equals the current duration. Only skipped
        // when the timer is already stopped at exactly that full duration.
        if let Some(duration_ms) = parse_duration(patch.minutes, patch.seconds) {
            let already_reset = !timer.is_running
                && timer.duration_ms == duration_ms
                && timer.remaining_ms == duration_ms;
            if !already_reset {
                timer.duration_ms = duration_ms;
                timer.remaining_ms = duration_ms;
                timer.is_running = false;
                timer.started_at = None;
                changed = true;
            }
        }

        if changed {
            timer.updated_at = Some(now_ms);
        }
        let view = project(timer, now_ms);

        if changed {
            self.persist(&doc).await?;
            info!(timer_id = %id, "Timer metadata updated");
        }
        Ok(TimerUpdate {
            timer: view,
            changed,
        })
    }

    /// Start (or restart) a timer. An expired timer is rearmed to its full
    /// duration first; a zero-duration timer cannot run and stays stopped.
    pub async fn start(&self, now_ms: i64, id: &TimerId) -> Result<TimerUpdate> {
        let _gate = self.gate.lock().await;

        let mut doc = self.store.read(true).await;
        let timer = find_timer(&mut doc.timers, id)?;
        reconcile(timer, now_ms);

        // Restarting a live timer keeps its current position: fold the
        // elapsed running time into the stored remaining before rearming
        if timer.is_running
            && let Some(started_at) = timer.started_at
        {
            let elapsed = (now_ms - started_at).max(0);
            timer.remaining_ms = (clamp_duration_ms(timer.remaining_ms) - elapsed).max(0);
        }

        if timer.remaining_ms <= 0 {
            if timer.duration_ms > 0 {
                timer.remaining_ms = clamp_duration_ms(timer.duration_ms);
            } else {
                timer.is_running = false;
                timer.started_at = None;
                timer.updated_at = Some(now_ms);
                let view = project(timer, now_ms);
                self.persist(&doc).await?;
                warn!(timer_id = %id, "Cannot start zero-duration timer");
                return Ok(TimerUpdate {
                    timer: view,
                    changed: true,
                });
            }
        }

        timer.is_running = true;
        timer.started_at = Some(now_ms);
        timer.updated_at = Some(now_ms);
        let view = project(timer, now_ms);
        self.persist(&doc).await?;

        info!(
            timer_id = %id,
            remaining = %format_duration_ms(view.remaining_ms),
            "Timer started"
        );
        Ok(TimerUpdate {
            timer: view,
            changed: true,
        })
    }

    /// Stop a timer and restore its full duration.
    pub async fn reset(&self, now_ms: i64, id: &TimerId) -> Result<TimerUpdate> {
        let _gate = self.gate.lock().await;

        let mut doc = self.store.read(true).await;
        let timer = find_timer(&mut doc.timers, id)?;

        timer.is_running = false;
        timer.started_at = None;
        timer.remaining_ms = clamp_duration_ms(timer.duration_ms);
        timer.updated_at = Some(now_ms);
        let view = project(timer, now_ms);
        self.persist(&doc).await?;

        info!(timer_id = %id, "Timer reset");
        Ok(TimerUpdate {
            timer: view,
            changed: true,
        })
    }

    /// Remove a timer permanently.
    pub async fn delete(&self, id: &TimerId) -> Result<()> {
        let _gate = self.gate.lock().await;

        if id.is_empty() {
            return Err(RosterError::validation("timer id must not be blank"));
        }

        let mut doc = self.store.read(true).await;
        let before = doc.timers.len();
        doc.timers.retain(|t| &t.id != id);
        if doc.timers.len() == before {
            return Err(RosterError::TimerNotFound(id.clone()));
        }

        self.persist(&doc).await?;
        info!(timer_id = %id, "Timer deleted");
        Ok(())
    }

    async fn persist(&self, doc: &roster_api::Document) -> Result<()> {
        if self.store.save(doc).await {
            Ok(())
        } else {
            Err(RosterError::storage("failed to persist timer change"))
        }
    }
}

fn find_timer<'a>(timers: &'a mut [Timer], id: &TimerId) -> Result<&'a mut Timer> {
    if id.is_empty() {
        return Err(RosterError::validation("timer id must not be blank"));
    }
    timers
        .iter_mut()
        .find(|t| &t.id == id)
        .ok_or_else(|| RosterError::TimerNotFound(id.clone()))
}

/// Trim, default, and cap a timer display name.
pub fn sanitize_name(name: Option<&str>) -> String {
    let trimmed = name.unwrap_or("").trim();
    if trimmed.is_empty() {
        DEFAULT_TIMER_NAME.to_string()
    } else {
        trimmed.chars().take(MAX_TIMER_NAME_LEN).collect()
    }
}

/// Combine minutes and seconds into a clamped millisecond duration.
/// Returns `None` when neither component is supplied, so callers can tell
/// "no duration given" from "zero duration given".
pub fn parse_duration(minutes: Option<i64>, seconds: Option<i64>) -> Option<i64> {
    if minutes.is_none() && seconds.is_none() {
        return None;
    }
    let minutes = minutes.unwrap_or(0).clamp(0, MAX_DURATION_MINUTES);
    let seconds = seconds.unwrap_or(0).clamp(0, 59);
    Some(clamp_duration_ms(minutes * 60_000 + seconds * 1000))
}

/// Fold observed time into a timer's persisted state. Returns whether the
/// timer changed and needs saving.
///
/// A running timer whose remaining time has elapsed either stops, or, when
/// repeating with a positive duration, jumps forward whole cycles so that
/// `started_at` lands within the current cycle.
pub fn reconcile(timer: &mut Timer, now_ms: i64) -> bool {
    let Some(started_at) = timer.started_at else {
        return false;
    };

    if !timer.is_running {
        // Stale start timestamp on a stopped timer
        timer.started_at = None;
        return true;
    }

    let elapsed = (now_ms - started_at).max(0);
    if elapsed < timer.remaining_ms {
        return false;
    }

    if timer.repeat && timer.duration_ms > 0 {
        let overshoot = elapsed - timer.remaining_ms;
        let remainder = overshoot % timer.duration_ms;
        let mut time_left = timer.duration_ms - remainder;
        if time_left <= 0 {
            time_left = timer.duration_ms;
        }
        timer.remaining_ms = timer.duration_ms;
        timer.started_at = Some(now_ms - (timer.duration_ms - time_left));
        timer.updated_at = Some(now_ms);
    } else {
        timer.is_running = false;
        timer.started_at = None;
        timer.remaining_ms = 0;
        timer.updated_at = Some(now_ms);
    }
    true
}

/// Project a timer for clients, with `remaining_ms` already reduced for
/// elapsed running time as of `now_ms`.
pub fn project(timer: &Timer, now_ms: i64) -> TimerView {
    let running = timer.is_running && timer.started_at.is_some();
    let elapsed = match timer.started_at {
        Some(started_at) if running => (now_ms - started_at).max(0),
        _ => 0,
    };
    let remaining_ms = (clamp_duration_ms(timer.remaining_ms) - elapsed).max(0);
    let is_running = running && remaining_ms > 0;

    TimerView {
        id: timer.id.clone(),
        name: sanitize_name(Some(&timer.name)),
        duration_ms: clamp_duration_ms(timer.duration_ms),
        remaining_ms,
        is_running,
        started_at: if is_running { timer.started_at } else { None },
        repeat: timer.repeat,
        updated_at: timer.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_util::MAX_TIMER_DURATION_MS;
    use tempfile::TempDir;

    const T0: i64 = 1_700_000_000_000;

    async fn engine(dir: &TempDir) -> TimerEngine {
        let store = JsonStore::open(dir.path().join("roster.json")).await.unwrap();
        TimerEngine::new(Arc::new(store))
    }

    fn minutes(m: i64) -> NewTimer {
        NewTimer {
            minutes: Some(m),
            ..NewTimer::default()
        }
    }

    #[test]
    fn sanitize_name_trims_defaults_and_caps() {
        assert_eq!(sanitize_name(Some("  보스 리젠  ")), "보스 리젠");
        assert_eq!(sanitize_name(Some("   ")), DEFAULT_TIMER_NAME);
        assert_eq!(sanitize_name(None), DEFAULT_TIMER_NAME);

        let long = "가".repeat(80);
        assert_eq!(sanitize_name(Some(&long)).chars().count(), MAX_TIMER_NAME_LEN);
    }

    #[test]
    fn parse_duration_distinguishes_absent_from_zero() {
        assert_eq!(parse_duration(None, None), None);
        assert_eq!(parse_duration(Some(0), None), Some(0));
        assert_eq!(parse_duration(None, Some(0)), Some(0));
        assert_eq!(parse_duration(Some(1), Some(30)), Some(90_000));
        // Component clamps
        assert_eq!(parse_duration(Some(-5), Some(90)), Some(59_000));
        assert_eq!(parse_duration(Some(9999), None), Some(MAX_TIMER_DURATION_MS));
    }

    #[test]
    fn reconcile_leaves_live_timer_alone() {
        let mut timer = Timer {
            id: TimerId::new("t"),
            name: "x".into(),
            duration_ms: 60_000,
            remaining_ms: 60_000,
            is_running: true,
            started_at: Some(T0),
            repeat: false,
            updated_at: Some(T0),
        };

        assert!(!reconcile(&mut timer, T0 + 30_000));
        assert!(timer.is_running);
        assert_eq!(timer.remaining_ms, 60_000);
    }

    #[test]
    fn reconcile_stops_expired_non_repeating_timer() {
        let mut timer = Timer {
            id: TimerId::new("t"),
            name: "x".into(),
            duration_ms: 5_000,
            remaining_ms: 5_000,
            is_running: true,
            started_at: Some(T0),
            repeat: false,
            updated_at: Some(T0),
        };

        assert!(reconcile(&mut timer, T0 + 9_000));
        assert!(!timer.is_running);
        assert_eq!(timer.remaining_ms, 0);
        assert_eq!(timer.started_at, None);
        assert_eq!(timer.updated_at, Some(T0 + 9_000));
    }

    #[test]
    fn reconcile_catches_up_repeating_timer_in_one_step() {
        let mut timer = Timer {
            id: TimerId::new("t"),
            name: "x".into(),
            duration_ms: 60_000,
            remaining_ms: 60_000,
            is_running: true,
            started_at: Some(T0),
            repeat: true,
            updated_at: Some(T0),
        };

        // 8 full cycles plus 20s into the 9th
        let now = T0 + 500_000;
        assert!(reconcile(&mut timer, now));
        assert!(timer.is_running);
        assert_eq!(timer.remaining_ms, 60_000);
        // 20s of the current cycle already elapsed
        assert_eq!(timer.started_at, Some(now - 20_000));

        let view = project(&timer, now);
        assert!(view.is_running);
        assert_eq!(view.remaining_ms, 40_000);
    }

    #[test]
    fn reconcile_on_exact_cycle_boundary_restarts_full() {
        let mut timer = Timer {
            id: TimerId::new("t"),
            name: "x".into(),
            duration_ms: 60_000,
            remaining_ms: 60_000,
            is_running: true,
            started_at: Some(T0),
            repeat: true,
            updated_at: Some(T0),
        };

        // Exactly two cycles elapsed: remainder 0 starts a fresh cycle
        let now = T0 + 120_000;
        assert!(reconcile(&mut timer, now));
        assert_eq!(timer.started_at, Some(now));
        assert_eq!(project(&timer, now).remaining_ms, 60_000);
    }

    #[test]
    fn project_reduces_remaining_while_running() {
        let timer = Timer {
            id: TimerId::new("t"),
            name: "x".into(),
            duration_ms: 60_000,
            remaining_ms: 60_000,
            is_running: true,
            started_at: Some(T0),
            repeat: false,
            updated_at: Some(T0),
        };

        let view = project(&timer, T0 + 15_000);
        assert_eq!(view.remaining_ms, 45_000);
        assert!(view.is_running);
        assert_eq!(view.started_at, Some(T0));

        // At expiry the projection reports stopped with no start timestamp
        let view = project(&timer, T0 + 60_000);
        assert_eq!(view.remaining_ms, 0);
        assert!(!view.is_running);
        assert_eq!(view.started_at, None);
    }

    #[tokio::test]
    async fn create_applies_defaults() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir).await;

        let update = engine.create(T0, NewTimer::default()).await.unwrap();
        assert!(update.changed);
        assert_eq!(update.timer.name, DEFAULT_TIMER_NAME);
        assert_eq!(update.timer.duration_ms, DEFAULT_TIMER_DURATION_MS);
        assert_eq!(update.timer.remaining_ms, DEFAULT_TIMER_DURATION_MS);
        assert!(!update.timer.is_running);
        assert!(!update.timer.repeat);
        assert_eq!(update.timer.updated_at, Some(T0));
    }

    #[tokio::test]
    async fn create_persists_across_cache_invalidation() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir).await;

        let created = engine.create(T0, minutes(10)).await.unwrap();
        engine.store.invalidate_cache().await;

        let snapshot = engine.snapshot(T0 + 1000).await;
        assert_eq!(snapshot.server_time, T0 + 1000);
        assert_eq!(snapshot.timers.len(), 1);
        assert_eq!(snapshot.timers[0].id, created.timer.id);
        assert_eq!(snapshot.timers[0].duration_ms, 600_000);
    }

    #[tokio::test]
    async fn timer_lifecycle_start_run_expire() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir).await;

        let id = engine
            .create(T0, NewTimer { seconds: Some(5), ..NewTimer::default() })
            .await
            .unwrap()
            .timer
            .id;

        let started = engine.start(T0, &id).await.unwrap();
        assert!(started.timer.is_running);
        assert_eq!(started.timer.started_at, Some(T0));
        assert_eq!(started.timer.remaining_ms, 5_000);

        // Mid-flight snapshot does not persist anything but projects live
        let snapshot = engine.snapshot(T0 + 2_000).await;
        assert_eq!(snapshot.timers[0].remaining_ms, 3_000);
        assert!(snapshot.timers[0].is_running);

        // Past expiry the timer is stopped and the stop is persisted
        let snapshot = engine.snapshot(T0 + 9_000).await;
        assert!(!snapshot.timers[0].is_running);
        assert_eq!(snapshot.timers[0].remaining_ms, 0);

        engine.store.invalidate_cache().await;
        let doc = engine.store.read(false).await;
        assert!(!doc.timers[0].is_running);
        assert_eq!(doc.timers[0].remaining_ms, 0);
        assert_eq!(doc.timers[0].started_at, None);
    }

    #[tokio::test]
    async fn start_rearms_expired_timer() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir).await;

        let id = engine
            .create(T0, NewTimer { seconds: Some(5), ..NewTimer::default() })
            .await
            .unwrap()
            .timer
            .id;
        engine.start(T0, &id).await.unwrap();

        // Start again long after expiry: full duration again
        let restarted = engine.start(T0 + 60_000, &id).await.unwrap();
        assert!(restarted.timer.is_running);
        assert_eq!(restarted.timer.remaining_ms, 5_000);
        assert_eq!(restarted.timer.started_at, Some(T0 + 60_000));
    }

    #[tokio::test]
    async fn restart_midflight_keeps_reconciled_remaining() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir).await;

        let id = engine
            .create(T0, NewTimer { seconds: Some(59), ..NewTimer::default() })
            .await
            .unwrap()
            .timer
            .id;
        engine.start(T0, &id).await.unwrap();

        // Restart 30s in: the countdown continues from where it was, not
        // from the last stored remaining
        let restarted = engine.start(T0 + 30_000, &id).await.unwrap();
        assert!(restarted.timer.is_running);
        assert_eq!(restarted.timer.remaining_ms, 29_000);
        assert_eq!(restarted.timer.started_at, Some(T0 + 30_000));
    }

    #[tokio::test]
    async fn restart_after_repeat_catchup_keeps_cycle_position() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir).await;

        let id = engine
            .create(T0, NewTimer { minutes: Some(1), repeat: true, ..NewTimer::default() })
            .await
            .unwrap()
            .timer
            .id;
        engine.start(T0, &id).await.unwrap();

        // 90s in: one full cycle done, 30s into the second. Restarting must
        // arm with the 30s left in the current cycle, not the full minute.
        let restarted = engine.start(T0 + 90_000, &id).await.unwrap();
        assert!(restarted.timer.is_running);
        assert_eq!(restarted.timer.remaining_ms, 30_000);
        assert_eq!(restarted.timer.started_at, Some(T0 + 90_000));
    }

    #[tokio::test]
    async fn duration_override_same_value_stops_running_timer() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir).await;

        let id = engine.create(T0, minutes(5)).await.unwrap().timer.id;
        engine.start(T0, &id).await.unwrap();

        let update = engine
            .update_meta(
                T0 + 10_000,
                &id,
                TimerPatch { minutes: Some(5), ..TimerPatch::default() },
            )
            .await
            .unwrap();

        assert!(update.changed);
        assert!(!update.timer.is_running);
        assert_eq!(update.timer.remaining_ms, 300_000);
        assert_eq!(update.timer.started_at, None);
        assert_eq!(update.timer.updated_at, Some(T0 + 10_000));
    }

    #[tokio::test]
    async fn duration_override_on_stopped_full_timer_is_noop() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir).await;

        let id = engine.create(T0, minutes(5)).await.unwrap().timer.id;

        let update = engine
            .update_meta(
                T0 + 10_000,
                &id,
                TimerPatch { minutes: Some(5), ..TimerPatch::default() },
            )
            .await
            .unwrap();

        assert!(!update.changed);
        assert_eq!(update.timer.updated_at, Some(T0));
    }

    #[tokio::test]
    async fn start_zero_duration_timer_stays_stopped() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir).await;

        let id = engine
            .create(T0, NewTimer { minutes: Some(0), ..NewTimer::default() })
            .await
            .unwrap()
            .timer
            .id;

        let update = engine.start(T0, &id).await.unwrap();
        assert!(update.changed);
        assert!(!update.timer.is_running);
        assert_eq!(update.timer.remaining_ms, 0);
        assert_eq!(update.timer.started_at, None);
    }

    #[tokio::test]
    async fn update_meta_noop_skips_persistence() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir).await;

        let created = engine
            .create(T0, NewTimer { name: Some("보스".into()), minutes: Some(1), ..NewTimer::default() })
            .await
            .unwrap();

        let update = engine
            .update_meta(
                T0 + 5_000,
                &created.timer.id,
                TimerPatch { name: Some("보스".into()), ..TimerPatch::default() },
            )
            .await
            .unwrap();

        assert!(!update.changed);
        // updated_at untouched by the no-op
        assert_eq!(update.timer.updated_at, Some(T0));
    }

    #[tokio::test]
    async fn update_meta_duration_override_stops_timer() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir).await;

        let id = engine.create(T0, minutes(5)).await.unwrap().timer.id;
        engine.start(T0, &id).await.unwrap();

        let update = engine
            .update_meta(
                T0 + 10_000,
                &id,
                TimerPatch { minutes: Some(2), ..TimerPatch::default() },
            )
            .await
            .unwrap();

        assert!(update.changed);
        assert!(!update.timer.is_running);
        assert_eq!(update.timer.duration_ms, 120_000);
        assert_eq!(update.timer.remaining_ms, 120_000);
        assert_eq!(update.timer.started_at, None);
        assert_eq!(update.timer.updated_at, Some(T0 + 10_000));
    }

    #[tokio::test]
    async fn update_meta_changes_name_and_repeat_independently() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir).await;

        let id = engine.create(T0, minutes(5)).await.unwrap().timer.id;
        engine.start(T0, &id).await.unwrap();

        let update = engine
            .update_meta(
                T0 + 1_000,
                &id,
                TimerPatch {
                    name: Some("새 이름".into()),
                    repeat: Some(true),
                    ..TimerPatch::default()
                },
            )
            .await
            .unwrap();

        assert!(update.changed);
        assert_eq!(update.timer.name, "새 이름");
        assert!(update.timer.repeat);
        // Name/repeat edits do not interrupt a running countdown
        assert!(update.timer.is_running);
    }

    #[tokio::test]
    async fn reset_restores_full_duration() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir).await;

        let id = engine.create(T0, minutes(5)).await.unwrap().timer.id;
        engine.start(T0, &id).await.unwrap();

        let update = engine.reset(T0 + 60_000, &id).await.unwrap();
        assert!(update.changed);
        assert!(!update.timer.is_running);
        assert_eq!(update.timer.remaining_ms, 300_000);
        assert_eq!(update.timer.started_at, None);
    }

    #[tokio::test]
    async fn delete_removes_timer() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir).await;

        let id = engine.create(T0, minutes(1)).await.unwrap().timer.id;
        engine.delete(&id).await.unwrap();

        assert!(engine.snapshot(T0).await.timers.is_empty());
        assert!(matches!(
            engine.start(T0, &id).await,
            Err(RosterError::TimerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn operations_on_unknown_id_fail() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir).await;

        let missing = TimerId::new("no-such-timer");
        assert!(matches!(
            engine.start(T0, &missing).await,
            Err(RosterError::TimerNotFound(_))
        ));
        assert!(matches!(
            engine.reset(T0, &missing).await,
            Err(RosterError::TimerNotFound(_))
        ));
        assert!(matches!(
            engine.delete(&missing).await,
            Err(RosterError::TimerNotFound(_))
        ));
        assert!(matches!(
            engine.update_meta(T0, &missing, TimerPatch::default()).await,
            Err(RosterError::TimerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn blank_id_is_a_validation_error() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir).await;

        let blank = TimerId::new("   ");
        assert!(matches!(
            engine.start(T0, &blank).await,
            Err(RosterError::ValidationError(_))
        ));
        assert!(matches!(
            engine.delete(&blank).await,
            Err(RosterError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn repeating_timer_survives_long_gap() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir).await;

        let id = engine
            .create(T0, NewTimer { minutes: Some(1), repeat: true, ..NewTimer::default() })
            .await
            .unwrap()
            .timer
            .id;
        engine.start(T0, &id).await.unwrap();

        let snapshot = engine.snapshot(T0 + 500_000).await;
        let view = &snapshot.timers[0];
        assert!(view.is_running);
        // 500s = 8 cycles + 20s, so 40s left in the current one
        assert_eq!(view.remaining_ms, 40_000);
        assert_eq!(view.started_at, Some(T0 + 500_000 - 20_000));
    }
}
