//! Ephemeral interaction state
//!
//! None of this is persisted: it backs multi-step UI interactions and is
//! bounded in both size and age so an abandoned flow cannot leak memory.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How long a per-user selection stays valid.
pub const USER_SELECTION_TTL: Duration = Duration::from_secs(30 * 60);

/// How long pending interaction data stays valid.
pub const INTERACTION_TTL: Duration = Duration::from_secs(10 * 60);

/// Default interval for the background expiry sweep.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

const MAX_RESET_ITEMS: usize = 20;
const MAX_USER_SELECTIONS: usize = 100;

/// Multi-step interaction flows that stash intermediate data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    TableManage,
    Recruitment,
}

struct UserSelection {
    value: String,
    at: Instant,
}

struct PendingInteraction {
    data: serde_json::Value,
    at: Instant,
}

struct Inner {
    reset_items: HashSet<String>,
    user_selections: HashMap<String, UserSelection>,
    interactions: HashMap<InteractionKind, PendingInteraction>,
}

/// Bounded, expiring in-memory state. Share behind an `Arc`.
pub struct Selections {
    inner: Mutex<Inner>,
    user_selection_ttl: Duration,
    interaction_ttl: Duration,
}

impl Default for Selections {
    fn default() -> Self {
        Self::new()
    }
}

impl Selections {
    pub fn new() -> Self {
        Self::with_ttls(USER_SELECTION_TTL, INTERACTION_TTL)
    }

    /// TTL override, used by tests to exercise expiry without waiting.
    pub fn with_ttls(user_selection_ttl: Duration, interaction_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                reset_items: HashSet::new(),
                user_selections: HashMap::new(),
                interactions: HashMap::new(),
            }),
            user_selection_ttl,
            interaction_ttl,
        }
    }

    /// Toggle an item in the reset selection. Returns whether the item is
    /// selected afterwards; adding past capacity is refused.
    pub fn toggle_reset_item(&self, item: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.reset_items.remove(item) {
            return false;
        }
        if inner.reset_items.len() >= MAX_RESET_ITEMS {
            warn!(item, limit = MAX_RESET_ITEMS, "Reset selection full, item not added");
            return false;
        }
        inner.reset_items.insert(item.to_string());
        true
    }

    pub fn reset_items(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner.reset_items.iter().cloned().collect()
    }

    pub fn clear_reset_items(&self) {
        self.inner.lock().unwrap().reset_items.clear();
    }

    /// Remember a user's in-progress selection. When full, the oldest entry
    /// is evicted to make room.
    pub fn set_user_selection(&self, user_id: &str, value: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.user_selections.contains_key(user_id)
            && inner.user_selections.len() >= MAX_USER_SELECTIONS
        {
            if let Some(oldest) = inner
                .user_selections
                .iter()
                .min_by_key(|(_, s)| s.at)
                .map(|(k, _)| k.clone())
            {
                inner.user_selections.remove(&oldest);
                debug!(user_id = %oldest, "Evicted oldest user selection");
            }
        }
        inner.user_selections.insert(
            user_id.to_string(),
            UserSelection {
                value: value.into(),
                at: Instant::now(),
            },
        );
    }

    /// Fetch a user's selection, dropping it if it has expired.
    pub fn user_selection(&self, user_id: &str) -> Option<String> {
        let mut inner = self.inner.lock().unwrap();
        match inner.user_selections.get(user_id) {
            Some(s) if s.at.elapsed() < self.user_selection_ttl => Some(s.value.clone()),
            Some(_) => {
                inner.user_selections.remove(user_id);
                None
            }
            None => None,
        }
    }

    pub fn clear_user_selection(&self, user_id: &str) {
        self.inner.lock().unwrap().user_selections.remove(user_id);
    }

    pub fn set_interaction(&self, kind: InteractionKind, data: serde_json::Value) {
        self.inner.lock().unwrap().interactions.insert(
            kind,
            PendingInteraction {
                data,
                at: Instant::now(),
            },
        );
    }

    /// Fetch pending interaction data, dropping it if it has expired.
    pub fn interaction(&self, kind: InteractionKind) -> Option<serde_json::Value> {
        let mut inner = self.inner.lock().unwrap();
        match inner.interactions.get(&kind) {
            Some(p) if p.at.elapsed() < self.interaction_ttl => Some(p.data.clone()),
            Some(_) => {
                inner.interactions.remove(&kind);
                None
            }
            None => None,
        }
    }

    pub fn clear_interaction(&self, kind: InteractionKind) {
        self.inner.lock().unwrap().interactions.remove(&kind);
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let mut inner = self.inner.lock().unwrap();
        let mut removed = 0;

        let user_ttl = self.user_selection_ttl;
        let before = inner.user_selections.len();
        inner.user_selections.retain(|_, s| s.at.elapsed() < user_ttl);
        removed += before - inner.user_selections.len();

        let interaction_ttl = self.interaction_ttl;
        let before = inner.interactions.len();
        inner.interactions.retain(|_, p| p.at.elapsed() < interaction_ttl);
        removed += before - inner.interactions.len();

        if removed > 0 {
            debug!(removed, "Expired ephemeral state cleaned up");
        }
        removed
    }

    /// Run `cleanup` periodically until the returned handle is aborted.
    pub fn spawn_cleanup(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let selections = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await; // first tick fires immediately
            loop {
                interval.tick().await;
                selections.cleanup();
            }
        })
    }
}
