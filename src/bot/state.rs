//! Per-user conversation state.
//!
//! One entry per Telegram user behind a single mutex. Handlers clone the
//! state out, do their backend calls, and write mutations back through
//! [`ConversationStore::update`] — the lock is never held across an await.
//! A background sweep reaps entries idle past [`IDLE_EXPIRY`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::action::EditField;
use crate::dns::RecordType;

/// Conversations idle longer than this are dropped by the sweeper.
pub const IDLE_EXPIRY: Duration = Duration::from_secs(30 * 60);
/// How often the sweeper runs.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Wizard step the user is currently on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    #[default]
    None,
    SelectZone,
    SelectType,
    InputName,
    InputContent,
    SelectTtl,
    SelectProxied,
    Confirm,
    EditContent,
    EditTtl,
    EditProxied,
}

/// Create-wizard answers, filled in one step at a time.
#[derive(Debug, Clone, Default)]
pub struct CreateDraft {
    pub zone: Option<String>,
    pub record_type: Option<RecordType>,
    pub name: Option<String>,
    pub content: Option<String>,
    pub ttl: Option<u32>,
    pub proxied: Option<bool>,
    /// The wizard message being edited in place.
    pub message_id: Option<i64>,
}

/// A single-field edit in progress, addressed by the page coordinates the
/// user clicked. Untouched field values are re-read from the live record at
/// apply time, never from here.
#[derive(Debug, Clone)]
pub struct EditDraft {
    pub zone: String,
    pub page: usize,
    pub row: usize,
    pub field: EditField,
    pub message_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct ConversationState {
    pub step: Step,
    pub create: CreateDraft,
    pub edit: Option<EditDraft>,
    last_updated: Instant,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            step: Step::None,
            create: CreateDraft::default(),
            edit: None,
            last_updated: Instant::now(),
        }
    }
}

pub struct ConversationStore {
    states: Mutex<HashMap<i64, ConversationState>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Snapshot of the user's state, created lazily. Refreshes the idle
    /// timer.
    pub fn get(&self, user_id: i64) -> ConversationState {
        let mut states = self.lock();
        let state = states.entry(user_id).or_default();
        state.last_updated = Instant::now();
        state.clone()
    }

    /// Mutate under the lock. The closure must not block.
    pub fn update<F>(&self, user_id: i64, f: F)
    where
        F: FnOnce(&mut ConversationState),
    {
        let mut states = self.lock();
        let state = states.entry(user_id).or_default();
        f(state);
        state.last_updated = Instant::now();
    }

    pub fn set_step(&self, user_id: i64, step: Step) {
        self.update(user_id, |state| state.step = step);
    }

    pub fn clear(&self, user_id: i64) {
        self.lock().remove(&user_id);
    }

    /// Drop entries idle longer than `max_idle`; returns how many were
    /// removed.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let mut states = self.lock();
        let before = states.len();
        states.retain(|_, state| state.last_updated.elapsed() <= max_idle);
        before - states.len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i64, ConversationState>> {
        self.states.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodically reap idle conversations. A failed iteration is impossible by
/// construction (the sweep only takes the lock and retains), so the loop
/// never exits.
pub fn spawn_expiry_sweep(store: Arc<ConversationStore>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        // The first tick completes immediately; skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let swept = store.sweep_idle(IDLE_EXPIRY);
            if swept > 0 {
                tracing::debug!("swept {swept} idle conversation(s)");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_is_created_lazily_and_cleared() {
        let store = ConversationStore::new();
        assert_eq!(store.get(1).step, Step::None);

        store.set_step(1, Step::SelectZone);
        assert_eq!(store.get(1).step, Step::SelectZone);

        store.clear(1);
        assert_eq!(store.get(1).step, Step::None);
    }

    #[test]
    fn update_accumulates_draft_fields() {
        let store = ConversationStore::new();
        store.update(7, |s| {
            s.create.zone = Some("example.com".into());
            s.step = Step::SelectType;
        });
        store.update(7, |s| {
            s.create.record_type = Some(RecordType::A);
            s.step = Step::InputName;
        });

        let state = store.get(7);
        assert_eq!(state.create.zone.as_deref(), Some("example.com"));
        assert_eq!(state.create.record_type, Some(RecordType::A));
        assert_eq!(state.step, Step::InputName);
    }

    #[test]
    fn idle_entries_are_swept_and_replaced_fresh() {
        let store = ConversationStore::new();
        store.update(9, |s| {
            s.step = Step::Confirm;
            s.create.zone = Some("example.com".into());
        });

        std::thread::sleep(Duration::from_millis(5));
        let swept = store.sweep_idle(Duration::from_millis(1));
        assert_eq!(swept, 1);

        // Subsequent lookup sees a fresh state, not the stale wizard.
        let state = store.get(9);
        assert_eq!(state.step, Step::None);
        assert!(state.create.zone.is_none());
    }

    #[test]
    fn touched_entries_survive_the_sweep() {
        let store = ConversationStore::new();
        store.set_step(1, Step::SelectZone);
        let _ = store.get(1);
        assert_eq!(store.sweep_idle(Duration::from_secs(60)), 0);
        assert_eq!(store.get(1).step, Step::SelectZone);
    }
}
