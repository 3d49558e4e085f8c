//! Per-conversation session state and the process-wide session store.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::dialogue::state::DialogueState;
use crate::plan::PlanPager;
use crate::profile::DraftProfile;

/// Transient dialogue state for one conversation. Never persisted.
#[derive(Debug)]
pub struct Session {
    pub user_id: String,
    pub state: DialogueState,
    pub draft: DraftProfile,
    pub pager: PlanPager,
    /// Bumped on every reset. A long-running generation call captures the
    /// epoch before suspending and discards its result if the session was
    /// reset in the meantime.
    pub epoch: u64,
    pub last_active_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            state: DialogueState::Idle,
            draft: DraftProfile::default(),
            pager: PlanPager::new(),
            epoch: 0,
            last_active_at: Utc::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }

    /// Restart: back to the main menu with draft, plan, and cursor cleared.
    pub fn reset(&mut self) {
        self.state = DialogueState::Idle;
        self.draft.clear();
        self.pager.clear();
        self.epoch += 1;
    }

    /// Enter the collection flow with a fresh draft.
    pub fn begin_collection(&mut self) {
        self.draft.clear();
        self.state = DialogueState::AwaitingSex;
    }
}

/// Process-wide session store keyed by user id.
///
/// Sessions are created on first contact and handed out as
/// `Arc<Mutex<Session>>`; the per-session mutex serializes event handling
/// for one user while different users proceed concurrently.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the session for a user, creating it on first contact.
    pub async fn get_or_create(&self, user_id: &str) -> Arc<Mutex<Session>> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(user_id) {
                return Arc::clone(session);
            }
        }

        let mut sessions = self.sessions.write().await;
        Arc::clone(
            sessions
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(Session::new(user_id)))),
        )
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle for longer than `idle_timeout`. Sessions whose
    /// lock is currently held are mid-event and are kept.
    pub async fn prune_stale(&self, idle_timeout: std::time::Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(idle_timeout).unwrap_or(chrono::Duration::hours(1));

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(guard) => guard.last_active_at >= cutoff,
            Err(_) => true,
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned stale sessions");
        }
        pruned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::DayPlan;
    use crate::profile::Sex;

    #[test]
    fn reset_clears_everything_and_bumps_epoch() {
        let mut session = Session::new("u1");
        session.state = DialogueState::Complete;
        session.draft.sex = Some(Sex::Male);
        session.pager.load(vec![DayPlan::new("Day 1")]).unwrap();
        let epoch = session.epoch;

        session.reset();

        assert_eq!(session.state, DialogueState::Idle);
        assert_eq!(session.draft, DraftProfile::default());
        assert!(!session.pager.is_loaded());
        assert_eq!(session.epoch, epoch + 1);
    }

    #[test]
    fn begin_collection_clears_previous_draft() {
        let mut session = Session::new("u1");
        session.draft.sex = Some(Sex::Female);
        session.begin_collection();
        assert_eq!(session.state, DialogueState::AwaitingSex);
        assert_eq!(session.draft.sex, None);
    }

    #[tokio::test]
    async fn store_creates_on_first_contact_and_reuses() {
        let store = SessionStore::new();
        let a = store.get_or_create("u1").await;
        let b = store.get_or_create("u1").await;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.count().await, 1);

        store.get_or_create("u2").await;
        assert_eq!(store.count().await, 2);
    }

    #[tokio::test]
    async fn prune_drops_only_stale_sessions() {
        let store = SessionStore::new();
        let stale = store.get_or_create("stale").await;
        stale.lock().await.last_active_at = Utc::now() - chrono::Duration::hours(2);
        store.get_or_create("fresh").await;

        let pruned = store.prune_stale(std::time::Duration::from_secs(3600)).await;
        assert_eq!(pruned, 1);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn prune_keeps_locked_sessions() {
        let store = SessionStore::new();
        let session = store.get_or_create("busy").await;
        let mut guard = session.lock().await;
        guard.last_active_at = Utc::now() - chrono::Duration::hours(2);

        // Lock still held: the session is mid-event and must survive.
        let pruned = store.prune_stale(std::time::Duration::from_secs(3600)).await;
        assert_eq!(pruned, 0);
        drop(guard);
    }
}
