//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the page manager and the live sessions. The manager is immutable
//! once built, so it is shared behind a plain `Arc`.
//!
//! Each session sits behind its own `tokio::sync::Mutex`. Intake holds that
//! lock for the whole dispatch, which serializes interactions on one session
//! while different sessions proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use crate::event::Interaction;
use crate::manager::Manager;
use crate::session::Session;

pub type SharedSession = Arc<Mutex<Session>>;

// =============================================================================
// SESSION STORE
// =============================================================================

/// In-memory sessions keyed by `Interaction::session_key`.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SharedSession>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for the actor behind `event`, created on first contact.
    ///
    /// The session is touched while the map lock is held, so a sweep that
    /// runs before the caller locks it sees it as fresh.
    pub async fn session_for(&self, event: &Interaction) -> SharedSession {
        let key = event.session_key();
        if let Some(session) = self.sessions.read().await.get(&key) {
            touch_unlocked(session);
            return Arc::clone(session);
        }

        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(event.actor_id()))));
        touch_unlocked(session);
        Arc::clone(session)
    }

    /// Drop the session stored under `key`. Returns whether one existed.
    pub async fn remove(&self, key: &str) -> bool {
        self.sessions.write().await.remove(key).is_some()
    }

    /// Drop the entry under `key` only if it is still `session`. A newer
    /// session created under the same key is left alone.
    pub async fn remove_if_same(&self, key: &str, session: &SharedSession) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get(key) {
            Some(stored) if Arc::ptr_eq(stored, session) => sessions.remove(key).is_some(),
            _ => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Remove sessions idle for at least `ttl`, and ended ones. Sessions whose
    /// lock is held are mid-dispatch and always survive. Returns the number
    /// removed.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(session) => !session.is_ended() && session.idle_for() < ttl,
            Err(_) => true,
        });
        before - sessions.len()
    }
}

// A held lock means a dispatch is running on it, which already keeps it alive.
fn touch_unlocked(session: &SharedSession) {
    if let Ok(mut session) = session.try_lock() {
        session.touch();
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<Manager>,
    pub sessions: SessionStore,
}

impl AppState {
    #[must_use]
    pub fn new(manager: Manager) -> Self {
        Self { manager: Arc::new(manager), sessions: SessionStore::new() }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
