//! Session: durable per-conversation state.
//!
//! DESIGN
//! ======
//! A session outlives any single interaction. The navigation runtime reads
//! and writes two pieces of it: the current page name and the ordered stack
//! of previously visited pages. Everything else is a free-form typed
//! key/value store owned by the pages themselves, plus the `streaming` flag
//! the image streamer raises while a grid is loading.
//!
//! Creating, resuming and persisting sessions happens outside this module;
//! the binary keeps them in memory (see `state::SessionStore`).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session value for {key} could not be encoded: {source}")]
    Encode { key: String, source: serde_json::Error },
}

// =============================================================================
// SESSION
// =============================================================================

#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    actor_id: String,
    current_page: Option<String>,
    previous_pages: Vec<String>,
    values: HashMap<String, serde_json::Value>,
    streaming: bool,
    last_active: Instant,
    ended: bool,
}

impl Session {
    #[must_use]
    pub fn new(actor_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_id: actor_id.into(),
            current_page: None,
            previous_pages: Vec::new(),
            values: HashMap::new(),
            streaming: false,
            last_active: Instant::now(),
            ended: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Identity of the user driving this session.
    #[must_use]
    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    // -------------------------------------------------------------------------
    // Navigation bookkeeping
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn current_page(&self) -> Option<&str> {
        self.current_page.as_deref()
    }

    pub fn set_current_page(&mut self, name: impl Into<String>) {
        self.current_page = Some(name.into());
    }

    /// History stack, oldest first.
    #[must_use]
    pub fn previous_pages(&self) -> &[String] {
        &self.previous_pages
    }

    pub fn previous_pages_mut(&mut self) -> &mut Vec<String> {
        &mut self.previous_pages
    }

    /// Forget the current page and the whole history stack.
    ///
    /// Used when a fresh command restarts a conversation on an existing session.
    pub fn reset_navigation(&mut self) {
        self.current_page = None;
        self.previous_pages.clear();
    }

    // -------------------------------------------------------------------------
    // Typed key/value store
    // -------------------------------------------------------------------------

    /// Read a value and decode it as `T`. Missing keys and values of another
    /// shape both read as `None`.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// Store a value under `key`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be represented as JSON.
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), SessionError> {
        let encoded = serde_json::to_value(value).map_err(|source| SessionError::Encode { key: key.into(), source })?;
        self.values.insert(key.into(), encoded);
        Ok(())
    }

    /// Remove `key`, returning whether it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn set_streaming(&mut self, streaming: bool) {
        self.streaming = streaming;
    }

    /// Refresh freshness so idle eviction does not reclaim an active session.
    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    #[must_use]
    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }

    /// Mark the session finished. The owner drops it after the current
    /// interaction completes.
    pub fn end(&mut self) {
        self.ended = true;
        self.streaming = false;
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
