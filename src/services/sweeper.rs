//! Sweeper service: periodic eviction of idle sessions.
//!
//! DESIGN
//! ======
//! Sessions live in memory only. A background task wakes every
//! `session_sweep` and drops sessions idle for longer than `session_idle`,
//! plus any that ended without being removed. Sessions mid-dispatch are
//! skipped and picked up by a later pass.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::state::SessionStore;

/// Spawn the background sweeper. Returns a handle for shutdown.
pub fn spawn_session_sweeper(sessions: SessionStore, idle: Duration, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            sweep(&sessions, idle).await;
        }
    })
}

async fn sweep(sessions: &SessionStore, idle: Duration) {
    let evicted = sessions.evict_idle(idle).await;
    if evicted == 0 {
        return;
    }
    let remaining = sessions.len().await;
    info!(evicted, remaining, idle_secs = idle.as_secs(), "sweeper: evicted idle sessions");
}

#[cfg(test)]
#[path = "sweeper_test.rs"]
mod tests;
