//! Interaction intake.
//!
//! DESIGN
//! ======
//! `receive` returns `202 Accepted` immediately and hands the event to
//! `dispatch` on its own task. `dispatch` owns the session lock for the whole
//! interaction:
//!
//! - commands restart navigation and show the page registered under the
//!   command name;
//! - control clicks and form submissions go through
//!   `Manager::handle_interaction`.
//!
//! A session that a handler ended is removed from the store afterwards, unless
//! a newer session already replaced it under the same key.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use tracing::{debug, info, warn};

use crate::event::Interaction;
use crate::state::AppState;

/// Shown for a command with no page registered under its name.
pub const UNKNOWN_COMMAND_MESSAGE: &str = "That command is not available.";

/// `POST /interactions`: acknowledge, then dispatch in the background.
pub async fn receive(State(state): State<AppState>, Json(event): Json<Interaction>) -> StatusCode {
    info!(%event, id = %event.id, "interactions: received");
    tokio::spawn(dispatch(state, event));
    StatusCode::ACCEPTED
}

/// Run one interaction to completion against its session.
pub async fn dispatch(state: AppState, event: Interaction) {
    let key = event.session_key();
    // EDGE: an interaction queued behind the one that ended its session must
    // not run on the orphan; it starts over on a fresh session instead.
    let (shared, mut session) = loop {
        let shared = state.sessions.session_for(&event).await;
        let session = Arc::clone(&shared).lock_owned().await;
        if !session.is_ended() {
            break (shared, session);
        }
        drop(session);
        debug!(session = %key, "interactions: session ended while queued");
        state.sessions.remove_if_same(&key, &shared).await;
    };
    session.touch();

    if let Some(command) = event.command_name() {
        if state.manager.page(command).is_some() {
            session.reset_navigation();
            let _responded = state
                .manager
                .context(&event, &mut session)
                .show(command, "")
                .await;
        } else {
            warn!(%event, command, "interactions: no page for command");
            state
                .manager
                .respond_with_error(&event, UNKNOWN_COMMAND_MESSAGE)
                .await;
        }
    } else {
        state.manager.handle_interaction(&event, &mut session).await;
    }

    let ended = session.is_ended();
    drop(session);
    if ended && state.sessions.remove_if_same(&key, &shared).await {
        debug!(session = %key, "interactions: ended session removed");
    }
}

#[cfg(test)]
#[path = "interactions_test.rs"]
mod tests;
