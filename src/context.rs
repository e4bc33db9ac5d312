//! Context: one-shot response surface for a single interaction.
//!
//! DESIGN
//! ======
//! A `Context` bundles the triggering event, the session and the manager for
//! the duration of one handler call. Every response verb consumes the context
//! and returns a `Responded` token that only this crate can construct. Page
//! hooks must return that token, so a handler that never answers, or answers
//! twice, does not compile.
//!
//! Dropping the future that drives a handler cancels it; there is no separate
//! cancellation scope.

use tracing::{debug, error, warn};

use crate::event::Interaction;
use crate::manager::Manager;
use crate::message::{Attachment, ModalSpec};
use crate::page::Page;
use crate::session::Session;

const MODAL_FAILED_MESSAGE: &str = "The form could not be opened. Please try again.";

/// Proof that an interaction was answered.
#[must_use = "handlers must return the token produced by a response verb"]
#[derive(Debug)]
pub struct Responded(());

impl Responded {
    pub(crate) fn new() -> Self {
        Self(())
    }
}

pub struct Context<'a> {
    pub(crate) manager: &'a Manager,
    pub(crate) event: &'a Interaction,
    pub(crate) session: &'a mut Session,
}

impl<'a> Context<'a> {
    pub(crate) fn new(manager: &'a Manager, event: &'a Interaction, session: &'a mut Session) -> Self {
        Self { manager, event, session }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn event(&self) -> &'a Interaction {
        self.event
    }

    #[must_use]
    pub fn manager(&self) -> &'a Manager {
        self.manager
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        self.session
    }

    /// The page the session is currently on, if it is registered.
    #[must_use]
    pub fn current_page(&self) -> Option<&'a Page> {
        let manager = self.manager;
        self.session
            .current_page()
            .and_then(|name| manager.page(name))
    }

    /// Stage navigation without rendering. Used before an async step whose
    /// completion renders the target page itself.
    pub fn update_page(&mut self, page_name: &str) {
        let Some(page) = self.manager.page(page_name) else {
            warn!(page = page_name, "context: update_page for unknown page");
            return;
        };
        self.manager.update_page(self.session, page);
    }

    // =========================================================================
    // RESPONSE VERBS
    // =========================================================================

    /// Terminal failure. Renders an error banner and ends the session.
    pub async fn error(self, content: &str) -> Responded {
        debug!(event = %self.event, content, "context: error");
        self.manager.respond_with_error(self.event, content).await;
        self.session.end();
        Responded::new()
    }

    /// Replace the screen with plain text.
    pub async fn clear(self, content: &str) -> Responded {
        self.manager.respond_with_clear(self.event, content).await;
        Responded::new()
    }

    /// Re-send the current page with its controls and attachments stripped.
    pub async fn clear_components(self, content: &str) -> Responded {
        let Some(page) = self.current_page() else {
            return self.clear(content).await;
        };
        let message = page
            .build_message(self.session)
            .without_components()
            .with_status_line(content);
        if let Err(e) = self
            .manager
            .responder()
            .update_response(self.event, &message)
            .await
        {
            warn!(error = %e, page = page.name(), "context: clear_components render failed");
        }
        Responded::new()
    }

    /// Navigate to `page_name`.
    pub async fn show(self, page_name: &str, content: &str) -> Responded {
        self.session.touch();
        self.manager
            .show(self.event, self.session, page_name, content)
            .await;
        Responded::new()
    }

    /// Re-render the current page after a handler changed session state.
    pub async fn reload(self, content: &str) -> Responded {
        self.rerender(content, Vec::new()).await
    }

    /// Re-render the current page unchanged, typically after rejecting input.
    pub async fn cancel(self, content: &str) -> Responded {
        self.rerender(content, Vec::new()).await
    }

    /// Return to the most recently visited page. With no history this is a
    /// `cancel`.
    pub async fn navigate_back(self, content: &str) -> Responded {
        let Some(previous) = self.session.previous_pages().last().cloned() else {
            debug!(event = %self.event, "context: navigate_back with empty history");
            return self.cancel(content).await;
        };
        if self.manager.page(&previous).is_none() {
            warn!(event = %self.event, page = %previous, "context: previous page is not registered");
            return self.cancel(content).await;
        }

        if let Some(cleanup) = self.current_page().and_then(|page| page.on_cleanup.clone()) {
            cleanup(self.session);
        }

        // Showing an entry that is already on the stack truncates the stack
        // at that entry, which pops it.
        self.show(&previous, content).await
    }

    /// Open a form dialog, then re-send the current page unless it opted out.
    pub async fn modal(self, spec: ModalSpec) -> Responded {
        if let Err(e) = self.event.ensure_can_open_modal() {
            error!(error = %e, event = %self.event, modal = %spec.custom_id, "context: modal from unsupported interaction");
            return self.error(&e.to_string()).await;
        }

        if let Err(e) = self
            .manager
            .responder()
            .open_modal(self.event, &spec)
            .await
        {
            warn!(error = %e, modal = %spec.custom_id, "context: modal open failed");
            return self.error(MODAL_FAILED_MESSAGE).await;
        }

        if let Some(page) = self.current_page() {
            if page.refreshes_after_modal() {
                self.manager
                    .display(self.event, self.session, page, "", Vec::new())
                    .await;
            }
        }
        Responded::new()
    }

    /// Render the current page with attachments.
    pub async fn respond_with_files(self, content: &str, files: Vec<Attachment>) -> Responded {
        self.rerender(content, files).await
    }

    async fn rerender(self, content: &str, files: Vec<Attachment>) -> Responded {
        let Some(page) = self.current_page() else {
            warn!(event = %self.event, "context: no current page to render");
            self.manager.respond_with_clear(self.event, content).await;
            return Responded::new();
        };
        self.manager
            .display(self.event, self.session, page, content, files)
            .await;
        Responded::new()
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
