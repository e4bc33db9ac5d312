//! Manager: page registry, dispatch and the history state machine.
//!
//! ARCHITECTURE
//! ============
//! The manager is the only component that renders a page or mutates a
//! session's current page and history. Everything funnels into two
//! primitives:
//!
//! - `display` builds a page's message, sends it as an update of the live
//!   interaction response, then records the navigation with `update_page`.
//! - `update_page` maintains the history stack.
//!
//! DESIGN
//! ======
//! The registry is filled during startup through `&mut self` and is
//! read-only once the manager is shared behind an `Arc`, so lookups need no
//! locking. Dispatch problems (unknown page, missing hook) are configuration
//! omissions: they are logged and dropped, never raised. Transport failures
//! are logged and not retried; the next user action re-renders.
//!
//! HISTORY
//! =======
//! Revisiting a page that is already on the stack truncates the stack at
//! that entry. Bouncing between two screens therefore never grows history.

use std::collections::HashMap;
use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, error, warn};

use crate::context::Context;
use crate::event::{ComponentKind, Interaction, InteractionKind};
use crate::message::{Attachment, OutboundMessage};
use crate::page::{Handled, Page};
use crate::respond::Responder;
use crate::session::Session;

/// Shown when an interaction arrives for a session with no routable page.
pub const EXPIRED_MESSAGE: &str = "This menu has expired. Run the command again to start over.";

pub struct Manager {
    pages: HashMap<String, Page>,
    responder: Arc<dyn Responder>,
}

impl Manager {
    #[must_use]
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        Self { pages: HashMap::new(), responder }
    }

    // =========================================================================
    // REGISTRY
    // =========================================================================

    /// Register pages. A page whose name is already registered replaces the
    /// earlier one.
    pub fn add_pages(&mut self, pages: impl IntoIterator<Item = Page>) {
        for page in pages {
            let name = page.name().to_string();
            if self.pages.insert(name.clone(), page).is_some() {
                debug!(page = %name, "manager: page re-registered");
            }
        }
    }

    #[must_use]
    pub fn page(&self, name: &str) -> Option<&Page> {
        self.pages.get(name)
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn responder(&self) -> &Arc<dyn Responder> {
        &self.responder
    }

    /// Context for programmatic navigation outside an inbound dispatch.
    pub fn context<'a>(&'a self, event: &'a Interaction, session: &'a mut Session) -> Context<'a> {
        Context::new(self, event, session)
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Route a control click or form submission to the current page's hook.
    pub async fn handle_interaction(&self, event: &Interaction, session: &mut Session) {
        let Some(current) = session.current_page().map(str::to_owned) else {
            warn!(%event, "manager: interaction without a current page");
            self.respond_with_error(event, EXPIRED_MESSAGE).await;
            return;
        };
        let Some(page) = self.page(&current) else {
            error!(%event, page = %current, "manager: current page is not registered");
            self.respond_with_error(event, EXPIRED_MESSAGE).await;
            return;
        };

        debug!(%event, page = %current, "manager: dispatch");

        let ctx = Context::new(self, event, session);
        let _responded = match &event.kind {
            InteractionKind::Component { custom_id, component: ComponentKind::Select, values } => {
                let Some(hook) = &page.on_select else {
                    error!(%event, page = %current, "manager: page has no select handler");
                    return;
                };
                hook(ctx, custom_id.as_str(), values.as_slice()).await
            }
            InteractionKind::Component { custom_id, component: ComponentKind::Button, .. } => {
                let Some(hook) = &page.on_button else {
                    error!(%event, page = %current, "manager: page has no button handler");
                    return;
                };
                hook(ctx, custom_id.as_str()).await
            }
            InteractionKind::ModalSubmit { .. } => {
                let Some(hook) = &page.on_modal else {
                    error!(%event, page = %current, "manager: page has no modal handler");
                    return;
                };
                hook(ctx).await
            }
            InteractionKind::Command { .. } => {
                warn!(%event, "manager: commands are routed by the intake layer; dropping");
                return;
            }
        };
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    /// Show `page_name`: run its `on_show` hook, and render it unless the
    /// hook answered on its own.
    pub async fn show(&self, event: &Interaction, session: &mut Session, page_name: &str, content: &str) {
        let Some(page) = self.page(page_name) else {
            error!(%event, page = page_name, "manager: show for unknown page");
            return;
        };

        if let Some(hook) = &page.on_show {
            let ctx = Context::new(self, event, session);
            match hook(ctx).await {
                Handled::Done(_) => {}
                Handled::Pass(ctx) => {
                    self.display(ctx.event, ctx.session, page, content, Vec::new())
                        .await;
                }
            }
            return;
        }

        self.display(event, session, page, content, Vec::new())
            .await;
    }

    /// Render `page` into the live response, then record the navigation.
    ///
    /// `update_page` runs whether or not the platform accepted the message.
    pub async fn display(
        &self,
        event: &Interaction,
        session: &mut Session,
        page: &Page,
        content: &str,
        files: Vec<Attachment>,
    ) {
        let message = page
            .build_message(session)
            .with_status_line(&status_line(content, OffsetDateTime::now_utc()))
            .with_attachments(files);

        match self.responder.update_response(event, &message).await {
            Ok(message_id) => {
                debug!(page = page.name(), message_id = %message_id.0, "manager: page rendered");
            }
            Err(e) => {
                warn!(error = %e, page = page.name(), retryable = e.retryable(), "manager: render failed");
            }
        }

        self.update_page(session, page);
    }

    /// Move `session` to `new_page`, maintaining the history stack.
    pub fn update_page(&self, session: &mut Session, new_page: &Page) {
        let new_name = new_page.name();

        if let Some(current) = session.current_page().map(str::to_owned) {
            if current != new_name {
                let found = session
                    .previous_pages()
                    .iter()
                    .position(|name| name == new_name);
                match found {
                    Some(index) => {
                        // EDGE: revisit drops the entry and everything after it.
                        session.previous_pages_mut().truncate(index);
                    }
                    None => {
                        session.previous_pages_mut().push(current);
                        if let Some(reset) = &new_page.on_reset {
                            reset(session);
                        }
                    }
                }
            }
        }

        session.set_current_page(new_name);
        debug!(
            session = %session.id(),
            page = new_name,
            depth = session.previous_pages().len(),
            "manager: page updated"
        );
    }

    // =========================================================================
    // ONE-SHOT RESPONSES
    // =========================================================================

    /// Answer with an error banner, bypassing pages.
    pub async fn respond_with_error(&self, event: &Interaction, message: &str) {
        let outbound = OutboundMessage::error_banner(message);
        if let Err(e) = self.responder.update_response(event, &outbound).await {
            warn!(error = %e, %event, "manager: error response failed");
        }
    }

    /// Answer with plain text and no controls, bypassing pages.
    pub async fn respond_with_clear(&self, event: &Interaction, message: &str) {
        let outbound = OutboundMessage::new(message);
        if let Err(e) = self.responder.update_response(event, &outbound).await {
            warn!(error = %e, %event, "manager: clear response failed");
        }
    }
}

/// Status line appended below every rendered page.
pub(crate) fn status_line(content: &str, now: OffsetDateTime) -> String {
    let stamp = format!("{:02}:{:02}:{:02} UTC", now.hour(), now.minute(), now.second());
    if content.is_empty() {
        format!("-# Updated {stamp}")
    } else {
        format!("{content}\n-# Updated {stamp}")
    }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod tests;
