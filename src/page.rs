//! Page: a named screen with a message builder and optional hooks.
//!
//! DESIGN
//! ======
//! A page is a plain record, not a trait hierarchy. Each hook is an
//! `Option` of a shared function value; dispatch is a `None` check and an
//! absent hook means the page does not support that trigger.
//!
//! Interaction hooks receive a `Context` by value and must hand back the
//! `Responded` token that only a response verb produces, so every handler
//! answers the platform exactly once. `on_show` may instead pass the context
//! back (`Handled::Pass`) to let the manager render the page normally.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::{Context, Responded};
use crate::message::OutboundMessage;
use crate::session::Session;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of an `on_show` hook.
pub enum Handled<'a> {
    /// The hook already answered the interaction.
    Done(Responded),
    /// The hook did not respond; the manager falls back to `display`.
    Pass(Context<'a>),
}

pub type MessageBuilder = Arc<dyn Fn(&Session) -> OutboundMessage + Send + Sync>;
pub type SessionHook = Arc<dyn Fn(&mut Session) + Send + Sync>;
pub type ShowHook = Arc<dyn for<'a> Fn(Context<'a>) -> BoxFuture<'a, Handled<'a>> + Send + Sync>;
pub type SelectHook = Arc<dyn for<'a> Fn(Context<'a>, &'a str, &'a [String]) -> BoxFuture<'a, Responded> + Send + Sync>;
pub type ButtonHook = Arc<dyn for<'a> Fn(Context<'a>, &'a str) -> BoxFuture<'a, Responded> + Send + Sync>;
pub type ModalHook = Arc<dyn for<'a> Fn(Context<'a>) -> BoxFuture<'a, Responded> + Send + Sync>;

// =============================================================================
// PAGE
// =============================================================================

pub struct Page {
    name: String,
    builder: MessageBuilder,
    pub(crate) on_show: Option<ShowHook>,
    pub(crate) on_reset: Option<SessionHook>,
    pub(crate) on_cleanup: Option<SessionHook>,
    pub(crate) on_select: Option<SelectHook>,
    pub(crate) on_button: Option<ButtonHook>,
    pub(crate) on_modal: Option<ModalHook>,
    refresh_after_modal: bool,
}

impl Page {
    pub fn new<F>(name: impl Into<String>, builder: F) -> Self
    where
        F: Fn(&Session) -> OutboundMessage + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            builder: Arc::new(builder),
            on_show: None,
            on_reset: None,
            on_cleanup: None,
            on_select: None,
            on_button: None,
            on_modal: None,
            refresh_after_modal: true,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the page for `session`.
    #[must_use]
    pub fn build_message(&self, session: &Session) -> OutboundMessage {
        (self.builder)(session)
    }

    /// Whether the page is re-sent after a form dialog opens over it.
    #[must_use]
    pub fn refreshes_after_modal(&self) -> bool {
        self.refresh_after_modal
    }

    // -------------------------------------------------------------------------
    // Hook registration
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn on_show<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(Context<'a>) -> BoxFuture<'a, Handled<'a>> + Send + Sync + 'static,
    {
        self.on_show = Some(Arc::new(hook));
        self
    }

    /// First-open initialization. Runs when the page is pushed onto a
    /// history that did not already contain it.
    #[must_use]
    pub fn on_reset<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Session) + Send + Sync + 'static,
    {
        self.on_reset = Some(Arc::new(hook));
        self
    }

    /// Runs when the user navigates back away from this page.
    #[must_use]
    pub fn on_cleanup<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Session) + Send + Sync + 'static,
    {
        self.on_cleanup = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn on_select<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(Context<'a>, &'a str, &'a [String]) -> BoxFuture<'a, Responded> + Send + Sync + 'static,
    {
        self.on_select = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn on_button<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(Context<'a>, &'a str) -> BoxFuture<'a, Responded> + Send + Sync + 'static,
    {
        self.on_button = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn on_modal<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(Context<'a>) -> BoxFuture<'a, Responded> + Send + Sync + 'static,
    {
        self.on_modal = Some(Arc::new(hook));
        self
    }

    /// Opt out of re-sending the page after a form dialog opens.
    #[must_use]
    pub fn without_modal_refresh(mut self) -> Self {
        self.refresh_after_modal = false;
        self
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("name", &self.name)
            .field("on_show", &self.on_show.is_some())
            .field("on_reset", &self.on_reset.is_some())
            .field("on_cleanup", &self.on_cleanup.is_some())
            .field("on_select", &self.on_select.is_some())
            .field("on_button", &self.on_button.is_some())
            .field("on_modal", &self.on_modal.is_some())
            .finish_non_exhaustive()
    }
}
