//! Demo pages served by the binary.
//!
//! `menu` is the entry screen (also the `/menu` command). It opens the
//! thumbnail gallery, takes a free-form note through a form dialog and shows
//! a moderator-only screen. `gallery` streams a 3×3 grid of
//! `DEMO_IMAGE_URLS` onto itself every time it is shown.

use std::sync::Arc;

use tracing::warn;

use crate::context::Responded;
use crate::event::Permissions;
use crate::message::{ButtonStyle, Component, ModalSpec, OutboundMessage, Panel, TextInput, TextInputStyle};
use crate::page::{Handled, Page};
use crate::session::Session;
use crate::stream::{GRID_FILENAME, ImageStreamer, StreamRequest};

pub const MENU: &str = "menu";
pub const GALLERY: &str = "gallery";
pub const MODERATION: &str = "moderation";

const OPEN_GALLERY: &str = "menu:gallery";
const OPEN_NOTE: &str = "menu:note";
const OPEN_MODERATION: &str = "menu:moderation";
const CLOSE: &str = "menu:close";
const NOTE_FORM: &str = "menu:note_form";
const NOTE_FIELD: &str = "note";
const BACK: &str = "nav:back";
const RELOAD: &str = "gallery:reload";

const NOTE_KEY: &str = "note";
const GRID_BYTES_KEY: &str = "gallery_grid_bytes";

/// Every demo page, ready for `Manager::add_pages`.
pub fn pages(streamer: Arc<ImageStreamer>, image_urls: Vec<String>) -> Vec<Page> {
    let urls = Arc::new(image_urls);
    vec![menu_page(), gallery_page(streamer, urls), moderation_page()]
}

// =============================================================================
// MENU
// =============================================================================

fn menu_page() -> Page {
    Page::new(MENU, |session: &Session| {
        let mut panel = Panel::new("Menu").with_description("Pick a screen.");
        if let Some(note) = session.get::<String>(NOTE_KEY) {
            panel = panel.with_field("Your note", note, false);
        }
        OutboundMessage::default().with_panel(panel).with_row(vec![
            Component::button(OPEN_GALLERY, "Gallery", ButtonStyle::Primary),
            Component::button(OPEN_NOTE, "Leave a note", ButtonStyle::Secondary),
            Component::button(OPEN_MODERATION, "Moderation", ButtonStyle::Secondary),
            Component::button(CLOSE, "Close", ButtonStyle::Danger),
        ])
    })
    .on_button(|ctx, custom_id| {
        Box::pin(async move {
            match custom_id {
                OPEN_GALLERY => ctx.show(GALLERY, "").await,
                OPEN_MODERATION => {
                    if ctx.event().permissions().contains(Permissions::MODERATE_MEMBERS) {
                        ctx.show(MODERATION, "").await
                    } else {
                        ctx.cancel("You need the Timeout Members permission for that.").await
                    }
                }
                OPEN_NOTE => {
                    let existing = ctx.session().get::<String>(NOTE_KEY);
                    ctx.modal(note_form(existing)).await
                }
                CLOSE => ctx.clear("Menu closed.").await,
                other => unknown_control(ctx, other).await,
            }
        })
    })
    .on_modal(|mut ctx| {
        Box::pin(async move {
            let note = ctx
                .event()
                .modal_field(NOTE_FIELD)
                .map(str::trim)
                .unwrap_or_default()
                .to_string();
            if note.is_empty() {
                ctx.session_mut().delete(NOTE_KEY);
                return ctx.reload("Note cleared.").await;
            }
            if let Err(e) = ctx.session_mut().set(NOTE_KEY, &note) {
                warn!(error = %e, "demo: note not saved");
                return ctx.cancel("The note could not be saved.").await;
            }
            ctx.reload("Note saved.").await
        })
    })
}

fn note_form(existing: Option<String>) -> ModalSpec {
    let mut input = TextInput::new(NOTE_FIELD, "Note", TextInputStyle::Paragraph).optional();
    if let Some(note) = existing {
        input = input.prefilled(note);
    }
    ModalSpec::new(NOTE_FORM, "Leave a note").with_input(input)
}

// =============================================================================
// GALLERY
// =============================================================================

fn gallery_page(streamer: Arc<ImageStreamer>, urls: Arc<Vec<String>>) -> Page {
    let (show_streamer, show_urls) = (Arc::clone(&streamer), Arc::clone(&urls));

    Page::new(GALLERY, |session: &Session| {
        let mut panel = Panel::new("Gallery").with_image(format!("attachment://{GRID_FILENAME}"));
        if let Some(bytes) = session.get::<usize>(GRID_BYTES_KEY) {
            panel = panel.with_field("Last grid", format!("{bytes} bytes"), true);
        }
        OutboundMessage::default().with_panel(panel).with_row(vec![
            Component::button(BACK, "Back", ButtonStyle::Secondary),
            Component::button(RELOAD, "Reload", ButtonStyle::Primary),
        ])
    })
    .on_show(move |ctx| {
        let streamer = Arc::clone(&show_streamer);
        let request = gallery_request(&show_urls);
        Box::pin(async move { Handled::Done(streamer.stream(ctx, request).await) })
    })
    .on_button(move |ctx, custom_id| {
        let streamer = Arc::clone(&streamer);
        let urls = Arc::clone(&urls);
        Box::pin(async move {
            match custom_id {
                BACK => ctx.navigate_back("").await,
                RELOAD => streamer.stream(ctx, gallery_request(&urls)).await,
                other => unknown_control(ctx, other).await,
            }
        })
    })
    .on_cleanup(|session| {
        session.delete(GRID_BYTES_KEY);
    })
}

fn gallery_request(urls: &Arc<Vec<String>>) -> StreamRequest {
    let urls = Arc::clone(urls);
    StreamRequest::new(GALLERY, 3, 3, move || urls.as_ref().clone()).on_success(|session, png| {
        if let Err(e) = session.set(GRID_BYTES_KEY, png.len()) {
            warn!(error = %e, "demo: grid size not recorded");
        }
    })
}

// =============================================================================
// MODERATION
// =============================================================================

fn moderation_page() -> Page {
    Page::new(MODERATION, |session: &Session| {
        let panel = Panel::new("Moderation")
            .with_description("Open cases for your server.")
            .with_field("Reviewer", session.actor_id(), true);
        OutboundMessage::default()
            .with_panel(panel)
            .with_row(vec![Component::button(BACK, "Back", ButtonStyle::Secondary)])
    })
    .on_button(|ctx, custom_id| {
        Box::pin(async move {
            match custom_id {
                BACK => ctx.navigate_back("").await,
                other => unknown_control(ctx, other).await,
            }
        })
    })
}

async fn unknown_control(ctx: crate::context::Context<'_>, custom_id: &str) -> Responded {
    warn!(custom_id, event = %ctx.event(), "demo: unknown control");
    ctx.cancel("That option is no longer available.").await
}

#[cfg(test)]
#[path = "demo_test.rs"]
mod tests;
