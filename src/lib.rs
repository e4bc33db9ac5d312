//! menudesk: page-navigation runtime for chat-platform menus.
//!
//! SYSTEM CONTEXT
//! ==============
//! Pages are named screens registered once with a `Manager`. Every inbound
//! interaction resolves to a session, is routed to a hook of the session's
//! current page, and is answered exactly once through a consuming `Context`
//! verb. The `stream` module adds the one long-running screen: a thumbnail
//! grid that re-renders while its images download.

pub mod config;
pub mod context;
pub mod demo;
pub mod event;
pub mod manager;
pub mod message;
pub mod page;
pub mod respond;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod stream;

#[cfg(test)]
pub(crate) use state::test_helpers;
