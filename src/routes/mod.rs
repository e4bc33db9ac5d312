//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The platform posts every interaction to `/interactions` as normalized
//! JSON. The handler acknowledges at once and answers through the webhook
//! responder from a spawned task, so slow pages never hold the request open.

pub mod interactions;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Intake routes plus a health probe.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/interactions", post(interactions::receive))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}
