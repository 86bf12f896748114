//! encore-rq library - live song request queue
//!
//! Guests submit tipped song requests to a show; performers triage them;
//! every connected viewer receives the full ranked queue over SSE after
//! each mutation.

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod queue;
pub mod sse;

pub use config::RuntimeSettings;
pub use error::{Error, Result};
pub use queue::RequestQueue;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub queue: RequestQueue,
}

impl AppState {
    pub fn new(queue: RequestQueue) -> Self {
        Self { queue }
    }
}

/// Build application router
///
/// Privileged handlers guard themselves through the `Privileged`
/// extractor, so guest and performer routes can share paths.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/shows/:show_id/requests",
            get(api::list_requests).post(api::submit_request),
        )
        .route("/shows/:show_id/requests/events", get(api::request_events))
        .route(
            "/shows/:show_id/requests/:request_id/contributions",
            post(api::add_contribution),
        )
        .route("/shows/:show_id/points", post(api::join_show))
        .route("/requests/:request_id/status", patch(api::update_status))
        .route(
            "/requests/:request_id/performer-action",
            patch(api::record_performer_action),
        )
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
