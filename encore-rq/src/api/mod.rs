//! HTTP API handlers for encore-rq

pub mod auth;
pub mod extract;
pub mod health;
pub mod points;
pub mod requests;
pub mod sse;

pub use auth::{AuthError, Privileged};
pub use extract::ValidJson;
pub use health::health_routes;
pub use points::join_show;
pub use requests::{
    add_contribution, list_requests, record_performer_action, submit_request, update_status,
};
pub use sse::request_events;
