//! # Encore Common Library
//!
//! Shared code for the Encore live request services:
//! - Database initialization and settings helpers
//! - Bootstrap configuration loading
//! - Privileged API authentication primitives
//! - Push-channel event types and SSE helpers
//! - Timestamp utilities

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
