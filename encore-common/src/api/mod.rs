//! Shared HTTP API functionality
//!
//! Contains only pure functions, database operations and shared types. The
//! service crate wraps these in framework-specific extractors.

pub mod auth;

pub use auth::{
    calculate_hash, initialize_shared_secret, load_shared_secret, validate_hash,
    validate_timestamp, ApiAuthError, HASH_HEADER, TIMESTAMP_HEADER,
};
