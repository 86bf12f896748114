//! Database queries for the request queue
//!
//! Writers take `&mut SqliteConnection` so callers can run them inside a
//! transaction (`&mut *tx`) or on a pooled connection.

pub mod catalog;
pub mod ledger;
pub mod requests;
pub mod shows;

use crate::error::{Error, Result};
use uuid::Uuid;

/// Parse a stored UUID column
pub(crate) fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Internal(format!("Invalid stored UUID '{}': {}", value, e)))
}
