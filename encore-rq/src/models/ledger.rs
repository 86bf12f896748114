//! Guest points ledger entries

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::request::PhoneNumber;

/// Points balance for one guest phone at one show
///
/// Unique per (show, phone). Points never decrease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub show_id: Uuid,
    #[serde(skip_serializing)]
    pub phone: PhoneNumber,
    pub guest_name: Option<String>,
    pub points: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
