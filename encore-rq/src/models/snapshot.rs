//! Wire shape of the queue snapshot pushed to subscribers
//!
//! Guest phone numbers never appear here: both the performer dashboard and
//! the anonymous guest view receive the same payload.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::request::{PerformerResponse, Request, SongRef};
use super::status::RequestStatus;

/// Public view of one request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    pub id: Uuid,
    pub song_key: String,
    pub songs: Vec<SongRef>,
    pub dedication: String,
    pub tip_amount: u32,
    pub status: RequestStatus,
    pub requester_name: Option<String>,
    pub performer_responses: BTreeMap<String, PerformerResponse>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl RequestView {
    pub fn from_request(request: &Request, song_key: &str) -> Self {
        Self {
            id: request.id,
            song_key: song_key.to_string(),
            songs: request.songs.clone(),
            dedication: request.dedication.clone(),
            tip_amount: request.tip_amount.get(),
            status: request.status,
            requester_name: request.requester.display_name().map(str::to_string),
            performer_responses: request.performer_responses.clone(),
            created_at: request.created_at,
            completed_at: request.completed_at,
        }
    }
}

/// Public view of one song group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    pub song_key: String,
    pub song_name: String,
    pub musical_key: Option<String>,
    pub status: RequestStatus,
    pub total_tip: u32,
    pub count: usize,
    pub earliest_request_at: DateTime<Utc>,
    pub request_ids: Vec<Uuid>,
    pub dedications: Vec<String>,
}

/// Full recomputed listing for one show
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub show_id: Uuid,
    /// Every displayed request, in group display order
    pub requests: Vec<RequestView>,
    pub active: Vec<GroupView>,
    pub played: Vec<GroupView>,
}
