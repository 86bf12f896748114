//! Request status and transition rules
//!
//! `played` and `declined` are terminal. Every other status may be moved to
//! `playing`, `alternate`, `declined`, `add_to_request` or `queued` by a
//! privileged caller. `played` is reachable explicitly only from `playing`
//! (finishing the current song) and implicitly when another request is
//! promoted to `playing`. Nothing ever returns to `pending`.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Queued,
    AddToRequest,
    Alternate,
    Playing,
    Declined,
    Played,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 7] = [
        RequestStatus::Pending,
        RequestStatus::Queued,
        RequestStatus::AddToRequest,
        RequestStatus::Alternate,
        RequestStatus::Playing,
        RequestStatus::Declined,
        RequestStatus::Played,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Queued => "queued",
            RequestStatus::AddToRequest => "add_to_request",
            RequestStatus::Alternate => "alternate",
            RequestStatus::Playing => "playing",
            RequestStatus::Declined => "declined",
            RequestStatus::Played => "played",
        }
    }

    /// Display priority, lowest number first
    pub fn priority(&self) -> u8 {
        match self {
            RequestStatus::Playing => 0,
            RequestStatus::AddToRequest => 1,
            RequestStatus::Alternate => 2,
            RequestStatus::Pending => 3,
            RequestStatus::Queued => 4,
            RequestStatus::Declined => 5,
            RequestStatus::Played => 6,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Played | RequestStatus::Declined)
    }

    /// Whether an explicit privileged call may move `self` to `target`.
    ///
    /// Same-status calls are not transitions; callers treat them as no-ops.
    pub fn can_transition_to(&self, target: RequestStatus) -> bool {
        if self.is_terminal() || *self == target {
            return false;
        }
        match target {
            RequestStatus::Playing
            | RequestStatus::Alternate
            | RequestStatus::Declined
            | RequestStatus::AddToRequest
            | RequestStatus::Queued => true,
            RequestStatus::Played => *self == RequestStatus::Playing,
            RequestStatus::Pending => false,
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown status '{}'", s))
    }
}
