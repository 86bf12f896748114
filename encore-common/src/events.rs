//! Push-channel event envelope
//!
//! Every event pushed to a live subscriber carries the *full* current state
//! of a show's queue. There is no event numbering and no replay: a
//! subscriber that misses one event is corrected by the next.

use serde::{Deserialize, Serialize};

/// Kind of push event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushEventKind {
    /// First event on a new subscription
    Bootstrap,
    /// Sent to every subscriber after a mutation
    Requests,
}

impl PushEventKind {
    /// SSE `event:` field value
    pub fn as_str(&self) -> &'static str {
        match self {
            PushEventKind::Bootstrap => "bootstrap",
            PushEventKind::Requests => "requests",
        }
    }
}

impl std::fmt::Display for PushEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event wrapper for transmission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushEvent<T> {
    /// Event type
    pub kind: PushEventKind,
    /// Full snapshot payload
    pub payload: T,
}

impl<T> PushEvent<T> {
    pub fn bootstrap(payload: T) -> Self {
        Self {
            kind: PushEventKind::Bootstrap,
            payload,
        }
    }

    pub fn requests(payload: T) -> Self {
        Self {
            kind: PushEventKind::Requests,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_match_wire_protocol() {
        assert_eq!(PushEventKind::Bootstrap.as_str(), "bootstrap");
        assert_eq!(PushEventKind::Requests.to_string(), "requests");
        assert_eq!(
            serde_json::to_string(&PushEventKind::Requests).unwrap(),
            "\"requests\""
        );
    }
}
