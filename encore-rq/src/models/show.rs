//! Shows and catalog songs
//!
//! Both are owned by external collaborators (show scheduling, song catalog).
//! The request queue only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowType {
    Public,
    Private,
}

impl ShowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShowType::Public => "public",
            ShowType::Private => "private",
        }
    }
}

impl FromStr for ShowType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(ShowType::Public),
            "private" => Ok(ShowType::Private),
            other => Err(format!("unknown show type '{}'", other)),
        }
    }
}

/// Display and request settings chosen by the performer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowSettings {
    pub allow_requests: bool,
    /// `None` means unlimited
    pub max_requests_per_user: Option<u32>,
}

impl Default for ShowSettings {
    fn default() -> Self {
        Self {
            allow_requests: true,
            max_requests_per_user: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    pub id: Uuid,
    pub name: String,
    pub show_type: ShowType,
    pub accepting_requests: bool,
    pub request_deadline: Option<DateTime<Utc>>,
    pub settings: ShowSettings,
    pub created_at: DateTime<Utc>,
}

impl Show {
    /// Open public show with default settings
    pub fn new(name: impl Into<String>, show_type: ShowType, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            show_type,
            accepting_requests: true,
            request_deadline: None,
            settings: ShowSettings::default(),
            created_at,
        }
    }

    pub fn is_accepting_requests(&self, now: DateTime<Utc>) -> bool {
        self.settings.allow_requests
            && self.accepting_requests
            && self.request_deadline.map_or(true, |deadline| now < deadline)
    }
}

/// Catalog song (external), used for display fields such as musical key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSong {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub musical_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_accepting_requires_every_gate() {
        let now = Utc::now();
        let mut show = Show::new("Friday Set", ShowType::Public, now);
        assert!(show.is_accepting_requests(now));

        show.settings.allow_requests = false;
        assert!(!show.is_accepting_requests(now));
        show.settings.allow_requests = true;

        show.accepting_requests = false;
        assert!(!show.is_accepting_requests(now));
        show.accepting_requests = true;

        show.request_deadline = Some(now - Duration::minutes(1));
        assert!(!show.is_accepting_requests(now));
        show.request_deadline = Some(now + Duration::minutes(1));
        assert!(show.is_accepting_requests(now));
    }
}
