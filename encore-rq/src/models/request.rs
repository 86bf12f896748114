//! Request records and their value objects

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::status::RequestStatus;

/// Minimum tip amount per request
pub const MIN_TIP: i64 = 1;
/// Maximum tip amount per request
pub const MAX_TIP: i64 = 100;
/// Maximum number of songs in one request
pub const MAX_SONGS_PER_REQUEST: usize = 3;

/// Per-request tip weight, always within `[1, 100]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TipAmount(u8);

impl TipAmount {
    pub fn new(value: i64) -> Result<Self> {
        if !(MIN_TIP..=MAX_TIP).contains(&value) {
            return Err(Error::validation(
                "tipAmount",
                format!("tip amount must be between {} and {}", MIN_TIP, MAX_TIP),
            ));
        }
        Ok(Self(value as u8))
    }

    pub fn get(&self) -> u32 {
        u32::from(self.0)
    }
}

impl<'de> Deserialize<'de> for TipAmount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = i64::deserialize(deserializer)?;
        TipAmount::new(value).map_err(serde::de::Error::custom)
    }
}

/// Normalized guest phone number (digits only)
///
/// A self-reported continuity token. It proves nothing about who the guest
/// is and is never shown on the public push channel.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Strip formatting and require 10 to 15 digits
    pub fn parse(raw: &str) -> Result<Self> {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        let has_letters = raw.chars().any(|c| c.is_alphabetic());
        if has_letters || !(10..=15).contains(&digits.len()) {
            return Err(Error::validation("phoneNumber", "malformed phone number"));
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who submitted a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequesterIdentity {
    /// Authenticated user (id issued by the external account system)
    User {
        #[serde(rename = "userId")]
        user_id: String,
    },
    /// Anonymous guest identified only by a self-reported phone number
    Guest {
        phone: PhoneNumber,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl RequesterIdentity {
    /// Name safe to show to other viewers
    pub fn display_name(&self) -> Option<&str> {
        match self {
            RequesterIdentity::User { .. } => None,
            RequesterIdentity::Guest { name, .. } => name.as_deref(),
        }
    }

    pub fn phone(&self) -> Option<&PhoneNumber> {
        match self {
            RequesterIdentity::User { .. } => None,
            RequesterIdentity::Guest { phone, .. } => Some(phone),
        }
    }
}

/// Song reference as submitted by a client
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongInput {
    /// Catalog song id
    #[serde(default)]
    pub song_id: Option<Uuid>,
    /// Free-text song name
    #[serde(default, alias = "songname")]
    pub name: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub is_custom: bool,
}

/// Resolved song reference embedded in a request
///
/// Either a catalog song (with its catalog name and artist copied in) or a
/// custom free-text entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<Uuid>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    pub is_custom: bool,
}

impl SongRef {
    pub fn custom(name: impl Into<String>, artist: Option<String>) -> Self {
        Self {
            catalog_id: None,
            name: name.into(),
            artist,
            is_custom: true,
        }
    }

    pub fn catalog(id: Uuid, name: impl Into<String>, artist: Option<String>) -> Self {
        Self {
            catalog_id: Some(id),
            name: name.into(),
            artist,
            is_custom: false,
        }
    }

    /// "Name" or "Name - Artist"
    pub fn display_text(&self) -> String {
        match self.artist.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            Some(artist) => format!("{} - {}", self.name.trim(), artist),
            None => self.name.trim().to_string(),
        }
    }
}

/// A performer's answer to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformerResponse {
    Accept,
    Pass,
}

/// A monetized ask to play one to three songs at a show
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: Uuid,
    pub show_id: Uuid,
    pub requester: RequesterIdentity,
    pub songs: Vec<SongRef>,
    pub dedication: String,
    pub tip_amount: TipAmount,
    pub status: RequestStatus,
    pub performer_responses: BTreeMap<String, PerformerResponse>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Request {
    /// New pending request
    pub fn new(
        show_id: Uuid,
        requester: RequesterIdentity,
        songs: Vec<SongRef>,
        dedication: String,
        tip_amount: TipAmount,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            show_id,
            requester,
            songs,
            dedication,
            tip_amount,
            status: RequestStatus::Pending,
            performer_responses: BTreeMap::new(),
            created_at,
            completed_at: None,
        }
    }

    /// All song display texts joined for headings and payment notes
    pub fn songs_display(&self) -> String {
        self.songs
            .iter()
            .map(SongRef::display_text)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tip_amount_bounds() {
        assert!(TipAmount::new(0).is_err());
        assert_eq!(TipAmount::new(1).unwrap().get(), 1);
        assert_eq!(TipAmount::new(100).unwrap().get(), 100);
        assert!(TipAmount::new(101).is_err());
        assert!(TipAmount::new(-3).is_err());
    }

    #[test]
    fn test_tip_amount_deserialize_validates() {
        assert!(serde_json::from_str::<TipAmount>("42").is_ok());
        assert!(serde_json::from_str::<TipAmount>("250").is_err());
    }

    #[test]
    fn test_phone_normalization() {
        let phone = PhoneNumber::parse("(555) 123-4567").unwrap();
        assert_eq!(phone.as_str(), "5551234567");
        assert_eq!(PhoneNumber::parse("+1 555.123.4567").unwrap().as_str(), "15551234567");
    }

    #[test]
    fn test_phone_rejects_malformed() {
        assert!(PhoneNumber::parse("12345").is_err());
        assert!(PhoneNumber::parse("555-CALL-NOW1").is_err());
        assert!(PhoneNumber::parse("").is_err());
        assert!(PhoneNumber::parse("1234567890123456").is_err());
    }

    #[test]
    fn test_song_input_accepts_songname_alias() {
        let input: SongInput = serde_json::from_str(r#"{"songname":"Wonderwall"}"#).unwrap();
        assert_eq!(input.name.as_deref(), Some("Wonderwall"));
        assert!(input.song_id.is_none());
    }

    #[test]
    fn test_display_text_with_and_without_artist() {
        assert_eq!(SongRef::custom("Let It Be", None).display_text(), "Let It Be");
        assert_eq!(
            SongRef::custom(" Let It Be ", Some("The Beatles".into())).display_text(),
            "Let It Be - The Beatles"
        );
        assert_eq!(
            SongRef::custom("Hey Jude", Some("  ".into())).display_text(),
            "Hey Jude"
        );
    }

    #[test]
    fn test_guest_display_name_hides_phone() {
        let guest = RequesterIdentity::Guest {
            phone: PhoneNumber::parse("5551234567").unwrap(),
            name: Some("Sam".into()),
        };
        assert_eq!(guest.display_name(), Some("Sam"));
        let user = RequesterIdentity::User { user_id: "u-1".into() };
        assert_eq!(user.display_name(), None);
        assert!(user.phone().is_none());
    }
}
