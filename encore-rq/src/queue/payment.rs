//! Payment deep links
//!
//! One-way, launch-only: the link opens an external payment app with the
//! amount and note prefilled. Nothing is captured or confirmed here.

use crate::models::Request;
use serde::Serialize;

/// Merchant settings for the payment deep link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentConfig {
    /// Base URL of the payment app, e.g. `https://venmo.com/`
    pub base_url: String,
    /// Fixed merchant handle receiving payments
    pub merchant_handle: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            base_url: "https://venmo.com/".to_string(),
            merchant_handle: "encore-live".to_string(),
        }
    }
}

/// Human-readable payment note: song text(s) plus dedication
pub fn payment_note(request: &Request) -> String {
    let songs = request.songs_display();
    let dedication = request.dedication.trim();
    if dedication.is_empty() {
        format!("Song request: {}", songs)
    } else {
        format!("Song request: {} | {}", songs, dedication)
    }
}

/// Build the payment deep link for a request
pub fn build_payment_link(request: &Request, config: &PaymentConfig) -> String {
    let base = config.base_url.trim_end_matches('/');
    format!(
        "{}/{}?txn=pay&amount={}&note={}",
        base,
        urlencoding::encode(config.merchant_handle.trim_start_matches('@')),
        request.tip_amount.get(),
        urlencoding::encode(&payment_note(request)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PhoneNumber, RequesterIdentity, SongRef, TipAmount};
    use chrono::Utc;
    use uuid::Uuid;

    fn request(tip: i64, songs: Vec<SongRef>, dedication: &str) -> Request {
        Request::new(
            Uuid::new_v4(),
            RequesterIdentity::Guest {
                phone: PhoneNumber::parse("5551234567").unwrap(),
                name: None,
            },
            songs,
            dedication.to_string(),
            TipAmount::new(tip).unwrap(),
            Utc::now(),
        )
    }

    fn note_param(url: &str) -> String {
        let encoded = url.split("note=").nth(1).unwrap();
        urlencoding::decode(encoded).unwrap().into_owned()
    }

    #[test]
    fn test_link_carries_amount_and_encoded_note() {
        let r = request(7, vec![SongRef::custom("Wonderwall", None)], "Happy Birthday");
        let url = build_payment_link(&r, &PaymentConfig::default());

        assert!(url.starts_with("https://venmo.com/encore-live?"));
        assert!(url.contains("amount=7"));
        assert!(url.contains("Wonderwall"));
        assert!(url.contains("Happy%20Birthday"));
        assert!(!url.contains(' '));

        let note = note_param(&url);
        assert!(note.contains("Wonderwall"));
        assert!(note.contains("Happy Birthday"));
    }

    #[test]
    fn test_note_lists_every_song_and_skips_empty_dedication() {
        let r = request(
            3,
            vec![
                SongRef::custom("Let It Be", Some("The Beatles".into())),
                SongRef::custom("Hey Jude", None),
            ],
            "   ",
        );
        assert_eq!(payment_note(&r), "Song request: Let It Be - The Beatles, Hey Jude");
    }

    #[test]
    fn test_reserved_characters_are_escaped() {
        let r = request(5, vec![SongRef::custom("Rock & Roll", None)], "for Jo=Ann?");
        let url = build_payment_link(&r, &PaymentConfig::default());
        let query_note = url.split("note=").nth(1).unwrap();
        assert!(!query_note.contains('&'));
        assert!(!query_note.contains('='));
        assert!(note_param(&url).contains("Rock & Roll"));
    }

    #[test]
    fn test_handle_and_trailing_slash_are_normalized() {
        let config = PaymentConfig {
            base_url: "https://pay.example.com".to_string(),
            merchant_handle: "@the-band".to_string(),
        };
        let r = request(20, vec![SongRef::custom("Creep", None)], "");
        let url = build_payment_link(&r, &config);
        assert!(url.starts_with("https://pay.example.com/the-band?txn=pay&amount=20&note="));
    }
}
