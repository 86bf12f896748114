//! JSON body extractor with field-level errors
//!
//! axum's own `Json` rejects a mistyped body with 422 and a plain-text
//! message. [`ValidJson`] reports the same failure as a 400
//! [`Error::Validation`] naming the offending field, so a tip sent as
//! `"7"` or `7.5` looks like any other bad tip to the client.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::Error;

/// Body fields a client may get wrong; anything else is reported as `body`
const KNOWN_FIELDS: &[&str] = &[
    "tipAmount",
    "songs",
    "dedication",
    "requesterPhone",
    "requesterName",
    "requesterUserId",
    "phoneNumber",
    "guestName",
    "status",
    "songKey",
    "performerId",
    "action",
];

/// `Json<T>` whose rejection is a 400 field-level validation error
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> Error {
    let text = rejection.body_text();
    debug!("Rejected JSON body: {}", text);
    match rejection {
        JsonRejection::JsonDataError(_) => Error::validation(field_of(&text), detail_of(&text)),
        JsonRejection::MissingJsonContentType(_) => {
            Error::validation("body", "expected Content-Type: application/json")
        }
        _ => Error::validation("body", detail_of(&text)),
    }
}

/// Field named by a serde path such as `tipAmount: invalid type: ...`
fn field_of(text: &str) -> &'static str {
    let detail = detail_of(text);
    let path = detail.split(": ").next().unwrap_or_default();
    let head = path.split(['.', '[']).next().unwrap_or_default();
    KNOWN_FIELDS
        .iter()
        .copied()
        .find(|field| *field == head)
        .unwrap_or("body")
}

/// Strip axum's generic prefix from a rejection message
fn detail_of(text: &str) -> String {
    match text.split_once("target type: ") {
        Some((_, rest)) => rest.to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_taken_from_serde_path() {
        let text = "Failed to deserialize the JSON body into the target type: \
                    tipAmount: invalid type: string \"7\", expected i64 at line 1 column 17";
        assert_eq!(field_of(text), "tipAmount");
        assert!(detail_of(text).starts_with("tipAmount: invalid type"));
    }

    #[test]
    fn test_nested_path_reports_top_level_field() {
        let text = "Failed to deserialize the JSON body into the target type: \
                    songs[0].title: invalid type: integer `3`, expected a string";
        assert_eq!(field_of(text), "songs");
    }

    #[test]
    fn test_unknown_path_falls_back_to_body() {
        assert_eq!(field_of("Failed to parse the request body as JSON: EOF"), "body");
        assert_eq!(
            field_of("Failed to deserialize the JSON body into the target type: invalid type: null"),
            "body"
        );
    }
}
