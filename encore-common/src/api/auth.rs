//! Privileged API authentication via timestamp and hash validation
//!
//! Performer-dashboard calls carry two headers:
//! - `X-Encore-Timestamp`: unix epoch milliseconds
//! - `X-Encore-Hash`: lowercase hex SHA-256 of
//!   `"{METHOD}\n{PATH}\n{timestamp}\n{secret}"`
//!
//! The shared secret is an i64 stored in the `settings` table under
//! `api_shared_secret`. The special value 0 disables checking entirely.
//!
//! This separates the performer dashboard from the anonymous guest surface.
//! It is not user login.

use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

/// Header carrying the request timestamp (unix ms)
pub const TIMESTAMP_HEADER: &str = "x-encore-timestamp";

/// Header carrying the request hash
pub const HASH_HEADER: &str = "x-encore-hash";

/// Maximum age of a timestamp in milliseconds
pub const MAX_PAST_MS: i64 = 5000;

/// Maximum clock skew into the future in milliseconds
pub const MAX_FUTURE_MS: i64 = 1000;

/// Authentication error types
#[derive(Debug, Clone)]
pub enum ApiAuthError {
    /// Timestamp outside acceptable window
    InvalidTimestamp {
        timestamp: i64,
        now: i64,
        reason: String,
    },

    /// Hash does not match calculated value
    InvalidHash { provided: String, calculated: String },

    /// Timestamp header missing or not an integer
    MissingTimestamp,

    /// Hash header missing
    MissingHash,

    /// Database error loading shared secret
    DatabaseError(String),
}

impl std::fmt::Display for ApiAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiAuthError::InvalidTimestamp { reason, .. } => {
                write!(f, "Invalid timestamp: {}", reason)
            }
            ApiAuthError::InvalidHash { .. } => write!(f, "Invalid hash"),
            ApiAuthError::MissingTimestamp => write!(f, "Missing timestamp header"),
            ApiAuthError::MissingHash => write!(f, "Missing hash header"),
            ApiAuthError::DatabaseError(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for ApiAuthError {}

/// Load shared secret from database settings, generating one if absent
pub async fn load_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    let result: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'api_shared_secret'")
            .fetch_optional(db)
            .await
            .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    match result.flatten() {
        Some(value) => value
            .parse::<i64>()
            .map_err(|e| ApiAuthError::DatabaseError(format!("Invalid i64: {}", e))),
        None => initialize_shared_secret(db).await,
    }
}

/// Generate and store a random non-zero shared secret
pub async fn initialize_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let secret: i64 = loop {
        let val = rng.gen::<i64>();
        if val != 0 {
            break val;
        }
    };

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES ('api_shared_secret', ?)")
        .bind(secret.to_string())
        .execute(db)
        .await
        .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    Ok(secret)
}

/// Validate a timestamp against `now` (both unix ms)
///
/// At most [`MAX_PAST_MS`] in the past and [`MAX_FUTURE_MS`] in the future.
pub fn validate_timestamp(timestamp: i64, now: i64) -> Result<(), ApiAuthError> {
    let diff = now - timestamp;

    if diff > MAX_PAST_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!("Timestamp {}ms too old (max {}ms past)", diff, MAX_PAST_MS),
        });
    }

    if diff < -MAX_FUTURE_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!(
                "Timestamp {}ms in future (max {}ms future)",
                diff.abs(),
                MAX_FUTURE_MS
            ),
        });
    }

    Ok(())
}

/// Calculate the request hash
///
/// # Examples
///
/// ```
/// use encore_common::api::auth::calculate_hash;
///
/// let hash = calculate_hash("GET", "/shows/abc/requests", 1730000000000, 42);
/// assert_eq!(hash.len(), 64);
/// ```
pub fn calculate_hash(method: &str, path: &str, timestamp: i64, shared_secret: i64) -> String {
    let to_hash = format!(
        "{}\n{}\n{}\n{}",
        method.to_ascii_uppercase(),
        path,
        timestamp,
        shared_secret
    );

    let mut hasher = Sha256::new();
    hasher.update(to_hash.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Validate a provided hash against the calculated one
pub fn validate_hash(
    provided: &str,
    method: &str,
    path: &str,
    timestamp: i64,
    shared_secret: i64,
) -> Result<(), ApiAuthError> {
    let calculated = calculate_hash(method, path, timestamp, shared_secret);
    if provided.eq_ignore_ascii_case(&calculated) {
        Ok(())
    } else {
        Err(ApiAuthError::InvalidHash {
            provided: provided.to_string(),
            calculated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_window() {
        let now = 1_730_000_000_000;
        assert!(validate_timestamp(now, now).is_ok());
        assert!(validate_timestamp(now - 4_000, now).is_ok());
        assert!(validate_timestamp(now - 6_000, now).is_err());
        assert!(validate_timestamp(now + 500, now).is_ok());
        assert!(validate_timestamp(now + 2_000, now).is_err());
    }

    #[test]
    fn test_hash_depends_on_every_component() {
        let base = calculate_hash("PATCH", "/requests/r1/status", 100, 7);
        assert_ne!(base, calculate_hash("GET", "/requests/r1/status", 100, 7));
        assert_ne!(base, calculate_hash("PATCH", "/requests/r2/status", 100, 7));
        assert_ne!(base, calculate_hash("PATCH", "/requests/r1/status", 101, 7));
        assert_ne!(base, calculate_hash("PATCH", "/requests/r1/status", 100, 8));
        assert_eq!(base, calculate_hash("patch", "/requests/r1/status", 100, 7));
    }

    #[test]
    fn test_validate_hash() {
        let hash = calculate_hash("GET", "/shows/s/requests", 5, 99);
        assert!(validate_hash(&hash, "GET", "/shows/s/requests", 5, 99).is_ok());
        assert!(validate_hash(&hash.to_uppercase(), "GET", "/shows/s/requests", 5, 99).is_ok());
        assert!(matches!(
            validate_hash("00", "GET", "/shows/s/requests", 5, 99),
            Err(ApiAuthError::InvalidHash { .. })
        ));
    }
}
