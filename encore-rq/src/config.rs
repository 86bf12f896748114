//! Runtime settings for encore-rq
//!
//! Bootstrap values (port, database location, logging) come from the TOML
//! file via `encore_common::config`. Everything here lives in the
//! `settings` table and is read once at startup; missing or NULL values
//! fall back to built-in defaults.

use crate::error::{Error, Result};
use crate::queue::payment::PaymentConfig;
use encore_common::api::auth::load_shared_secret;
use encore_common::db::get_setting;
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::info;

/// Default one-time bonus for joining a private show
pub const DEFAULT_PRIVATE_SHOW_JOIN_BONUS: u32 = 50;

/// Runtime settings loaded from database
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub payment: PaymentConfig,
    pub private_show_join_bonus: u32,
    /// Events buffered per live subscriber
    pub subscriber_buffer: usize,
    pub sse_keepalive: Duration,
    /// Privileged API secret; 0 disables checking
    pub api_shared_secret: i64,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            payment: PaymentConfig::default(),
            private_show_join_bonus: DEFAULT_PRIVATE_SHOW_JOIN_BONUS,
            subscriber_buffer: 32,
            sse_keepalive: Duration::from_secs(15),
            api_shared_secret: 0,
        }
    }
}

impl RuntimeSettings {
    pub async fn load(db: &SqlitePool) -> Result<Self> {
        let defaults = Self::default();

        let payment = PaymentConfig {
            base_url: get_setting::<String>(db, "payment_base_url")
                .await?
                .unwrap_or(defaults.payment.base_url),
            merchant_handle: get_setting::<String>(db, "payment_merchant_handle")
                .await?
                .unwrap_or(defaults.payment.merchant_handle),
        };

        let settings = Self {
            payment,
            private_show_join_bonus: get_setting(db, "private_show_join_bonus")
                .await?
                .unwrap_or(defaults.private_show_join_bonus),
            subscriber_buffer: get_setting(db, "subscriber_buffer")
                .await?
                .unwrap_or(defaults.subscriber_buffer),
            sse_keepalive: get_setting::<u64>(db, "sse_keepalive_secs")
                .await?
                .map(Duration::from_secs)
                .unwrap_or(defaults.sse_keepalive),
            api_shared_secret: load_shared_secret(db)
                .await
                .map_err(|e| Error::Config(e.to_string()))?,
        };

        info!(
            "Runtime settings: merchant '{}', private join bonus {}, subscriber buffer {}",
            settings.payment.merchant_handle,
            settings.private_show_join_bonus,
            settings.subscriber_buffer
        );
        if settings.api_shared_secret == 0 {
            info!("Privileged API authentication disabled (api_shared_secret = 0)");
        }

        Ok(settings)
    }
}
