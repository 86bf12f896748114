//! Database initialization
//!
//! Creates the database file on first run, applies connection pragmas and
//! creates every table idempotently. Safe to call on every startup.

use crate::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Pragmas go on the connect options so every pooled connection gets them
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        // WAL lets the push channel read snapshots while a mutation commits
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    init_default_settings(&pool).await?;

    Ok(pool)
}

/// Create every table and index (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_settings_table(pool).await?;

    // Tables owned by external collaborators (show CRUD, song catalog)
    create_shows_table(pool).await?;
    create_catalog_songs_table(pool).await?;

    // Tables owned by the request queue
    create_show_queue_state_table(pool).await?;
    create_requests_table(pool).await?;
    create_guest_ledger_table(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores application configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_shows_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS shows (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            show_type TEXT NOT NULL DEFAULT 'public'
                CHECK (show_type IN ('public', 'private')),
            accepting_requests INTEGER NOT NULL DEFAULT 1,
            request_deadline TEXT,
            allow_requests INTEGER NOT NULL DEFAULT 1,
            max_requests_per_user INTEGER,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_catalog_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS catalog_songs (
            guid TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            artist TEXT NOT NULL DEFAULT '',
            musical_key TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_show_queue_state_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS show_queue_state (
            show_id TEXT PRIMARY KEY REFERENCES shows(guid),
            current_playing_request_id TEXT,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_requests_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS requests (
            guid TEXT PRIMARY KEY,
            show_id TEXT NOT NULL REFERENCES shows(guid),
            requester_user_id TEXT,
            requester_phone TEXT,
            requester_name TEXT,
            songs_json TEXT NOT NULL,
            dedication TEXT NOT NULL DEFAULT '',
            tip_amount INTEGER NOT NULL CHECK (tip_amount BETWEEN 1 AND 100),
            status TEXT NOT NULL DEFAULT 'pending',
            performer_responses_json TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL,
            completed_at TEXT,
            CHECK (requester_user_id IS NOT NULL OR requester_phone IS NOT NULL)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_requests_show ON requests(show_id, created_at)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_requests_show_status ON requests(show_id, status)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_guest_ledger_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS guest_ledger (
            show_id TEXT NOT NULL REFERENCES shows(guid),
            phone TEXT NOT NULL,
            guest_name TEXT,
            points INTEGER NOT NULL DEFAULT 0 CHECK (points >= 0),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (show_id, phone)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize default runtime settings
///
/// Missing settings are created; NULL values are reset to the default.
pub async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    // Payment deep link
    ensure_setting(pool, "payment_base_url", "https://venmo.com/").await?;
    ensure_setting(pool, "payment_merchant_handle", "encore-live").await?;

    // Guest ledger
    ensure_setting(pool, "private_show_join_bonus", "50").await?;

    // Push channel
    ensure_setting(pool, "subscriber_buffer", "32").await?;
    ensure_setting(pool, "sse_keepalive_secs", "15").await?;

    info!("Default settings initialized");
    Ok(())
}

async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    // INSERT OR IGNORE tolerates concurrent initialization
    let inserted = sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(default_value)
        .execute(pool)
        .await?
        .rows_affected();

    if inserted > 0 {
        info!("Initialized setting '{}' with default value: {}", key, default_value);
        return Ok(());
    }

    let reset = sqlx::query("UPDATE settings SET value = ? WHERE key = ? AND value IS NULL")
        .bind(default_value)
        .bind(key)
        .execute(pool)
        .await?
        .rows_affected();

    if reset > 0 {
        info!("Reset NULL setting '{}' to default value: {}", key, default_value);
    }

    Ok(())
}
