//! Show lookups and the per-show "currently playing" field
//!
//! The `shows` table belongs to the external show-scheduling collaborator;
//! `upsert_show` exists so that collaborator (and tests) can populate it.

use crate::error::{Error, Result};
use crate::models::{Show, ShowSettings, ShowType};
use chrono::{DateTime, Utc};
use encore_common::time;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};
use uuid::Uuid;

use super::parse_uuid;

fn show_from_row(row: &SqliteRow) -> Result<Show> {
    let show_type: String = row.try_get("show_type")?;
    let deadline: Option<String> = row.try_get("request_deadline")?;
    let max_requests: Option<i64> = row.try_get("max_requests_per_user")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Show {
        id: parse_uuid(&row.try_get::<String, _>("guid")?)?,
        name: row.try_get("name")?,
        show_type: show_type.parse::<ShowType>().map_err(Error::Internal)?,
        accepting_requests: row.try_get("accepting_requests")?,
        request_deadline: deadline.as_deref().map(time::from_storage).transpose()?,
        settings: ShowSettings {
            allow_requests: row.try_get("allow_requests")?,
            max_requests_per_user: max_requests.map(|n| n.max(0) as u32),
        },
        created_at: time::from_storage(&created_at)?,
    })
}

/// Get show by id
pub async fn get_show(conn: &mut SqliteConnection, show_id: Uuid) -> Result<Option<Show>> {
    let row = sqlx::query(
        r#"
        SELECT guid, name, show_type, accepting_requests, request_deadline,
               allow_requests, max_requests_per_user, created_at
        FROM shows
        WHERE guid = ?
        "#,
    )
    .bind(show_id.to_string())
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(show_from_row).transpose()
}

/// Insert or replace a show record
pub async fn upsert_show(conn: &mut SqliteConnection, show: &Show) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO shows (guid, name, show_type, accepting_requests, request_deadline,
                           allow_requests, max_requests_per_user, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(guid) DO UPDATE SET
            name = excluded.name,
            show_type = excluded.show_type,
            accepting_requests = excluded.accepting_requests,
            request_deadline = excluded.request_deadline,
            allow_requests = excluded.allow_requests,
            max_requests_per_user = excluded.max_requests_per_user
        "#,
    )
    .bind(show.id.to_string())
    .bind(&show.name)
    .bind(show.show_type.as_str())
    .bind(show.accepting_requests)
    .bind(show.request_deadline.as_ref().map(time::to_storage))
    .bind(show.settings.allow_requests)
    .bind(show.settings.max_requests_per_user.map(i64::from))
    .bind(time::to_storage(&show.created_at))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Id of the request currently marked `playing` in a show
pub async fn current_playing(conn: &mut SqliteConnection, show_id: Uuid) -> Result<Option<Uuid>> {
    let value: Option<Option<String>> = sqlx::query_scalar(
        "SELECT current_playing_request_id FROM show_queue_state WHERE show_id = ?",
    )
    .bind(show_id.to_string())
    .fetch_optional(&mut *conn)
    .await?;

    value.flatten().as_deref().map(parse_uuid).transpose()
}

/// Set (or clear) the currently playing request of a show
pub async fn set_current_playing(
    conn: &mut SqliteConnection,
    show_id: Uuid,
    request_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO show_queue_state (show_id, current_playing_request_id, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(show_id) DO UPDATE SET
            current_playing_request_id = excluded.current_playing_request_id,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(show_id.to_string())
    .bind(request_id.map(|id| id.to_string()))
    .bind(time::to_storage(&now))
    .execute(&mut *conn)
    .await?;

    Ok(())
}
