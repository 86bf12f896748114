//! Guest ledger queries
//!
//! (show_id, phone) is the primary key, so the conditional insert below is
//! the single point where an entry (and its bonus) can come into existence.

use crate::error::Result;
use crate::models::{LedgerEntry, PhoneNumber};
use chrono::{DateTime, Utc};
use encore_common::time;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use super::parse_uuid;

/// Insert a ledger entry unless one already exists for (show, phone).
///
/// Returns `true` if this call created the entry.
pub async fn insert_if_absent(
    conn: &mut SqliteConnection,
    show_id: Uuid,
    phone: &PhoneNumber,
    guest_name: Option<&str>,
    initial_points: u32,
    now: DateTime<Utc>,
) -> Result<bool> {
    let stamp = time::to_storage(&now);
    let inserted = sqlx::query(
        r#"
        INSERT INTO guest_ledger (show_id, phone, guest_name, points, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(show_id, phone) DO NOTHING
        "#,
    )
    .bind(show_id.to_string())
    .bind(phone.as_str())
    .bind(guest_name)
    .bind(i64::from(initial_points))
    .bind(&stamp)
    .bind(&stamp)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    Ok(inserted > 0)
}

/// Update the display name of an existing entry
pub async fn update_guest_name(
    conn: &mut SqliteConnection,
    show_id: Uuid,
    phone: &PhoneNumber,
    guest_name: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE guest_ledger SET guest_name = ?, updated_at = ?
        WHERE show_id = ? AND phone = ? AND (guest_name IS NULL OR guest_name <> ?)
        "#,
    )
    .bind(guest_name)
    .bind(time::to_storage(&now))
    .bind(show_id.to_string())
    .bind(phone.as_str())
    .bind(guest_name)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Get the entry for (show, phone)
pub async fn get_entry(
    conn: &mut SqliteConnection,
    show_id: Uuid,
    phone: &PhoneNumber,
) -> Result<Option<LedgerEntry>> {
    let row = sqlx::query(
        r#"
        SELECT show_id, guest_name, points, created_at, updated_at
        FROM guest_ledger
        WHERE show_id = ? AND phone = ?
        "#,
    )
    .bind(show_id.to_string())
    .bind(phone.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let points: i64 = row.try_get("points")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Some(LedgerEntry {
        show_id: parse_uuid(&row.try_get::<String, _>("show_id")?)?,
        phone: phone.clone(),
        guest_name: row.try_get("guest_name")?,
        points: points.max(0) as u32,
        created_at: time::from_storage(&created_at)?,
        updated_at: time::from_storage(&updated_at)?,
    }))
}
