//! Request table queries
//!
//! Requests are append-only: there is no delete. Status changes go through
//! `update_status`, which only the state machine calls.

use crate::error::{Error, Result};
use crate::models::{
    PerformerResponse, PhoneNumber, Request, RequestStatus, RequesterIdentity, SongRef, TipAmount,
};
use chrono::{DateTime, Utc};
use encore_common::time;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::parse_uuid;

const REQUEST_COLUMNS: &str = r#"
    guid, show_id, requester_user_id, requester_phone, requester_name,
    songs_json, dedication, tip_amount, status, performer_responses_json,
    created_at, completed_at
"#;

fn request_from_row(row: &SqliteRow) -> Result<Request> {
    let user_id: Option<String> = row.try_get("requester_user_id")?;
    let phone: Option<String> = row.try_get("requester_phone")?;
    let name: Option<String> = row.try_get("requester_name")?;

    let requester = match (user_id, phone) {
        (Some(user_id), _) => RequesterIdentity::User { user_id },
        (None, Some(phone)) => RequesterIdentity::Guest {
            phone: PhoneNumber::parse(&phone)
                .map_err(|_| Error::Internal(format!("Invalid stored phone '{}'", phone)))?,
            name,
        },
        (None, None) => {
            return Err(Error::Internal("Stored request has no requester".to_string()));
        }
    };

    let songs: Vec<SongRef> = serde_json::from_str(&row.try_get::<String, _>("songs_json")?)?;
    let responses: BTreeMap<String, PerformerResponse> =
        serde_json::from_str(&row.try_get::<String, _>("performer_responses_json")?)?;

    let tip: i64 = row.try_get("tip_amount")?;
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    let completed_at: Option<String> = row.try_get("completed_at")?;

    Ok(Request {
        id: parse_uuid(&row.try_get::<String, _>("guid")?)?,
        show_id: parse_uuid(&row.try_get::<String, _>("show_id")?)?,
        requester,
        songs,
        dedication: row.try_get("dedication")?,
        tip_amount: TipAmount::new(tip)
            .map_err(|_| Error::Internal(format!("Invalid stored tip amount {}", tip)))?,
        status: status.parse::<RequestStatus>().map_err(Error::Internal)?,
        performer_responses: responses,
        created_at: time::from_storage(&created_at)?,
        completed_at: completed_at.as_deref().map(time::from_storage).transpose()?,
    })
}

/// Persist a new request
pub async fn insert_request(conn: &mut SqliteConnection, request: &Request) -> Result<()> {
    let (user_id, phone, name) = match &request.requester {
        RequesterIdentity::User { user_id } => (Some(user_id.as_str()), None, None),
        RequesterIdentity::Guest { phone, name } => (None, Some(phone.as_str()), name.as_deref()),
    };

    sqlx::query(
        r#"
        INSERT INTO requests (guid, show_id, requester_user_id, requester_phone, requester_name,
                              songs_json, dedication, tip_amount, status, performer_responses_json,
                              created_at, completed_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(request.id.to_string())
    .bind(request.show_id.to_string())
    .bind(user_id)
    .bind(phone)
    .bind(name)
    .bind(serde_json::to_string(&request.songs)?)
    .bind(&request.dedication)
    .bind(i64::from(request.tip_amount.get()))
    .bind(request.status.as_str())
    .bind(serde_json::to_string(&request.performer_responses)?)
    .bind(time::to_storage(&request.created_at))
    .bind(request.completed_at.as_ref().map(time::to_storage))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Get request by id
pub async fn get_request(conn: &mut SqliteConnection, request_id: Uuid) -> Result<Option<Request>> {
    let sql = format!("SELECT {} FROM requests WHERE guid = ?", REQUEST_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(request_id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(request_from_row).transpose()
}

/// All requests of a show, any status, oldest first
pub async fn list_by_show(conn: &mut SqliteConnection, show_id: Uuid) -> Result<Vec<Request>> {
    let sql = format!(
        "SELECT {} FROM requests WHERE show_id = ? ORDER BY created_at ASC, guid ASC",
        REQUEST_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(show_id.to_string())
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(request_from_row).collect()
}

/// Write a new status (and completion time) for one request
pub async fn update_status(
    conn: &mut SqliteConnection,
    request_id: Uuid,
    status: RequestStatus,
    completed_at: Option<DateTime<Utc>>,
) -> Result<()> {
    sqlx::query("UPDATE requests SET status = ?, completed_at = ? WHERE guid = ?")
        .bind(status.as_str())
        .bind(completed_at.as_ref().map(time::to_storage))
        .bind(request_id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Replace the performer response map of one request
pub async fn set_performer_responses(
    conn: &mut SqliteConnection,
    request_id: Uuid,
    responses: &BTreeMap<String, PerformerResponse>,
) -> Result<()> {
    sqlx::query("UPDATE requests SET performer_responses_json = ? WHERE guid = ?")
        .bind(serde_json::to_string(responses)?)
        .bind(request_id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Number of requests a requester already owns in a show
pub async fn count_by_requester(
    conn: &mut SqliteConnection,
    show_id: Uuid,
    requester: &RequesterIdentity,
) -> Result<i64> {
    let count: i64 = match requester {
        RequesterIdentity::User { user_id } => {
            sqlx::query_scalar(
                "SELECT COUNT(*) FROM requests WHERE show_id = ? AND requester_user_id = ?",
            )
            .bind(show_id.to_string())
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?
        }
        RequesterIdentity::Guest { phone, .. } => {
            sqlx::query_scalar(
                "SELECT COUNT(*) FROM requests WHERE show_id = ? AND requester_phone = ?",
            )
            .bind(show_id.to_string())
            .bind(phone.as_str())
            .fetch_one(&mut *conn)
            .await?
        }
    };

    Ok(count)
}
