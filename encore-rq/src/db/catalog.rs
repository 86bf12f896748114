//! Song catalog lookups (read-only collaborator data)

use crate::error::Result;
use crate::models::CatalogSong;
use sqlx::{Row, SqliteConnection};
use std::collections::HashMap;
use uuid::Uuid;

use super::parse_uuid;

/// Look up a catalog song by id
pub async fn get_song(conn: &mut SqliteConnection, song_id: Uuid) -> Result<Option<CatalogSong>> {
    let row = sqlx::query("SELECT guid, title, artist, musical_key FROM catalog_songs WHERE guid = ?")
        .bind(song_id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => Ok(Some(CatalogSong {
            id: parse_uuid(&row.try_get::<String, _>("guid")?)?,
            title: row.try_get("title")?,
            artist: row.try_get("artist")?,
            musical_key: row.try_get("musical_key")?,
        })),
        None => Ok(None),
    }
}

/// Musical keys for a set of catalog ids; ids without a key are omitted
pub async fn musical_keys(
    conn: &mut SqliteConnection,
    song_ids: &[Uuid],
) -> Result<HashMap<Uuid, String>> {
    let mut keys = HashMap::new();
    for id in song_ids {
        if keys.contains_key(id) {
            continue;
        }
        if let Some(song) = get_song(conn, *id).await? {
            if let Some(key) = song.musical_key {
                keys.insert(*id, key);
            }
        }
    }
    Ok(keys)
}

/// Insert or replace a catalog song
pub async fn upsert_song(conn: &mut SqliteConnection, song: &CatalogSong) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO catalog_songs (guid, title, artist, musical_key)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(guid) DO UPDATE SET
            title = excluded.title,
            artist = excluded.artist,
            musical_key = excluded.musical_key
        "#,
    )
    .bind(song.id.to_string())
    .bind(&song.title)
    .bind(&song.artist)
    .bind(&song.musical_key)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
