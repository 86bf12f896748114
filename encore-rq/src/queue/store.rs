//! Request store operations
//!
//! Validation happens before anything is written. Checks that need no
//! database (song list shape, tip range, identity) run first; show and
//! catalog lookups follow under the show lock.

use crate::db;
use crate::error::{Error, Result};
use crate::models::{
    PerformerResponse, PhoneNumber, Request, RequestStatus, RequesterIdentity, Show, SongInput,
    SongRef, TipAmount,
};
use chrono::Utc;
use encore_common::time;
use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::{debug, info};
use uuid::Uuid;

use super::core::RequestQueue;
use super::payment::build_payment_link;
use crate::models::request::MAX_SONGS_PER_REQUEST;

/// Unvalidated request submission
#[derive(Debug, Clone, Default)]
pub struct NewRequest {
    pub songs: Vec<SongInput>,
    pub dedication: String,
    pub tip_amount: i64,
    pub requester_phone: Option<String>,
    pub requester_name: Option<String>,
    pub requester_user_id: Option<String>,
}

/// Unvalidated "add to request" contribution
#[derive(Debug, Clone, Default)]
pub struct Contribution {
    pub tip_amount: i64,
    pub phone_number: String,
    pub guest_name: Option<String>,
    pub dedication: Option<String>,
}

/// A persisted request and its payment deep link
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submitted {
    pub request: Request,
    pub payment_url: String,
}

fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn check_song_count(songs: &[SongInput]) -> Result<()> {
    if songs.is_empty() {
        return Err(Error::validation("songs", "at least one song is required"));
    }
    if songs.len() > MAX_SONGS_PER_REQUEST {
        return Err(Error::validation(
            "songs",
            format!("at most {} songs per request", MAX_SONGS_PER_REQUEST),
        ));
    }
    for song in songs {
        if song.song_id.is_none() && clean_text(song.name.as_deref()).is_none() {
            return Err(Error::validation("songs", "every song needs a name"));
        }
    }
    Ok(())
}

fn requester_identity(new: &NewRequest) -> Result<RequesterIdentity> {
    if let Some(phone) = new.requester_phone.as_deref() {
        return Ok(RequesterIdentity::Guest {
            phone: PhoneNumber::parse(phone)?,
            name: clean_text(new.requester_name.as_deref()),
        });
    }
    match clean_text(new.requester_user_id.as_deref()) {
        Some(user_id) => Ok(RequesterIdentity::User { user_id }),
        None => Err(Error::validation(
            "requesterPhone",
            "a phone number or user id is required",
        )),
    }
}

/// Resolve client song inputs into embedded song references
async fn resolve_songs(conn: &mut SqliteConnection, songs: &[SongInput]) -> Result<Vec<SongRef>> {
    let mut resolved = Vec::with_capacity(songs.len());
    for input in songs {
        let song = match input.song_id {
            Some(id) => {
                let catalog = db::catalog::get_song(conn, id)
                    .await?
                    .ok_or_else(|| Error::validation("songs", format!("unknown catalog song {}", id)))?;
                SongRef::catalog(catalog.id, catalog.title, Some(catalog.artist))
            }
            None => {
                // check_song_count guarantees a name here
                let name = clean_text(input.name.as_deref()).unwrap_or_default();
                SongRef::custom(name, clean_text(input.artist.as_deref()))
            }
        };
        resolved.push(song);
    }
    Ok(resolved)
}

fn check_accepting(show: &Show) -> Result<()> {
    if !show.is_accepting_requests(Utc::now()) {
        return Err(Error::NotAccepting(show.id));
    }
    Ok(())
}

async fn check_request_limit(
    conn: &mut SqliteConnection,
    show: &Show,
    requester: &RequesterIdentity,
) -> Result<()> {
    let Some(limit) = show.settings.max_requests_per_user else {
        return Ok(());
    };
    let owned = db::requests::count_by_requester(conn, show.id, requester).await?;
    if owned >= i64::from(limit) {
        return Err(Error::validation(
            "requester",
            format!("request limit of {} reached for this show", limit),
        ));
    }
    Ok(())
}

impl RequestQueue {
    /// Validate and persist a new `pending` request
    pub async fn submit(&self, show_id: Uuid, new: NewRequest) -> Result<Submitted> {
        check_song_count(&new.songs)?;
        let tip = TipAmount::new(new.tip_amount)?;
        let requester = requester_identity(&new)?;

        let _guard = self.locks.lock(show_id).await;
        let mut tx = self.begin_write().await?;

        let show = Self::require_show(&mut tx, show_id).await?;
        check_accepting(&show)?;
        let songs = resolve_songs(&mut tx, &new.songs).await?;
        check_request_limit(&mut tx, &show, &requester).await?;

        let request = Request::new(
            show_id,
            requester,
            songs,
            new.dedication.trim().to_string(),
            tip,
            time::now(),
        );
        db::requests::insert_request(&mut tx, &request).await?;
        tx.commit().await?;

        info!(
            "Request {} submitted to show {}: {} (tip {})",
            request.id,
            show_id,
            request.songs_display(),
            request.tip_amount.get()
        );

        self.publish(show_id).await;

        let payment_url = build_payment_link(&request, &self.settings.payment);
        Ok(Submitted {
            request,
            payment_url,
        })
    }

    /// All raw requests of a show, any status
    pub async fn list_by_show(&self, show_id: Uuid) -> Result<Vec<Request>> {
        let mut conn = self.db.acquire().await?;
        Self::require_show(&mut conn, show_id).await?;
        db::requests::list_by_show(&mut conn, show_id).await
    }

    /// Upsert one performer's response on a request; repeating it is a no-op
    pub async fn record_performer_response(
        &self,
        request_id: Uuid,
        performer_id: &str,
        response: PerformerResponse,
    ) -> Result<Request> {
        let performer_id = performer_id.trim();
        if performer_id.is_empty() {
            return Err(Error::validation("performerId", "performer id is required"));
        }

        let show_id = {
            let mut conn = self.db.acquire().await?;
            Self::require_request(&mut conn, request_id).await?.show_id
        };

        let _guard = self.locks.lock(show_id).await;
        let mut tx = self.begin_write().await?;
        let mut request = Self::require_request(&mut tx, request_id).await?;

        if request.performer_responses.get(performer_id) == Some(&response) {
            debug!(
                "Performer {} already answered request {} with {:?}",
                performer_id, request_id, response
            );
            return Ok(request);
        }

        request
            .performer_responses
            .insert(performer_id.to_string(), response);
        db::requests::set_performer_responses(&mut tx, request_id, &request.performer_responses)
            .await?;
        tx.commit().await?;

        info!(
            "Performer {} answered request {} with {:?}",
            performer_id, request_id, response
        );
        self.publish(show_id).await;

        Ok(request)
    }

    /// Append an `add_to_request` contribution onto an existing request's group
    ///
    /// The phone must already be known to the show, either through the
    /// ledger or through an earlier request.
    pub async fn contribute(
        &self,
        show_id: Uuid,
        target_id: Uuid,
        contribution: Contribution,
    ) -> Result<Submitted> {
        let tip = TipAmount::new(contribution.tip_amount)?;
        let phone = PhoneNumber::parse(&contribution.phone_number)?;

        let _guard = self.locks.lock(show_id).await;
        let mut tx = self.begin_write().await?;

        let show = Self::require_show(&mut tx, show_id).await?;
        let target = Self::require_request(&mut tx, target_id).await?;
        if target.show_id != show_id {
            return Err(Error::request_not_found(target_id));
        }
        if target.status.is_terminal() {
            return Err(Error::StateTransition(format!(
                "cannot add to request {} in status {}",
                target_id, target.status
            )));
        }
        check_accepting(&show)?;

        let requester = RequesterIdentity::Guest {
            phone: phone.clone(),
            name: clean_text(contribution.guest_name.as_deref()),
        };
        let known_in_ledger = db::ledger::get_entry(&mut tx, show_id, &phone)
            .await?
            .is_some();
        if !known_in_ledger
            && db::requests::count_by_requester(&mut tx, show_id, &requester).await? == 0
        {
            return Err(Error::validation(
                "phoneNumber",
                "phone number is not known to this show",
            ));
        }
        check_request_limit(&mut tx, &show, &requester).await?;

        let mut request = Request::new(
            show_id,
            requester,
            target.songs.clone(),
            clean_text(contribution.dedication.as_deref()).unwrap_or_default(),
            tip,
            time::now(),
        );
        request.status = RequestStatus::AddToRequest;
        db::requests::insert_request(&mut tx, &request).await?;
        tx.commit().await?;

        info!(
            "Contribution {} added to request {} in show {} (tip {})",
            request.id,
            target_id,
            show_id,
            request.tip_amount.get()
        );
        self.publish(show_id).await;

        let payment_url = build_payment_link(&request, &self.settings.payment);
        Ok(Submitted {
            request,
            payment_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(name: &str) -> SongInput {
        SongInput {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_song_count_bounds() {
        assert!(check_song_count(&[]).is_err());
        assert!(check_song_count(&[song("A")]).is_ok());
        assert!(check_song_count(&[song("A"), song("B"), song("C")]).is_ok());
        assert!(check_song_count(&[song("A"), song("B"), song("C"), song("D")]).is_err());
    }

    #[test]
    fn test_song_needs_name_or_catalog_id() {
        assert!(check_song_count(&[song("   ")]).is_err());
        let catalog = SongInput {
            song_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert!(check_song_count(&[catalog]).is_ok());
    }

    #[test]
    fn test_identity_prefers_phone_and_requires_one() {
        let guest = NewRequest {
            requester_phone: Some("555-123-4567".to_string()),
            requester_name: Some("  Sam ".to_string()),
            requester_user_id: Some("user-1".to_string()),
            ..Default::default()
        };
        match requester_identity(&guest).unwrap() {
            RequesterIdentity::Guest { phone, name } => {
                assert_eq!(phone.as_str(), "5551234567");
                assert_eq!(name.as_deref(), Some("Sam"));
            }
            other => panic!("unexpected identity {:?}", other),
        }

        let user = NewRequest {
            requester_user_id: Some("user-1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            requester_identity(&user).unwrap(),
            RequesterIdentity::User {
                user_id: "user-1".to_string()
            }
        );

        assert!(requester_identity(&NewRequest::default()).is_err());
    }
}
