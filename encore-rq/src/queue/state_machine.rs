//! Status transitions
//!
//! `show_queue_state.current_playing_request_id` is the only record of which
//! request is playing. Promotion reads it, demotes that request to `played`,
//! promotes the new one and rewrites the field, all in one transaction under
//! the show lock. At most one request per show is `playing` after any commit.

use crate::db;
use crate::error::{Error, Result};
use crate::models::{Request, RequestStatus};
use chrono::{DateTime, Utc};
use encore_common::time;
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::aggregation::song_key;
use super::core::RequestQueue;

/// Result of a transition call
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    /// The addressed request, after the change
    pub request: Request,
    /// Request demoted from `playing` to `played`, if any
    pub demoted: Option<Uuid>,
    /// Other group members moved along with the addressed request
    pub group_members: Vec<Uuid>,
}

fn completed_at_for(status: RequestStatus, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    status.is_terminal().then_some(now)
}

fn check_transition(request: &Request, target: RequestStatus) -> Result<()> {
    if request.status.can_transition_to(target) {
        return Ok(());
    }
    Err(Error::StateTransition(format!(
        "request {} cannot move from {} to {}",
        request.id, request.status, target
    )))
}

/// Write one status change and keep the playing field in step
async fn apply(
    conn: &mut SqliteConnection,
    request: &mut Request,
    target: RequestStatus,
    now: DateTime<Utc>,
) -> Result<()> {
    let from = request.status;
    let completed_at = completed_at_for(target, now);
    db::requests::update_status(conn, request.id, target, completed_at).await?;

    if from == RequestStatus::Playing
        && db::shows::current_playing(conn, request.show_id).await? == Some(request.id)
    {
        db::shows::set_current_playing(conn, request.show_id, None, now).await?;
    }

    request.status = target;
    request.completed_at = completed_at;
    debug!("Request {}: {} -> {}", request.id, from, target);
    Ok(())
}

/// Demote whatever the field points at, then promote `request`
async fn promote_to_playing(
    conn: &mut SqliteConnection,
    request: &mut Request,
    now: DateTime<Utc>,
) -> Result<Option<Uuid>> {
    let show_id = request.show_id;
    let mut demoted = None;

    if let Some(current_id) = db::shows::current_playing(conn, show_id).await? {
        match db::requests::get_request(conn, current_id).await? {
            Some(mut current) if current.status == RequestStatus::Playing => {
                apply(conn, &mut current, RequestStatus::Played, now).await?;
                info!("Request {} finished playing in show {}", current_id, show_id);
                demoted = Some(current_id);
            }
            _ => {
                warn!(
                    "Show {} pointed at request {} which is not playing; replacing it without a demotion",
                    show_id, current_id
                );
            }
        }
    }

    apply(conn, request, RequestStatus::Playing, now).await?;
    db::shows::set_current_playing(conn, show_id, Some(request.id), now).await?;
    Ok(demoted)
}

impl RequestQueue {
    /// Move a request (or its whole group, when `group_key` is given) to `target`.
    ///
    /// A call that asks for the status a request already has changes nothing.
    /// For `playing` only the addressed request is promoted.
    pub async fn transition(
        &self,
        request_id: Uuid,
        target: RequestStatus,
        group_key: Option<&str>,
    ) -> Result<TransitionOutcome> {
        if target == RequestStatus::Pending {
            return Err(Error::StateTransition(
                "requests cannot return to pending".to_string(),
            ));
        }

        let show_id = {
            let mut conn = self.db.acquire().await?;
            Self::require_request(&mut conn, request_id).await?.show_id
        };

        let _guard = self.locks.lock(show_id).await;
        let mut tx = self.begin_write().await?;
        let mut request = Self::require_request(&mut tx, request_id).await?;

        if request.status == target {
            debug!("Request {} already {}", request_id, target);
            return Ok(TransitionOutcome {
                request,
                demoted: None,
                group_members: Vec::new(),
            });
        }
        check_transition(&request, target)?;

        let now = time::now();
        let from = request.status;
        let mut demoted = None;
        let mut group_members = Vec::new();

        match (target, group_key) {
            (RequestStatus::Playing, _) => {
                demoted = promote_to_playing(&mut tx, &mut request, now).await?;
            }
            (_, Some(key)) => {
                if song_key(&request) != key {
                    return Err(Error::validation(
                        "songKey",
                        "request does not belong to that song group",
                    ));
                }
                apply(&mut tx, &mut request, target, now).await?;

                let members = db::requests::list_by_show(&mut tx, show_id).await?;
                for mut member in members {
                    if member.id == request_id
                        || song_key(&member) != key
                        || !member.status.can_transition_to(target)
                    {
                        continue;
                    }
                    apply(&mut tx, &mut member, target, now).await?;
                    group_members.push(member.id);
                }
            }
            (_, None) => {
                apply(&mut tx, &mut request, target, now).await?;
            }
        }

        tx.commit().await?;

        info!(
            "Request {} in show {}: {} -> {}{}",
            request_id,
            show_id,
            from,
            target,
            if group_members.is_empty() {
                String::new()
            } else {
                format!(" (with {} group members)", group_members.len())
            }
        );
        self.publish(show_id).await;

        Ok(TransitionOutcome {
            request,
            demoted,
            group_members,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PhoneNumber, RequesterIdentity, SongRef, TipAmount};

    fn request(status: RequestStatus) -> Request {
        let mut r = Request::new(
            Uuid::new_v4(),
            RequesterIdentity::Guest {
                phone: PhoneNumber::parse("5551234567").unwrap(),
                name: None,
            },
            vec![SongRef::custom("Wonderwall", None)],
            String::new(),
            TipAmount::new(5).unwrap(),
            Utc::now(),
        );
        r.status = status;
        r
    }

    #[test]
    fn test_completion_time_only_for_terminal_targets() {
        let now = Utc::now();
        assert_eq!(completed_at_for(RequestStatus::Played, now), Some(now));
        assert_eq!(completed_at_for(RequestStatus::Declined, now), Some(now));
        assert_eq!(completed_at_for(RequestStatus::Playing, now), None);
        assert_eq!(completed_at_for(RequestStatus::Alternate, now), None);
    }

    #[test]
    fn test_terminal_request_rejects_transition() {
        let played = request(RequestStatus::Played);
        let err = check_transition(&played, RequestStatus::Playing).unwrap_err();
        assert!(matches!(err, Error::StateTransition(_)));

        let pending = request(RequestStatus::Pending);
        assert!(check_transition(&pending, RequestStatus::Alternate).is_ok());
        assert!(check_transition(&pending, RequestStatus::Played).is_err());
    }
}
