//! Request queue handle
//!
//! Every mutation follows the same funnel: take the show lock, apply the
//! change in one transaction, commit, then recompute the snapshot once and
//! push it to that show's subscribers, all before releasing the lock. The
//! push therefore reflects the committed state and arrives after any
//! bootstrap that was taken under the same lock.

use crate::config::RuntimeSettings;
use crate::db;
use crate::error::{Error, Result};
use crate::models::{QueueSnapshot, Request, Show};
use crate::sse::{BroadcastHub, Subscription};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::aggregation;
use super::locks::ShowLocks;

/// Shared handle to the request queue, cheap to clone
#[derive(Clone)]
pub struct RequestQueue {
    pub(super) db: SqlitePool,
    pub(super) locks: ShowLocks,
    pub(super) hub: BroadcastHub,
    pub(super) settings: RuntimeSettings,
}

impl RequestQueue {
    pub fn new(db: SqlitePool, settings: RuntimeSettings) -> Self {
        let hub = BroadcastHub::new(settings.subscriber_buffer);
        Self {
            db,
            locks: ShowLocks::new(),
            hub,
            settings,
        }
    }

    pub fn db(&self) -> &SqlitePool {
        &self.db
    }

    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    /// Open a write transaction holding the database write lock from the start.
    ///
    /// A deferred transaction that reads and then writes fails with
    /// SQLITE_BUSY_SNAPSHOT if another show committed in between, and the
    /// busy timeout does not retry that. `BEGIN IMMEDIATE` waits instead.
    pub(super) async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.db.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Load a show or fail with NotFound
    pub(super) async fn require_show(conn: &mut SqliteConnection, show_id: Uuid) -> Result<Show> {
        db::shows::get_show(conn, show_id)
            .await?
            .ok_or_else(|| Error::show_not_found(show_id))
    }

    /// Load a request or fail with NotFound
    pub(super) async fn require_request(
        conn: &mut SqliteConnection,
        request_id: Uuid,
    ) -> Result<Request> {
        db::requests::get_request(conn, request_id)
            .await?
            .ok_or_else(|| Error::request_not_found(request_id))
    }

    /// Recompute the full snapshot of a show
    pub async fn snapshot(&self, show_id: Uuid) -> Result<QueueSnapshot> {
        let mut conn = self.db.acquire().await?;
        let requests = db::requests::list_by_show(&mut conn, show_id).await?;
        let aggregation = aggregation::aggregate(&requests);

        let catalog_ids: Vec<Uuid> = aggregation
            .active
            .iter()
            .chain(aggregation.played.iter())
            .filter_map(|group| group.catalog_id())
            .collect();
        let musical_keys = db::catalog::musical_keys(&mut conn, &catalog_ids).await?;

        Ok(aggregation::build_snapshot(show_id, &aggregation, &musical_keys))
    }

    /// Open a live subscription; the first event is a full bootstrap
    pub async fn subscribe(&self, show_id: Uuid) -> Result<Subscription> {
        {
            let mut conn = self.db.acquire().await?;
            Self::require_show(&mut conn, show_id).await?;
        }

        let _guard = self.locks.lock(show_id).await;
        let snapshot = self.snapshot(show_id).await?;
        Ok(self.hub.subscribe(show_id, snapshot))
    }

    /// Push a fresh snapshot to subscribers. Call while holding the show lock.
    ///
    /// A failed recompute is logged, not returned: the mutation itself has
    /// already committed and the next push will converge.
    pub(super) async fn publish(&self, show_id: Uuid) {
        if !self.hub.has_subscribers(show_id) {
            return;
        }
        match self.snapshot(show_id).await {
            Ok(snapshot) => {
                self.hub.publish(show_id, snapshot);
            }
            Err(e) => {
                tracing::warn!("Failed to recompute snapshot for show {}: {}", show_id, e);
            }
        }
        debug!("Published snapshot for show {}", show_id);
    }
}
