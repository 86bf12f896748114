//! Broadcast hub
//!
//! Maps show id → live subscriber sinks. Every sink receives full
//! snapshots only, so delivery is best-effort and convergent: a sink that
//! is full skips one event and is corrected by the next. A sink whose
//! receiver is gone is removed during the push that discovers it.
//!
//! The registry lock is a plain `std` lock: it is never held across an
//! await point, and `Subscription::drop` must be able to take it.

use encore_common::events::PushEvent;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::QueueSnapshot;

/// Event delivered to subscribers
pub type SnapshotEvent = Arc<PushEvent<QueueSnapshot>>;

type Sinks = HashMap<u64, mpsc::Sender<SnapshotEvent>>;

struct HubInner {
    shows: RwLock<HashMap<Uuid, Sinks>>,
    next_id: AtomicU64,
    buffer: usize,
}

impl HubInner {
    fn unsubscribe(&self, show_id: Uuid, subscriber_id: u64) {
        let mut shows = self.shows.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(sinks) = shows.get_mut(&show_id) {
            if sinks.remove(&subscriber_id).is_some() {
                info!(
                    "Subscriber {} left show {} ({} remaining)",
                    subscriber_id,
                    show_id,
                    sinks.len()
                );
            }
            if sinks.is_empty() {
                shows.remove(&show_id);
            }
        }
    }
}

/// Shared registry of live subscribers, cheap to clone
#[derive(Clone)]
pub struct BroadcastHub {
    inner: Arc<HubInner>,
}

impl BroadcastHub {
    /// Create a hub whose sinks buffer up to `buffer` events each
    pub fn new(buffer: usize) -> Self {
        info!("Broadcast hub initialized with per-subscriber buffer {}", buffer);
        Self {
            inner: Arc::new(HubInner {
                shows: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                buffer: buffer.max(1),
            }),
        }
    }

    /// Register a new sink for `show_id`.
    ///
    /// `bootstrap` is queued before the sink becomes visible to `publish`,
    /// so it is always the first event the subscriber sees.
    pub fn subscribe(&self, show_id: Uuid, bootstrap: QueueSnapshot) -> Subscription {
        let (tx, rx) = mpsc::channel(self.inner.buffer);
        // A fresh channel always has room for one event
        let _ = tx.try_send(Arc::new(PushEvent::bootstrap(bootstrap)));

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let count = {
            let mut shows = self.inner.shows.write().unwrap_or_else(PoisonError::into_inner);
            let sinks = shows.entry(show_id).or_default();
            sinks.insert(id, tx);
            sinks.len()
        };
        info!("Subscriber {} joined show {} ({} connected)", id, show_id, count);

        Subscription {
            show_id,
            id,
            rx,
            hub: Arc::clone(&self.inner),
        }
    }

    /// Push a `requests` event to every subscriber of `show_id`.
    ///
    /// Returns the number of sinks the event was queued on.
    pub fn publish(&self, show_id: Uuid, snapshot: QueueSnapshot) -> usize {
        let event: SnapshotEvent = Arc::new(PushEvent::requests(snapshot));
        let mut shows = self.inner.shows.write().unwrap_or_else(PoisonError::into_inner);
        let Some(sinks) = shows.get_mut(&show_id) else {
            return 0;
        };

        let mut delivered = 0;
        sinks.retain(|id, tx| match tx.try_send(Arc::clone(&event)) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Subscriber {} of show {} is lagging, skipped one event", id, show_id);
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Dropping closed subscriber {} of show {}", id, show_id);
                false
            }
        });

        if sinks.is_empty() {
            shows.remove(&show_id);
        }

        debug!("Pushed snapshot for show {} to {} subscribers", show_id, delivered);
        delivered
    }

    /// Number of live subscribers of a show
    pub fn subscriber_count(&self, show_id: Uuid) -> usize {
        self.inner
            .shows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&show_id)
            .map_or(0, HashMap::len)
    }

    pub fn has_subscribers(&self, show_id: Uuid) -> bool {
        self.subscriber_count(show_id) > 0
    }
}

/// One live subscriber; unregisters itself when dropped
pub struct Subscription {
    show_id: Uuid,
    id: u64,
    rx: mpsc::Receiver<SnapshotEvent>,
    hub: Arc<HubInner>,
}

impl Subscription {
    pub fn show_id(&self) -> Uuid {
        self.show_id
    }

    /// Next event, or `None` once the hub has dropped this sink
    pub async fn recv(&mut self) -> Option<SnapshotEvent> {
        self.rx.recv().await
    }

    /// Next event if one is already queued
    #[cfg(test)]
    pub(crate) fn try_recv(&mut self) -> Option<SnapshotEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.show_id, self.id);
    }
}
