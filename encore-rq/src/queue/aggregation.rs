//! Grouping and ranking of a show's requests
//!
//! Requests asking for the same song(s) form one group. A song reference
//! keys on its catalog id when it has one and on normalized name text
//! otherwise, so two different catalog songs sharing a title stay apart.
//! A request with several songs keys on the whole ordered list.
//!
//! Pure functions only: the same input always yields the same groups,
//! totals and order.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::models::{GroupView, QueueSnapshot, Request, RequestStatus, RequestView, SongRef};

/// Normalized text key: lowercase, trimmed, internal whitespace collapsed
pub fn normalize_song_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn song_ref_key(song: &SongRef) -> String {
    match song.catalog_id {
        Some(id) => format!("catalog:{}", id),
        None => format!("text:{}", normalize_song_name(&song.name)),
    }
}

/// Grouping key of a request
pub fn song_key(request: &Request) -> String {
    request
        .songs
        .iter()
        .map(song_ref_key)
        .collect::<Vec<_>>()
        .join("|")
}

/// Requests sharing one song key, with aggregate totals
#[derive(Debug, Clone, PartialEq)]
pub struct RequestGroup {
    pub key: String,
    /// Members, oldest first
    pub members: Vec<Request>,
    pub total_tip: u32,
    pub earliest: DateTime<Utc>,
    pub dominant_status: RequestStatus,
}

impl RequestGroup {
    fn from_members(key: String, mut members: Vec<Request>) -> Option<Self> {
        members.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        let first = members.first()?;
        let earliest = first.created_at;
        let total_tip = members.iter().map(|r| r.tip_amount.get()).sum();
        let dominant_status = members
            .iter()
            .min_by_key(|r| (r.status.priority(), r.created_at))
            .map(|r| r.status)?;

        Some(Self {
            key,
            members,
            total_tip,
            earliest,
            dominant_status,
        })
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Display heading, taken from the earliest member
    pub fn song_name(&self) -> String {
        self.members
            .first()
            .map(Request::songs_display)
            .unwrap_or_default()
    }

    /// Catalog id when the group keys on exactly one catalog song
    pub fn catalog_id(&self) -> Option<Uuid> {
        let first = self.members.first()?;
        match first.songs.as_slice() {
            [song] => song.catalog_id,
            _ => None,
        }
    }
}

/// Ranked display lists for one show
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aggregation {
    /// Groups still in play, highest display priority first
    pub active: Vec<RequestGroup>,
    /// Finished groups, most recent first
    pub played: Vec<RequestGroup>,
}

/// Group, partition and rank a show's requests.
///
/// Declined groups appear in neither list.
pub fn aggregate(requests: &[Request]) -> Aggregation {
    let mut by_key: BTreeMap<String, Vec<Request>> = BTreeMap::new();
    for request in requests {
        by_key.entry(song_key(request)).or_default().push(request.clone());
    }

    let mut aggregation = Aggregation::default();
    for (key, members) in by_key {
        let Some(group) = RequestGroup::from_members(key, members) else {
            continue;
        };
        match group.dominant_status {
            RequestStatus::Played => aggregation.played.push(group),
            RequestStatus::Declined => {}
            _ => aggregation.active.push(group),
        }
    }

    aggregation.active.sort_by(|a, b| {
        a.dominant_status
            .priority()
            .cmp(&b.dominant_status.priority())
            .then(b.total_tip.cmp(&a.total_tip))
            .then(a.earliest.cmp(&b.earliest))
            .then(a.key.cmp(&b.key))
    });
    aggregation
        .played
        .sort_by(|a, b| b.earliest.cmp(&a.earliest).then(a.key.cmp(&b.key)));

    aggregation
}

fn group_view(group: &RequestGroup, musical_keys: &HashMap<Uuid, String>) -> GroupView {
    GroupView {
        song_key: group.key.clone(),
        song_name: group.song_name(),
        musical_key: group.catalog_id().and_then(|id| musical_keys.get(&id).cloned()),
        status: group.dominant_status,
        total_tip: group.total_tip,
        count: group.count(),
        earliest_request_at: group.earliest,
        request_ids: group.members.iter().map(|r| r.id).collect(),
        dedications: group
            .members
            .iter()
            .map(|r| r.dedication.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

/// Build the wire snapshot from an aggregation
pub fn build_snapshot(
    show_id: Uuid,
    aggregation: &Aggregation,
    musical_keys: &HashMap<Uuid, String>,
) -> QueueSnapshot {
    let ordered = aggregation.active.iter().chain(aggregation.played.iter());
    let requests = ordered
        .flat_map(|group| {
            group
                .members
                .iter()
                .map(move |r| RequestView::from_request(r, &group.key))
        })
        .collect();

    QueueSnapshot {
        show_id,
        requests,
        active: aggregation
            .active
            .iter()
            .map(|g| group_view(g, musical_keys))
            .collect(),
        played: aggregation
            .played
            .iter()
            .map(|g| group_view(g, musical_keys))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PhoneNumber, RequesterIdentity, TipAmount};
    use chrono::{Duration, TimeZone};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 20, 0, 0).unwrap()
    }

    fn request(song: &str, tip: i64, minute: i64, status: RequestStatus) -> Request {
        let mut r = Request::new(
            Uuid::nil(),
            RequesterIdentity::Guest {
                phone: PhoneNumber::parse("5551234567").unwrap(),
                name: None,
            },
            vec![SongRef::custom(song, None)],
            String::new(),
            TipAmount::new(tip).unwrap(),
            base_time() + Duration::minutes(minute),
        );
        r.status = status;
        r
    }

    #[test]
    fn test_groups_by_normalized_name_and_ranks_by_tip() {
        let requests = vec![
            request("Let It Be", 5, 0, RequestStatus::Pending),
            request("  let it  BE ", 10, 1, RequestStatus::Pending),
            request("Hey Jude", 3, 2, RequestStatus::Pending),
        ];

        let agg = aggregate(&requests);
        assert_eq!(agg.active.len(), 2);
        assert!(agg.played.is_empty());

        let first = &agg.active[0];
        assert_eq!(first.key, "text:let it be");
        assert_eq!(first.count(), 2);
        assert_eq!(first.total_tip, 15);
        assert_eq!(first.song_name(), "Let It Be");

        let second = &agg.active[1];
        assert_eq!(second.key, "text:hey jude");
        assert_eq!(second.count(), 1);
        assert_eq!(second.total_tip, 3);
    }

    #[test]
    fn test_status_priority_outranks_tip() {
        let requests = vec![
            request("Big Tipper", 100, 0, RequestStatus::Pending),
            request("Now Playing", 1, 1, RequestStatus::Playing),
            request("Alternate", 2, 2, RequestStatus::Alternate),
        ];

        let agg = aggregate(&requests);
        let order: Vec<_> = agg.active.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(order, vec!["text:now playing", "text:alternate", "text:big tipper"]);
    }

    #[test]
    fn test_equal_tip_falls_back_to_earliest() {
        let requests = vec![
            request("Later", 5, 10, RequestStatus::Pending),
            request("Sooner", 5, 1, RequestStatus::Pending),
        ];
        let agg = aggregate(&requests);
        assert_eq!(agg.active[0].key, "text:sooner");
    }

    #[test]
    fn test_dominant_status_is_lowest_priority_member() {
        let requests = vec![
            request("Wonderwall", 5, 0, RequestStatus::Played),
            request("Wonderwall", 5, 1, RequestStatus::AddToRequest),
            request("Wonderwall", 5, 2, RequestStatus::Pending),
        ];
        let agg = aggregate(&requests);
        assert_eq!(agg.active.len(), 1);
        assert_eq!(agg.active[0].dominant_status, RequestStatus::AddToRequest);
        assert_eq!(agg.active[0].total_tip, 15);
    }

    #[test]
    fn test_played_sorted_most_recent_first_and_declined_hidden() {
        let requests = vec![
            request("Opener", 5, 0, RequestStatus::Played),
            request("Second", 5, 5, RequestStatus::Played),
            request("Nope", 50, 6, RequestStatus::Declined),
        ];
        let agg = aggregate(&requests);
        assert!(agg.active.is_empty());
        let order: Vec<_> = agg.played.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(order, vec!["text:second", "text:opener"]);
    }

    #[test]
    fn test_catalog_songs_with_same_title_stay_apart() {
        let mut a = request("Hold On", 5, 0, RequestStatus::Pending);
        let mut b = request("Hold On", 5, 1, RequestStatus::Pending);
        a.songs = vec![SongRef::catalog(Uuid::new_v4(), "Hold On", Some("Wilson Phillips".into()))];
        b.songs = vec![SongRef::catalog(Uuid::new_v4(), "Hold On", Some("Alabama Shakes".into()))];

        let agg = aggregate(&[a, b]);
        assert_eq!(agg.active.len(), 2);
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let requests = vec![
            request("A", 5, 0, RequestStatus::Pending),
            request("B", 5, 0, RequestStatus::Pending),
            request("a", 7, 3, RequestStatus::Queued),
            request("C", 9, 1, RequestStatus::Alternate),
        ];
        let mut reversed = requests.clone();
        reversed.reverse();

        assert_eq!(aggregate(&requests), aggregate(&requests));
        assert_eq!(aggregate(&requests), aggregate(&reversed));
    }

    #[test]
    fn test_snapshot_lists_requests_in_group_order_without_phones() {
        let requests = vec![
            request("Hey Jude", 3, 0, RequestStatus::Pending),
            request("Let It Be", 5, 1, RequestStatus::Pending),
            request("Let It Be", 10, 2, RequestStatus::Pending),
        ];
        let agg = aggregate(&requests);
        let snapshot = build_snapshot(Uuid::nil(), &agg, &HashMap::new());

        let keys: Vec<_> = snapshot.requests.iter().map(|r| r.song_key.as_str()).collect();
        assert_eq!(keys, vec!["text:let it be", "text:let it be", "text:hey jude"]);

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(!json.contains("5551234567"));
    }
}
