//! Live subscriber registry for per-show queue snapshots

pub mod hub;

pub use hub::{BroadcastHub, SnapshotEvent, Subscription};
