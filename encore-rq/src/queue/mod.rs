//! Request queue core
//!
//! **Module Structure:**
//! - `core.rs`: `RequestQueue` handle, snapshots, subscriptions
//! - `store.rs`: submitting requests, contributions, performer responses
//! - `state_machine.rs`: status transitions and the single playing request
//! - `ledger.rs`: guest points ledger
//! - `aggregation.rs`: grouping and ranking (pure)
//! - `payment.rs`: payment deep links (pure)
//! - `locks.rs`: per-show mutation serialization

pub mod aggregation;
mod core;
mod ledger;
pub mod locks;
pub mod payment;
mod state_machine;
mod store;

pub use self::core::RequestQueue;
pub use ledger::JoinOutcome;
pub use state_machine::TransitionOutcome;
pub use store::{Contribution, NewRequest, Submitted};
