//! Domain model types for the request queue

pub mod ledger;
pub mod request;
pub mod show;
pub mod snapshot;
pub mod status;

pub use ledger::LedgerEntry;
pub use request::{
    PerformerResponse, PhoneNumber, Request, RequesterIdentity, SongInput, SongRef, TipAmount,
};
pub use show::{CatalogSong, Show, ShowSettings, ShowType};
pub use snapshot::{GroupView, QueueSnapshot, RequestView};
pub use status::RequestStatus;
