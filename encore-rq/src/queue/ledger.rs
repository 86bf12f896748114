//! Guest points ledger
//!
//! Points and tip amounts are separate numbers: joining never spends
//! points and tipping never checks them.

use crate::db;
use crate::error::{Error, Result};
use crate::models::{LedgerEntry, PhoneNumber, ShowType};
use encore_common::time;
use tracing::{debug, info};
use uuid::Uuid;

use super::core::RequestQueue;

/// Ledger entry after a join, and whether this call granted the bonus
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub entry: LedgerEntry,
    pub bonus_granted: bool,
}

impl RequestQueue {
    /// Record a guest joining a show.
    ///
    /// The first join of a (show, phone) pair on a private show grants the
    /// one-time bonus; later joins return the same balance. A non-empty
    /// `guest_name` replaces the stored display name.
    pub async fn join_show(
        &self,
        show_id: Uuid,
        phone_number: &str,
        guest_name: Option<&str>,
    ) -> Result<JoinOutcome> {
        let phone = PhoneNumber::parse(phone_number)?;
        let guest_name = guest_name.map(str::trim).filter(|n| !n.is_empty());

        let _guard = self.locks.lock(show_id).await;
        let mut tx = self.begin_write().await?;
        let show = Self::require_show(&mut tx, show_id).await?;

        let bonus = match show.show_type {
            ShowType::Private => self.settings.private_show_join_bonus,
            ShowType::Public => 0,
        };

        let now = time::now();
        let created =
            db::ledger::insert_if_absent(&mut tx, show_id, &phone, guest_name, bonus, now).await?;
        if !created {
            if let Some(name) = guest_name {
                db::ledger::update_guest_name(&mut tx, show_id, &phone, name, now).await?;
            }
        }

        let entry = db::ledger::get_entry(&mut tx, show_id, &phone)
            .await?
            .ok_or_else(|| Error::Internal(format!("ledger entry for show {} vanished", show_id)))?;
        tx.commit().await?;

        let bonus_granted = created && bonus > 0;
        if bonus_granted {
            info!("Granted join bonus of {} points in show {}", bonus, show_id);
        } else {
            debug!("Guest rejoined show {} with {} points", show_id, entry.points);
        }

        Ok(JoinOutcome {
            entry,
            bonus_granted,
        })
    }
}
