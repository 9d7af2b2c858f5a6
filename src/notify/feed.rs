//! Notification feed - per-session reconciliation context
//!
//! Owns the visible notification list, the ledger view, and the fetch cycle
//! counter for one signed-in user. A session is a single logical actor, so
//! every method takes `&mut self` and nothing here spawns tasks; the
//! embedding runtime decides when to poll.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::complaint::model::{Complaint, ComplaintId, ComplaintStatus, UserId};
use crate::config::FeedConfig;
use crate::error::Result;
use crate::service::ComplaintService;

use super::key::NotificationKey;
use super::ledger::{LedgerMap, NotificationLedger};
use super::merge::merge;
use super::Notification;

/// Per-user notification session state.
pub struct NotificationFeed {
    user_id: UserId,
    config: FeedConfig,
    ledger: Box<dyn NotificationLedger>,
    map: LedgerMap,
    visible: Vec<Notification>,
    /// Fetch cycles applied, monotonically increasing
    cycle: u64,
    /// A ledger write failed and needs retrying
    dirty: bool,
    /// Forward-progress marks: the newest filing time seen and the latest
    /// status seen per complaint. A list that falls behind either is an
    /// out-of-order response and must not drive a prune pass.
    newest_seen: Option<DateTime<Utc>>,
    status_marks: HashMap<ComplaintId, ComplaintStatus>,
}

impl NotificationFeed {
    /// Open a feed for one user, seeding read/cleared state from the ledger
    /// so the session starts where the last one ended.
    pub fn new(
        user_id: impl Into<UserId>,
        config: FeedConfig,
        ledger: Box<dyn NotificationLedger>,
    ) -> Result<Self> {
        let user_id = user_id.into();
        let map = ledger.load(&user_id)?;
        debug!(user_id = %user_id, entries = map.len(), "Notification feed opened");
        Ok(Self {
            user_id,
            config,
            ledger,
            map,
            visible: Vec::new(),
            cycle: 0,
            dirty: false,
            newest_seen: None,
            status_marks: HashMap::new(),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Currently visible notifications, newest complaint first.
    pub fn notifications(&self) -> &[Notification] {
        &self.visible
    }

    pub fn unread_count(&self) -> usize {
        self.visible.iter().filter(|n| !n.read).count()
    }

    /// Fetch cycles applied so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Run one fetch cycle against the complaint service. Returns the
    /// fetched list so the caller can render it too.
    ///
    /// A fetch failure leaves the visible list, the cycle counter, and the
    /// ledger exactly as they were; the next poll simply tries again.
    pub async fn refresh(&mut self, service: &dyn ComplaintService) -> Result<Vec<Complaint>> {
        self.retry_flush();

        let complaints = service.fetch_complaints().await?;
        self.apply_complaints(&complaints);
        Ok(complaints)
    }

    /// Merge one fetched complaint list into the visible state.
    ///
    /// Safe to call with responses that arrive out of order: the cleared
    /// set is consulted fresh on every call, so an older list can never
    /// resurrect a cleared key, and the prune pass (when enabled) is
    /// skipped for lists that fall behind the forward-progress marks, so
    /// a stale response can never drop a cleared fact either.
    pub fn apply_complaints(&mut self, complaints: &[Complaint]) {
        self.cycle += 1;
        self.visible = merge(&self.visible, complaints, &self.map, self.config.window);

        debug!(
            user_id = %self.user_id,
            cycle = self.cycle,
            visible = self.visible.len(),
            "Applied fetch cycle"
        );

        if self.config.prune {
            if self.observe(complaints) {
                let live: HashSet<String> = complaints
                    .iter()
                    .take(self.config.window)
                    .map(|c| NotificationKey::new(&c.id, c.current_status).to_storage_key())
                    .collect();
                self.prune_ledger(&live);
            } else {
                debug!(
                    user_id = %self.user_id,
                    cycle = self.cycle,
                    "Out-of-order list, prune skipped"
                );
            }
        }
    }

    /// Mark one notification as read.
    pub fn mark_read(&mut self, key: &NotificationKey) {
        for n in &mut self.visible {
            if n.key == *key {
                n.read = true;
            }
        }
        self.map.mark_read(&key.to_storage_key());
        self.flush();
    }

    /// Mark everything currently visible as read.
    pub fn mark_all_read(&mut self) {
        for n in &mut self.visible {
            n.read = true;
            self.map.mark_read(&n.key.to_storage_key());
        }
        self.flush();
    }

    /// Remove one notification now and keep it from ever coming back, even
    /// while its complaint stays among the newest.
    pub fn dismiss(&mut self, key: &NotificationKey) {
        self.visible.retain(|n| n.key != *key);
        self.map.mark_cleared(&key.to_storage_key());
        self.flush();
    }

    /// Remove everything currently visible, permanently.
    pub fn clear_all(&mut self) {
        for n in &self.visible {
            self.map.mark_cleared(&n.key.to_storage_key());
        }
        self.visible.clear();
        self.flush();
    }

    /// Write-through persistence. A failed write keeps the in-memory state
    /// authoritative for this session and is retried on the next mutation
    /// and at the start of the next fetch cycle.
    fn flush(&mut self) {
        match self.ledger.persist(&self.user_id, &self.map) {
            Ok(()) => self.dirty = false,
            Err(e) => {
                warn!(
                    user_id = %self.user_id,
                    error = %e,
                    "Ledger persist failed, keeping in-memory state"
                );
                self.dirty = true;
            }
        }
    }

    fn retry_flush(&mut self) {
        if self.dirty {
            self.flush();
        }
    }

    /// Advance the forward-progress marks with one applied list. Returns
    /// false for a list that falls behind a mark (an out-of-order response)
    /// or carries nothing at all: pruning from such a list would drop
    /// ledger facts that newer lists still derive.
    fn observe(&mut self, complaints: &[Complaint]) -> bool {
        let mut current = !complaints.is_empty();

        if let Some(newest) = complaints.iter().map(|c| c.created_at).max() {
            match self.newest_seen {
                Some(seen) if newest < seen => current = false,
                Some(seen) if newest > seen => self.newest_seen = Some(newest),
                None => self.newest_seen = Some(newest),
                _ => {}
            }
        }

        for complaint in complaints {
            let rank = complaint.current_status.rank();
            let seen = self.status_marks.get(&complaint.id).map(|s| s.rank());
            match seen {
                Some(seen) if rank < seen => current = false,
                Some(seen) if rank > seen => {
                    self.status_marks
                        .insert(complaint.id.clone(), complaint.current_status);
                }
                None => {
                    self.status_marks
                        .insert(complaint.id.clone(), complaint.current_status);
                }
                _ => {}
            }
        }

        current
    }

    /// Retention pass: forget ledger entries for keys that can no longer be
    /// derived. Statuses only move forward and the window only moves toward
    /// newer complaints, so once a key leaves the candidate set of the most
    /// advanced list seen, no later one brings it back. Callers gate this
    /// on lists that advance the forward-progress marks.
    fn prune_ledger(&mut self, live: &HashSet<String>) {
        let dropped = self.map.retain_keys(live);
        match self.ledger.prune(&self.user_id, live) {
            Ok(removed) => {
                if dropped > 0 || removed > 0 {
                    debug!(user_id = %self.user_id, dropped, removed, "Pruned ledger");
                }
            }
            Err(e) => {
                warn!(user_id = %self.user_id, error = %e, "Ledger prune failed");
            }
        }
    }
}
