//! Reconciliation merge
//!
//! Pure function combining freshly derived candidates with the previous
//! visible list and the durable ledger. No storage, no clock, no I/O, so
//! every multi-cycle property is testable right here.

use crate::complaint::model::Complaint;

use super::derive::derive_candidates;
use super::ledger::LedgerMap;
use super::Notification;

/// Merge one fetch cycle's complaint list into the visible notification list.
///
/// Candidates whose key matches a previously visible notification keep that
/// notification exactly as it was, read flag and clock label included; that
/// is what stops entries flipping back to unread on every poll. New keys
/// come in unread unless the ledger already recorded them as read. Keys the
/// ledger records as cleared never appear at all.
///
/// The cleared set is taken from `ledger` on every call, so replaying an
/// older complaint list can never resurrect a cleared key.
pub fn merge(
    previous: &[Notification],
    complaints: &[Complaint],
    ledger: &LedgerMap,
    window: usize,
) -> Vec<Notification> {
    let cleared = ledger.cleared_keys();

    derive_candidates(complaints, window, &cleared)
        .into_iter()
        .map(|candidate| {
            if let Some(existing) = previous.iter().find(|n| n.key == candidate.key) {
                return existing.clone();
            }
            let mut fresh = candidate;
            fresh.read = ledger.is_read(&fresh.key.to_storage_key());
            fresh
        })
        .collect()
}
