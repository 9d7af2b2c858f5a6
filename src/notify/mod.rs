//! Notification derivation and reconciliation
//!
//! The backend holds no notion of a notification. On every poll this module
//! derives candidates from the authoritative complaint list, merges them
//! with the previous visible list, and consults a durable per-user ledger
//! so that read flags and dismissals survive reloads and restarts. The
//! merge is idempotent across polls and a cleared key never resurrects.

pub mod derive;
pub mod feed;
pub mod key;
pub mod ledger;
pub mod merge;

use serde::{Deserialize, Serialize};

// Re-exports
pub use feed::NotificationFeed;
pub use key::NotificationKey;
pub use ledger::{LedgerEntry, LedgerMap, MemoryLedger, NotificationLedger, SqliteLedger};
pub use merge::merge;

/// What kind of event a notification announces
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A complaint was filed and is waiting for staff
    NewReport,
    /// A complaint's status moved
    StatusChange,
}

/// One entry in the visible notification list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    /// Identity: the (complaint, status) pair
    pub key: NotificationKey,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Wall-clock label shown next to the entry (HH:MM)
    pub time: String,
    pub read: bool,
}
