//! Notification identity keys
//!
//! A notification's identity is the pair (complaint id, status at derivation
//! time). A status change therefore mints a fresh identity, which is exactly
//! what makes it a new notifiable event; the old identity stops being
//! derivable and never comes back.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::complaint::model::ComplaintStatus;

/// Identity key for a derived notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NotificationKey {
    /// Complaint the notification is about
    pub complaint_id: String,
    /// Status the complaint held when the notification was derived
    pub status: ComplaintStatus,
}

impl NotificationKey {
    pub fn new(complaint_id: &str, status: ComplaintStatus) -> Self {
        Self {
            complaint_id: complaint_id.to_string(),
            status,
        }
    }

    /// Convert to the string the ledger stores.
    /// Format: notif:{digest}:{status}, where the digest hashes the
    /// complaint id so arbitrary backend ids stay a fixed width.
    pub fn to_storage_key(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.complaint_id.as_bytes());
        let hash = hasher.finalize();
        format!(
            "notif:{}:{}",
            hex::encode(&hash[..8]), // First 8 bytes = 16 hex chars
            self.status.as_str()
        )
    }
}

impl fmt::Display for NotificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}",
            &self.complaint_id[..8.min(self.complaint_id.len())],
            self.status.as_str()
        )
    }
}
