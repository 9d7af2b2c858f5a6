//! sarana-core: complaint lifecycle and notification reconciliation
//!
//! The core behind a school facility reporting tool:
//! - Students file complaints; staff advance them through
//!   `pending` → `in_progress` → `done`, each step appending to an audit log
//! - Notifications are derived from the complaint list on every poll; the
//!   backend stores no notifications at all
//! - A durable per-user ledger keeps read and dismissed state across reloads
//!
//! The reconciliation engine in [`notify`] is idempotent across polls, keeps
//! read flags stable, versions identities when a status changes, and never
//! resurrects a dismissed notification.

pub mod complaint;
pub mod config;
pub mod error;
pub mod notify;
pub mod service;

// Re-exports
pub use complaint::model::{Complaint, ComplaintStatus, NewComplaint, ProgressEntry};
pub use complaint::store::ComplaintStore;
pub use complaint::view::{ComplaintFilter, StatusBreakdown, ViewerRole};
pub use config::Config;
pub use error::{CoreError, Result};
pub use notify::{Notification, NotificationFeed, NotificationKey, NotificationKind};
pub use service::{ComplaintService, LocalComplaintService, RemoteComplaintService};
