//! Complaint service boundary
//!
//! The core consumes complaints through this trait. Two implementations
//! ship: the local SQLite store wrapper and the hosted-relay HTTP client.

pub mod local;
pub mod remote;

use async_trait::async_trait;

use crate::complaint::model::{Complaint, ComplaintStatus};
use crate::error::Result;

// Re-exports
pub use local::LocalComplaintService;
pub use remote::RemoteComplaintService;

/// Boundary to the authoritative complaint backend.
#[async_trait]
pub trait ComplaintService: Send + Sync {
    /// Fetch every complaint, newest first, progress logs included.
    async fn fetch_complaints(&self) -> Result<Vec<Complaint>>;

    /// Record a status change and return the updated complaint.
    ///
    /// `None` for the note records the canned note for the target status.
    /// Implementations must surface partial writes as
    /// [`CoreError::InconsistentTransition`](crate::error::CoreError) rather
    /// than papering over them; callers retry the whole transition.
    async fn transition_status(
        &self,
        id: &str,
        target: ComplaintStatus,
        note: Option<&str>,
    ) -> Result<Complaint>;
}
