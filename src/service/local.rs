//! Local complaint service over the SQLite store

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::complaint::model::{Complaint, ComplaintStatus, NewComplaint};
use crate::complaint::store::ComplaintStore;
use crate::error::Result;

use super::ComplaintService;

/// Serves complaints straight from a local store. Each call holds the store
/// lock for its duration; transitions are atomic inside the store itself.
pub struct LocalComplaintService {
    store: Arc<Mutex<ComplaintStore>>,
}

impl LocalComplaintService {
    pub fn new(store: ComplaintStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Shared handle to the underlying store.
    pub fn store(&self) -> Arc<Mutex<ComplaintStore>> {
        Arc::clone(&self.store)
    }

    /// File a new complaint through the service.
    pub async fn file_complaint(&self, new: NewComplaint) -> Result<Complaint> {
        self.store.lock().await.file_complaint(new)
    }
}

#[async_trait]
impl ComplaintService for LocalComplaintService {
    async fn fetch_complaints(&self) -> Result<Vec<Complaint>> {
        self.store.lock().await.list_complaints()
    }

    async fn transition_status(
        &self,
        id: &str,
        target: ComplaintStatus,
        note: Option<&str>,
    ) -> Result<Complaint> {
        self.store.lock().await.transition_status(id, target, note)
    }
}
