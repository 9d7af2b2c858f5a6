//! Complaint lifecycle - models, authoritative store, list views

pub mod model;
pub mod store;
pub mod view;

// Re-exports
pub use model::{Complaint, ComplaintId, ComplaintStatus, NewComplaint, ProgressEntry, UserId};
pub use store::ComplaintStore;
pub use view::{ComplaintFilter, StatusBreakdown, ViewerRole};
