//! Complaint list views - visibility filtering and status tallies
//!
//! Pure helpers over a fetched complaint list. Staff see everything;
//! students see their own reports unless the view is a shared history page.

use serde::Serialize;

use crate::complaint::model::{Complaint, ComplaintStatus, UserId};

/// Who is looking at the list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerRole {
    Student,
    Staff,
}

/// Client-side visibility rules for one list view
#[derive(Debug, Clone)]
pub struct ComplaintFilter {
    pub viewer: UserId,
    pub role: ViewerRole,
    /// History views show every report to everyone
    pub shared_view: bool,
    /// Exact status to show, if any
    pub status: Option<ComplaintStatus>,
    /// Hide finished reports when no explicit status filter is set
    pub exclude_done: bool,
    /// Case-insensitive substring match on title and location
    pub search: Option<String>,
}

impl ComplaintFilter {
    pub fn new(viewer: impl Into<UserId>, role: ViewerRole) -> Self {
        Self {
            viewer: viewer.into(),
            role,
            shared_view: false,
            status: None,
            exclude_done: false,
            search: None,
        }
    }

    pub fn shared_view(mut self) -> Self {
        self.shared_view = true;
        self
    }

    pub fn with_status(mut self, status: ComplaintStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn exclude_done(mut self) -> Self {
        self.exclude_done = true;
        self
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Apply the rules, preserving input order.
    pub fn retain<'a>(&self, complaints: &'a [Complaint]) -> Vec<&'a Complaint> {
        complaints.iter().filter(|c| self.matches(c)).collect()
    }

    fn matches(&self, complaint: &Complaint) -> bool {
        let visible = match self.role {
            ViewerRole::Staff => true,
            ViewerRole::Student => self.shared_view || complaint.user_id == self.viewer,
        };
        if !visible {
            return false;
        }

        match self.status {
            Some(status) => {
                if complaint.current_status != status {
                    return false;
                }
            }
            None => {
                if self.exclude_done && complaint.current_status.is_terminal() {
                    return false;
                }
            }
        }

        // A blank or whitespace-only term is no query at all
        if let Some(ref term) = self.search {
            let term = term.to_lowercase();
            if !term.trim().is_empty()
                && !complaint.title.to_lowercase().contains(&term)
                && !complaint.location.to_lowercase().contains(&term)
            {
                return false;
            }
        }

        true
    }
}

/// Status tallies over a complaint list
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct StatusBreakdown {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub done: usize,
}

impl StatusBreakdown {
    pub fn tally(complaints: &[Complaint]) -> Self {
        let mut out = StatusBreakdown::default();
        for c in complaints {
            out.total += 1;
            match c.current_status {
                ComplaintStatus::Pending => out.pending += 1,
                ComplaintStatus::InProgress => out.in_progress += 1,
                ComplaintStatus::Done => out.done += 1,
            }
        }
        out
    }
}
