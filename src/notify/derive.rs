//! Candidate derivation from the complaint list
//!
//! The backend returns complaints, never notifications. Each fetch cycle
//! takes the newest complaints, drops keys the user has cleared, and
//! synthesizes text and a clock label for everything that survives.

use std::collections::HashSet;

use crate::complaint::model::{Complaint, ComplaintStatus};

use super::key::NotificationKey;
use super::{Notification, NotificationKind};

/// Titles shown in the notification dropdown
pub const TITLE_NEW_REPORT: &str = "New report";
pub const TITLE_STATUS_UPDATE: &str = "Status update";

/// Derive the candidate list for one fetch cycle.
///
/// `complaints` must be ordered newest first. The window is applied before
/// the cleared filter: clearing a candidate shrinks the result rather than
/// pulling in an older complaint.
///
/// Candidates come out with `read = false`; the merge step seeds the real
/// flag from the ledger.
pub fn derive_candidates(
    complaints: &[Complaint],
    window: usize,
    cleared: &HashSet<String>,
) -> Vec<Notification> {
    complaints
        .iter()
        .take(window)
        .filter_map(|complaint| {
            let key = NotificationKey::new(&complaint.id, complaint.current_status);
            if cleared.contains(&key.to_storage_key()) {
                return None;
            }
            Some(candidate_for(complaint, key))
        })
        .collect()
}

fn candidate_for(complaint: &Complaint, key: NotificationKey) -> Notification {
    let (kind, title, message) = match complaint.current_status {
        ComplaintStatus::Pending => (
            NotificationKind::NewReport,
            TITLE_NEW_REPORT.to_string(),
            format!("Report \"{}\" has been received.", complaint.title),
        ),
        status => (
            NotificationKind::StatusChange,
            TITLE_STATUS_UPDATE.to_string(),
            format!(
                "Report \"{}\" status changed to {}.",
                complaint.title,
                status.as_str().to_uppercase()
            ),
        ),
    };

    Notification {
        key,
        kind,
        title,
        message,
        time: display_time(complaint),
        read: false,
    }
}

/// Clock label for a candidate. New reports show the filing time; status
/// changes show the time of the transition itself, not the filing time.
fn display_time(complaint: &Complaint) -> String {
    let at = match complaint.current_status {
        ComplaintStatus::Pending => complaint.created_at,
        _ => complaint.last_activity_at(),
    };
    at.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complaint::model::ProgressEntry;
    use chrono::{TimeZone, Utc};

    fn complaint(id: &str, title: &str, hour: u32) -> Complaint {
        Complaint {
            id: id.to_string(),
            title: title.to_string(),
            location: "Hall B".to_string(),
            category_id: "cat-1".to_string(),
            description: String::new(),
            image_url: None,
            user_id: "user-1".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 10, hour, 15, 0).unwrap(),
            current_status: ComplaintStatus::Pending,
            progress: Vec::new(),
        }
    }

    fn advanced(mut c: Complaint, status: ComplaintStatus, hour: u32) -> Complaint {
        c.progress.push(ProgressEntry {
            status,
            note: status.default_note(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 10, hour, 45, 0).unwrap(),
        });
        c.current_status = status;
        c
    }

    #[test]
    fn test_pending_becomes_new_report() {
        let list = vec![complaint("c-1", "Broken fan", 8)];
        let candidates = derive_candidates(&list, 5, &HashSet::new());

        assert_eq!(candidates.len(), 1);
        let n = &candidates[0];
        assert_eq!(n.kind, NotificationKind::NewReport);
        assert_eq!(n.title, TITLE_NEW_REPORT);
        assert_eq!(n.message, "Report \"Broken fan\" has been received.");
        assert_eq!(n.time, "08:15");
        assert!(!n.read);
    }

    #[test]
    fn test_non_pending_becomes_status_change() {
        let list = vec![advanced(
            complaint("c-1", "Broken fan", 8),
            ComplaintStatus::InProgress,
            10,
        )];
        let candidates = derive_candidates(&list, 5, &HashSet::new());

        let n = &candidates[0];
        assert_eq!(n.kind, NotificationKind::StatusChange);
        assert_eq!(n.title, TITLE_STATUS_UPDATE);
        assert_eq!(
            n.message,
            "Report \"Broken fan\" status changed to IN_PROGRESS."
        );
    }

    #[test]
    fn test_status_change_time_is_transition_time() {
        // Filed at 08:15, transitioned at 10:45: the label must show the
        // transition, not the filing.
        let list = vec![advanced(
            complaint("c-1", "Broken fan", 8),
            ComplaintStatus::Done,
            10,
        )];
        let candidates = derive_candidates(&list, 5, &HashSet::new());
        assert_eq!(candidates[0].time, "10:45");
    }

    #[test]
    fn test_status_change_with_empty_log_falls_back_to_filing_time() {
        let mut c = complaint("c-1", "Broken fan", 8);
        c.current_status = ComplaintStatus::InProgress;
        let candidates = derive_candidates(&[c], 5, &HashSet::new());
        assert_eq!(candidates[0].time, "08:15");
    }

    #[test]
    fn test_window_takes_newest() {
        let list: Vec<Complaint> = (0..7)
            .map(|i| complaint(&format!("c-{}", i), "t", 8))
            .collect();
        let candidates = derive_candidates(&list, 5, &HashSet::new());
        assert_eq!(candidates.len(), 5);
        assert_eq!(candidates[0].key.complaint_id, "c-0");
        assert_eq!(candidates[4].key.complaint_id, "c-4");
    }

    #[test]
    fn test_cleared_is_not_backfilled() {
        // Clearing one of the newest five must not pull in the sixth.
        let list: Vec<Complaint> = (0..6)
            .map(|i| complaint(&format!("c-{}", i), "t", 8))
            .collect();

        let mut cleared = HashSet::new();
        cleared.insert(
            NotificationKey::new("c-2", ComplaintStatus::Pending).to_storage_key(),
        );

        let candidates = derive_candidates(&list, 5, &cleared);
        assert_eq!(candidates.len(), 4);
        assert!(candidates.iter().all(|n| n.key.complaint_id != "c-2"));
        assert!(candidates.iter().all(|n| n.key.complaint_id != "c-5"));
    }
}
