//! Complaint models - reports, lifecycle status, and the progress log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a complaint
pub type ComplaintId = String;

/// Unique identifier for a user (reporter or staff)
pub type UserId = String;

/// Unique identifier for a facility category
pub type CategoryId = String;

//=============================================================================
// STATUS LIFECYCLE
//=============================================================================

/// Lifecycle status of a complaint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    /// Filed, waiting for staff to pick it up
    Pending,
    /// Staff is working on it
    InProgress,
    /// Repair finished; terminal
    Done,
}

impl ComplaintStatus {
    /// The status a staff action advances to, if any. This is an affordance
    /// for frontends; the store accepts any target (see the store docs for
    /// the concurrent-transition semantics).
    pub fn next(&self) -> Option<ComplaintStatus> {
        match self {
            ComplaintStatus::Pending => Some(ComplaintStatus::InProgress),
            ComplaintStatus::InProgress => Some(ComplaintStatus::Done),
            ComplaintStatus::Done => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ComplaintStatus::Done)
    }

    /// Position along the lifecycle path. Statuses only move forward, so a
    /// lower rank seen after a higher one means out-of-order data.
    pub fn rank(&self) -> u8 {
        match self {
            ComplaintStatus::Pending => 0,
            ComplaintStatus::InProgress => 1,
            ComplaintStatus::Done => 2,
        }
    }

    /// Wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "pending",
            ComplaintStatus::InProgress => "in_progress",
            ComplaintStatus::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Option<ComplaintStatus> {
        match s {
            "pending" => Some(ComplaintStatus::Pending),
            "in_progress" => Some(ComplaintStatus::InProgress),
            "done" => Some(ComplaintStatus::Done),
            _ => None,
        }
    }

    /// Note recorded when a transition supplies none.
    pub fn default_note(&self) -> String {
        match self {
            ComplaintStatus::InProgress => "Report is being handled by staff.".to_string(),
            ComplaintStatus::Done => "Facility issue has been resolved.".to_string(),
            status => format!("Status changed to {}.", status),
        }
    }
}

impl std::fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//=============================================================================
// ENTITIES
//=============================================================================

/// A filed facility complaint with its audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complaint {
    /// Unique complaint ID
    pub id: ComplaintId,
    /// Short human title
    pub title: String,
    /// Where the problem is (building, room, ...)
    pub location: String,
    /// Facility category reference
    pub category_id: CategoryId,
    /// Free-text description
    pub description: String,
    /// Optional uploaded image reference
    pub image_url: Option<String>,
    /// Reporter
    pub user_id: UserId,
    /// When the complaint was filed
    pub created_at: DateTime<Utc>,
    /// Current lifecycle status
    pub current_status: ComplaintStatus,
    /// Status history, oldest first. Empty right after filing: the initial
    /// `pending` is implicit, not a logged entry. The hosted relay embeds
    /// this under `complaint_progress`; we always serialize as `progress`.
    #[serde(default, alias = "complaint_progress")]
    pub progress: Vec<ProgressEntry>,
}

/// One audit-log record of a status change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEntry {
    /// Status this entry moved the complaint to
    pub status: ComplaintStatus,
    /// Staff note for the change; `description` on the relay wire
    #[serde(alias = "description")]
    pub note: String,
    /// When the change was recorded
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when filing a new complaint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComplaint {
    pub title: String,
    pub location: String,
    pub category_id: CategoryId,
    pub description: String,
    pub image_url: Option<String>,
    pub user_id: UserId,
}

//=============================================================================
// HELPERS
//=============================================================================

impl Complaint {
    /// Timestamp of the latest progress entry, or the filing time while the
    /// log is still empty.
    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.progress
            .last()
            .map(|p| p.created_at)
            .unwrap_or(self.created_at)
    }

    /// Whether the status header agrees with the progress log. A complaint
    /// with no logged entries is consistent only at `pending`.
    pub fn is_consistent(&self) -> bool {
        match self.progress.last() {
            Some(entry) => entry.status == self.current_status,
            None => self.current_status == ComplaintStatus::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn complaint_at(status: ComplaintStatus) -> Complaint {
        Complaint {
            id: "c-1".to_string(),
            title: "Broken projector".to_string(),
            location: "Lab 2".to_string(),
            category_id: "cat-electronics".to_string(),
            description: "No signal on the ceiling projector".to_string(),
            image_url: None,
            user_id: "user-1".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 10, 8, 30, 0).unwrap(),
            current_status: status,
            progress: Vec::new(),
        }
    }

    #[test]
    fn test_status_path() {
        assert_eq!(
            ComplaintStatus::Pending.next(),
            Some(ComplaintStatus::InProgress)
        );
        assert_eq!(
            ComplaintStatus::InProgress.next(),
            Some(ComplaintStatus::Done)
        );
        assert_eq!(ComplaintStatus::Done.next(), None);
        assert!(ComplaintStatus::Done.is_terminal());
        assert!(!ComplaintStatus::Pending.is_terminal());

        assert!(ComplaintStatus::Pending.rank() < ComplaintStatus::InProgress.rank());
        assert!(ComplaintStatus::InProgress.rank() < ComplaintStatus::Done.rank());
    }

    #[test]
    fn test_status_wire_names_round_trip() {
        for status in [
            ComplaintStatus::Pending,
            ComplaintStatus::InProgress,
            ComplaintStatus::Done,
        ] {
            assert_eq!(ComplaintStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ComplaintStatus::parse("selesai"), None);
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&ComplaintStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let back: ComplaintStatus = serde_json::from_str("\"done\"").unwrap();
        assert_eq!(back, ComplaintStatus::Done);
    }

    #[test]
    fn test_default_notes() {
        assert!(ComplaintStatus::InProgress
            .default_note()
            .contains("handled by staff"));
        assert!(ComplaintStatus::Done.default_note().contains("resolved"));
    }

    #[test]
    fn test_last_activity_falls_back_to_filing_time() {
        let mut c = complaint_at(ComplaintStatus::Pending);
        assert_eq!(c.last_activity_at(), c.created_at);

        let later = Utc.with_ymd_and_hms(2024, 5, 10, 11, 0, 0).unwrap();
        c.progress.push(ProgressEntry {
            status: ComplaintStatus::InProgress,
            note: ComplaintStatus::InProgress.default_note(),
            created_at: later,
        });
        assert_eq!(c.last_activity_at(), later);
    }

    #[test]
    fn test_consistency_check() {
        let mut c = complaint_at(ComplaintStatus::Pending);
        assert!(c.is_consistent());

        // Header moved without a log entry
        c.current_status = ComplaintStatus::InProgress;
        assert!(!c.is_consistent());

        c.progress.push(ProgressEntry {
            status: ComplaintStatus::InProgress,
            note: "picked up".to_string(),
            created_at: c.created_at,
        });
        assert!(c.is_consistent());
    }

    #[test]
    fn test_complaint_json_defaults_progress() {
        let json = r#"{
            "id": "c-9",
            "title": "Leaky tap",
            "location": "Restroom 1F",
            "category_id": "cat-plumbing",
            "description": "Constant drip",
            "image_url": null,
            "user_id": "user-2",
            "created_at": "2024-05-10T08:30:00Z",
            "current_status": "pending"
        }"#;
        let c: Complaint = serde_json::from_str(json).unwrap();
        assert!(c.progress.is_empty());
        assert!(c.is_consistent());
    }

    #[test]
    fn test_complaint_json_accepts_relay_field_names() {
        // List fetches from the hosted relay embed the log under
        // `complaint_progress`, with `description` instead of `note` and
        // extra row columns we don't model.
        let json = r#"{
            "id": "c-9",
            "title": "Leaky tap",
            "location": "Restroom 1F",
            "category_id": "cat-plumbing",
            "description": "Constant drip",
            "image_url": null,
            "user_id": "user-2",
            "created_at": "2024-05-10T08:30:00Z",
            "current_status": "in_progress",
            "complaint_progress": [
                {
                    "id": 41,
                    "complaint_id": "c-9",
                    "status": "in_progress",
                    "description": "Report is being handled by staff.",
                    "created_at": "2024-05-10T11:00:00Z"
                }
            ]
        }"#;
        let c: Complaint = serde_json::from_str(json).unwrap();
        assert_eq!(c.progress.len(), 1);
        assert_eq!(c.progress[0].note, "Report is being handled by staff.");
        assert!(c.is_consistent());
        assert_eq!(
            c.last_activity_at(),
            Utc.with_ymd_and_hms(2024, 5, 10, 11, 0, 0).unwrap()
        );

        // Local field names keep working, and serialization stays local
        let local = serde_json::to_string(&c).unwrap();
        assert!(local.contains("\"progress\""));
        assert!(local.contains("\"note\""));
        let back: Complaint = serde_json::from_str(&local).unwrap();
        assert_eq!(back.progress.len(), 1);
    }
}
