//! SQLite-backed complaint store
//!
//! Authoritative storage for complaints and their progress logs. A status
//! transition writes the audit entry and the status header in a single
//! transaction, so the log and the header cannot drift apart here.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::complaint::model::{Complaint, ComplaintStatus, NewComplaint, ProgressEntry};
use crate::error::{CoreError, Result};

/// Raw complaint row before timestamp/status parsing
type ComplaintRow = (
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    String,
    String,
);

/// Complaint store backed by SQLite.
pub struct ComplaintStore {
    db: Connection,
}

impl ComplaintStore {
    /// Open or create the store under the given data directory.
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join("complaints.db");
        let db = Connection::open(&db_path)?;

        // Enable WAL mode for concurrent read access
        db.execute_batch("PRAGMA journal_mode=WAL;")?;

        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS complaints (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                location TEXT NOT NULL,
                category_id TEXT NOT NULL,
                description TEXT NOT NULL,
                image_url TEXT,
                user_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                current_status TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS complaint_progress (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                complaint_id TEXT NOT NULL REFERENCES complaints(id),
                status TEXT NOT NULL,
                note TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_progress_complaint
                ON complaint_progress(complaint_id);",
        )?;

        info!(path = %db_path.display(), "Complaint store initialized");

        Ok(Self { db })
    }

    /// File a new complaint. Status always starts at `pending` with an empty
    /// progress log, whatever the caller intended.
    pub fn file_complaint(&self, new: NewComplaint) -> Result<Complaint> {
        let complaint = Complaint {
            id: uuid::Uuid::new_v4().to_string(),
            title: new.title,
            location: new.location,
            category_id: new.category_id,
            description: new.description,
            image_url: new.image_url,
            user_id: new.user_id,
            // truncated to the stored precision so reloads compare equal
            created_at: Utc::now().trunc_subsecs(6),
            current_status: ComplaintStatus::Pending,
            progress: Vec::new(),
        };

        self.db.execute(
            "INSERT INTO complaints
                 (id, title, location, category_id, description,
                  image_url, user_id, created_at, current_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                complaint.id,
                complaint.title,
                complaint.location,
                complaint.category_id,
                complaint.description,
                complaint.image_url,
                complaint.user_id,
                encode_timestamp(complaint.created_at),
                complaint.current_status.as_str(),
            ],
        )?;

        info!(id = %complaint.id, title = %complaint.title, "Complaint filed");
        Ok(complaint)
    }

    /// Load one complaint with its progress log.
    pub fn get_complaint(&self, id: &str) -> Result<Option<Complaint>> {
        let mut stmt = self.db.prepare_cached(
            "SELECT id, title, location, category_id, description,
                    image_url, user_id, created_at, current_status
             FROM complaints WHERE id = ?1",
        )?;

        let result = stmt.query_row([id], row_to_tuple);

        match result {
            Ok(row) => {
                let mut complaint = complaint_from_row(row)?;
                complaint.progress = self.load_progress(&complaint.id)?;
                Ok(Some(complaint))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List all complaints, newest first, each with its progress log.
    pub fn list_complaints(&self) -> Result<Vec<Complaint>> {
        let mut stmt = self.db.prepare_cached(
            "SELECT id, title, location, category_id, description,
                    image_url, user_id, created_at, current_status
             FROM complaints ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
            .query_map([], row_to_tuple)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut complaints = Vec::with_capacity(rows.len());
        for row in rows {
            let mut complaint = complaint_from_row(row)?;
            complaint.progress = self.load_progress(&complaint.id)?;
            complaints.push(complaint);
        }

        debug!(count = complaints.len(), "Listed complaints");
        Ok(complaints)
    }

    /// Record a status change: append the audit entry and update the status
    /// header in one transaction.
    ///
    /// Any target status is accepted. Concurrent transitions on the same
    /// complaint each leave their audit entry and the last header write
    /// wins; what is never possible is an entry without the matching header
    /// update (or the reverse), since both land or neither does.
    pub fn transition_status(
        &mut self,
        id: &str,
        target: ComplaintStatus,
        note: Option<&str>,
    ) -> Result<Complaint> {
        let note = match note {
            Some(n) if !n.trim().is_empty() => n.to_string(),
            _ => target.default_note(),
        };
        let now = Utc::now().trunc_subsecs(6);

        let tx = self.db.transaction()?;

        let updated = tx.execute(
            "UPDATE complaints SET current_status = ?2 WHERE id = ?1",
            rusqlite::params![id, target.as_str()],
        )?;
        if updated == 0 {
            return Err(CoreError::NotFound(id.to_string()));
        }

        tx.execute(
            "INSERT INTO complaint_progress (complaint_id, status, note, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![id, target.as_str(), note, encode_timestamp(now)],
        )?;

        tx.commit()?;

        info!(id, status = target.as_str(), "Status transition recorded");

        self.get_complaint(id)?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))
    }

    fn load_progress(&self, complaint_id: &str) -> Result<Vec<ProgressEntry>> {
        let mut stmt = self.db.prepare_cached(
            "SELECT status, note, created_at FROM complaint_progress
             WHERE complaint_id = ?1 ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt
            .query_map([complaint_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut entries = Vec::with_capacity(rows.len());
        for (status, note, created_at) in rows {
            entries.push(ProgressEntry {
                status: parse_status(&status)?,
                note,
                created_at: parse_timestamp(&created_at)?,
            });
        }
        Ok(entries)
    }
}

fn row_to_tuple(row: &rusqlite::Row<'_>) -> rusqlite::Result<ComplaintRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

fn complaint_from_row(row: ComplaintRow) -> Result<Complaint> {
    let (id, title, location, category_id, description, image_url, user_id, created_at, status) =
        row;
    Ok(Complaint {
        id,
        title,
        location,
        category_id,
        description,
        image_url,
        user_id,
        created_at: parse_timestamp(&created_at)?,
        current_status: parse_status(&status)?,
        progress: Vec::new(),
    })
}

/// Fixed-width RFC 3339 so lexicographic ORDER BY matches time order.
fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| CoreError::Parse(format!("bad timestamp {}: {}", s, e)))
}

fn parse_status(s: &str) -> Result<ComplaintStatus> {
    ComplaintStatus::parse(s).ok_or_else(|| CoreError::Parse(format!("unknown status: {}", s)))
}
