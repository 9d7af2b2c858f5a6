//! Read/clear ledger
//!
//! Durable, per-user record of which notification keys have been read or
//! cleared. The backend never stores notifications, so this ledger is the
//! only thing standing between a page reload and every dismissal coming
//! back.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::complaint::model::UserId;
use crate::error::{CoreError, Result};

/// Durable facts about one notification key
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerEntry {
    pub read: bool,
    pub cleared: bool,
}

/// One user's ledger contents, keyed by notification storage key
#[derive(Debug, Clone, Default)]
pub struct LedgerMap {
    entries: HashMap<String, LedgerEntry>,
}

impl LedgerMap {
    pub fn insert(&mut self, key: String, entry: LedgerEntry) {
        self.entries.insert(key, entry);
    }

    pub fn get(&self, key: &str) -> Option<LedgerEntry> {
        self.entries.get(key).copied()
    }

    pub fn is_read(&self, key: &str) -> bool {
        self.entries.get(key).map(|e| e.read).unwrap_or(false)
    }

    pub fn is_cleared(&self, key: &str) -> bool {
        self.entries.get(key).map(|e| e.cleared).unwrap_or(false)
    }

    pub fn mark_read(&mut self, key: &str) {
        self.entries.entry(key.to_string()).or_default().read = true;
    }

    pub fn mark_cleared(&mut self, key: &str) {
        self.entries.entry(key.to_string()).or_default().cleared = true;
    }

    /// All keys currently marked cleared.
    pub fn cleared_keys(&self) -> HashSet<String> {
        self.entries
            .iter()
            .filter(|(_, e)| e.cleared)
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Drop entries whose keys are not in `live`. Returns how many went.
    pub fn retain_keys(&mut self, live: &HashSet<String>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, _| live.contains(k));
        before - self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &LedgerEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Durable backend for per-user ledgers.
///
/// `load` for a user with no history returns an empty map; that is not an
/// error. Persisting the same map twice must be a no-op.
pub trait NotificationLedger: Send {
    fn load(&self, user_id: &str) -> Result<LedgerMap>;

    fn persist(&self, user_id: &str, map: &LedgerMap) -> Result<()>;

    /// Remove persisted entries whose keys are not in `live_keys`. Returns
    /// the number of rows removed. Only safe to call with the full candidate
    /// key set of the latest fetch: a pruned key is forgotten entirely, so
    /// pruning a cleared key that is still derivable would resurrect it.
    fn prune(&self, user_id: &str, live_keys: &HashSet<String>) -> Result<usize>;
}

impl<L: NotificationLedger + Sync + ?Sized> NotificationLedger for Arc<L> {
    fn load(&self, user_id: &str) -> Result<LedgerMap> {
        (**self).load(user_id)
    }

    fn persist(&self, user_id: &str, map: &LedgerMap) -> Result<()> {
        (**self).persist(user_id, map)
    }

    fn prune(&self, user_id: &str, live_keys: &HashSet<String>) -> Result<usize> {
        (**self).prune(user_id, live_keys)
    }
}

//=============================================================================
// SQLITE LEDGER
//=============================================================================

/// SQLite-backed ledger. One row per (user, key); reads and clears are
/// idempotent upserts.
pub struct SqliteLedger {
    db: Connection,
}

impl SqliteLedger {
    /// Open or create the ledger database under the given data directory.
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join("notifications.db");
        let db = Connection::open(&db_path)?;

        // Enable WAL mode for concurrent read access
        db.execute_batch("PRAGMA journal_mode=WAL;")?;

        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS notification_ledger (
                user_id TEXT NOT NULL,
                key TEXT NOT NULL,
                read INTEGER NOT NULL DEFAULT 0,
                cleared INTEGER NOT NULL DEFAULT 0,
                updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
                PRIMARY KEY (user_id, key)
            );",
        )?;

        info!(path = %db_path.display(), "Notification ledger initialized");

        Ok(Self { db })
    }
}

impl NotificationLedger for SqliteLedger {
    fn load(&self, user_id: &str) -> Result<LedgerMap> {
        let mut stmt = self.db.prepare_cached(
            "SELECT key, read, cleared FROM notification_ledger WHERE user_id = ?1",
        )?;
        let rows = stmt
            .query_map([user_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, bool>(1)?,
                    row.get::<_, bool>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut map = LedgerMap::default();
        for (key, read, cleared) in rows {
            map.insert(key, LedgerEntry { read, cleared });
        }
        debug!(user_id, entries = map.len(), "Loaded ledger");
        Ok(map)
    }

    fn persist(&self, user_id: &str, map: &LedgerMap) -> Result<()> {
        for (key, entry) in map.iter() {
            self.db.execute(
                "INSERT INTO notification_ledger (user_id, key, read, cleared, updated_at)
                 VALUES (?1, ?2, ?3, ?4, strftime('%s', 'now'))
                 ON CONFLICT(user_id, key) DO UPDATE SET
                     read = ?3, cleared = ?4, updated_at = strftime('%s', 'now')",
                rusqlite::params![user_id, key, entry.read, entry.cleared],
            )?;
        }
        debug!(user_id, entries = map.len(), "Persisted ledger");
        Ok(())
    }

    fn prune(&self, user_id: &str, live_keys: &HashSet<String>) -> Result<usize> {
        let mut stmt = self
            .db
            .prepare_cached("SELECT key FROM notification_ledger WHERE user_id = ?1")?;
        let keys = stmt
            .query_map([user_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut removed = 0;
        for key in keys.iter().filter(|k| !live_keys.contains(*k)) {
            removed += self.db.execute(
                "DELETE FROM notification_ledger WHERE user_id = ?1 AND key = ?2",
                rusqlite::params![user_id, key],
            )?;
        }
        if removed > 0 {
            debug!(user_id, removed, "Pruned ledger entries");
        }
        Ok(removed)
    }
}

//=============================================================================
// MEMORY LEDGER
//=============================================================================

/// In-memory ledger for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryLedger {
    users: Mutex<HashMap<UserId, LedgerMap>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn users(&self) -> Result<MutexGuard<'_, HashMap<UserId, LedgerMap>>> {
        self.users
            .lock()
            .map_err(|_| CoreError::Ledger("ledger mutex poisoned".to_string()))
    }
}

impl NotificationLedger for MemoryLedger {
    fn load(&self, user_id: &str) -> Result<LedgerMap> {
        Ok(self.users()?.get(user_id).cloned().unwrap_or_default())
    }

    fn persist(&self, user_id: &str, map: &LedgerMap) -> Result<()> {
        self.users()?.insert(user_id.to_string(), map.clone());
        Ok(())
    }

    fn prune(&self, user_id: &str, live_keys: &HashSet<String>) -> Result<usize> {
        let mut users = self.users()?;
        match users.get_mut(user_id) {
            Some(map) => Ok(map.retain_keys(live_keys)),
            None => Ok(0),
        }
    }
}
