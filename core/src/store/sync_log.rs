use super::Store;
use crate::{error::DropshipResult, types::RecordId};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncKind {
    Inventory,
    Orders,
}

impl SyncKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inventory => "inventory",
            Self::Orders => "orders",
        }
    }
}

impl fmt::Display for SyncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncLogRecord {
    pub id: RecordId,
    pub sync_type: String,
    pub platform: String,
    pub status: String,
    pub items_checked: i64,
    pub items_changed: i64,
    pub errors: Vec<String>,
    pub started_at: String,
    pub completed_at: Option<String>,
}

impl Store {
    // ── Sync log ──────────────────────────────────────────────────

    pub fn start_sync(&self, kind: SyncKind, platform: &str) -> DropshipResult<RecordId> {
        self.conn.execute(
            "INSERT INTO sync_log (sync_type, platform, status) VALUES (?1, ?2, 'running')",
            params![kind.as_str(), platform],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn complete_sync(
        &self,
        id: RecordId,
        items_checked: usize,
        items_changed: usize,
        errors: &[String],
        success: bool,
    ) -> DropshipResult<()> {
        let errors_json = if errors.is_empty() {
            None
        } else {
            Some(serde_json::to_string(errors)?)
        };
        let status = if success { "completed" } else { "failed" };
        self.conn.execute(
            "UPDATE sync_log
             SET status = ?1, items_checked = ?2, items_changed = ?3,
                 errors = ?4, completed_at = ?5
             WHERE id = ?6",
            params![
                status,
                items_checked as i64,
                items_changed as i64,
                errors_json,
                Utc::now().to_rfc3339(),
                id
            ],
        )?;
        Ok(())
    }

    pub fn sync_log(&self, id: RecordId) -> DropshipResult<Option<SyncLogRecord>> {
        self.conn
            .query_row(
                "SELECT id, sync_type, platform, status, items_checked, items_changed,
                        errors, started_at, completed_at
                 FROM sync_log WHERE id = ?1",
                params![id],
                |row| {
                    let errors: Option<String> = row.get(6)?;
                    Ok(SyncLogRecord {
                        id: row.get(0)?,
                        sync_type: row.get(1)?,
                        platform: row.get(2)?,
                        status: row.get(3)?,
                        items_checked: row.get(4)?,
                        items_changed: row.get(5)?,
                        errors: errors
                            .and_then(|json| serde_json::from_str(&json).ok())
                            .unwrap_or_default(),
                        started_at: row.get(7)?,
                        completed_at: row.get(8)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }
}
