//! SQLite-backed request store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode};

use crate::catalog::Asin;

use super::{
    DownloadHandle, DownloadHistory, DownloadStatus, NewDownloadHistory, NewRequest, Request,
    RequestStatus, RequestStore, StoreError,
};

/// SQLite-backed request store.
pub struct SqliteRequestStore {
    conn: Mutex<Connection>,
}

const REQUEST_COLUMNS: &str =
    "id, asin, title, author, requested_by, status, error, created_at, completed_at, deleted_at, updated_at";

const HISTORY_COLUMNS: &str =
    "id, request_id, selected, indexer, torrent_hash, usenet_job_id, status, title, created_at";

impl SqliteRequestStore {
    /// Open (or create) a request store at the given path.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory request store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS requests (
                id TEXT PRIMARY KEY,
                asin TEXT NOT NULL,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                requested_by TEXT NOT NULL,
                status TEXT NOT NULL,
                error TEXT,
                created_at TEXT NOT NULL,
                completed_at TEXT,
                deleted_at TEXT,
                updated_at TEXT NOT NULL
            );

            -- At most one live request per identifier; soft-deleted rows do
            -- not block a new request for the same title.
            CREATE UNIQUE INDEX IF NOT EXISTS idx_requests_live_asin
                ON requests(asin) WHERE deleted_at IS NULL;

            CREATE TABLE IF NOT EXISTS download_history (
                id TEXT PRIMARY KEY,
                request_id TEXT NOT NULL REFERENCES requests(id) ON DELETE CASCADE,
                selected INTEGER NOT NULL,
                indexer TEXT NOT NULL,
                torrent_hash TEXT,
                usenet_job_id TEXT,
                status TEXT NOT NULL,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                CHECK ((torrent_hash IS NULL) <> (usenet_job_id IS NULL))
            );

            CREATE INDEX IF NOT EXISTS idx_history_request_id
                ON download_history(request_id);
            CREATE INDEX IF NOT EXISTS idx_history_torrent_hash
                ON download_history(torrent_hash);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn parse_ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_request(row: &rusqlite::Row) -> rusqlite::Result<Request> {
        let asin_str: String = row.get(1)?;
        let asin = Asin::new(asin_str).map_err(|_| {
            rusqlite::Error::InvalidColumnType(1, "asin".to_string(), rusqlite::types::Type::Text)
        })?;

        let status_str: String = row.get(5)?;
        let status = RequestStatus::parse(&status_str).unwrap_or(RequestStatus::Pending);

        Ok(Request {
            id: row.get(0)?,
            asin,
            title: row.get(2)?,
            author: row.get(3)?,
            requested_by: row.get(4)?,
            status,
            error: row.get(6)?,
            created_at: Self::parse_ts(&row.get::<_, String>(7)?),
            completed_at: row
                .get::<_, Option<String>>(8)?
                .map(|s| Self::parse_ts(&s)),
            deleted_at: row
                .get::<_, Option<String>>(9)?
                .map(|s| Self::parse_ts(&s)),
            updated_at: Self::parse_ts(&row.get::<_, String>(10)?),
        })
    }

    fn row_to_history(row: &rusqlite::Row, offset: usize) -> rusqlite::Result<DownloadHistory> {
        let torrent_hash: Option<String> = row.get(offset + 4)?;
        let usenet_job_id: Option<String> = row.get(offset + 5)?;

        let handle = match (torrent_hash, usenet_job_id) {
            (Some(hash), None) => DownloadHandle::Torrent(hash),
            (None, Some(id)) => DownloadHandle::Usenet(id),
            // Unreachable with the CHECK constraint in place.
            _ => {
                return Err(rusqlite::Error::InvalidColumnType(
                    offset + 4,
                    "torrent_hash/usenet_job_id".to_string(),
                    rusqlite::types::Type::Text,
                ))
            }
        };

        let status_str: String = row.get(offset + 6)?;
        let status = DownloadStatus::parse(&status_str).unwrap_or(DownloadStatus::Pending);

        Ok(DownloadHistory {
            id: row.get(offset)?,
            request_id: row.get(offset + 1)?,
            selected: row.get::<_, i64>(offset + 2)? != 0,
            indexer: row.get(offset + 3)?,
            handle,
            status,
            title: row.get(offset + 7)?,
            created_at: Self::parse_ts(&row.get::<_, String>(offset + 8)?),
        })
    }

    fn get_locked(conn: &Connection, id: &str) -> Result<Option<Request>, StoreError> {
        let result = conn.query_row(
            &format!("SELECT {} FROM requests WHERE id = ?", REQUEST_COLUMNS),
            params![id],
            Self::row_to_request,
        );

        match result {
            Ok(request) => Ok(Some(request)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }

    fn is_unique_violation(e: &rusqlite::Error) -> bool {
        matches!(
            e,
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == ErrorCode::ConstraintViolation
        )
    }
}

impl RequestStore for SqliteRequestStore {
    fn create(&self, request: NewRequest) -> Result<Request, StoreError> {
        let conn = self.conn.lock().unwrap();

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let status = RequestStatus::Pending;

        let result = conn.execute(
            "INSERT INTO requests (id, asin, title, author, requested_by, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                request.asin.as_str(),
                request.title,
                request.author,
                request.requested_by,
                status.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(Request {
                id,
                asin: request.asin,
                title: request.title,
                author: request.author,
                requested_by: request.requested_by,
                status,
                error: None,
                created_at: now,
                completed_at: None,
                deleted_at: None,
                updated_at: now,
            }),
            Err(e) if Self::is_unique_violation(&e) => Err(StoreError::Conflict(format!(
                "a live request already exists for {}",
                request.asin
            ))),
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }

    fn get(&self, id: &str) -> Result<Option<Request>, StoreError> {
        let conn = self.conn.lock().unwrap();
        Self::get_locked(&conn, id)
    }

    fn live(&self) -> Result<Vec<Request>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM requests WHERE deleted_at IS NULL ORDER BY created_at ASC",
                REQUEST_COLUMNS
            ))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_request)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn update_status(&self, id: &str, status: RequestStatus) -> Result<Request, StoreError> {
        let conn = self.conn.lock().unwrap();

        let current =
            Self::get_locked(&conn, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if !current.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                id: id.to_string(),
                from: current.status.as_str(),
                to: status.as_str(),
            });
        }

        let now = Utc::now();
        let completed_at = if status == RequestStatus::Downloaded {
            Some(now)
        } else {
            current.completed_at
        };

        conn.execute(
            "UPDATE requests SET status = ?, completed_at = ?, updated_at = ? WHERE id = ?",
            params![
                status.as_str(),
                completed_at.map(|t| t.to_rfc3339()),
                now.to_rfc3339(),
                id
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Request {
            status,
            completed_at,
            updated_at: now,
            ..current
        })
    }

    fn mark_failed(&self, id: &str, error: &str) -> Result<Request, StoreError> {
        let conn = self.conn.lock().unwrap();

        let current =
            Self::get_locked(&conn, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if !current.status.can_transition_to(RequestStatus::Failed) {
            return Err(StoreError::InvalidTransition {
                id: id.to_string(),
                from: current.status.as_str(),
                to: RequestStatus::Failed.as_str(),
            });
        }

        let now = Utc::now();
        conn.execute(
            "UPDATE requests SET status = ?, error = ?, updated_at = ? WHERE id = ?",
            params![RequestStatus::Failed.as_str(), error, now.to_rfc3339(), id],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Request {
            status: RequestStatus::Failed,
            error: Some(error.to_string()),
            updated_at: now,
            ..current
        })
    }

    fn soft_delete(&self, id: &str) -> Result<Request, StoreError> {
        let conn = self.conn.lock().unwrap();

        let current =
            Self::get_locked(&conn, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if current.deleted_at.is_some() {
            // Already soft-deleted, nothing to do.
            return Ok(current);
        }

        let now = Utc::now();
        conn.execute(
            "UPDATE requests SET deleted_at = ?, updated_at = ? WHERE id = ?",
            params![now.to_rfc3339(), now.to_rfc3339(), id],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Request {
            deleted_at: Some(now),
            updated_at: now,
            ..current
        })
    }

    fn hard_delete(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();

        // History rows go first; FK cascade covers it too, but not every
        // connection has foreign_keys enabled.
        conn.execute("DELETE FROM download_history WHERE request_id = ?", params![id])
            .map_err(|e| StoreError::Database(e.to_string()))?;
        conn.execute("DELETE FROM requests WHERE id = ?", params![id])
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn add_history(&self, history: NewDownloadHistory) -> Result<DownloadHistory, StoreError> {
        let conn = self.conn.lock().unwrap();

        if Self::get_locked(&conn, &history.request_id)?.is_none() {
            return Err(StoreError::NotFound(history.request_id));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO download_history (id, request_id, selected, indexer, torrent_hash, usenet_job_id, status, title, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                history.request_id,
                history.selected as i64,
                history.indexer,
                history.handle.torrent_hash(),
                history.handle.usenet_job_id(),
                history.status.as_str(),
                history.title,
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(DownloadHistory {
            id,
            request_id: history.request_id,
            selected: history.selected,
            indexer: history.indexer,
            handle: history.handle,
            status: history.status,
            title: history.title,
            created_at: now,
        })
    }

    fn update_history_status(&self, id: &str, status: DownloadStatus) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();

        let changed = conn
            .execute(
                "UPDATE download_history SET status = ? WHERE id = ?",
                params![status.as_str(), id],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn completed_selected(&self) -> Result<Vec<(Request, DownloadHistory)>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let sql = format!(
            "SELECT {req}, {hist} FROM requests r \
             JOIN download_history h ON h.request_id = r.id \
             WHERE h.selected = 1 AND h.status = 'completed' \
             ORDER BY r.created_at ASC",
            req = REQUEST_COLUMNS
                .split(", ")
                .map(|c| format!("r.{}", c))
                .collect::<Vec<_>>()
                .join(", "),
            hist = HISTORY_COLUMNS
                .split(", ")
                .map(|c| format!("h.{}", c))
                .collect::<Vec<_>>()
                .join(", "),
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let request = Self::row_to_request(row)?;
                let history = Self::row_to_history(row, 11)?;
                Ok((request, history))
            })
            .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn live_sharing_torrent(
        &self,
        hash: &str,
        exclude_request_id: &str,
    ) -> Result<Vec<Request>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let sql = format!(
            "SELECT DISTINCT {} FROM requests r \
             JOIN download_history h ON h.request_id = r.id \
             WHERE h.torrent_hash = ? AND r.deleted_at IS NULL AND r.id != ?",
            REQUEST_COLUMNS
                .split(", ")
                .map(|c| format!("r.{}", c))
                .collect::<Vec<_>>()
                .join(", "),
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![hash, exclude_request_id], Self::row_to_request)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_request(asin: &str, user: &str) -> NewRequest {
        NewRequest {
            asin: Asin::new(asin).unwrap(),
            title: "The Blade Itself".to_string(),
            author: "Joe Abercrombie".to_string(),
            requested_by: user.to_string(),
        }
    }

    fn torrent_history(request_id: &str, hash: &str, status: DownloadStatus) -> NewDownloadHistory {
        NewDownloadHistory {
            request_id: request_id.to_string(),
            selected: true,
            indexer: "IndexerA".to_string(),
            handle: DownloadHandle::Torrent(hash.to_string()),
            status,
            title: "The Blade Itself [M4B]".to_string(),
        }
    }

    #[test]
    fn test_create_and_get() {
        let store = SqliteRequestStore::in_memory().unwrap();
        let created = store.create(new_request("B0071LRKB2", "alice")).unwrap();

        assert_eq!(created.status, RequestStatus::Pending);
        assert!(created.is_live());

        let fetched = store.get(&created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_duplicate_live_request_rejected() {
        let store = SqliteRequestStore::in_memory().unwrap();
        store.create(new_request("B0071LRKB2", "alice")).unwrap();

        let err = store.create(new_request("B0071LRKB2", "bob")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn test_soft_deleted_request_frees_identifier() {
        let store = SqliteRequestStore::in_memory().unwrap();
        let first = store.create(new_request("B0071LRKB2", "alice")).unwrap();
        store.soft_delete(&first.id).unwrap();

        // A new live request for the same identifier is allowed now.
        let second = store.create(new_request("B0071LRKB2", "bob")).unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_update_status_forward() {
        let store = SqliteRequestStore::in_memory().unwrap();
        let request = store.create(new_request("B0071LRKB2", "alice")).unwrap();

        let updated = store
            .update_status(&request.id, RequestStatus::Downloading)
            .unwrap();
        assert_eq!(updated.status, RequestStatus::Downloading);
        assert!(updated.completed_at.is_none());

        let done = store
            .update_status(&request.id, RequestStatus::Downloaded)
            .unwrap();
        assert_eq!(done.status, RequestStatus::Downloaded);
        assert!(done.completed_at.is_some());
    }

    #[test]
    fn test_update_status_backward_rejected() {
        let store = SqliteRequestStore::in_memory().unwrap();
        let request = store.create(new_request("B0071LRKB2", "alice")).unwrap();
        store
            .update_status(&request.id, RequestStatus::Downloading)
            .unwrap();

        let err = store
            .update_status(&request.id, RequestStatus::Pending)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }

    #[test]
    fn test_mark_failed_records_error() {
        let store = SqliteRequestStore::in_memory().unwrap();
        let request = store.create(new_request("B0071LRKB2", "alice")).unwrap();

        let failed = store.mark_failed(&request.id, "client unreachable").unwrap();
        assert_eq!(failed.status, RequestStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("client unreachable"));

        let fetched = store.get(&request.id).unwrap().unwrap();
        assert_eq!(fetched.error.as_deref(), Some("client unreachable"));
    }

    #[test]
    fn test_update_status_unknown_request() {
        let store = SqliteRequestStore::in_memory().unwrap();
        let err = store
            .update_status("missing", RequestStatus::Downloading)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_live_excludes_soft_deleted() {
        let store = SqliteRequestStore::in_memory().unwrap();
        let keep = store.create(new_request("B0071LRKB2", "alice")).unwrap();
        let removed = store.create(new_request("B002UZKL9W", "bob")).unwrap();
        store.soft_delete(&removed.id).unwrap();

        let live = store.live().unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, keep.id);
    }

    #[test]
    fn test_add_history_both_protocols() {
        let store = SqliteRequestStore::in_memory().unwrap();
        let request = store.create(new_request("B0071LRKB2", "alice")).unwrap();

        let torrent = store
            .add_history(torrent_history(&request.id, "deadbeef", DownloadStatus::Downloading))
            .unwrap();
        assert_eq!(torrent.handle.torrent_hash(), Some("deadbeef"));

        let usenet = store
            .add_history(NewDownloadHistory {
                request_id: request.id.clone(),
                selected: false,
                indexer: "UsenetOne".to_string(),
                handle: DownloadHandle::Usenet("nzo_42".to_string()),
                status: DownloadStatus::Pending,
                title: "The Blade Itself (NZB)".to_string(),
            })
            .unwrap();
        assert_eq!(usenet.handle.usenet_job_id(), Some("nzo_42"));
    }

    #[test]
    fn test_add_history_unknown_request() {
        let store = SqliteRequestStore::in_memory().unwrap();
        let err = store
            .add_history(torrent_history("missing", "deadbeef", DownloadStatus::Pending))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_completed_selected_join() {
        let store = SqliteRequestStore::in_memory().unwrap();
        let request = store.create(new_request("B0071LRKB2", "alice")).unwrap();
        let history = store
            .add_history(torrent_history(&request.id, "deadbeef", DownloadStatus::Downloading))
            .unwrap();

        // Not completed yet.
        assert!(store.completed_selected().unwrap().is_empty());

        store
            .update_history_status(&history.id, DownloadStatus::Completed)
            .unwrap();

        let rows = store.completed_selected().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0.id, request.id);
        assert_eq!(rows[0].1.status, DownloadStatus::Completed);
    }

    #[test]
    fn test_completed_selected_includes_soft_deleted_requests() {
        let store = SqliteRequestStore::in_memory().unwrap();
        let request = store.create(new_request("B0071LRKB2", "alice")).unwrap();
        let history = store
            .add_history(torrent_history(&request.id, "deadbeef", DownloadStatus::Completed))
            .unwrap();
        let _ = history;
        store.soft_delete(&request.id).unwrap();

        let rows = store.completed_selected().unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].0.is_live());
    }

    #[test]
    fn test_live_sharing_torrent() {
        let store = SqliteRequestStore::in_memory().unwrap();
        let first = store.create(new_request("B0071LRKB2", "alice")).unwrap();
        let second = store.create(new_request("B002UZKL9W", "bob")).unwrap();
        let third = store.create(new_request("B002V0QK4C", "carol")).unwrap();

        // Same omnibus torrent satisfies the first two requests.
        store
            .add_history(torrent_history(&first.id, "deadbeef", DownloadStatus::Completed))
            .unwrap();
        store
            .add_history(torrent_history(&second.id, "deadbeef", DownloadStatus::Completed))
            .unwrap();
        store
            .add_history(torrent_history(&third.id, "0badc0de", DownloadStatus::Completed))
            .unwrap();

        let sharing = store.live_sharing_torrent("deadbeef", &first.id).unwrap();
        assert_eq!(sharing.len(), 1);
        assert_eq!(sharing[0].id, second.id);

        // A soft-deleted sharer no longer counts.
        store.soft_delete(&second.id).unwrap();
        assert!(store
            .live_sharing_torrent("deadbeef", &first.id)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_hard_delete_idempotent_and_cascades() {
        let store = SqliteRequestStore::in_memory().unwrap();
        let request = store.create(new_request("B0071LRKB2", "alice")).unwrap();
        store
            .add_history(torrent_history(&request.id, "deadbeef", DownloadStatus::Completed))
            .unwrap();

        store.hard_delete(&request.id).unwrap();
        assert!(store.get(&request.id).unwrap().is_none());
        assert!(store.completed_selected().unwrap().is_empty());

        // Deleting again is a no-op.
        store.hard_delete(&request.id).unwrap();
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requests.db");

        let id = {
            let store = SqliteRequestStore::new(&path).unwrap();
            store.create(new_request("B0071LRKB2", "alice")).unwrap().id
        };

        let store = SqliteRequestStore::new(&path).unwrap();
        let fetched = store.get(&id).unwrap().unwrap();
        assert_eq!(fetched.asin.as_str(), "B0071LRKB2");
    }
}
