//! SQLite database for persistent ingestion records

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use super::record_store::{ApplyOutcome, RecordStore};
use crate::error::{Error, Result};
use crate::types::{FormatTag, IngestionRecord, ParsedContent, RecordChange, RecordStatus};

const SELECT_COLUMNS: &str = "SELECT id, original_name, stored_name, size_bytes, format_tag, \
     status, progress, result_json, error, created_at, updated_at FROM ingestion_records";

/// SQLite-based record store
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::storage(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::storage(format!("Failed to open in-memory database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
        "#,
        )
        .map_err(|e| Error::storage(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS ingestion_records (
                id TEXT PRIMARY KEY,
                original_name TEXT NOT NULL,
                stored_name TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                format_tag TEXT NOT NULL,
                status TEXT NOT NULL,
                progress INTEGER NOT NULL DEFAULT 0,
                result_json TEXT,
                error TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_ingestion_records_status ON ingestion_records(status);
            CREATE INDEX IF NOT EXISTS idx_ingestion_records_created_at ON ingestion_records(created_at);
        "#,
        )
        .map_err(|e| Error::storage(format!("Failed to run migrations: {}", e)))?;

        tracing::info!("Database migrations complete");
        Ok(())
    }

    fn query_records(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<IngestionRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| Error::storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params, read_row)
            .map_err(|e| Error::storage(format!("Failed to list records: {}", e)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(StoredRow::into_record).collect()
    }
}

fn select_one(conn: &Connection, id: Uuid) -> Result<Option<IngestionRecord>> {
    let row = conn
        .query_row(
            &format!("{} WHERE id = ?1", SELECT_COLUMNS),
            params![id.to_string()],
            read_row,
        )
        .optional()
        .map_err(|e| Error::storage(format!("Failed to get record: {}", e)))?;

    row.map(StoredRow::into_record).transpose()
}

impl RecordStore for SqliteRecordStore {
    fn create(&self, record: &IngestionRecord) -> Result<()> {
        let conn = self.conn.lock();

        let result_json = record.result.as_ref().map(serde_json::to_string).transpose()?;

        conn.execute(
            r#"
            INSERT INTO ingestion_records (
                id, original_name, stored_name, size_bytes, format_tag, status,
                progress, result_json, error, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                record.id.to_string(),
                record.original_name,
                record.stored_name,
                record.size_bytes as i64,
                record.format_tag.as_str(),
                record.status.as_str(),
                record.progress as i64,
                result_json,
                record.error,
                timestamp(&record.created_at),
                timestamp(&record.updated_at),
            ],
        )
        .map_err(|e| Error::storage(format!("Failed to insert record: {}", e)))?;

        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Option<IngestionRecord>> {
        let conn = self.conn.lock();
        select_one(&conn, id)
    }

    fn list(&self) -> Result<Vec<IngestionRecord>> {
        self.query_records(&format!("{} ORDER BY created_at DESC", SELECT_COLUMNS), &[])
    }

    fn list_by_status(&self, status: RecordStatus) -> Result<Vec<IngestionRecord>> {
        self.query_records(
            &format!("{} WHERE status = ?1 ORDER BY created_at DESC", SELECT_COLUMNS),
            &[&status.as_str()],
        )
    }

    fn failed_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<IngestionRecord>> {
        self.query_records(
            &format!(
                "{} WHERE status = ?1 AND created_at < ?2 ORDER BY created_at ASC",
                SELECT_COLUMNS
            ),
            &[&RecordStatus::Failed.as_str(), &timestamp(&cutoff)],
        )
    }

    fn apply(&self, id: Uuid, change: RecordChange) -> Result<ApplyOutcome> {
        let conn = self.conn.lock();

        let Some(mut record) = select_one(&conn, id)? else {
            return Ok(ApplyOutcome::Missing);
        };

        let expected = change.expected_status();
        if !record.apply(change) {
            return Ok(ApplyOutcome::Rejected(record.status));
        }

        let result_json = record.result.as_ref().map(serde_json::to_string).transpose()?;

        let updated = conn
            .execute(
                r#"
                UPDATE ingestion_records
                SET status = ?1, progress = ?2, result_json = ?3, error = ?4, updated_at = ?5
                WHERE id = ?6 AND status = ?7
                "#,
                params![
                    record.status.as_str(),
                    record.progress as i64,
                    result_json,
                    record.error,
                    timestamp(&record.updated_at),
                    id.to_string(),
                    expected.as_str(),
                ],
            )
            .map_err(|e| Error::storage(format!("Failed to update record: {}", e)))?;

        // Another connection on the same file won the race
        if updated == 0 {
            return Ok(match select_one(&conn, id)? {
                Some(current) => ApplyOutcome::Rejected(current.status),
                None => ApplyOutcome::Missing,
            });
        }

        Ok(ApplyOutcome::Applied(record))
    }

    fn delete(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock();

        let count = conn
            .execute(
                "DELETE FROM ingestion_records WHERE id = ?1",
                params![id.to_string()],
            )
            .map_err(|e| Error::storage(format!("Failed to delete record: {}", e)))?;

        Ok(count > 0)
    }
}

/// Fixed-width RFC3339 so text ordering matches time ordering
fn timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| Error::storage(format!("Invalid timestamp '{}': {}", value, e)))
}

/// Raw column values of one row
struct StoredRow {
    id: String,
    original_name: String,
    stored_name: String,
    size_bytes: i64,
    format_tag: String,
    status: String,
    progress: i64,
    result_json: Option<String>,
    error: Option<String>,
    created_at: String,
    updated_at: String,
}

fn read_row(row: &rusqlite::Row) -> rusqlite::Result<StoredRow> {
    Ok(StoredRow {
        id: row.get(0)?,
        original_name: row.get(1)?,
        stored_name: row.get(2)?,
        size_bytes: row.get(3)?,
        format_tag: row.get(4)?,
        status: row.get(5)?,
        progress: row.get(6)?,
        result_json: row.get(7)?,
        error: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

impl StoredRow {
    fn into_record(self) -> Result<IngestionRecord> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::storage(format!("Invalid record id '{}': {}", self.id, e)))?;
        let format_tag: FormatTag = self
            .format_tag
            .parse()
            .map_err(|_| Error::storage(format!("Invalid format tag '{}'", self.format_tag)))?;
        let status = RecordStatus::from_db(&self.status)
            .ok_or_else(|| Error::storage(format!("Invalid status '{}'", self.status)))?;
        let result = self
            .result_json
            .as_deref()
            .map(serde_json::from_str::<ParsedContent>)
            .transpose()?;

        Ok(IngestionRecord {
            id,
            original_name: self.original_name,
            stored_name: self.stored_name,
            size_bytes: self.size_bytes.max(0) as u64,
            format_tag,
            status,
            progress: self.progress.clamp(0, 100) as u8,
            result,
            error: self.error,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TextSummary, TextTotals};
    use chrono::Duration;

    fn record(name: &str) -> IngestionRecord {
        IngestionRecord::received(
            Uuid::new_v4(),
            name.to_string(),
            format!("{}.blob", name),
            42,
            FormatTag::Txt,
        )
    }

    fn text_content() -> ParsedContent {
        ParsedContent::PlainText(TextSummary {
            total_lines: 2,
            total_characters: 9,
            content_preview: "hi\nthere".to_string(),
            lines_preview: vec!["hi".to_string(), "there".to_string()],
            summary: TextTotals {
                total_lines: 2,
                total_characters: 9,
                average_line_length: 4.5,
            },
        })
    }

    #[test]
    fn test_create_and_get() {
        let db = SqliteRecordStore::in_memory().unwrap();
        let r = record("notes.txt");
        db.create(&r).unwrap();

        let loaded = db.get(r.id).unwrap().unwrap();
        assert_eq!(loaded.id, r.id);
        assert_eq!(loaded.original_name, "notes.txt");
        assert_eq!(loaded.stored_name, "notes.txt.blob");
        assert_eq!(loaded.status, RecordStatus::Received);
        assert_eq!(loaded.format_tag, FormatTag::Txt);
        assert!(db.get(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_apply_compare_and_set() {
        let db = SqliteRecordStore::in_memory().unwrap();
        let r = record("a.txt");
        db.create(&r).unwrap();

        assert!(matches!(
            db.apply(r.id, RecordChange::Progress(10)).unwrap(),
            ApplyOutcome::Rejected(RecordStatus::Received)
        ));
        assert!(matches!(
            db.apply(r.id, RecordChange::BeginProcessing).unwrap(),
            ApplyOutcome::Applied(_)
        ));

        let outcome = db.apply(r.id, RecordChange::Complete(text_content())).unwrap();
        let ApplyOutcome::Applied(done) = outcome else {
            panic!("expected applied, got {:?}", outcome);
        };
        assert_eq!(done.progress, 100);

        let loaded = db.get(r.id).unwrap().unwrap();
        assert_eq!(loaded.status, RecordStatus::Ready);
        assert_eq!(loaded.result, Some(text_content()));
        assert!(loaded.is_consistent());

        assert!(matches!(
            db.apply(r.id, RecordChange::Fail("late".to_string())).unwrap(),
            ApplyOutcome::Rejected(RecordStatus::Ready)
        ));
        assert_eq!(
            db.apply(Uuid::new_v4(), RecordChange::BeginProcessing).unwrap(),
            ApplyOutcome::Missing
        );
    }

    #[test]
    fn test_list_and_filters() {
        let db = SqliteRecordStore::in_memory().unwrap();

        let mut old = record("old.txt");
        old.created_at = Utc::now() - Duration::hours(30);
        db.create(&old).unwrap();
        db.apply(old.id, RecordChange::BeginProcessing).unwrap();
        db.apply(old.id, RecordChange::Fail("bad".to_string())).unwrap();

        let fresh = record("fresh.txt");
        db.create(&fresh).unwrap();

        let all = db.list().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, fresh.id);

        let received = db.list_by_status(RecordStatus::Received).unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].id, fresh.id);

        let stale = db.failed_before(Utc::now() - Duration::hours(24)).unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].error.as_deref(), Some("bad"));
        assert!(db
            .failed_before(Utc::now() - Duration::hours(48))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_delete() {
        let db = SqliteRecordStore::in_memory().unwrap();
        let r = record("gone.txt");
        db.create(&r).unwrap();

        assert!(db.delete(r.id).unwrap());
        assert!(!db.delete(r.id).unwrap());
        assert!(db.get(r.id).unwrap().is_none());
    }

    #[test]
    fn test_reopen_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intake.db");
        let r = record("kept.txt");

        {
            let db = SqliteRecordStore::new(&path).unwrap();
            db.create(&r).unwrap();
        }

        let db = SqliteRecordStore::new(&path).unwrap();
        assert_eq!(db.get(r.id).unwrap().unwrap().original_name, "kept.txt");
    }
}
