use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};

use crate::error::{Error, Result};
use crate::models::CaseRecord;
use crate::store::CaseStore;
use crate::types::FieldMap;

/// SQLite-backed case and override store. Case records are stored as JSON
/// blobs keyed by case id; overrides are one row per (case, field) so a
/// partial update never clobbers other edits.
pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Store(format!("Could not create db dir: {}", e)))?;
        }
        let conn = Connection::open(&db_path)
            .map_err(|e| Error::Store(format!("Could not open database: {}", e)))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Store(format!("Could not open database: {}", e)))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at TEXT DEFAULT CURRENT_TIMESTAMP
            );
            INSERT INTO schema_version (version) SELECT 1 WHERE NOT EXISTS (SELECT 1 FROM schema_version LIMIT 1);
            CREATE TABLE IF NOT EXISTS cases (
                case_id TEXT PRIMARY KEY,
                record TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS overrides (
                case_id TEXT NOT NULL,
                field TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (case_id, field)
            );
            ",
        )
        .map_err(|e| Error::Store(e.to_string()))?;
        Ok(Db {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Store("database lock poisoned".to_string()))
    }

    /// Insert or replace a full case record.
    pub fn put_case(&self, record: &CaseRecord) -> Result<()> {
        let json = serde_json::to_string(record)
            .map_err(|e| Error::Store(format!("Serialize case: {}", e)))?;
        let now = chrono::Utc::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO cases (case_id, record, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(case_id) DO UPDATE SET
               record = excluded.record,
               updated_at = excluded.updated_at",
            params![record.case_id, json, now],
        )
        .map_err(|e| Error::Store(e.to_string()))?;
        Ok(())
    }
}

impl CaseStore for Db {
    fn get_case(&self, case_id: &str) -> Result<Option<CaseRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT record FROM cases WHERE case_id = ?1")
            .map_err(|e| Error::Store(e.to_string()))?;
        let mut rows = stmt
            .query(params![case_id])
            .map_err(|e| Error::Store(e.to_string()))?;
        match rows.next().map_err(|e| Error::Store(e.to_string()))? {
            Some(row) => {
                let json: String = row.get(0).map_err(|e| Error::Store(e.to_string()))?;
                let record = serde_json::from_str(&json)
                    .map_err(|e| Error::Store(format!("Parse case {}: {}", case_id, e)))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn get_overrides(&self, case_id: &str) -> Result<FieldMap> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT field, value FROM overrides WHERE case_id = ?1")
            .map_err(|e| Error::Store(e.to_string()))?;
        let rows = stmt
            .query_map(params![case_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| Error::Store(e.to_string()))?;
        let mut map = FieldMap::new();
        for row in rows {
            let (field, value) = row.map_err(|e| Error::Store(e.to_string()))?;
            map.set(&field, value);
        }
        Ok(map)
    }

    fn put_overrides(&self, case_id: &str, fields: &FieldMap) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let conn = self.lock()?;
        for (field, value) in fields.iter() {
            conn.execute(
                "INSERT INTO overrides (case_id, field, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(case_id, field) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at",
                params![case_id, field, value, now],
            )
            .map_err(|e| Error::Store(e.to_string()))?;
        }
        Ok(())
    }

    fn delete_overrides(&self, case_id: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM overrides WHERE case_id = ?1", params![case_id])
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(())
    }
}
