//! Record and override store seam. The pipeline only ever talks to this
//! trait; SQLite backs it in production and `MemoryStore` backs tests and
//! the CLI.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{Error, Result};
use crate::models::CaseRecord;
use crate::types::FieldMap;

pub trait CaseStore: Send + Sync {
    fn get_case(&self, case_id: &str) -> Result<Option<CaseRecord>>;
    /// Saved field edits for a case; empty map when none exist.
    fn get_overrides(&self, case_id: &str) -> Result<FieldMap>;
    /// Merge a partial map into the saved overrides, field by field.
    fn put_overrides(&self, case_id: &str, fields: &FieldMap) -> Result<()>;
    fn delete_overrides(&self, case_id: &str) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryStore {
    cases: RwLock<HashMap<String, CaseRecord>>,
    overrides: RwLock<HashMap<String, FieldMap>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_case(&self, record: CaseRecord) -> Result<()> {
        let mut cases = self
            .cases
            .write()
            .map_err(|_| Error::Store("memory store lock poisoned".to_string()))?;
        cases.insert(record.case_id.clone(), record);
        Ok(())
    }
}

impl CaseStore for MemoryStore {
    fn get_case(&self, case_id: &str) -> Result<Option<CaseRecord>> {
        let cases = self
            .cases
            .read()
            .map_err(|_| Error::Store("memory store lock poisoned".to_string()))?;
        Ok(cases.get(case_id).cloned())
    }

    fn get_overrides(&self, case_id: &str) -> Result<FieldMap> {
        let overrides = self
            .overrides
            .read()
            .map_err(|_| Error::Store("memory store lock poisoned".to_string()))?;
        Ok(overrides.get(case_id).cloned().unwrap_or_default())
    }

    fn put_overrides(&self, case_id: &str, fields: &FieldMap) -> Result<()> {
        let mut overrides = self
            .overrides
            .write()
            .map_err(|_| Error::Store("memory store lock poisoned".to_string()))?;
        overrides
            .entry(case_id.to_string())
            .or_default()
            .apply(fields);
        Ok(())
    }

    fn delete_overrides(&self, case_id: &str) -> Result<()> {
        let mut overrides = self
            .overrides
            .write()
            .map_err(|_| Error::Store("memory store lock poisoned".to_string()))?;
        overrides.remove(case_id);
        Ok(())
    }
}
