//! Assembly of legal demand documents for delinquent-debt cases: pagare
//! text is parsed into structured fields, merged with the case record and
//! any saved edits, and rendered into the client entity's DOCX template.

pub mod config;
pub mod db;
pub mod docx;
pub mod error;
pub mod extract;
pub mod fields;
pub mod highlight;
pub mod inflight;
pub mod models;
pub mod numerals;
pub mod pipeline;
pub mod store;
pub mod templates;
pub mod types;

pub use config::Settings;
pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use store::{CaseStore, MemoryStore};
pub use types::{FieldMap, GeneratedDocument, InstrumentData, TemplateKind};
