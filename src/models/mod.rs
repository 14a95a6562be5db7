pub mod case;

pub use case::{CaseRecord, InstrumentDocument, Party};
