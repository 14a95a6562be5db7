//! One generation request end to end: load the case, parse its pagares,
//! resolve the template, merge fields, render, preview, highlight.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Settings;
use crate::docx;
use crate::error::{Error, Result};
use crate::extract::parse_instrument_text;
use crate::fields::{cover_fields, demand_fields};
use crate::highlight::highlight_preview;
use crate::inflight::Inflight;
use crate::models::CaseRecord;
use crate::store::CaseStore;
use crate::templates::{self, MatchStrategy};
use crate::types::{
    FieldMap, GeneratedDocument, InstrumentData, TemplateDescriptor, TemplateKind,
};

pub struct Pipeline {
    store: Arc<dyn CaseStore>,
    settings: Settings,
    inflight: Inflight<(String, TemplateKind), Result<GeneratedDocument>>,
}

struct LoadedTemplate {
    descriptor: TemplateDescriptor,
    strategy: MatchStrategy,
    bytes: Vec<u8>,
}

impl Pipeline {
    pub fn new(store: Arc<dyn CaseStore>, settings: Settings) -> Self {
        Pipeline {
            store,
            settings,
            inflight: Inflight::new(),
        }
    }

    /// The field map the resolved template of this kind would consume,
    /// restricted to its declared placeholders.
    pub async fn resolve_fields(&self, case_id: &str, kind: TemplateKind) -> Result<FieldMap> {
        let record = self.load_case(case_id)?;
        let instruments = parse_instruments(&record);
        let overrides = self.load_overrides(case_id);
        let template = self.load_template(&record, kind).await?;

        let mut map = build_fields(&record, &instruments, &overrides, kind);
        map.restrict(&template.descriptor.placeholders);
        Ok(map)
    }

    /// Generate the document for a case. Concurrent requests for the same
    /// case and kind join one in-flight run instead of racing.
    pub async fn generate_document(
        &self,
        case_id: &str,
        kind: TemplateKind,
    ) -> Result<GeneratedDocument> {
        let key = (case_id.to_string(), kind);
        self.inflight
            .run(key, || self.generate_inner(case_id, kind))
            .await
    }

    /// Persist user edits for a case. Unlike reads, a failing write is
    /// surfaced to the caller.
    pub fn update_overrides(&self, case_id: &str, fields: &FieldMap) -> Result<()> {
        self.store.put_overrides(case_id, fields)
    }

    async fn generate_inner(&self, case_id: &str, kind: TemplateKind) -> Result<GeneratedDocument> {
        let record = self.load_case(case_id)?;
        let instruments = parse_instruments(&record);
        let overrides = self.load_overrides(case_id);
        let LoadedTemplate {
            descriptor,
            strategy,
            bytes,
        } = self.load_template(&record, kind).await?;

        if strategy == MatchStrategy::Fallback {
            warn!(
                case_id,
                file = %descriptor.path.display(),
                "template matched only by last-resort fallback"
            );
        }

        let mut fields = build_fields(&record, &instruments, &overrides, kind);
        fields.restrict(&descriptor.placeholders);

        let (rendered, preview_result) = tokio::task::spawn_blocking(move || {
            let rendered = docx::render(&bytes, &fields)?;
            let preview = docx::to_preview_markup(&rendered)
                .map(|markup| highlight_preview(&markup, &fields));
            Ok::<_, Error>((rendered, preview))
        })
        .await
        .map_err(|e| Error::Io(format!("Task join error: {}", e)))??;

        let (preview, note) = match preview_result {
            Ok(markup) => (markup, None),
            Err(e) => {
                warn!(case_id, error = %e, "preview conversion failed, returning document without preview");
                (String::new(), Some(format!("Preview unavailable: {}", e)))
            }
        };

        let filename = output_filename(kind, case_id);
        info!(case_id, %filename, "document generated");
        Ok(GeneratedDocument {
            bytes: rendered,
            filename,
            preview,
            note,
        })
    }

    fn load_case(&self, case_id: &str) -> Result<CaseRecord> {
        self.store
            .get_case(case_id)?
            .ok_or_else(|| Error::CaseNotFound(case_id.to_string()))
    }

    /// Override reads degrade to an empty map; a broken store must not
    /// block generation.
    fn load_overrides(&self, case_id: &str) -> FieldMap {
        match self.store.get_overrides(case_id) {
            Ok(map) => map,
            Err(e) => {
                warn!(case_id, error = %e, "override store read failed, proceeding without overrides");
                FieldMap::new()
            }
        }
    }

    async fn load_template(
        &self,
        record: &CaseRecord,
        kind: TemplateKind,
    ) -> Result<LoadedTemplate> {
        let files = templates::list_templates(&self.settings.templates_dir).await?;
        let resolved = match kind {
            TemplateKind::Demand => {
                templates::resolve_demand(&files, &record.client, record.multiplicity())?
            }
            TemplateKind::Cover => templates::resolve_cover(&files, &record.client)?,
        };

        let path = self.settings.templates_dir.join(&resolved.filename);
        let bytes = tokio::fs::read(&path).await.map_err(|e| Error::TemplateRead {
            path: path.display().to_string(),
            cause: e.to_string(),
        })?;

        let placeholders = {
            let bytes = bytes.clone();
            tokio::task::spawn_blocking(move || docx::discover_placeholders(&bytes))
                .await
                .map_err(|e| Error::Io(format!("Task join error: {}", e)))??
        };

        Ok(LoadedTemplate {
            descriptor: TemplateDescriptor { path, placeholders },
            strategy: resolved.strategy,
            bytes,
        })
    }
}

fn parse_instruments(record: &CaseRecord) -> Vec<InstrumentData> {
    record
        .instruments
        .iter()
        .map(|doc| parse_instrument_text(&doc.text))
        .collect()
}

fn build_fields(
    record: &CaseRecord,
    instruments: &[InstrumentData],
    overrides: &FieldMap,
    kind: TemplateKind,
) -> FieldMap {
    match kind {
        TemplateKind::Demand => demand_fields(record, instruments, overrides),
        TemplateKind::Cover => cover_fields(record, instruments, overrides),
    }
}

/// "Demanda_<case>.docx" / "Caratula_<case>.docx" with anything outside
/// [A-Za-z0-9_-] in the case id replaced.
fn output_filename(kind: TemplateKind, case_id: &str) -> String {
    let safe: String = case_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{}.docx", kind.filename_stem(), safe)
}
