//! End-to-end generation tests: real template files on disk, a seeded
//! store, the full pipeline from case record to rendered bytes.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use demand_builder::db::Db;
use demand_builder::models::{CaseRecord, InstrumentDocument, Party};
use demand_builder::{Error, FieldMap, MemoryStore, Pipeline, Settings, TemplateKind};

const PAGARE_A: &str = "PAGARE Certificate No.12345\n\
    Por valor de 15,000.00 pesos.\n\
    Suscrito el 18/08/2021 con vencimiento el 30/08/2026.\n\
    OTORGANTE JUAN CARLOS PEREZ con C.C 1020304050\n\
    A la orden de COOPERATIVA CREDIFUTURO con NIT 860.123.456-7";

const PAGARE_B: &str = "PAGARE Certificate No.67890\n\
    Por valor de 20,000.00 pesos.\n\
    Suscrito el 05/03/2022 con vencimiento el 15/09/2026.\n\
    OTORGANTE MARIA FERNANDA RIOS con C.C 52998877";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="xml" ContentType="application/xml"/>
</Types>"#;

fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    )
}

fn paragraph(text: &str) -> String {
    format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", text)
}

/// Zip up a docx whose XML parts are given as (entry name, body) pairs.
fn build_docx(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut writer = ZipWriter::new(std::io::Cursor::new(&mut out));
    let opts = SimpleFileOptions::default();
    writer.start_file("[Content_Types].xml", opts).unwrap();
    writer.write_all(CONTENT_TYPES.as_bytes()).unwrap();
    for (name, body) in parts {
        writer.start_file(*name, opts).unwrap();
        writer.write_all(document_xml(body).as_bytes()).unwrap();
    }
    writer.finish().unwrap();
    out
}

fn write_template(dir: &Path, filename: &str, body: &str) {
    let bytes = build_docx(&[("word/document.xml", body)]);
    std::fs::write(dir.join(filename), bytes).unwrap();
}

fn settings_for(tmp: &TempDir) -> Settings {
    let templates_dir = tmp.path().join("templates");
    let output_dir = tmp.path().join("out");
    std::fs::create_dir_all(&templates_dir).unwrap();
    std::fs::create_dir_all(&output_dir).unwrap();
    Settings {
        templates_dir,
        db_path: tmp.path().join("demand_builder.db"),
        output_dir,
    }
}

fn debtor() -> Party {
    Party {
        name: "JUAN CARLOS PEREZ".to_string(),
        id_number: Some("1020304050".to_string()),
        address: Some("Calle 10 # 5-23".to_string()),
        phone: None,
    }
}

fn case_record(case_id: &str, client: &str, texts: &[&str]) -> CaseRecord {
    CaseRecord {
        case_id: case_id.to_string(),
        client: client.to_string(),
        debtor: debtor(),
        co_debtors: Vec::new(),
        instruments: texts
            .iter()
            .map(|t| InstrumentDocument {
                doc_type: "pagare".to_string(),
                text: (*t).to_string(),
                raw: None,
            })
            .collect(),
        jurisdiction: None,
        venue: None,
        claim_category: None,
    }
}

fn pipeline_with(record: CaseRecord, settings: Settings) -> Pipeline {
    let store = Arc::new(MemoryStore::new());
    store.put_case(record).unwrap();
    Pipeline::new(store, settings)
}

#[tokio::test]
async fn test_demand_from_single_pagare() {
    let tmp = TempDir::new().unwrap();
    let settings = settings_for(&tmp);
    write_template(
        &settings.templates_dir,
        "BANCOXYZ_NORMAL.docx",
        &[
            paragraph("«JUZGADO»"),
            paragraph("Demandante: «DEMANDANTE»"),
            paragraph("Demandado: «DEMANDADO»"),
            paragraph("Pagare No. «PAGARE» por «CAPITAL»"),
            paragraph("En mora desde el «FECHA_MORA»"),
        ]
        .concat(),
    );

    let pipeline = pipeline_with(case_record("2026-045", "Banco XYZ", &[PAGARE_A]), settings);
    let doc = pipeline
        .generate_document("2026-045", TemplateKind::Demand)
        .await
        .unwrap();

    assert_eq!(doc.filename, "Demanda_2026-045.docx");
    assert!(doc.note.is_none());
    assert!(!doc.bytes.is_empty());
    assert!(doc.preview.contains("Banco XYZ"));
    assert!(doc
        .preview
        .contains(r#"QUINCE MIL PESOS M/CTE ($ <mark data-field="CAPITAL">15,000.00</mark>)"#));
    assert!(doc.preview.contains("12345"));
    // mora follows maturity by one day
    assert!(doc.preview.contains("31/08/2026"));
    assert!(!doc.preview.contains('«'));
}

#[tokio::test]
async fn test_multi_pagare_selects_count_variant_and_totals() {
    let tmp = TempDir::new().unwrap();
    let settings = settings_for(&tmp);
    write_template(
        &settings.templates_dir,
        "BANCOXYZ_NORMAL.docx",
        &paragraph("«CAPITAL»"),
    );
    write_template(
        &settings.templates_dir,
        "BANCOXYZ_2PAGARES.docx",
        &[
            paragraph("Primero: «CAPITAL_1»"),
            paragraph("Segundo: «CAPITAL_2»"),
            paragraph("Total: «TOTAL»"),
        ]
        .concat(),
    );

    let mut record = case_record("EJ-77", "Banco XYZ", &[PAGARE_A, PAGARE_B]);
    record.co_debtors.push(Party {
        name: "MARIA FERNANDA RIOS".to_string(),
        id_number: Some("52998877".to_string()),
        address: None,
        phone: None,
    });
    let pipeline = pipeline_with(record, settings);

    let doc = pipeline
        .generate_document("EJ-77", TemplateKind::Demand)
        .await
        .unwrap();
    assert!(doc.preview.contains("QUINCE MIL PESOS M/CTE"));
    assert!(doc.preview.contains("VEINTE MIL PESOS M/CTE"));
    assert!(doc.preview.contains("TREINTA Y CINCO MIL PESOS M/CTE"));
}

#[tokio::test]
async fn test_cover_lists_every_pagare_number() {
    let tmp = TempDir::new().unwrap();
    let settings = settings_for(&tmp);
    write_template(
        &settings.templates_dir,
        "BANCOXYZ_CARATULA.docx",
        &[
            paragraph("Pagares: «PAGARES»"),
            paragraph("Cuantia: «CUANTIA»"),
            paragraph("Total: «TOTAL»"),
        ]
        .concat(),
    );
    // a demand template in the same folder must not shadow the cover
    write_template(
        &settings.templates_dir,
        "BANCOXYZ_NORMAL.docx",
        &paragraph("«CAPITAL»"),
    );

    let pipeline = pipeline_with(
        case_record("C-9", "Banco XYZ", &[PAGARE_A, PAGARE_B]),
        settings,
    );
    let doc = pipeline
        .generate_document("C-9", TemplateKind::Cover)
        .await
        .unwrap();

    assert_eq!(doc.filename, "Caratula_C-9.docx");
    assert!(doc.preview.contains("12345, 67890"));
    assert!(doc.preview.contains("MINIMA"));
}

#[tokio::test]
async fn test_no_demand_template_reports_available_files() {
    let tmp = TempDir::new().unwrap();
    let settings = settings_for(&tmp);
    write_template(
        &settings.templates_dir,
        "COOPERATIVA_CARATULA.docx",
        &paragraph("«PAGARES»"),
    );

    let pipeline = pipeline_with(case_record("X-1", "Banco XYZ", &[PAGARE_A]), settings);
    let err = pipeline
        .generate_document("X-1", TemplateKind::Demand)
        .await
        .unwrap_err();

    match err {
        Error::TemplateNotFound { entity, available } => {
            assert_eq!(entity, "Banco XYZ");
            assert_eq!(available, vec!["COOPERATIVA_CARATULA.docx".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_case_is_reported() {
    let tmp = TempDir::new().unwrap();
    let settings = settings_for(&tmp);
    let pipeline = Pipeline::new(Arc::new(MemoryStore::new()), settings);
    let err = pipeline
        .generate_document("missing", TemplateKind::Demand)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CaseNotFound(id) if id == "missing"));
}

#[tokio::test]
async fn test_overrides_beat_computed_fields() {
    let tmp = TempDir::new().unwrap();
    let settings = settings_for(&tmp);
    write_template(
        &settings.templates_dir,
        "BANCOXYZ_NORMAL.docx",
        &[paragraph("«JUZGADO»"), paragraph("«PAGARE»")].concat(),
    );

    let pipeline = pipeline_with(case_record("E-3", "Banco XYZ", &[PAGARE_A]), settings);
    let mut edits = FieldMap::new();
    edits.set("JUZGADO", "JUZGADO SEGUNDO CIVIL DEL CIRCUITO".to_string());
    pipeline.update_overrides("E-3", &edits).unwrap();

    let fields = pipeline
        .resolve_fields("E-3", TemplateKind::Demand)
        .await
        .unwrap();
    assert_eq!(
        fields.get("JUZGADO"),
        Some("JUZGADO SEGUNDO CIVIL DEL CIRCUITO")
    );

    let doc = pipeline
        .generate_document("E-3", TemplateKind::Demand)
        .await
        .unwrap();
    assert!(doc.preview.contains("JUZGADO SEGUNDO CIVIL DEL CIRCUITO"));
    assert!(!doc.preview.contains("(REPARTO)"));
}

#[tokio::test]
async fn test_resolve_fields_matches_template_placeholders() {
    let tmp = TempDir::new().unwrap();
    let settings = settings_for(&tmp);
    write_template(
        &settings.templates_dir,
        "BANCOXYZ_NORMAL.docx",
        &[paragraph("«DEMANDADO»"), paragraph("«CAPITAL»")].concat(),
    );

    let pipeline = pipeline_with(case_record("E-2", "Banco XYZ", &[PAGARE_A]), settings);
    let fields = pipeline
        .resolve_fields("E-2", TemplateKind::Demand)
        .await
        .unwrap();

    assert_eq!(fields.len(), 2);
    assert_eq!(
        fields.get("CAPITAL"),
        Some("QUINCE MIL PESOS M/CTE ($ 15,000.00)")
    );
    assert_eq!(
        fields.get("DEMANDADO"),
        Some("JUAN CARLOS PEREZ con C.C 1020304050")
    );
}

#[tokio::test]
async fn test_unknown_placeholder_is_cleared_not_left() {
    let tmp = TempDir::new().unwrap();
    let settings = settings_for(&tmp);
    write_template(
        &settings.templates_dir,
        "BANCOXYZ_NORMAL.docx",
        &[
            paragraph("«DEMANDADO»"),
            paragraph("Clausula: «CLAUSULA_ESPECIAL»"),
        ]
        .concat(),
    );

    let pipeline = pipeline_with(case_record("E-4", "Banco XYZ", &[PAGARE_A]), settings);
    let doc = pipeline
        .generate_document("E-4", TemplateKind::Demand)
        .await
        .unwrap();

    assert!(!doc.preview.contains('«'));
    assert!(!doc.preview.contains("CLAUSULA_ESPECIAL"));
    assert!(doc.preview.contains("JUAN CARLOS PEREZ"));
}

#[tokio::test]
async fn test_preview_failure_degrades_to_note() {
    let tmp = TempDir::new().unwrap();
    let settings = settings_for(&tmp);
    // header-only container: fillable, but there is no document.xml to preview
    let header = paragraph("«DEMANDADO»");
    let bytes = build_docx(&[("word/header1.xml", header.as_str())]);
    std::fs::write(settings.templates_dir.join("BANCOXYZ_NORMAL.docx"), bytes).unwrap();

    let pipeline = pipeline_with(case_record("E-5", "Banco XYZ", &[PAGARE_A]), settings);
    let doc = pipeline
        .generate_document("E-5", TemplateKind::Demand)
        .await
        .unwrap();

    assert!(!doc.bytes.is_empty());
    assert!(doc.preview.is_empty());
    let note = doc.note.unwrap();
    assert!(note.starts_with("Preview unavailable"));
}

#[tokio::test]
async fn test_concurrent_requests_yield_identical_documents() {
    let tmp = TempDir::new().unwrap();
    let settings = settings_for(&tmp);
    write_template(
        &settings.templates_dir,
        "BANCOXYZ_NORMAL.docx",
        &paragraph("«DEMANDADO»"),
    );

    let pipeline = pipeline_with(case_record("E-6", "Banco XYZ", &[PAGARE_A]), settings);
    let (a, b) = tokio::join!(
        pipeline.generate_document("E-6", TemplateKind::Demand),
        pipeline.generate_document("E-6", TemplateKind::Demand)
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.filename, b.filename);
    assert_eq!(a.bytes, b.bytes);
}

#[tokio::test]
async fn test_sqlite_backed_store_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let settings = settings_for(&tmp);
    write_template(
        &settings.templates_dir,
        "BANCOXYZ_NORMAL.docx",
        &[paragraph("«JUZGADO»"), paragraph("«DEMANDADO»")].concat(),
    );

    let db = Db::open_in_memory().unwrap();
    db.put_case(&case_record("DB-1", "Banco XYZ", &[PAGARE_A]))
        .unwrap();
    let pipeline = Pipeline::new(Arc::new(db), settings);

    let mut edits = FieldMap::new();
    edits.set("JUZGADO", "JUZGADO PROMISCUO DE SOACHA".to_string());
    pipeline.update_overrides("DB-1", &edits).unwrap();

    let doc = pipeline
        .generate_document("DB-1", TemplateKind::Demand)
        .await
        .unwrap();
    assert!(doc.preview.contains("JUZGADO PROMISCUO DE SOACHA"));
    assert!(doc.preview.contains("JUAN CARLOS PEREZ"));
}
