//! DOCX template engine: placeholder discovery, substitution, preview
//! markup.
//!
//! A .docx is a ZIP of XML parts. Rendering rebuilds the archive entry by
//! entry, substituting placeholders in the text parts (word/document.xml
//! plus headers and footers) and copying every other part through
//! unchanged. Discovery and rendering share one placeholder pattern so
//! they always agree on the declared set.

use std::io::{Cursor, Read, Write};
use std::sync::OnceLock;

use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::{Error, Result};
use crate::types::FieldMap;

/// Placeholders are authored as «NAME» in the office templates.
fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("«([A-Z0-9_]+)»").expect("placeholder regex"))
}

/// ZIP entries whose XML carries document text.
fn is_text_part(name: &str) -> bool {
    name == "word/document.xml"
        || (name.starts_with("word/header") && name.ends_with(".xml"))
        || (name.starts_with("word/footer") && name.ends_with(".xml"))
}

/// Distinct placeholder names declared by a template, in first-appearance
/// order across document, headers and footers.
pub fn discover_placeholders(bytes: &[u8]) -> Result<Vec<String>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::BadContainer(format!("not a zip archive: {}", e)))?;

    let mut names: Vec<String> = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| Error::BadContainer(format!("entry {}: {}", i, e)))?;
        let name = entry.name().replace('\\', "/");
        if !is_text_part(&name) {
            continue;
        }
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(|e| Error::BadContainer(format!("read {}: {}", name, e)))?;
        let xml = String::from_utf8_lossy(&data);
        for caps in placeholder_re().captures_iter(&xml) {
            let key = caps[1].to_string();
            if !names.contains(&key) {
                names.push(key);
            }
        }
    }
    Ok(names)
}

/// Substitute every placeholder with its field value and return the
/// rebuilt archive. Missing keys become empty strings so no marker
/// survives in the output.
pub fn render(bytes: &[u8], fields: &FieldMap) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::BadContainer(format!("not a zip archive: {}", e)))?;

    let mut out: Vec<u8> = Vec::new();
    let mut writer = ZipWriter::new(Cursor::new(&mut out));
    let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| Error::BadContainer(format!("entry {}: {}", i, e)))?;
        let name = entry.name().replace('\\', "/");
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(|e| Error::BadContainer(format!("read {}: {}", name, e)))?;

        writer
            .start_file(&name, opts)
            .map_err(|e| Error::Io(format!("write {}: {}", name, e)))?;
        if is_text_part(&name) {
            let xml = String::from_utf8_lossy(&data);
            let filled = substitute(&xml, fields);
            writer
                .write_all(filled.as_bytes())
                .map_err(|e| Error::Io(format!("write {}: {}", name, e)))?;
        } else {
            writer
                .write_all(&data)
                .map_err(|e| Error::Io(format!("write {}: {}", name, e)))?;
        }
    }
    writer
        .finish()
        .map_err(|e| Error::Io(format!("finish archive: {}", e)))?;
    Ok(out)
}

fn substitute(xml: &str, fields: &FieldMap) -> String {
    placeholder_re()
        .replace_all(xml, |caps: &regex::Captures| {
            fields.get(&caps[1]).map(xml_value).unwrap_or_default()
        })
        .to_string()
}

/// Escape a field value for a w:t text node; embedded newlines become
/// explicit line breaks.
fn xml_value(value: &str) -> String {
    let escaped = value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    escaped.replace('\n', "</w:t><w:br/><w:t xml:space=\"preserve\">")
}

/// Flatten word/document.xml into minimal preview markup: one `<p>` per
/// paragraph, `<br/>` for line breaks, text HTML-escaped.
pub fn to_preview_markup(bytes: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::BadContainer(format!("not a zip archive: {}", e)))?;
    let mut entry = archive
        .by_name("word/document.xml")
        .map_err(|e| Error::BadContainer(format!("word/document.xml: {}", e)))?;
    let mut data = Vec::new();
    entry
        .read_to_end(&mut data)
        .map_err(|e| Error::BadContainer(format!("read word/document.xml: {}", e)))?;
    let xml = String::from_utf8_lossy(&data);

    let mut reader = Reader::from_str(&xml);
    let mut buf = Vec::new();
    let mut markup = String::new();
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => markup.push_str("<p>"),
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text {
                    if let Ok(text) = e.unescape() {
                        markup.push_str(&escape_markup(&text));
                    }
                }
            }
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:br" => markup.push_str("<br/>"),
                b"w:p" => markup.push_str("<p></p>\n"),
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:p" => markup.push_str("</p>\n"),
                b"w:t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(Error::BadContainer(format!(
                    "malformed document.xml: {}",
                    e
                )))
            }
        }
        buf.clear();
    }
    Ok(markup)
}

/// Escape text for the preview markup. The highlighter escapes its search
/// literals with the same function so they match what rendering produced.
pub(crate) fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
