//! Marks machine-filled values in the rendered preview so a reviewer can
//! see at a glance what came from extraction. Strictly best-effort: a
//! literal that cannot be located is simply left unmarked.

use std::collections::HashSet;

use crate::docx::escape_markup;
use crate::types::FieldMap;

/// Values longer than this are prose paragraphs, not worth marking whole.
const SHORT_VALUE_MAX: usize = 80;

/// Wrap the first occurrence of each field-derived literal in
/// `<mark data-field="KEY">`. Never fails; unmatched literals are skipped.
pub fn highlight_preview(markup: &str, fields: &FieldMap) -> String {
    let mut out = markup.to_string();
    let mut seen: HashSet<String> = HashSet::new();

    for (key, value) in fields.iter() {
        for literal in derive_patterns(value) {
            let escaped = escape_markup(&literal).replace('\n', "<br/>");
            if !seen.insert(escaped.clone()) {
                continue;
            }
            if let Some(idx) = find_unmarked(&out, &escaped) {
                out.insert_str(idx + escaped.len(), "</mark>");
                out.insert_str(idx, &format!("<mark data-field=\"{}\">", key));
            }
        }
    }
    out
}

/// One search literal per value shape, first matching shape wins: date
/// literal, the figure of a currency string, the name of a party
/// composite, a digit-only value, else the whole value when short.
fn derive_patterns(value: &str) -> Vec<String> {
    let value = value.trim();
    if value.is_empty() {
        return Vec::new();
    }
    if is_date_literal(value) {
        return vec![value.to_string()];
    }
    if let Some(figure) = currency_figure(value) {
        return vec![figure];
    }
    if let Some(name) = composite_name(value) {
        return vec![name];
    }
    if value.chars().all(|c| c.is_ascii_digit()) {
        return vec![value.to_string()];
    }
    if value.chars().count() <= SHORT_VALUE_MAX {
        return vec![value.to_string()];
    }
    Vec::new()
}

/// dd/mm/yyyy shape check.
fn is_date_literal(value: &str) -> bool {
    let b = value.as_bytes();
    b.len() == 10
        && b[2] == b'/'
        && b[5] == b'/'
        && b.iter()
            .enumerate()
            .all(|(i, c)| matches!(i, 2 | 5) || c.is_ascii_digit())
}

/// The grouped figure inside "($ ... )" of a formatted currency value.
fn currency_figure(value: &str) -> Option<String> {
    let start = value.find("($ ")? + 3;
    let end = value[start..].find(')')? + start;
    let figure = &value[start..end];
    if figure.is_empty() {
        None
    } else {
        Some(figure.to_string())
    }
}

/// The name portion of "NAME con C.C 123" / "NAME con NIT 123".
fn composite_name(value: &str) -> Option<String> {
    for marker in [" con C.C ", " con NIT "] {
        if let Some(pos) = value.find(marker) {
            let name = value[..pos].trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}

/// First occurrence of `literal` that sits in plain text: not inside a
/// tag, not inside an already-inserted mark.
fn find_unmarked(markup: &str, literal: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(rel) = markup[from..].find(literal) {
        let idx = from + rel;
        if !inside_tag(markup, idx) && !inside_mark(markup, idx) {
            return Some(idx);
        }
        from = idx + literal.len().max(1);
    }
    None
}

fn inside_tag(markup: &str, idx: usize) -> bool {
    let before = &markup.as_bytes()[..idx];
    let last_open = before.iter().rposition(|b| *b == b'<');
    let last_close = before.iter().rposition(|b| *b == b'>');
    match (last_open, last_close) {
        (Some(o), Some(c)) => o > c,
        (Some(_), None) => true,
        _ => false,
    }
}

fn inside_mark(markup: &str, idx: usize) -> bool {
    let before = &markup[..idx];
    let opens = before.matches("<mark ").count();
    let closes = before.matches("</mark>").count();
    opens > closes
}
