//! Picks the template file for a client entity out of the template
//! directory. Filenames are matched on a normalized form; every strategy
//! that can still return something does, and only an empty candidate set
//! is an error.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Cover-page files carry this token in their name; demand resolution
/// skips them, cover resolution requires them.
const COVER_MARKER: &str = "caratula";

/// How a template was matched. `Fallback` is low-confidence and callers
/// should flag it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    CountVariant,
    Prefix,
    Keyword,
    Partial,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct ResolvedTemplate {
    pub filename: String,
    pub strategy: MatchStrategy,
}

/// Lowercase and keep only ascii letters and digits, so "Banco XYZ" and
/// "BANCOXYZ_NORMAL.docx" compare as "bancoxyz" vs "bancoxyznormaldocx".
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Resolve the demand template for an entity. Multiplicity-aware: with two
/// or more instruments a "<n>pagares" variant wins over the base file.
pub fn resolve_demand(
    files: &[String],
    entity: &str,
    multiplicity: usize,
) -> Result<ResolvedTemplate> {
    let candidates = candidate_set(files, false);
    if candidates.is_empty() {
        return Err(not_found(entity, files));
    }
    let entity_norm = normalize(entity);

    if multiplicity >= 2 {
        let marker = format!("{}pagares", multiplicity);
        if let Some((name, _)) = candidates
            .iter()
            .find(|(_, norm)| norm.starts_with(&entity_norm) && norm.contains(&marker))
        {
            return Ok(resolved(name, MatchStrategy::CountVariant));
        }
    }

    // The entity's base file: prefix match without any count marker.
    if let Some((name, _)) = candidates
        .iter()
        .find(|(_, norm)| norm.starts_with(&entity_norm) && !has_count_marker(norm))
    {
        return Ok(resolved(name, MatchStrategy::Prefix));
    }
    if let Some((name, _)) = candidates
        .iter()
        .find(|(_, norm)| norm.starts_with(&entity_norm))
    {
        return Ok(resolved(name, MatchStrategy::Prefix));
    }

    if let Some(name) = keyword_match(&candidates, entity) {
        return Ok(resolved(&name, MatchStrategy::Keyword));
    }

    warn!(entity, "no template strategy matched, using first candidate");
    Ok(resolved(&candidates[0].0, MatchStrategy::Fallback))
}

/// Resolve the cover-page template. Same ladder as demands minus count
/// variants, plus a partial match on the entity's first four characters
/// before the last resort.
pub fn resolve_cover(files: &[String], entity: &str) -> Result<ResolvedTemplate> {
    let candidates = candidate_set(files, true);
    if candidates.is_empty() {
        return Err(not_found(entity, files));
    }
    let entity_norm = normalize(entity);

    if let Some((name, _)) = candidates
        .iter()
        .find(|(_, norm)| norm.starts_with(&entity_norm))
    {
        return Ok(resolved(name, MatchStrategy::Prefix));
    }
    if let Some(name) = keyword_match(&candidates, entity) {
        return Ok(resolved(&name, MatchStrategy::Keyword));
    }
    if entity_norm.len() >= 4 {
        let stem = &entity_norm[..4];
        if let Some((name, _)) = candidates.iter().find(|(_, norm)| norm.contains(stem)) {
            return Ok(resolved(name, MatchStrategy::Partial));
        }
    }

    warn!(entity, "no cover strategy matched, using first candidate");
    Ok(resolved(&candidates[0].0, MatchStrategy::Fallback))
}

/// List the .docx files in the template directory, skipping Word lock
/// files. Sorted so resolution is deterministic across runs.
pub async fn list_templates(dir: &Path) -> Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| Error::Io(format!("Could not list templates in {}: {}", dir.display(), e)))?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with("~$") {
            continue;
        }
        if name.to_lowercase().ends_with(".docx") {
            files.push(name);
        }
    }
    files.sort();
    debug!(count = files.len(), "template directory listed");
    Ok(files)
}

/// Sorted (original, normalized) pairs, filtered by cover marker.
fn candidate_set(files: &[String], cover: bool) -> Vec<(String, String)> {
    let mut candidates: Vec<(String, String)> = files
        .iter()
        .map(|f| (f.clone(), normalize(f)))
        .filter(|(_, norm)| norm.contains(COVER_MARKER) == cover)
        .collect();
    candidates.sort();
    candidates
}

/// True when the normalized name encodes an instrument count ("2pagares").
fn has_count_marker(norm: &str) -> bool {
    let mut rest = norm;
    while let Some(pos) = rest.find("pagares") {
        if pos > 0 && rest.as_bytes()[pos - 1].is_ascii_digit() {
            return true;
        }
        rest = &rest[pos + "pagares".len()..];
    }
    false
}

/// Entity tokens longer than two characters against the lowercase
/// filename prefix.
fn keyword_match(candidates: &[(String, String)], entity: &str) -> Option<String> {
    for token in entity.split_whitespace() {
        if token.len() <= 2 {
            continue;
        }
        let token = token.to_lowercase();
        if let Some((name, _)) = candidates
            .iter()
            .find(|(name, _)| name.to_lowercase().starts_with(&token))
        {
            return Some(name.clone());
        }
    }
    None
}

fn resolved(filename: &str, strategy: MatchStrategy) -> ResolvedTemplate {
    debug!(filename, ?strategy, "template resolved");
    ResolvedTemplate {
        filename: filename.to_string(),
        strategy,
    }
}

fn not_found(entity: &str, files: &[String]) -> Error {
    let mut available = files.to_vec();
    available.sort();
    Error::TemplateNotFound {
        entity: entity.to_string(),
        available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_strips_everything_but_alnum() {
        assert_eq!(normalize("Banco XYZ"), "bancoxyz");
        assert_eq!(normalize("BANCOXYZ_NORMAL.docx"), "bancoxyznormaldocx");
        assert_eq!(normalize("Coop. Credifuturo S.A."), "coopcredifuturosa");
    }

    #[test]
    fn test_prefix_match_without_exact_name() {
        let fs = files(&["OTRA_ENTIDAD.docx", "BANCOXYZ_NORMAL.docx"]);
        let r = resolve_demand(&fs, "Banco XYZ", 1).unwrap();
        assert_eq!(r.filename, "BANCOXYZ_NORMAL.docx");
        assert_eq!(r.strategy, MatchStrategy::Prefix);
    }

    #[test]
    fn test_count_variant_preferred_for_two_instruments() {
        let fs = files(&["BANCOXYZ_NORMAL.docx", "BANCOXYZ_2PAGARES.docx"]);
        let r = resolve_demand(&fs, "Banco XYZ", 2).unwrap();
        assert_eq!(r.filename, "BANCOXYZ_2PAGARES.docx");
        assert_eq!(r.strategy, MatchStrategy::CountVariant);
    }

    #[test]
    fn test_base_file_wins_when_count_variant_missing() {
        let fs = files(&["BANCOXYZ_NORMAL.docx", "BANCOXYZ_3PAGARES.docx"]);
        let r = resolve_demand(&fs, "Banco XYZ", 2).unwrap();
        assert_eq!(r.filename, "BANCOXYZ_NORMAL.docx");
        assert_eq!(r.strategy, MatchStrategy::Prefix);
    }

    #[test]
    fn test_single_instrument_ignores_count_variants() {
        let fs = files(&["BANCOXYZ_2PAGARES.docx", "BANCOXYZ_NORMAL.docx"]);
        let r = resolve_demand(&fs, "Banco XYZ", 1).unwrap();
        assert_eq!(r.filename, "BANCOXYZ_NORMAL.docx");
    }

    #[test]
    fn test_keyword_match_on_entity_token() {
        let fs = files(&["CREDIFUTURO_BASE.docx", "OTRA.docx"]);
        let r = resolve_demand(&fs, "Cooperativa Credifuturo", 1).unwrap();
        // "cooperativa" fails the prefix, "credifuturo" starts the filename
        assert_eq!(r.filename, "CREDIFUTURO_BASE.docx");
        assert_eq!(r.strategy, MatchStrategy::Keyword);
    }

    #[test]
    fn test_fallback_is_flagged() {
        let fs = files(&["ZZZ_GENERICO.docx"]);
        let r = resolve_demand(&fs, "Banco XYZ", 1).unwrap();
        assert_eq!(r.filename, "ZZZ_GENERICO.docx");
        assert_eq!(r.strategy, MatchStrategy::Fallback);
    }

    #[test]
    fn test_empty_set_is_named_error() {
        let err = resolve_demand(&[], "Banco XYZ", 1).unwrap_err();
        match err {
            Error::TemplateNotFound { entity, available } => {
                assert_eq!(entity, "Banco XYZ");
                assert!(available.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_demand_never_picks_cover_files() {
        let fs = files(&["BANCOXYZ_CARATULA.docx"]);
        let err = resolve_demand(&fs, "Banco XYZ", 1).unwrap_err();
        match err {
            Error::TemplateNotFound { available, .. } => {
                assert_eq!(available, vec!["BANCOXYZ_CARATULA.docx".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cover_requires_marker() {
        let fs = files(&["BANCOXYZ_NORMAL.docx", "BANCOXYZ_CARATULA.docx"]);
        let r = resolve_cover(&fs, "Banco XYZ").unwrap();
        assert_eq!(r.filename, "BANCOXYZ_CARATULA.docx");
        assert_eq!(r.strategy, MatchStrategy::Prefix);
    }

    #[test]
    fn test_cover_partial_match_on_stem() {
        let fs = files(&["CARATULA_BANCARIA.docx"]);
        // prefix and keyword fail, but "banc" appears in the name
        let r = resolve_cover(&fs, "Banco XYZ").unwrap();
        assert_eq!(r.filename, "CARATULA_BANCARIA.docx");
        assert_eq!(r.strategy, MatchStrategy::Partial);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let fs = files(&["B_GEN.docx", "A_GEN.docx"]);
        let first = resolve_demand(&fs, "Banco XYZ", 1).unwrap();
        for _ in 0..3 {
            let again = resolve_demand(&fs, "Banco XYZ", 1).unwrap();
            assert_eq!(again.filename, first.filename);
        }
        assert_eq!(first.filename, "A_GEN.docx");
    }
}
