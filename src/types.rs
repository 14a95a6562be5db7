use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Structured result of parsing one pagare's text. Every field is optional;
/// a miss is an empty field, never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentData {
    pub number: Option<String>,
    pub value: Option<f64>,
    /// Amount in words plus the grouped figure ("QUINCE MIL PESOS M/CTE ($ 15,000.00)").
    pub value_words: Option<String>,
    pub subscription_date: Option<String>,
    pub maturity_date: Option<String>,
    /// Maturity + 1 calendar day, when the maturity parses.
    pub default_date: Option<String>,
    pub grantor: Option<String>,
    pub beneficiary: Option<String>,
    pub beneficiary_id: Option<String>,
}

/// Ordered placeholder-name -> value map handed to the renderer. Later
/// writes win, so merge order is the precedence order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, String>);

impl FieldMap {
    pub fn new() -> Self {
        FieldMap(BTreeMap::new())
    }

    pub fn set(&mut self, key: &str, value: String) {
        self.0.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|v| v.as_str())
    }

    /// Merge `other` on top of self; its values win on shared keys.
    pub fn apply(&mut self, other: &FieldMap) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    /// Keep only the declared placeholder names; declared keys with no
    /// value become empty strings so no marker survives rendering.
    pub fn restrict(&mut self, placeholders: &[String]) {
        let mut kept = BTreeMap::new();
        for name in placeholders {
            let value = self.0.remove(name).unwrap_or_default();
            kept.insert(name.clone(), value);
        }
        self.0 = kept;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Which document a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Demand,
    Cover,
}

impl TemplateKind {
    /// Output filename stem ("Demanda_<case>.docx" / "Caratula_<case>.docx").
    pub fn filename_stem(&self) -> &'static str {
        match self {
            TemplateKind::Demand => "Demanda",
            TemplateKind::Cover => "Caratula",
        }
    }
}

/// A resolved template file plus the placeholder names it declares.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDescriptor {
    pub path: PathBuf,
    pub placeholders: Vec<String>,
}

/// Outcome of a successful generation.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub preview: String,
    /// Set when the document was produced but the preview degraded.
    pub note: Option<String>,
}
