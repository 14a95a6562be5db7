use serde::{Deserialize, Serialize};

/// A delinquency case as stored by the external record system. Read-only
/// inside the pipeline; field names follow the store's camelCase wire shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    pub case_id: String,
    /// Client entity name, drives template resolution ("Banco XYZ").
    pub client: String,
    pub debtor: Party,
    #[serde(default)]
    pub co_debtors: Vec<Party>,
    #[serde(default)]
    pub instruments: Vec<InstrumentDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_category: Option<String>,
}

impl CaseRecord {
    /// Principal debtor plus co-debtors, record order.
    pub fn parties(&self) -> Vec<&Party> {
        let mut all = vec![&self.debtor];
        all.extend(self.co_debtors.iter());
        all
    }

    /// One instrument per party is the norm; resolution variants key off
    /// this count.
    pub fn multiplicity(&self) -> usize {
        1 + self.co_debtors.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Party {
    /// Display composite used in demand bodies: "NAME con C.C 123456".
    pub fn display(&self) -> String {
        match &self.id_number {
            Some(id) => format!("{} con C.C {}", self.name, id),
            None => self.name.clone(),
        }
    }
}

/// One attached pagare: its recovered text plus optional raw bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentDocument {
    #[serde(default)]
    pub doc_type: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Vec<u8>>,
}
