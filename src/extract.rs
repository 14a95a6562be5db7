use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use crate::numerals::format_currency;
use crate::types::InstrumentData;

/// Values at or below this are page/clause numbers, not capital amounts.
const VALUE_FLOOR: f64 = 1000.0;

/// The institutional creditor named on every pagare this office handles.
const BENEFICIARY_NAME: &str = "COOPERATIVA CREDIFUTURO";

const DATE_FORMAT: &str = "%d/%m/%Y";

struct Patterns {
    number: Regex,
    amount: Regex,
    date: Regex,
    grantor_with_id: Regex,
    grantor_name: Regex,
    beneficiary: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        number: Regex::new(r"No\.\s*(\d+)").expect("number regex"),
        amount: Regex::new(r"\b\d{1,3}(?:,\d{3})*\.\d{2}\b").expect("amount regex"),
        date: Regex::new(r"\b(\d{2}/\d{2}/\d{4})\b").expect("date regex"),
        grantor_with_id: Regex::new(
            r"OTORGANTE:?\s+([A-ZÁÉÍÓÚÑÜ][A-ZÁÉÍÓÚÑÜ ]+?)\s*,?\s*(?:con\s+)?C\.?C\.?\s*(?:No\.?\s*)?(\d[\d.]*)",
        )
        .expect("grantor id regex"),
        grantor_name: Regex::new(r"OTORGANTE:?\s+([A-ZÁÉÍÓÚÑÜ][A-ZÁÉÍÓÚÑÜ ]+)")
            .expect("grantor name regex"),
        beneficiary: Regex::new(
            r"COOPERATIVA CREDIFUTURO[\s,]+(?:con\s+)?NIT\.?\s*(?:No\.?\s*)?(\d[\d.\-]*)",
        )
        .expect("beneficiary regex"),
    })
}

/// Parse one pagare's recovered text into structured fields. Best-effort:
/// every heuristic is independent and first-match-wins, and a miss leaves
/// its field unset.
pub fn parse_instrument_text(text: &str) -> InstrumentData {
    let mut data = InstrumentData::default();

    if let Some(number) = extract_number(text) {
        data.number = Some(number);
    }
    if let Some(value) = extract_value(text) {
        data.value_words = Some(format_currency(value));
        data.value = Some(value);
    } else {
        debug!("no monetary value above floor in instrument text");
    }

    let dates = extract_dates(text);
    if dates.len() >= 2 {
        data.subscription_date = Some(dates[0].clone());
        data.maturity_date = Some(dates[1].clone());
        data.default_date = default_date(&dates[1]);
    } else {
        debug!(found = dates.len(), "fewer than two dates in instrument text");
    }

    if let Some(grantor) = extract_grantor(text) {
        data.grantor = Some(grantor);
    }
    if let Some((beneficiary, id)) = extract_beneficiary(text) {
        data.beneficiary = Some(beneficiary);
        data.beneficiary_id = Some(id);
    }

    data
}

/// Day after the maturity date, both sides formatted dd/mm/yyyy. Empty or
/// malformed input yields None, never a fabricated date.
pub fn default_date(maturity: &str) -> Option<String> {
    let parsed = NaiveDate::parse_from_str(maturity.trim(), DATE_FORMAT).ok()?;
    let next = parsed.succ_opt()?;
    Some(next.format(DATE_FORMAT).to_string())
}

/// First "No." label followed by digits ("Pagare No. 123", "Certificate No.12345").
fn extract_number(text: &str) -> Option<String> {
    patterns()
        .number
        .captures(text)
        .map(|c| c[1].to_string())
}

/// First comma-grouped two-decimal token strictly above the floor.
fn extract_value(text: &str) -> Option<f64> {
    for token in patterns().amount.find_iter(text) {
        let cleaned: String = token.as_str().chars().filter(|c| *c != ',').collect();
        if let Ok(value) = cleaned.parse::<f64>() {
            if value > VALUE_FLOOR {
                return Some(value);
            }
        }
    }
    None
}

/// All dd/mm/yyyy tokens in document order.
fn extract_dates(text: &str) -> Vec<String> {
    patterns()
        .date
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// "OTORGANTE" label, all-caps name, optional cedula. With an ID the
/// composite is "NAME con C.C 123", otherwise the name alone.
fn extract_grantor(text: &str) -> Option<String> {
    let pats = patterns();
    if let Some(caps) = pats.grantor_with_id.captures(text) {
        let name = caps[1].trim();
        let id = caps[2].trim_end_matches('.');
        return Some(format!("{} con C.C {}", name, id));
    }
    pats.grantor_name
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
}

/// Fixed institutional name followed by a NIT. Returns the canonical
/// composite plus the captured tax id.
fn extract_beneficiary(text: &str) -> Option<(String, String)> {
    patterns().beneficiary.captures(text).map(|caps| {
        let id = caps[1].trim_end_matches(['.', '-']).to_string();
        (format!("{} con NIT {}", BENEFICIARY_NAME, id), id)
    })
}
