//! Builds the final placeholder map for a case. Merge order is the
//! precedence order: defaults, record values, per-instrument extraction,
//! aggregate total, cached overrides last.

use crate::models::CaseRecord;
use crate::numerals::format_currency;
use crate::types::{FieldMap, InstrumentData};

/// Court fallback when the record carries no jurisdiction.
pub const DEFAULT_COURT: &str = "JUZGADO CIVIL MUNICIPAL DE BOGOTA (REPARTO)";

/// Venue fallback when the record carries no venue.
pub const DEFAULT_CITY: &str = "BOGOTA D.C.";

/// Claim-amount category fallback; small-claims is the office default.
pub const DEFAULT_CLAIM_CATEGORY: &str = "MINIMA";

/// Full field map for a demand document.
pub fn demand_fields(
    record: &CaseRecord,
    instruments: &[InstrumentData],
    overrides: &FieldMap,
) -> FieldMap {
    let mut map = base_fields(record);

    // Base keys come from the first instrument, indexed keys from all of
    // them in document order.
    if let Some(first) = instruments.first() {
        set_instrument_fields(&mut map, "", first);
    }
    for (i, data) in instruments.iter().enumerate() {
        set_instrument_fields(&mut map, &format!("_{}", i + 1), data);
    }

    set_total(&mut map, instruments);
    map.apply(overrides);
    map
}

/// Field map for the cover page: parties and totals, no per-instrument
/// detail beyond the joined instrument numbers.
pub fn cover_fields(
    record: &CaseRecord,
    instruments: &[InstrumentData],
    overrides: &FieldMap,
) -> FieldMap {
    let mut map = base_fields(record);

    let numbers: Vec<&str> = instruments
        .iter()
        .filter_map(|d| d.number.as_deref())
        .collect();
    if !numbers.is_empty() {
        map.set("PAGARES", numbers.join(", "));
    }

    set_total(&mut map, instruments);
    map.apply(overrides);
    map
}

/// Defaults plus record-derived values, shared by both variants.
fn base_fields(record: &CaseRecord) -> FieldMap {
    let mut map = FieldMap::new();

    map.set(
        "JUZGADO",
        record
            .jurisdiction
            .clone()
            .unwrap_or_else(|| DEFAULT_COURT.to_string()),
    );
    map.set(
        "CIUDAD",
        record.venue.clone().unwrap_or_else(|| DEFAULT_CITY.to_string()),
    );
    map.set(
        "CUANTIA",
        record
            .claim_category
            .clone()
            .unwrap_or_else(|| DEFAULT_CLAIM_CATEGORY.to_string()),
    );

    map.set("DEMANDANTE", record.client.clone());
    let parties = record.parties();
    if let Some(principal) = parties.first() {
        map.set("DEMANDADO", principal.display());
        if let Some(addr) = &principal.address {
            map.set("DIRECCION", addr.clone());
        }
    }
    for (i, party) in parties.iter().enumerate() {
        map.set(&format!("DEMANDADO_{}", i + 1), party.display());
        if let Some(addr) = &party.address {
            map.set(&format!("DIRECCION_{}", i + 1), addr.clone());
        }
    }
    map
}

fn set_instrument_fields(map: &mut FieldMap, suffix: &str, data: &InstrumentData) {
    let pairs = [
        ("PAGARE", &data.number),
        ("CAPITAL", &data.value_words),
        ("FECHA_SUSCRIPCION", &data.subscription_date),
        ("FECHA_VENCIMIENTO", &data.maturity_date),
        ("FECHA_MORA", &data.default_date),
        ("OTORGANTE", &data.grantor),
        ("BENEFICIARIO", &data.beneficiary),
        ("NIT", &data.beneficiary_id),
    ];
    for (key, value) in pairs {
        if let Some(value) = value {
            map.set(&format!("{}{}", key, suffix), value.clone());
        }
    }
}

/// Sum of extracted values under TOTAL, only when positive.
fn set_total(map: &mut FieldMap, instruments: &[InstrumentData]) {
    let total: f64 = instruments.iter().filter_map(|d| d.value).sum();
    if total > 0.0 {
        map.set("TOTAL", format_currency(total));
    }
}
