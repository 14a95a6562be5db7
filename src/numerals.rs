//! Spanish cardinal numerals and the currency strings built from them.
//!
//! Legal templates spell amounts out in words followed by the figure, e.g.
//! "QUINCE MIL PESOS M/CTE ($ 15,000.00)". Words are unaccented uppercase,
//! matching how the templates are authored.

const UNITS: [&str; 9] = [
    "UN", "DOS", "TRES", "CUATRO", "CINCO", "SEIS", "SIETE", "OCHO", "NUEVE",
];

const TEENS: [&str; 10] = [
    "DIEZ",
    "ONCE",
    "DOCE",
    "TRECE",
    "CATORCE",
    "QUINCE",
    "DIECISEIS",
    "DIECISIETE",
    "DIECIOCHO",
    "DIECINUEVE",
];

const TENS: [&str; 8] = [
    "VEINTE", "TREINTA", "CUARENTA", "CINCUENTA", "SESENTA", "SETENTA", "OCHENTA", "NOVENTA",
];

const HUNDREDS: [&str; 8] = [
    "DOSCIENTOS",
    "TRESCIENTOS",
    "CUATROCIENTOS",
    "QUINIENTOS",
    "SEISCIENTOS",
    "SETECIENTOS",
    "OCHOCIENTOS",
    "NOVECIENTOS",
];

/// Convert a cardinal number to unaccented uppercase Spanish words
/// (e.g. 15000 -> "QUINCE MIL").
pub fn number_to_words(n: u64) -> String {
    if n == 0 {
        return "CERO".to_string();
    }
    let millions = n / 1_000_000;
    let thousands = (n % 1_000_000) / 1_000;
    let rest = n % 1_000;

    let mut parts: Vec<String> = Vec::new();
    if millions == 1 {
        parts.push("UN MILLON".to_string());
    } else if millions > 1 {
        parts.push(format!("{} MILLONES", number_to_words(millions)));
    }
    if thousands == 1 {
        parts.push("MIL".to_string());
    } else if thousands > 1 {
        parts.push(format!("{} MIL", below_thousand(thousands)));
    }
    if rest > 0 {
        parts.push(below_thousand(rest));
    }
    parts.join(" ")
}

/// Words for 1..=999. 100 is the irregular "CIEN"; 101-199 take the
/// "CIENTO" prefix instead.
fn below_thousand(n: u64) -> String {
    if n == 100 {
        return "CIEN".to_string();
    }
    let hundreds = n / 100;
    let rest = n % 100;
    let mut parts: Vec<String> = Vec::new();
    if hundreds == 1 {
        parts.push("CIENTO".to_string());
    } else if hundreds > 1 {
        parts.push(HUNDREDS[(hundreds - 2) as usize].to_string());
    }
    if rest > 0 {
        parts.push(below_hundred(rest));
    }
    parts.join(" ")
}

/// Words for 1..=99. 10-19 are irregular; higher tens take "Y" before a
/// non-zero unit.
fn below_hundred(n: u64) -> String {
    if n < 10 {
        return UNITS[(n - 1) as usize].to_string();
    }
    if n < 20 {
        return TEENS[(n - 10) as usize].to_string();
    }
    let tens = TENS[(n / 10 - 2) as usize];
    let unit = n % 10;
    if unit == 0 {
        tens.to_string()
    } else {
        format!("{} Y {}", tens, UNITS[(unit - 1) as usize])
    }
}

/// Full currency string for a peso amount: words, fixed label, grouped
/// figure (e.g. 15000.0 -> "QUINCE MIL PESOS M/CTE ($ 15,000.00)").
pub fn format_currency(value: f64) -> String {
    format!(
        "{} PESOS M/CTE ($ {})",
        number_to_words(value.trunc() as u64),
        format_amount(value)
    )
}

/// Format amount with thousands separator and two decimals (e.g. 27826.17 -> "27,826.17").
pub fn format_amount(n: f64) -> String {
    let s = format!("{:.2}", n);
    let (int_part, dec_part) = match s.find('.') {
        Some(dot) => (&s[..dot], &s[dot..]),
        None => (s.as_str(), ""),
    };
    let chars: Vec<char> = int_part.chars().collect();
    let len = chars.len();
    let mut out = String::new();
    for (i, c) in chars.into_iter().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.push_str(dec_part);
    out
}
