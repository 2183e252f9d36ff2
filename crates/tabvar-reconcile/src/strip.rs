//! Release-form tables: sentinel prefixes removed and numeric text restored
//! to numbers.

use serde_json::{Number, Value};
use tabvar_core::{Sentinel, Table, VariantError};

const DASHES: [char; 3] = ['\u{2013}', '\u{2014}', '\u{2212}'];

/// Returns a copy of `table` with the sentinel removed from every marked
/// cell and the remainder coerced by [`coerce_stripped`].
pub fn strip_markers(table: &Table, sentinel: &Sentinel) -> Result<Table, VariantError> {
    let rows = table
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|value| match sentinel.strip(value) {
                    Some(text) => coerce_stripped(text),
                    None => value.clone(),
                })
                .collect()
        })
        .collect();
    Table::from_rows(table.columns().to_vec(), rows)
}

/// Coerces the text left after removing a marker.
///
/// Integer literals become integers; decimal literals become integers when
/// the fraction is all zeros and floats otherwise. Other text is retried
/// after normalising unicode dashes and, when it holds no `", "`, dropping
/// thousands separators. Anything still non-numeric is returned unchanged.
pub fn coerce_stripped(text: &str) -> Value {
    if is_integer(text) {
        return integer(text).unwrap_or_else(|| Value::String(text.to_owned()));
    }
    if let Some((whole, fraction)) = split_decimal(text) {
        if fraction.chars().all(|c| c == '0') {
            return integer(whole).unwrap_or_else(|| Value::String(text.to_owned()));
        }
        return float(text).unwrap_or_else(|| Value::String(text.to_owned()));
    }
    normalised_number(text).unwrap_or_else(|| Value::String(text.to_owned()))
}

fn normalised_number(text: &str) -> Option<Value> {
    let dashed: String = text
        .trim()
        .chars()
        .map(|c| if DASHES.contains(&c) { '-' } else { c })
        .collect();
    if dashed.contains(", ") {
        return None;
    }
    let plain = dashed.replace(',', "");
    let unsigned = plain.strip_prefix('-').unwrap_or(&plain);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if !digits(whole) || (unsigned.contains('.') && !digits(fraction)) {
        return None;
    }
    if plain.contains('.') {
        float(&plain)
    } else {
        integer(&plain)
    }
}

fn digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

fn unsigned_part(text: &str) -> &str {
    text.strip_prefix(['+', '-']).unwrap_or(text)
}

fn is_integer(text: &str) -> bool {
    digits(unsigned_part(text))
}

fn split_decimal(text: &str) -> Option<(&str, &str)> {
    let (whole, fraction) = text.split_once('.')?;
    (digits(unsigned_part(whole)) && digits(fraction)).then_some((whole, fraction))
}

fn integer(text: &str) -> Option<Value> {
    let text = text.strip_prefix('+').unwrap_or(text);
    match text.parse::<i64>() {
        Ok(value) => Some(Value::Number(value.into())),
        Err(_) => float(text),
    }
}

fn float(text: &str) -> Option<Value> {
    let value: f64 = text.parse().ok()?;
    Number::from_f64(value).map(Value::Number)
}
