//! Metadata normalisation: raw PDF document-info keys → canonical names.
//!
//! PDF info dictionaries use slash-prefixed, CamelCase keys (`/CreationDate`)
//! and encode dates in the PDF-specific `D:YYYYMMDDHHmmSS` form. Downstream
//! indexers want flat lower-case keys and ISO-8601 timestamps, so this module
//! renames the well-known keys, lower-cases the rest, and rewrites any
//! date-like string it can parse. Nothing here fails: unparseable dates are
//! kept verbatim.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use serde_json::{Map, Value};

/// Well-known document-info keys and their canonical names.
const KEY_MAP: &[(&str, &str)] = &[
    ("/Author", "author"),
    ("/CreationDate", "creation_date"),
    ("/Creator", "creator"),
    ("/ModDate", "modification_date"),
    ("/Producer", "producer"),
    ("/Title", "title"),
    ("/Subject", "subject"),
    ("/Keywords", "keywords"),
];

/// Normalise raw document properties.
///
/// Entries whose value is `None` or JSON `null` are dropped. Pass an empty
/// iterator for a document without an info dictionary.
pub fn normalize_metadata<I, K>(raw: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, Option<Value>)>,
    K: AsRef<str>,
{
    let mut out = Map::new();

    for (key, value) in raw {
        let value = match value {
            None | Some(Value::Null) => continue,
            Some(v) => v,
        };

        let key = canonical_key(key.as_ref());
        let value = match value {
            Value::String(s) if key.contains("date") => {
                Value::String(parse_date(&s).unwrap_or(s))
            }
            other => other,
        };

        out.insert(key, value);
    }

    out
}

/// Map a raw key to its canonical name.
fn canonical_key(raw: &str) -> String {
    KEY_MAP
        .iter()
        .find(|(from, _)| *from == raw)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or_else(|| raw.trim_start_matches('/').to_lowercase())
}

/// Parse a PDF or ISO-8601 date string into canonical ISO-8601 form.
///
/// Returns `None` when neither format matches.
pub fn parse_date(value: &str) -> Option<String> {
    if let Some(rest) = value.strip_prefix("D:") {
        // Timezone suffix after the 14 digits is ignored.
        let digits = rest.get(..14)?;
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let dt = NaiveDateTime::parse_from_str(digits, "%Y%m%d%H%M%S").ok()?;
        return Some(dt.format("%Y-%m-%dT%H:%M:%S").to_string());
    }

    let iso = value.replace('Z', "+00:00");

    if let Ok(dt) = DateTime::parse_from_rfc3339(&iso) {
        let fmt = format!("{}%:z", iso_time_format(dt.nanosecond()));
        return Some(dt.format(&fmt).to_string());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&iso, fmt) {
            return Some(dt.format(iso_time_format(dt.nanosecond())).to_string());
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(&iso, "%Y-%m-%d") {
        return Some(format!("{}T00:00:00", d.format("%Y-%m-%d")));
    }

    None
}

/// Fractional seconds are written as microseconds, and omitted when zero.
fn iso_time_format(nanos: u32) -> &'static str {
    if nanos == 0 {
        "%Y-%m-%dT%H:%M:%S"
    } else {
        "%Y-%m-%dT%H:%M:%S%.6f"
    }
}
