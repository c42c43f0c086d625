//! Record representation and identifier helpers.
//!
//! Records are schemaless ordered field maps ([`bson::Document`]). Exactly one field,
//! [`ID_FIELD`], identifies a record inside its collection. Identifiers are compared
//! loosely, so the string `"7"` coming from a request path finds the stored number `7`.

use bson::{Bson, Document};
use chrono::SecondsFormat;

/// A single stored record.
pub type Record = Document;

/// Name of the identifying field of every record.
pub const ID_FIELD: &str = "id";

/// Returns the identifier of a record, if it has one.
pub fn record_id(record: &Record) -> Option<&Bson> {
    record.get(ID_FIELD).filter(|id| !matches!(id, Bson::Null))
}

/// Compares two identifiers the way request paths expect.
///
/// Numbers compare numerically regardless of width, everything else compares by its
/// textual rendering.
pub fn ids_match(left: &Bson, right: &Bson) -> bool {
    match (as_number(left), as_number(right)) {
        (Some(a), Some(b)) => a == b,
        _ => match (left, right) {
            (Bson::Document(_) | Bson::Array(_), _) | (_, Bson::Document(_) | Bson::Array(_)) => false,
            _ => display_value(left) == display_value(right),
        },
    }
}

/// Returns the numeric value of a BSON number.
pub fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(value) => Some(*value as f64),
        Bson::Int64(value) => Some(*value as f64),
        Bson::Double(value) => Some(*value),
        _ => None,
    }
}

/// Renders a value as plain text.
///
/// Strings render without quotes, dates as RFC 3339 with millisecond precision,
/// integral doubles without a fractional part.
pub fn display_value(value: &Bson) -> String {
    match value {
        Bson::String(value) => value.clone(),
        Bson::Int32(value) => value.to_string(),
        Bson::Int64(value) => value.to_string(),
        Bson::Double(value) if value.fract() == 0.0 && value.is_finite() => format!("{}", *value as i64),
        Bson::Double(value) => value.to_string(),
        Bson::Boolean(value) => value.to_string(),
        Bson::Null => "null".to_string(),
        Bson::DateTime(value) => value
            .to_chrono()
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        other => other.to_string(),
    }
}

/// Short name of the kind of a value, used in error messages.
pub fn value_kind(value: &Bson) -> &'static str {
    match value {
        Bson::Null => "null",
        Bson::Boolean(_) => "boolean",
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => "number",
        Bson::String(_) => "string",
        Bson::DateTime(_) => "date",
        Bson::Array(_) => "array",
        Bson::Document(_) => "document",
        _ => "unsupported",
    }
}

/// Parses an identifier received as text (e.g. a path segment).
///
/// Integral text becomes an `Int64`, anything else stays a string. Because ids match
/// loosely either form finds the stored record; the parsed form is what a replace of an
/// absent record stores, so integer-keyed collections stay integer-keyed.
pub fn parse_id(raw: &str) -> Bson {
    match raw.parse::<i64>() {
        Ok(value) => Bson::Int64(value),
        Err(_) => Bson::String(raw.to_string()),
    }
}
