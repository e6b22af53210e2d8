//! Scalar coercions used by transformation rules.
//!
//! Every function takes the value plus the name of the field it came from
//! (used only in diagnostics) and returns `None` when the value cannot be
//! represented. Nothing here fails hard: problems are logged and the caller
//! leaves the output field out.

use crate::diagnostics::DiagnosticsSink;
use crate::document::text_of;
use crate::types::As;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde_json::{Number, Value};

/// Coerce `value` into the representation named by `as_type`.
pub fn convert(as_type: As, value: &Value, field_label: &str, sink: &dyn DiagnosticsSink) -> Option<Value> {
    match as_type {
        As::Unchanged => (!value.is_null()).then(|| value.clone()),
        As::String => to_text(value),
        As::WholeNumber => to_whole_number(value, field_label, sink),
        As::Double => to_double(value, field_label, sink),
        As::IsoDate => to_iso_date(value, field_label, sink),
        As::IsoUtcDate => to_iso_utc_date(value, field_label, sink),
        As::SerializeJson => serialize_to_text(value, field_label, sink),
    }
}

/// Parse a float. `,` group separators are ignored.
pub fn to_double(value: &Value, field_label: &str, sink: &dyn DiagnosticsSink) -> Option<Value> {
    let parsed = text_of(value)
        .and_then(|text| text.trim().replace(',', "").parse::<f64>().ok())
        .and_then(Number::from_f64);

    match parsed {
        Some(number) => Some(Value::Number(number)),
        None => {
            warn_numeric(value, field_label, sink);
            None
        }
    }
}

pub fn to_whole_number(value: &Value, field_label: &str, sink: &dyn DiagnosticsSink) -> Option<Value> {
    let parsed = match value {
        // Float-typed numbers like 12.0 count when they hold a whole value
        Value::Number(number) => number.as_i64().or_else(|| number.as_f64().and_then(whole_f64)),
        _ => text_of(value).and_then(|text| text.trim().parse::<i64>().ok()),
    };

    match parsed {
        Some(number) => Some(Value::from(number)),
        None => {
            warn_numeric(value, field_label, sink);
            None
        }
    }
}

fn whole_f64(number: f64) -> Option<i64> {
    let in_range = number >= i64::MIN as f64 && number < i64::MAX as f64;
    (number.fract() == 0.0 && in_range).then_some(number as i64)
}

fn warn_numeric(value: &Value, field_label: &str, sink: &dyn DiagnosticsSink) {
    sink.warning(
        &format!(
            "The source field {} has a null value or a non valid numeric value: {}",
            field_label,
            text_of(value).unwrap_or_default()
        ),
        None,
    );
}

/// Format a date keeping whatever offset it was written with.
pub fn to_iso_date(value: &Value, field_label: &str, sink: &dyn DiagnosticsSink) -> Option<Value> {
    match text_of(value).as_deref().and_then(parse_date) {
        Some(date) => Some(Value::String(date.to_iso())),
        None => {
            warn_date(value, field_label, sink);
            None
        }
    }
}

/// Format a date after moving it to UTC. Values without an offset are taken as UTC.
pub fn to_iso_utc_date(value: &Value, field_label: &str, sink: &dyn DiagnosticsSink) -> Option<Value> {
    match text_of(value).as_deref().and_then(parse_date).map(ParsedDate::into_utc) {
        Some(date) => Some(Value::String(date.to_iso())),
        None => {
            warn_date(value, field_label, sink);
            None
        }
    }
}

fn warn_date(value: &Value, field_label: &str, sink: &dyn DiagnosticsSink) {
    sink.warning(
        &format!(
            "The source field {} has a null value or a non valid Date Time: {}",
            field_label,
            text_of(value).unwrap_or_default()
        ),
        None,
    );
}

/// Compact JSON text of the value.
pub fn serialize_to_text(value: &Value, field_label: &str, sink: &dyn DiagnosticsSink) -> Option<Value> {
    match serde_json::to_string(value) {
        Ok(text) => Some(Value::String(text)),
        Err(err) => {
            sink.error(
                &format!("The value in the field {} is not JSON serializable.", field_label),
                Some(&err),
            );
            None
        }
    }
}

pub fn to_text(value: &Value) -> Option<Value> {
    text_of(value).map(Value::String)
}

// ===== DATE PARSING =====

#[derive(Debug, Clone, Copy, PartialEq)]
enum ParsedDate {
    /// Written with a `Z` designator
    Utc(NaiveDateTime),
    Offset(DateTime<FixedOffset>),
    /// No zone information at all
    Naive(NaiveDateTime),
}

impl ParsedDate {
    fn into_utc(self) -> Self {
        match self {
            ParsedDate::Utc(dt) | ParsedDate::Naive(dt) => ParsedDate::Utc(dt),
            ParsedDate::Offset(dt) => ParsedDate::Utc(dt.with_timezone(&Utc).naive_utc()),
        }
    }

    /// `yyyy-MM-ddTHH:mm:ss.fffffffK`
    fn to_iso(&self) -> String {
        let (local, zone) = match self {
            ParsedDate::Utc(dt) => (*dt, "Z".to_string()),
            ParsedDate::Offset(dt) => (dt.naive_local(), dt.format("%:z").to_string()),
            ParsedDate::Naive(dt) => (*dt, String::new()),
        };
        // Leap seconds report nanos past 1e9; keep to seven digits
        let ticks = (local.nanosecond() / 100).min(9_999_999);
        format!("{}.{:07}{}", local.format("%Y-%m-%dT%H:%M:%S"), ticks, zone)
    }
}

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m-%d-%Y %H:%M:%S%.f",
    "%m-%d-%Y %H:%M",
    "%d %B %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    // 12-hour clock
    "%Y-%m-%d %I:%M:%S %p",
    "%Y-%m-%d %I:%M %p",
    "%m-%d-%Y %I:%M:%S %p",
    "%m-%d-%Y %I:%M %p",
    "%d %B %Y %I:%M:%S %p",
    "%d %B %Y %I:%M %p",
    "%d %b %Y %I:%M:%S %p",
    "%d %b %Y %I:%M %p",
    "%B %d, %Y %I:%M:%S %p",
    "%B %d, %Y %I:%M %p",
    "%b %d, %Y %I:%M:%S %p",
    "%b %d, %Y %I:%M %p",
];

// Numeric dates without a year first are read month first
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m-%d-%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%A, %d %B %Y",
    "%A, %B %d, %Y",
];

fn parse_date(raw: &str) -> Option<ParsedDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(ParsedDate::Offset(dt));
    }

    let text = trimmed.replace('/', "-");

    if let Some(stripped) = text.strip_suffix(|c: char| c == 'Z' || c == 'z') {
        return parse_naive(stripped).map(ParsedDate::Utc);
    }

    OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(&text, fmt).ok())
        .map(ParsedDate::Offset)
        .or_else(|| parse_naive(&text).map(ParsedDate::Naive))
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
