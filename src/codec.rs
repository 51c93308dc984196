//! Value codec - storage representation <-> form representation
//!
//! Both directions are pure functions over a field list:
//!
//! | Field kind | Inbound (storage → form)     | Outbound (form → storage)           |
//! |------------|------------------------------|-------------------------------------|
//! | DateTime   | ISO string → instant         | instant or raw → ISO-8601 string    |
//! | Json       | value → pretty-printed text  | text → parsed value (or error)      |
//! | Number     | passthrough                  | text → number, null when unparsable |
//! | Boolean    | passthrough                  | truthiness                          |
//! | others     | passthrough                  | passthrough                         |
//!
//! Outbound conversion is atomic: any failure rejects the whole record and no
//! partially converted payload escapes.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Number, Value};

use crate::error::AdminError;
use crate::schema::{FieldKind, FieldSchema, Record};

/// A field's value as held by an editable form
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FormValue {
    /// Date-time picker value
    Instant(DateTime<Utc>),
    /// Everything else, including hand-edited JSON text
    Value(Value),
}

/// Form state keyed by field key
pub type FormValues = BTreeMap<String, FormValue>;

impl FormValue {
    pub fn null() -> Self {
        FormValue::Value(Value::Null)
    }

    pub fn text(s: &str) -> Self {
        FormValue::Value(Value::String(s.to_string()))
    }

    /// Empty for required-field purposes
    pub fn is_empty(&self) -> bool {
        match self {
            FormValue::Instant(_) => false,
            FormValue::Value(Value::Null) => true,
            FormValue::Value(Value::String(s)) => s.trim().is_empty(),
            FormValue::Value(Value::Array(items)) => items.is_empty(),
            FormValue::Value(_) => false,
        }
    }

    /// Plain JSON view, instants rendered as ISO-8601
    pub fn to_value(&self) -> Value {
        match self {
            FormValue::Instant(dt) => Value::String(format_instant(dt)),
            FormValue::Value(v) => v.clone(),
        }
    }
}

impl From<Value> for FormValue {
    fn from(value: Value) -> Self {
        FormValue::Value(value)
    }
}

pub fn format_instant(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse the timestamp shapes the backend and date inputs produce
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

// ============================================================================
// Inbound
// ============================================================================

/// Convert a stored record into form values
///
/// Fields absent from `record` take their configured default; fields with
/// neither are left out.
pub fn to_form(fields: &[FieldSchema], record: &Record) -> FormValues {
    let mut values = FormValues::new();
    for field in fields {
        let raw = match record.get(&field.key) {
            Some(value) => value.clone(),
            None => match &field.default {
                Some(default) => default.clone(),
                None => continue,
            },
        };
        values.insert(field.key.clone(), inbound_value(field, raw));
    }
    values
}

/// Inbound conversion of a single value
pub fn inbound_value(field: &FieldSchema, raw: Value) -> FormValue {
    match (&field.kind, raw) {
        (FieldKind::DateTime, Value::String(s)) => match parse_instant(&s) {
            Some(dt) => FormValue::Instant(dt),
            None => FormValue::Value(Value::String(s)),
        },
        (FieldKind::Json, Value::Null) => FormValue::null(),
        (FieldKind::Json, Value::String(s)) => FormValue::Value(Value::String(s)),
        (FieldKind::Json, other) => match serde_json::to_string_pretty(&other) {
            Ok(text) => FormValue::Value(Value::String(text)),
            Err(_) => FormValue::Value(other),
        },
        (_, other) => FormValue::Value(other),
    }
}

// ============================================================================
// Outbound
// ============================================================================

/// Convert form values into a storage payload
///
/// Only fields present in `values` are emitted. All fields are converted
/// before anything is returned; failures are reported together as one
/// validation error naming the offending field(s).
pub fn to_storage(fields: &[FieldSchema], values: &FormValues) -> Result<Record, AdminError> {
    let mut payload = Record::new();
    let mut failures: Vec<(&FieldSchema, String)> = Vec::new();

    for field in fields {
        let Some(value) = values.get(&field.key) else {
            continue;
        };
        match outbound_value(field, value) {
            Ok(converted) => {
                payload.insert(field.key.clone(), converted);
            }
            Err(reason) => failures.push((field, reason)),
        }
    }

    match failures.len() {
        0 => Ok(payload),
        1 => {
            let (field, reason) = &failures[0];
            Err(AdminError::validation(&field.key, &field.label, reason))
        }
        _ => {
            let labels: Vec<&str> = failures.iter().map(|(f, _)| f.label.as_str()).collect();
            let reasons: Vec<String> = failures
                .iter()
                .map(|(f, r)| format!("{}: {}", f.label, r))
                .collect();
            Err(AdminError::validation(
                &failures[0].0.key,
                labels.join(", "),
                reasons.join("; "),
            ))
        }
    }
}

/// Outbound conversion of a single value; `Err` carries the reason
pub fn outbound_value(field: &FieldSchema, value: &FormValue) -> Result<Value, String> {
    match &field.kind {
        FieldKind::Number => Ok(number_out(value)),
        FieldKind::Boolean => Ok(Value::Bool(truthy(value))),
        FieldKind::Json => json_out(value),
        FieldKind::DateTime => datetime_out(value),
        FieldKind::ShortText
        | FieldKind::LongText
        | FieldKind::Select { .. }
        | FieldKind::Locale
        | FieldKind::RichText
        | FieldKind::Image { .. }
        | FieldKind::PrimaryAction
        | FieldKind::RelationSelect => Ok(value.to_value()),
    }
}

fn number_out(value: &FormValue) -> Value {
    match value {
        FormValue::Value(Value::Number(n)) => Value::Number(n.clone()),
        FormValue::Value(Value::String(s)) => parse_number(s),
        _ => Value::Null,
    }
}

fn parse_number(s: &str) -> Value {
    let s = s.trim();
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::from(i);
    }
    s.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn truthy(value: &FormValue) -> bool {
    match value {
        FormValue::Instant(_) => true,
        FormValue::Value(Value::Null) => false,
        FormValue::Value(Value::Bool(b)) => *b,
        FormValue::Value(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        FormValue::Value(Value::String(s)) => !s.is_empty(),
        FormValue::Value(Value::Array(_) | Value::Object(_)) => true,
    }
}

fn json_out(value: &FormValue) -> Result<Value, String> {
    match value {
        FormValue::Value(Value::String(text)) if text.trim().is_empty() => Ok(Value::Null),
        FormValue::Value(Value::String(text)) => {
            serde_json::from_str(text).map_err(|e| format!("invalid JSON ({})", e))
        }
        other => Ok(other.to_value()),
    }
}

fn datetime_out(value: &FormValue) -> Result<Value, String> {
    match value {
        FormValue::Instant(dt) => Ok(Value::String(format_instant(dt))),
        FormValue::Value(Value::Null) => Ok(Value::Null),
        FormValue::Value(Value::String(s)) if s.trim().is_empty() => Ok(Value::Null),
        FormValue::Value(Value::String(s)) => parse_instant(s)
            .map(|dt| Value::String(format_instant(&dt)))
            .ok_or_else(|| format!("invalid date-time ('{}')", s)),
        FormValue::Value(Value::Number(n)) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .map(|dt| Value::String(format_instant(&dt)))
            .ok_or_else(|| format!("invalid timestamp ({})", n)),
        FormValue::Value(other) => Err(format!("invalid date-time ({})", other)),
    }
}
