//! List-view columns

use std::fmt::Write;

use serde::Serialize;
use serde_json::Value;

use super::Record;
use crate::codec::parse_instant;

/// Custom cell renderer: receives the cell value and the whole row
pub type CellRenderer = fn(&Value, &Record) -> String;

/// Default formatting hint for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Number,
    Boolean,
    DateTime,
    Json,
    Image,
}

/// One column in a resource's list view
#[derive(Debug, Clone)]
pub struct ColumnSchema {
    pub key: String,
    pub title: String,
    pub kind: Option<ColumnKind>,
    pub render: Option<CellRenderer>,
    pub width: Option<u16>,
}

impl ColumnSchema {
    pub fn new(key: &str, title: &str) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            kind: None,
            render: None,
            width: None,
        }
    }

    pub fn kind(mut self, kind: ColumnKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn render(mut self, render: CellRenderer) -> Self {
        self.render = Some(render);
        self
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = Some(width);
        self
    }

    /// Format this column's cell for `row`
    pub fn format(&self, row: &Record, datetime_format: &str) -> String {
        let value = row.get(&self.key).unwrap_or(&Value::Null);
        if let Some(render) = self.render {
            return render(value, row);
        }
        format_value(value, self.kind, datetime_format)
    }
}

fn format_value(value: &Value, kind: Option<ColumnKind>, datetime_format: &str) -> String {
    match (value, kind) {
        (Value::Null, _) => String::new(),
        (Value::Bool(b), _) => if *b { "Yes" } else { "No" }.to_string(),
        (Value::String(s), Some(ColumnKind::DateTime)) => match parse_instant(s) {
            Some(dt) => {
                // A bad format string surfaces as fmt::Error, never a panic
                let mut out = String::new();
                match write!(out, "{}", dt.format(datetime_format)) {
                    Ok(()) => out,
                    Err(_) => s.clone(),
                }
            }
            None => s.clone(),
        },
        (Value::String(s), _) => s.clone(),
        (Value::Number(n), _) => n.to_string(),
        (other, _) => other.to_string(),
    }
}
