//! Filters, sorting and pagination shared by list screens and backends

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

use crate::error::AdminError;
use crate::schema::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Eq,
    Ne,
    In,
    Contains,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOperator {
    pub fn parse(s: &str) -> Result<Self, AdminError> {
        match s {
            "eq" => Ok(FilterOperator::Eq),
            "ne" => Ok(FilterOperator::Ne),
            "in" => Ok(FilterOperator::In),
            "contains" => Ok(FilterOperator::Contains),
            "gt" => Ok(FilterOperator::Gt),
            "gte" => Ok(FilterOperator::Gte),
            "lt" => Ok(FilterOperator::Lt),
            "lte" => Ok(FilterOperator::Lte),
            other => Err(AdminError::Navigation(format!("unknown filter operator '{}'", other))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Ne => "ne",
            FilterOperator::In => "in",
            FilterOperator::Contains => "contains",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(field, operator, value)` predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub operator: FilterOperator,
    pub value: Value,
}

impl Filter {
    pub fn new(field: &str, operator: FilterOperator, value: Value) -> Self {
        Self {
            field: field.to_string(),
            operator,
            value,
        }
    }

    pub fn eq(field: &str, value: Value) -> Self {
        Self::new(field, FilterOperator::Eq, value)
    }

    /// Evaluate against a row. Values compare loosely: `7` matches `"7"`.
    pub fn matches(&self, row: &Record) -> bool {
        let actual = row.get(&self.field).unwrap_or(&Value::Null);
        match self.operator {
            FilterOperator::Eq => loose_eq(actual, &self.value),
            FilterOperator::Ne => !loose_eq(actual, &self.value),
            FilterOperator::In => match &self.value {
                Value::Array(items) => items.iter().any(|v| loose_eq(actual, v)),
                other => loose_eq(actual, other),
            },
            FilterOperator::Contains => match (actual, &self.value) {
                (Value::String(a), Value::String(needle)) => {
                    a.to_lowercase().contains(&needle.to_lowercase())
                }
                (Value::Array(items), needle) => items.iter().any(|v| loose_eq(v, needle)),
                _ => false,
            },
            FilterOperator::Gt => compare(actual, &self.value) == Some(Ordering::Greater),
            FilterOperator::Gte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::Lt => compare(actual, &self.value) == Some(Ordering::Less),
            FilterOperator::Lte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

/// Render a scalar the way it appears in a query string
pub fn value_to_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b || value_to_param(a) == value_to_param(b),
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: SortOrder::Desc,
        }
    }

    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let left = a.get(&self.field).unwrap_or(&Value::Null);
        let right = b.get(&self.field).unwrap_or(&Value::Null);
        let ord = compare(left, right).unwrap_or(Ordering::Equal);
        match self.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    pub fn new(page: usize, per_page: usize) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }
}

/// Parameters of a backend `list` call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    pub filters: Vec<Filter>,
    pub sort: Option<Sort>,
    pub pagination: Option<Pagination>,
    /// Opaque column-selection string passed through to the backend
    pub projection: Option<String>,
}

impl ListQuery {
    pub fn filtered(filters: Vec<Filter>) -> Self {
        Self {
            filters,
            ..Default::default()
        }
    }

    pub fn matches(&self, row: &Record) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_eq_is_loose_across_number_and_string() {
        let r = row(json!({ "organization_id": 7 }));
        assert!(Filter::eq("organization_id", json!("7")).matches(&r));
        assert!(Filter::eq("organization_id", json!(7)).matches(&r));
        assert!(!Filter::eq("organization_id", json!(8)).matches(&r));
    }

    #[test]
    fn test_null_never_equals_value() {
        let r = row(json!({ "organization_id": null }));
        assert!(!Filter::eq("organization_id", json!("")).matches(&r));
        assert!(Filter::eq("organization_id", Value::Null).matches(&r));
    }

    #[test]
    fn test_in_and_contains() {
        let r = row(json!({ "email": "Ada@Example.com", "tags": ["vip", "speaker"] }));
        assert!(Filter::new("email", FilterOperator::Contains, json!("example")).matches(&r));
        assert!(Filter::new("tags", FilterOperator::Contains, json!("vip")).matches(&r));
        assert!(Filter::new(
            "email",
            FilterOperator::In,
            json!(["x@y.z", "Ada@Example.com"])
        )
        .matches(&r));
    }

    #[test]
    fn test_range_operators() {
        let r = row(json!({ "capacity": 50 }));
        assert!(Filter::new("capacity", FilterOperator::Gt, json!(10)).matches(&r));
        assert!(Filter::new("capacity", FilterOperator::Lte, json!(50)).matches(&r));
        assert!(!Filter::new("capacity", FilterOperator::Lt, json!(50)).matches(&r));
    }

    #[test]
    fn test_operator_parse() {
        assert_eq!(FilterOperator::parse("eq").unwrap(), FilterOperator::Eq);
        assert!(FilterOperator::parse("like").is_err());
    }

    #[test]
    fn test_sort_desc() {
        let a = row(json!({ "starts_at": "2024-01-01" }));
        let b = row(json!({ "starts_at": "2024-02-01" }));
        assert_eq!(Sort::desc("starts_at").compare(&a, &b), Ordering::Greater);
    }
}
