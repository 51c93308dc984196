//! Locked fields - values fixed by navigation context
//!
//! A [`LockedFieldSet`] is computed once per screen mount and never
//! persisted. It has two sources:
//!
//! - the org-scoping key, from the caller's organization (create) or the
//!   loaded record (edit)
//! - a translation foreign key, from the parent id in the navigation context
//!   (create) or the loaded record (edit)

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::navigation::NavigationContext;
use crate::schema::{FieldKind, FieldSchema, Record, ResourceSchema};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LockedFieldSet {
    values: BTreeMap<String, Value>,
}

impl LockedFieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks for a create screen, taken from navigation parameters
    ///
    /// The organization comes from `organizationId`, then an `eq` filter on
    /// the org key, then the session's active organization. The parent id of
    /// a translation comes from its bare parameter, then an `eq` filter on
    /// the foreign key.
    pub fn for_create(
        schema: &ResourceSchema,
        nav: &NavigationContext,
        active_organization: Option<&str>,
    ) -> Self {
        let mut locks = Self::new();
        let pinned = |key: &str| nav.filter.as_ref().and_then(|f| f.pinned_value(key));

        if let Some(org_key) = &schema.org_key {
            let org = nav
                .organization_id
                .as_deref()
                .or_else(|| pinned(org_key.as_str()))
                .or(active_organization);
            if let Some(org) = org {
                locks.insert(org_key, coerce_param(schema.field(org_key), org));
            }
        }

        if let Some(fk) = schema.translation_key() {
            if let Some(parent_id) = nav.param(fk).or_else(|| pinned(fk)) {
                locks.insert(fk, coerce_param(schema.field(fk), parent_id));
            }
        }

        debug!(resource = %schema.name, locked = locks.len(), "Resolved create locks");
        locks
    }

    /// Locks for an edit screen, taken from the loaded record itself
    pub fn for_edit(schema: &ResourceSchema, record: &Record) -> Self {
        let mut locks = Self::new();
        let keys = schema
            .org_key
            .as_deref()
            .into_iter()
            .chain(schema.translation_key());

        for key in keys {
            match record.get(key) {
                None | Some(Value::Null) => {}
                Some(value) => locks.insert(key, value.clone()),
            }
        }

        debug!(resource = %schema.name, locked = locks.len(), "Resolved edit locks");
        locks
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Overwrite every locked key in `payload` with its locked value
    pub fn apply(&self, payload: &mut Record) {
        for (key, value) in &self.values {
            payload.insert(key.clone(), value.clone());
        }
    }
}

/// Give a query-string value the JSON type its field stores
///
/// `?event_id=42` for a relation select locks the number `42`, not the
/// string `"42"`.
pub fn coerce_param(field: Option<&FieldSchema>, raw: &str) -> Value {
    let kind = field.map(|f| &f.kind);
    match kind {
        Some(FieldKind::Number) => match raw.parse::<i64>() {
            Ok(i) => Value::from(i),
            Err(_) => raw
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(raw.to_string())),
        },
        Some(FieldKind::Boolean) => match raw {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        },
        Some(FieldKind::Select { .. }) | Some(FieldKind::RelationSelect) | None => {
            integer_id(raw).unwrap_or_else(|| Value::String(raw.to_string()))
        }
        Some(_) => Value::String(raw.to_string()),
    }
}

/// Canonical integers only; "007" stays a string
fn integer_id(raw: &str) -> Option<Value> {
    let n = raw.parse::<i64>().ok()?;
    (n.to_string() == raw).then(|| Value::from(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog::default_registry;
    use serde_json::json;

    #[test]
    fn test_translation_create_locks_parent_id() {
        let registry = default_registry().unwrap();
        let schema = registry.get("event_translations").unwrap();
        let nav = NavigationContext::from_query("event_id=42").unwrap();

        let locks = LockedFieldSet::for_create(schema, &nav, None);
        assert_eq!(locks.get("event_id"), Some(&json!(42)));
    }

    #[test]
    fn test_create_locks_org_from_navigation_then_session() {
        let registry = default_registry().unwrap();
        let schema = registry.get("events").unwrap();

        let nav = NavigationContext::from_query("organizationId=7").unwrap();
        let locks = LockedFieldSet::for_create(schema, &nav, Some("9"));
        assert_eq!(locks.get("organization_id"), Some(&json!(7)));

        let locks = LockedFieldSet::for_create(schema, &NavigationContext::default(), Some("9"));
        assert_eq!(locks.get("organization_id"), Some(&json!(9)));

        let locks = LockedFieldSet::for_create(schema, &NavigationContext::default(), None);
        assert!(locks.is_empty());
    }

    #[test]
    fn test_create_locks_from_eq_filter() {
        let registry = default_registry().unwrap();
        let schema = registry.get("event_translations").unwrap();

        let nav = NavigationContext::from_query(
            "filters[0][field]=event_id&filters[0][operator]=eq&filters[0][value]=42",
        )
        .unwrap();
        let locks = LockedFieldSet::for_create(schema, &nav, None);
        assert_eq!(locks.get("event_id"), Some(&json!(42)));

        // Bare parameter wins over the filter
        let nav = NavigationContext::from_query(
            "event_id=5&filters[0][field]=event_id&filters[0][operator]=eq&filters[0][value]=42",
        )
        .unwrap();
        let locks = LockedFieldSet::for_create(schema, &nav, None);
        assert_eq!(locks.get("event_id"), Some(&json!(5)));

        // Only equality pins a value
        let nav = NavigationContext::from_query(
            "filters[0][field]=event_id&filters[0][operator]=gt&filters[0][value]=42",
        )
        .unwrap();
        assert!(LockedFieldSet::for_create(schema, &nav, None).is_empty());
    }

    #[test]
    fn test_create_org_from_filter_before_session() {
        let registry = default_registry().unwrap();
        let schema = registry.get("venues").unwrap();
        let nav = NavigationContext::from_query(
            "filters[0][field]=organization_id&filters[0][operator]=eq&filters[0][value]=8",
        )
        .unwrap();

        let locks = LockedFieldSet::for_create(schema, &nav, Some("7"));
        assert_eq!(locks.get("organization_id"), Some(&json!(8)));

        let nav = nav.with_organization("9");
        let locks = LockedFieldSet::for_create(schema, &nav, Some("7"));
        assert_eq!(locks.get("organization_id"), Some(&json!(9)));
    }

    #[test]
    fn test_edit_locks_from_record() {
        let registry = default_registry().unwrap();
        let schema = registry.get("event_translations").unwrap();
        let record = json!({ "id": 3, "event_id": 42, "locale": "fr" })
            .as_object()
            .cloned()
            .unwrap();

        let locks = LockedFieldSet::for_edit(schema, &record);
        assert_eq!(locks.len(), 1);
        assert_eq!(locks.get("event_id"), Some(&json!(42)));
    }

    #[test]
    fn test_apply_overwrites_payload() {
        let mut locks = LockedFieldSet::new();
        locks.insert("event_id", json!(42));
        let mut payload = json!({ "event_id": 1, "title": "x" })
            .as_object()
            .cloned()
            .unwrap();
        locks.apply(&mut payload);
        assert_eq!(payload.get("event_id"), Some(&json!(42)));
        assert_eq!(payload.get("title"), Some(&json!("x")));
    }

    #[test]
    fn test_coerce_param() {
        let number = FieldSchema::number("n", "N");
        let text = FieldSchema::text("t", "T");
        let flag = FieldSchema::boolean("b", "B");

        assert_eq!(coerce_param(Some(&number), "2.5"), json!(2.5));
        assert_eq!(coerce_param(Some(&text), "42"), json!("42"));
        assert_eq!(coerce_param(Some(&flag), "true"), json!(true));
        assert_eq!(coerce_param(None, "42"), json!(42));
        assert_eq!(coerce_param(None, "007"), json!("007"));
        assert_eq!(coerce_param(None, "org-a"), json!("org-a"));
    }
}
