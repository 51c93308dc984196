//! In-process record backend
//!
//! Holds every resource as a vector of JSON rows. Used by the CLI against
//! seed files and by tests, which read [`MemoryBackend::call_count`] to
//! assert that rejected submissions never reached the backend.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{ListPage, RecordBackend};
use crate::error::AdminError;
use crate::query::{value_to_param, Filter, ListQuery};
use crate::schema::Record;

pub struct MemoryBackend {
    tables: RwLock<HashMap<String, Vec<Record>>>,
    next_id: AtomicU64,
    calls: AtomicUsize,
    /// Error returned by the next call, for exercising failure paths
    fail_next: Mutex<Option<String>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            calls: AtomicUsize::new(0),
            fail_next: Mutex::new(None),
        }
    }

    /// Build from `{ "resource": [row, ...], ... }`
    pub fn from_json(seed: Value) -> Result<Self, AdminError> {
        let Value::Object(tables) = seed else {
            return Err(AdminError::Config(
                "seed data must be an object of resource arrays".into(),
            ));
        };

        let mut map = HashMap::new();
        let mut max_id = 0u64;
        for (resource, rows) in tables {
            let Value::Array(rows) = rows else {
                return Err(AdminError::Config(format!(
                    "seed data for '{}' must be an array",
                    resource
                )));
            };
            let mut records = Vec::with_capacity(rows.len());
            for row in rows {
                let Value::Object(record) = row else {
                    return Err(AdminError::Config(format!(
                        "seed row in '{}' must be an object",
                        resource
                    )));
                };
                if let Some(id) = record.get("id").and_then(Value::as_u64) {
                    max_id = max_id.max(id);
                }
                records.push(record);
            }
            map.insert(resource, records);
        }

        info!(resources = map.len(), "Seeded memory backend");
        Ok(Self {
            tables: RwLock::new(map),
            next_id: AtomicU64::new(max_id + 1),
            calls: AtomicUsize::new(0),
            fail_next: Mutex::new(None),
        })
    }

    pub fn load_seed<P: AsRef<Path>>(path: P) -> Result<Self, AdminError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(serde_json::from_str(&content)?)
    }

    /// Number of backend operations invoked so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make the next operation fail with a backend error
    pub fn fail_next(&self, message: &str) {
        if let Ok(mut slot) = self.fail_next.lock() {
            *slot = Some(message.to_string());
        }
    }

    /// Snapshot of a resource's rows
    pub async fn rows(&self, resource: &str) -> Vec<Record> {
        self.tables
            .read()
            .await
            .get(resource)
            .cloned()
            .unwrap_or_default()
    }

    fn begin(&self, op: &str, resource: &str) -> Result<(), AdminError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        debug!("memory backend {} on {}", op, resource);
        let injected = self.fail_next.lock().ok().and_then(|mut slot| slot.take());
        match injected {
            Some(message) => Err(AdminError::Backend(message)),
            None => Ok(()),
        }
    }

    fn now() -> Value {
        Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

fn id_matches(row: &Record, id: &str) -> bool {
    row.get("id").map(|v| value_to_param(v) == id).unwrap_or(false)
}

fn not_found(resource: &str, id: &str) -> AdminError {
    AdminError::NotFound {
        resource: resource.to_string(),
        id: id.to_string(),
    }
}

fn merge(row: &mut Record, payload: Record) {
    for (key, value) in payload {
        if key != "id" {
            row.insert(key, value);
        }
    }
}

#[async_trait]
impl RecordBackend for MemoryBackend {
    async fn list(&self, resource: &str, query: &ListQuery) -> Result<ListPage, AdminError> {
        self.begin("list", resource)?;
        let tables = self.tables.read().await;
        let mut rows: Vec<Record> = tables
            .get(resource)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();

        if let Some(sort) = &query.sort {
            rows.sort_by(|a, b| sort.compare(a, b));
        }

        let total = rows.len();
        if let Some(page) = query.pagination {
            rows = rows
                .into_iter()
                .skip(page.page.saturating_sub(1).saturating_mul(page.per_page))
                .take(page.per_page)
                .collect();
        }

        Ok(ListPage { rows, total })
    }

    async fn get_one(
        &self,
        resource: &str,
        id: &str,
        _projection: Option<&str>,
    ) -> Result<Record, AdminError> {
        self.begin("get_one", resource)?;
        let tables = self.tables.read().await;
        tables
            .get(resource)
            .and_then(|rows| rows.iter().find(|r| id_matches(r, id)))
            .cloned()
            .ok_or_else(|| not_found(resource, id))
    }

    async fn create(
        &self,
        resource: &str,
        mut payload: Record,
        _projection: Option<&str>,
    ) -> Result<Record, AdminError> {
        self.begin("create", resource)?;
        let mut tables = self.tables.write().await;
        let rows = tables.entry(resource.to_string()).or_default();

        match payload.get("id") {
            None | Some(Value::Null) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                payload.insert("id".into(), Value::from(id));
            }
            Some(existing) => {
                let id = value_to_param(existing);
                if rows.iter().any(|r| id_matches(r, &id)) {
                    return Err(AdminError::Backend(format!(
                        "duplicate key: {}/{} already exists",
                        resource, id
                    )));
                }
            }
        }
        payload.entry("created_at").or_insert_with(Self::now);

        rows.push(payload.clone());
        Ok(payload)
    }

    async fn update(
        &self,
        resource: &str,
        id: &str,
        payload: Record,
        _projection: Option<&str>,
    ) -> Result<Record, AdminError> {
        self.begin("update", resource)?;
        let mut tables = self.tables.write().await;
        let row = tables
            .get_mut(resource)
            .and_then(|rows| rows.iter_mut().find(|r| id_matches(r, id)))
            .ok_or_else(|| not_found(resource, id))?;

        merge(row, payload);
        row.insert("updated_at".into(), Self::now());
        Ok(row.clone())
    }

    async fn delete_one(
        &self,
        resource: &str,
        id: &str,
        _projection: Option<&str>,
    ) -> Result<Record, AdminError> {
        self.begin("delete_one", resource)?;
        let mut tables = self.tables.write().await;
        let rows = tables
            .get_mut(resource)
            .ok_or_else(|| not_found(resource, id))?;
        let index = rows
            .iter()
            .position(|r| id_matches(r, id))
            .ok_or_else(|| not_found(resource, id))?;
        Ok(rows.remove(index))
    }

    async fn update_matching(
        &self,
        resource: &str,
        filters: &[Filter],
        payload: Record,
        _projection: Option<&str>,
    ) -> Result<Vec<Record>, AdminError> {
        self.begin("update_matching", resource)?;
        let mut tables = self.tables.write().await;
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(resource) {
            for row in rows
                .iter_mut()
                .filter(|r| filters.iter().all(|f| f.matches(r)))
            {
                merge(row, payload.clone());
                row.insert("updated_at".into(), Self::now());
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete_matching(
        &self,
        resource: &str,
        filters: &[Filter],
        _projection: Option<&str>,
    ) -> Result<Vec<Record>, AdminError> {
        self.begin("delete_matching", resource)?;
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(resource) else {
            return Ok(Vec::new());
        };
        let (removed, kept): (Vec<Record>, Vec<Record>) = rows
            .drain(..)
            .partition(|r| filters.iter().all(|f| f.matches(r)));
        *rows = kept;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Pagination, Sort};
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    fn seeded() -> MemoryBackend {
        MemoryBackend::from_json(json!({
            "events": [
                { "id": 1, "name": "Gala", "organization_id": 7 },
                { "id": 2, "name": "Brunch", "organization_id": 8 },
                { "id": 3, "name": "Auction", "organization_id": 7 }
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_next_id() {
        let backend = seeded();
        let created = backend
            .create("events", record(json!({ "name": "Picnic" })), None)
            .await
            .unwrap();
        assert_eq!(created.get("id"), Some(&json!(4)));
        assert!(created.contains_key("created_at"));
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let backend = seeded();
        let result = backend
            .create("events", record(json!({ "id": 1, "name": "Again" })), None)
            .await;
        assert!(matches!(result, Err(AdminError::Backend(_))));
    }

    #[tokio::test]
    async fn test_list_filters_sorts_and_paginates() {
        let backend = seeded();
        let query = ListQuery {
            filters: vec![Filter::eq("organization_id", json!("7"))],
            sort: Some(Sort::asc("name")),
            pagination: Some(Pagination::new(1, 1)),
            projection: None,
        };
        let page = backend.list("events", &query).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].get("name"), Some(&json!("Auction")));
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() {
        let backend = seeded();
        let query = ListQuery {
            pagination: Some(Pagination::new(usize::MAX, 50)),
            ..Default::default()
        };
        let page = backend.list("events", &query).await.unwrap();
        assert_eq!(page.total, 3);
        assert!(page.rows.is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let backend = seeded();
        let updated = backend
            .update("events", "2", record(json!({ "name": "Late brunch" })), None)
            .await
            .unwrap();
        assert_eq!(updated.get("name"), Some(&json!("Late brunch")));
        assert_eq!(updated.get("id"), Some(&json!(2)));

        backend.delete_one("events", "2", None).await.unwrap();
        let missing = backend.get_one("events", "2", None).await;
        assert!(matches!(missing, Err(AdminError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_matching_operations() {
        let backend = seeded();
        let filters = [Filter::eq("organization_id", json!(7))];
        let updated = backend
            .update_matching("events", &filters, record(json!({ "flag": true })), None)
            .await
            .unwrap();
        assert_eq!(updated.len(), 2);

        let removed = backend.delete_matching("events", &filters, None).await.unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(backend.rows("events").await.len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure_and_call_count() {
        let backend = seeded();
        backend.fail_next("connection reset");
        let err = backend.get_one("events", "1", None).await.unwrap_err();
        assert_eq!(err.to_string(), "Backend error: connection reset");
        assert!(backend.get_one("events", "1", None).await.is_ok());
        assert_eq!(backend.call_count(), 2);
    }

    #[test]
    fn test_seed_must_be_object() {
        assert!(MemoryBackend::from_json(json!([])).is_err());
        assert!(MemoryBackend::from_json(json!({ "events": {} })).is_err());
    }
}
