//! Bulk invitee import
//!
//! Upserts parsed rows into `invitees` by a natural key (default `email`).
//! Spreadsheet parsing happens upstream; rows arrive as JSON objects.
//!
//! ```text
//! rows ─> normalize key ─┬─ missing key ──────────> skipped
//!                        ├─ known in org ─ update ─> updated
//!                        └─ new ───────── create ─> inserted
//! ```
//!
//! Rows are processed in batches of `import.batch_size`. Row-level failures
//! are recorded in the report and never abort the run.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::backend::RecordBackend;
use crate::config::ImportSettings;
use crate::error::AdminError;
use crate::locks::coerce_param;
use crate::query::{value_to_param, Filter, ListQuery};
use crate::schema::{Record, ResourceSchema, SchemaRegistry};

const INVITEES: &str = "invitees";
const IMPORTS: &str = "imports";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// Zero-based position in the input
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: Vec<SkippedRow>,
    pub batches: usize,
}

impl ImportReport {
    pub fn processed(&self) -> usize {
        self.inserted + self.updated + self.skipped.len()
    }
}

pub struct InviteeImporter {
    backend: Arc<dyn RecordBackend>,
    schema: ResourceSchema,
    settings: ImportSettings,
}

impl InviteeImporter {
    pub fn new(
        registry: &SchemaRegistry,
        backend: Arc<dyn RecordBackend>,
        settings: ImportSettings,
    ) -> Result<Self, AdminError> {
        let schema = registry.require(INVITEES)?.clone();
        if schema.field(&settings.natural_key).is_none() {
            return Err(AdminError::Config(format!(
                "import natural key '{}' is not an invitee field",
                settings.natural_key
            )));
        }
        Ok(Self {
            backend,
            schema,
            settings,
        })
    }

    /// Upsert `rows` into the organization's invitees
    ///
    /// Fails only when the existing invitees cannot be read.
    pub async fn import(
        &self,
        rows: Vec<Value>,
        organization_id: &str,
    ) -> Result<ImportReport, AdminError> {
        let key = self.settings.natural_key.as_str();
        let org_key = self.schema.org_key.as_deref().unwrap_or("organization_id");
        let org_value = coerce_param(self.schema.field(org_key), organization_id);

        let existing = self
            .backend
            .list(
                INVITEES,
                &ListQuery::filtered(vec![Filter::eq(org_key, org_value.clone())]),
            )
            .await?;
        let mut known: HashMap<String, String> = existing
            .rows
            .iter()
            .filter_map(|row| {
                let natural = normalize(row.get(key)?)?;
                Some((natural, self.schema.record_id(row)?))
            })
            .collect();
        debug!(org = organization_id, existing = known.len(), "Loaded existing invitees");

        let mut report = ImportReport::default();
        let total = rows.len();
        let batch_size = self.settings.batch_size.max(1);

        for (batch_index, batch) in rows.chunks(batch_size).enumerate() {
            let offset = batch_index * batch_size;
            for (i, row) in batch.iter().enumerate() {
                let index = offset + i;
                match self.upsert(row, key, org_key, &org_value, &mut known).await {
                    Ok(Outcome::Inserted) => report.inserted += 1,
                    Ok(Outcome::Updated) => report.updated += 1,
                    Err(reason) => {
                        debug!(row = index, "Skipping import row: {}", reason);
                        report.skipped.push(SkippedRow { row: index, reason });
                    }
                }
            }
            report.batches += 1;
            info!(
                batch = report.batches,
                processed = report.processed(),
                total,
                "Import batch complete"
            );
        }

        info!(
            org = organization_id,
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped.len(),
            "Invitee import finished"
        );
        Ok(report)
    }

    async fn upsert(
        &self,
        row: &Value,
        key: &str,
        org_key: &str,
        org_value: &Value,
        known: &mut HashMap<String, String>,
    ) -> Result<Outcome, String> {
        let Value::Object(raw) = row else {
            return Err("row is not an object".to_string());
        };
        let natural = raw
            .get(key)
            .and_then(normalize)
            .ok_or_else(|| format!("missing {}", key))?;

        let mut payload = Record::new();
        for (column, value) in raw {
            if self.schema.field(column).is_some() {
                payload.insert(column.clone(), value.clone());
            } else {
                debug!(column = %column, "Dropping unknown import column");
            }
        }
        payload.insert(key.to_string(), Value::String(natural.clone()));
        payload.insert(org_key.to_string(), org_value.clone());

        match known.get(&natural) {
            Some(id) => {
                self.backend
                    .update(INVITEES, id, payload, None)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(Outcome::Updated)
            }
            None => {
                let created = self
                    .backend
                    .create(INVITEES, payload, None)
                    .await
                    .map_err(|e| e.to_string())?;
                if let Some(id) = self.schema.record_id(&created) {
                    known.insert(natural, id);
                }
                Ok(Outcome::Inserted)
            }
        }
    }

    /// Keep an `imports` row describing a finished run
    pub async fn record_run(
        &self,
        organization_id: &str,
        file_name: &str,
        report: &ImportReport,
    ) -> Result<Record, AdminError> {
        let mut payload = Record::new();
        payload.insert(
            "organization_id".into(),
            coerce_param(None, organization_id),
        );
        payload.insert("file_name".into(), json!(file_name));
        payload.insert("status".into(), json!("done"));
        payload.insert("report".into(), serde_json::to_value(report)?);

        self.backend
            .create(IMPORTS, payload, None)
            .await
            .inspect_err(|e| warn!(file = file_name, "Failed to record import run: {}", e))
    }
}

enum Outcome {
    Inserted,
    Updated,
}

/// Lowercased, trimmed natural key; `None` when blank
fn normalize(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_lowercase(),
        Value::Null => return None,
        other => value_to_param(other).trim().to_lowercase(),
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::schema::catalog::default_registry;

    fn importer(batch_size: usize) -> (InviteeImporter, Arc<MemoryBackend>) {
        let memory = Arc::new(
            MemoryBackend::from_json(json!({
                "invitees": [
                    { "id": 1, "email": "ada@example.com", "name": "Ada", "organization_id": 7 },
                    { "id": 2, "email": "bob@example.com", "name": "Bob", "organization_id": 8 }
                ]
            }))
            .unwrap(),
        );
        let settings = ImportSettings {
            batch_size,
            ..Default::default()
        };
        let importer =
            InviteeImporter::new(&default_registry().unwrap(), memory.clone(), settings).unwrap();
        (importer, memory)
    }

    #[tokio::test]
    async fn test_upsert_by_normalized_email() {
        let (importer, memory) = importer(2);
        let rows = vec![
            json!({ "email": "  ADA@example.com ", "name": "Ada Lovelace" }),
            json!({ "email": "bob@example.com", "name": "Bob in org 7" }),
            json!({ "name": "No email" }),
            json!({ "email": "bob@example.com", "phone": "555" }),
            json!("not an object"),
        ];

        let report = importer.import(rows, "7").await.unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.updated, 2);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0], SkippedRow { row: 2, reason: "missing email".into() });
        assert_eq!(report.skipped[1].row, 4);
        assert_eq!(report.batches, 3);

        let rows = memory.rows("invitees").await;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("name"), Some(&json!("Ada Lovelace")));
        // the org 8 invitee is untouched
        assert_eq!(rows[1].get("name"), Some(&json!("Bob")));
        assert_eq!(rows[2].get("organization_id"), Some(&json!(7)));
        assert_eq!(rows[2].get("phone"), Some(&json!("555")));
    }

    #[tokio::test]
    async fn test_unknown_columns_dropped() {
        let (importer, memory) = importer(10);
        importer
            .import(vec![json!({ "email": "c@example.com", "shoe_size": 44 })], "7")
            .await
            .unwrap();
        let rows = memory.rows("invitees").await;
        assert!(!rows[2].contains_key("shoe_size"));
    }

    #[tokio::test]
    async fn test_backend_failure_skips_row() {
        let (importer, memory) = importer(10);
        let report = importer
            .import(vec![json!({ "email": "c@example.com" })], "7")
            .await
            .unwrap();
        assert_eq!(report.inserted, 1);

        memory.fail_next("connection reset");
        assert!(importer.import(vec![], "7").await.is_err());
    }

    #[tokio::test]
    async fn test_record_run() {
        let (importer, memory) = importer(10);
        let report = ImportReport {
            inserted: 1,
            ..Default::default()
        };
        importer.record_run("7", "guests.xlsx", &report).await.unwrap();
        let runs = memory.rows("imports").await;
        assert_eq!(runs[0].get("status"), Some(&json!("done")));
        assert_eq!(runs[0]["report"]["inserted"], json!(1));
    }

    #[test]
    fn test_bad_natural_key() {
        let memory = Arc::new(MemoryBackend::new());
        let settings = ImportSettings {
            natural_key: "shoe_size".into(),
            ..Default::default()
        };
        assert!(InviteeImporter::new(&default_registry().unwrap(), memory, settings).is_err());
    }
}
