//! Relation option loading
//!
//! Every relation field on a form needs the target resource's rows as select
//! options. The fetches are independent and run concurrently; each failure
//! degrades that one field to an empty option list. Results reach the form
//! through a [`MountGuard`] so a screen torn down mid-fetch ignores them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::RecordBackend;
use crate::query::{Filter, ListQuery, Pagination, Sort};
use crate::schema::{FieldSchema, Projection, Relation, SchemaRegistry, SelectOption};

/// Shared "still mounted" flag between a screen and its in-flight reads
#[derive(Debug, Clone)]
pub struct MountGuard {
    mounted: Arc<AtomicBool>,
}

impl Default for MountGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl MountGuard {
    pub fn new() -> Self {
        Self {
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }
}

/// Options per field key
pub type OptionMap = HashMap<String, Vec<SelectOption>>;

/// Fetch options for every relation field in `fields`
///
/// Targets scoped by organization are filtered to `active_organization`.
/// Relations whose target has no schema yield no options.
pub async fn load_relation_options(
    registry: &SchemaRegistry,
    backend: &dyn RecordBackend,
    fields: &[FieldSchema],
    active_organization: Option<&str>,
    limit: usize,
) -> OptionMap {
    let requests = fields.iter().filter_map(|field| {
        let relation = field.relation.as_ref()?;
        Some(fetch_options(
            registry,
            backend,
            field.key.as_str(),
            relation,
            active_organization,
            limit,
        ))
    });

    join_all(requests).await.into_iter().collect()
}

async fn fetch_options(
    registry: &SchemaRegistry,
    backend: &dyn RecordBackend,
    key: &str,
    relation: &Relation,
    active_organization: Option<&str>,
    limit: usize,
) -> (String, Vec<SelectOption>) {
    let Some(target) = registry.get(&relation.resource) else {
        warn!(field = key, target = %relation.resource, "Relation target not configured");
        return (key.to_string(), Vec::new());
    };

    let mut query = ListQuery {
        pagination: Some(Pagination::new(1, limit)),
        ..Default::default()
    };
    if let (Some(org_key), Some(org)) = (&target.org_key, active_organization) {
        query
            .filters
            .push(Filter::eq(org_key, Value::String(org.to_string())));
    }
    if let Projection::Field(label) = &relation.label {
        query.sort = Some(Sort::asc(label));
    }

    match backend.list(&relation.resource, &query).await {
        Ok(page) => {
            debug!(field = key, target = %relation.resource, count = page.rows.len(), "Loaded relation options");
            let options = page.rows.iter().map(|row| relation.option_for(row)).collect();
            (key.to_string(), options)
        }
        Err(e) => {
            warn!(field = key, target = %relation.resource, "Failed to load relation options: {}", e);
            (key.to_string(), Vec::new())
        }
    }
}
