//! Record backend - generic CRUD keyed by resource name and record id
//!
//! The engine never talks to storage directly. Everything goes through
//! [`RecordBackend`], so the persistence layer can be swapped without
//! touching screens:
//!
//! ```text
//! Screens / FormOrchestrator
//!     ↓
//! CompositeKeyBackend  (organization_members id translation)
//!     ↓
//! RecordBackend impl   (MemoryBackend, HTTP client, ...)
//! ```

mod memory;

pub use memory::MemoryBackend;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AdminError;
use crate::query::{Filter, ListQuery};
use crate::schema::Record;

/// One page of `list` results
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListPage {
    pub rows: Vec<Record>,
    /// Matching rows before pagination
    pub total: usize,
}

/// Generic record operations
///
/// `projection` is a column-selection string passed through opaquely.
/// Implementations report failures as [`AdminError::Backend`] or
/// [`AdminError::NotFound`]; the engine surfaces them verbatim.
#[async_trait]
pub trait RecordBackend: Send + Sync {
    async fn list(&self, resource: &str, query: &ListQuery) -> Result<ListPage, AdminError>;

    async fn get_one(
        &self,
        resource: &str,
        id: &str,
        projection: Option<&str>,
    ) -> Result<Record, AdminError>;

    async fn create(
        &self,
        resource: &str,
        payload: Record,
        projection: Option<&str>,
    ) -> Result<Record, AdminError>;

    async fn update(
        &self,
        resource: &str,
        id: &str,
        payload: Record,
        projection: Option<&str>,
    ) -> Result<Record, AdminError>;

    async fn delete_one(
        &self,
        resource: &str,
        id: &str,
        projection: Option<&str>,
    ) -> Result<Record, AdminError>;

    /// Update every row matching all `filters`
    async fn update_matching(
        &self,
        resource: &str,
        filters: &[Filter],
        payload: Record,
        projection: Option<&str>,
    ) -> Result<Vec<Record>, AdminError>;

    /// Delete every row matching all `filters`
    async fn delete_matching(
        &self,
        resource: &str,
        filters: &[Filter],
        projection: Option<&str>,
    ) -> Result<Vec<Record>, AdminError>;
}

/// Shared backends, so tests can keep a handle on the inner store
#[async_trait]
impl<T: RecordBackend + ?Sized> RecordBackend for Arc<T> {
    async fn list(&self, resource: &str, query: &ListQuery) -> Result<ListPage, AdminError> {
        (**self).list(resource, query).await
    }

    async fn get_one(
        &self,
        resource: &str,
        id: &str,
        projection: Option<&str>,
    ) -> Result<Record, AdminError> {
        (**self).get_one(resource, id, projection).await
    }

    async fn create(
        &self,
        resource: &str,
        payload: Record,
        projection: Option<&str>,
    ) -> Result<Record, AdminError> {
        (**self).create(resource, payload, projection).await
    }

    async fn update(
        &self,
        resource: &str,
        id: &str,
        payload: Record,
        projection: Option<&str>,
    ) -> Result<Record, AdminError> {
        (**self).update(resource, id, payload, projection).await
    }

    async fn delete_one(
        &self,
        resource: &str,
        id: &str,
        projection: Option<&str>,
    ) -> Result<Record, AdminError> {
        (**self).delete_one(resource, id, projection).await
    }

    async fn update_matching(
        &self,
        resource: &str,
        filters: &[Filter],
        payload: Record,
        projection: Option<&str>,
    ) -> Result<Vec<Record>, AdminError> {
        (**self)
            .update_matching(resource, filters, payload, projection)
            .await
    }

    async fn delete_matching(
        &self,
        resource: &str,
        filters: &[Filter],
        projection: Option<&str>,
    ) -> Result<Vec<Record>, AdminError> {
        (**self).delete_matching(resource, filters, projection).await
    }
}
