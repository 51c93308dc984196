//! Composite-key resources
//!
//! `organization_members` rows are identified by `(organization_id, user_id)`
//! rather than an `id`. Screens address them with a colon-joined id such as
//! `org-1:user-2`; [`CompositeKeyBackend`] turns that id back into a
//! two-predicate filter before delegating to the wrapped backend. Every other
//! resource passes through unchanged.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::backend::{ListPage, RecordBackend};
use crate::error::AdminError;
use crate::query::{value_to_param, Filter, ListQuery};
use crate::schema::Record;

pub const MEMBERS_RESOURCE: &str = "organization_members";

const SEPARATOR: char = ':';

/// Parsed `organization_members` identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberKey {
    pub org_id: String,
    pub user_id: String,
}

impl MemberKey {
    pub fn filters(&self) -> Vec<Filter> {
        vec![
            Filter::eq("organization_id", Value::String(self.org_id.clone())),
            Filter::eq("user_id", Value::String(self.user_id.clone())),
        ]
    }
}

/// Split `"orgA:userB"` into its two parts
pub fn parse_composite_id(id: &str) -> Result<MemberKey, AdminError> {
    let invalid = |reason: &str| AdminError::InvalidCompositeId {
        id: id.to_string(),
        reason: reason.to_string(),
    };

    let (org_id, user_id) = id
        .split_once(SEPARATOR)
        .ok_or_else(|| invalid("expected '<organization_id>:<user_id>'"))?;
    if org_id.is_empty() {
        return Err(invalid("organization id is empty"));
    }
    if user_id.is_empty() {
        return Err(invalid("user id is empty"));
    }
    if user_id.contains(SEPARATOR) {
        return Err(invalid("too many ':' separators"));
    }

    Ok(MemberKey {
        org_id: org_id.to_string(),
        user_id: user_id.to_string(),
    })
}

/// Row identity extractor for `organization_members`
pub fn member_record_id(record: &Record) -> Option<String> {
    let org = record.get("organization_id").filter(|v| !v.is_null())?;
    let user = record.get("user_id").filter(|v| !v.is_null())?;
    Some(format!("{}{}{}", value_to_param(org), SEPARATOR, value_to_param(user)))
}

/// Backend wrapper translating composite ids into filters
pub struct CompositeKeyBackend<B> {
    inner: B,
}

impl<B: RecordBackend> CompositeKeyBackend<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }
}

fn is_composite(resource: &str) -> bool {
    resource == MEMBERS_RESOURCE
}

#[async_trait]
impl<B: RecordBackend> RecordBackend for CompositeKeyBackend<B> {
    async fn list(&self, resource: &str, query: &ListQuery) -> Result<ListPage, AdminError> {
        self.inner.list(resource, query).await
    }

    async fn get_one(
        &self,
        resource: &str,
        id: &str,
        projection: Option<&str>,
    ) -> Result<Record, AdminError> {
        if !is_composite(resource) {
            return self.inner.get_one(resource, id, projection).await;
        }

        let key = parse_composite_id(id)?;
        debug!(resource, org = %key.org_id, user = %key.user_id, "composite get_one");
        let query = ListQuery {
            filters: key.filters(),
            projection: projection.map(str::to_string),
            ..Default::default()
        };
        let page = self.inner.list(resource, &query).await?;
        page.rows.into_iter().next().ok_or_else(|| AdminError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        })
    }

    async fn create(
        &self,
        resource: &str,
        payload: Record,
        projection: Option<&str>,
    ) -> Result<Record, AdminError> {
        self.inner.create(resource, payload, projection).await
    }

    async fn update(
        &self,
        resource: &str,
        id: &str,
        payload: Record,
        projection: Option<&str>,
    ) -> Result<Record, AdminError> {
        if !is_composite(resource) {
            return self.inner.update(resource, id, payload, projection).await;
        }

        let key = parse_composite_id(id)?;
        debug!(resource, org = %key.org_id, user = %key.user_id, "composite update");
        let rows = self
            .inner
            .update_matching(resource, &key.filters(), payload, projection)
            .await?;
        rows.into_iter().next().ok_or_else(|| AdminError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        })
    }

    async fn delete_one(
        &self,
        resource: &str,
        id: &str,
        projection: Option<&str>,
    ) -> Result<Record, AdminError> {
        if !is_composite(resource) {
            return self.inner.delete_one(resource, id, projection).await;
        }

        let key = parse_composite_id(id)?;
        debug!(resource, org = %key.org_id, user = %key.user_id, "composite delete");
        let rows = self
            .inner
            .delete_matching(resource, &key.filters(), projection)
            .await?;
        rows.into_iter().next().ok_or_else(|| AdminError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        })
    }

    async fn update_matching(
        &self,
        resource: &str,
        filters: &[Filter],
        payload: Record,
        projection: Option<&str>,
    ) -> Result<Vec<Record>, AdminError> {
        self.inner
            .update_matching(resource, filters, payload, projection)
            .await
    }

    async fn delete_matching(
        &self,
        resource: &str,
        filters: &[Filter],
        projection: Option<&str>,
    ) -> Result<Vec<Record>, AdminError> {
        self.inner.delete_matching(resource, filters, projection).await
    }
}
