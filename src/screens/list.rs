//! Generic list screen

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{AdminContext, ScreenState};
use crate::error::AdminError;
use crate::navigation::{NavigationContext, NavigationTarget};
use crate::notification::Notification;
use crate::permissions::Capabilities;
use crate::query::{Filter, ListQuery, Pagination};
use crate::schema::{ColumnSchema, Record, ResourceSchema};
use crate::session::Session;

/// Filter pinning an org-scoped resource to the active organization
///
/// `None` when the resource is not org-scoped or no organization is active.
pub fn permanent_filter(schema: &ResourceSchema, active_organization: Option<&str>) -> Option<Filter> {
    let key = schema.org_key.as_deref()?;
    let org = active_organization?;
    Some(Filter::eq(key, Value::String(org.to_string())))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListColumn {
    pub key: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowAction {
    Edit,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListRow {
    /// Row identity; `None` when the row carries no usable id
    pub id: Option<String>,
    pub cells: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_url: Option<String>,
    #[serde(skip)]
    pub record: Record,
}

#[derive(Debug, Serialize)]
pub struct ListScreen {
    pub resource: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permanent_filter: Option<Filter>,
    pub query: ListQuery,
    pub columns: Vec<ListColumn>,
    /// Trailing actions column
    pub actions: Vec<RowAction>,
    pub capabilities: Capabilities,
    pub rows: Vec<ListRow>,
    pub total: usize,
    pub notifications: Vec<Notification>,
    #[serde(skip)]
    nav: NavigationContext,
    #[serde(skip)]
    schema: ResourceSchema,
}

impl ListScreen {
    /// Resolve the resource, build its query and load the first page
    pub async fn mount(
        ctx: &AdminContext,
        session: &Session,
        resource: &str,
        nav: NavigationContext,
    ) -> ScreenState<ListScreen> {
        match Self::build(ctx, session, resource, nav).await {
            Ok(mut screen) => {
                info!(resource, mode = "list", "Screen mounted");
                screen.load(ctx).await;
                ScreenState::Ready(screen)
            }
            Err(e) => ScreenState::from_error(resource, e),
        }
    }

    async fn build(
        ctx: &AdminContext,
        session: &Session,
        resource: &str,
        nav: NavigationContext,
    ) -> Result<Self, AdminError> {
        let schema = ctx.schema(resource)?.clone();
        let Some(list) = &schema.list else {
            warn!(resource, "List requested for resource without list configuration");
            return Err(AdminError::MissingListConfig(resource.to_string()));
        };

        let permanent = permanent_filter(&schema, session.active_organization());
        let mut filters: Vec<Filter> = permanent.iter().cloned().collect();
        filters.extend(list.initial_filters.iter().cloned());
        if let Some(triple) = &nav.filter {
            filters.push(triple.to_filter(schema.field(&triple.field)));
        }

        let page_size = list.page_size.unwrap_or(ctx.config.list.page_size);
        let query = ListQuery {
            filters,
            sort: list.initial_sort.clone(),
            pagination: Some(Pagination::new(1, page_size)),
            projection: schema.projection.clone(),
        };

        let capabilities = session.capabilities(&schema).await;
        let mut actions = vec![RowAction::Edit];
        if schema.deletable && capabilities.can_delete {
            actions.push(RowAction::Delete);
        }

        Ok(Self {
            resource: schema.name.clone(),
            label: schema.label.clone(),
            permanent_filter: permanent,
            query,
            columns: list.columns.iter().map(column).collect(),
            actions,
            capabilities,
            rows: Vec::new(),
            total: 0,
            notifications: Vec::new(),
            nav,
            schema,
        })
    }

    /// (Re)load the current page; failures leave an empty table and a
    /// notification
    pub async fn load(&mut self, ctx: &AdminContext) {
        match ctx.backend.list(&self.resource, &self.query).await {
            Ok(page) => {
                debug!(resource = %self.resource, rows = page.rows.len(), total = page.total, "Loaded list page");
                self.total = page.total;
                self.rows = page
                    .rows
                    .into_iter()
                    .map(|record| self.row(record, &ctx.config.list.datetime_format))
                    .collect();
            }
            Err(e) => {
                warn!(resource = %self.resource, "Failed to load list: {}", e);
                self.rows.clear();
                self.total = 0;
                self.notifications.push(Notification::from_error(&e));
            }
        }
    }

    pub async fn go_to_page(&mut self, ctx: &AdminContext, page: usize) {
        let per_page = self
            .query
            .pagination
            .map(|p| p.per_page)
            .unwrap_or(ctx.config.list.page_size);
        self.query.pagination = Some(Pagination::new(page, per_page));
        self.load(ctx).await;
    }

    fn row(&self, record: Record, datetime_format: &str) -> ListRow {
        let id = self.schema.record_id(&record);
        let cells = self
            .schema
            .list
            .iter()
            .flat_map(|list| list.columns.iter())
            .map(|c| c.format(&record, datetime_format))
            .collect();
        let edit_url = id.as_deref().map(|id| {
            NavigationTarget::new(self.schema.routes.edit_path(id), self.nav.preserved()).to_url()
        });
        ListRow {
            id,
            cells,
            edit_url,
            record,
        }
    }

    /// Create link carrying the caller's context (organization, parent ids)
    pub fn create_target(&self) -> NavigationTarget {
        NavigationTarget::new(self.schema.routes.create.clone(), self.nav.clone())
    }

    /// Delete one row and reload
    pub async fn delete(&mut self, ctx: &AdminContext, id: &str) -> Result<(), AdminError> {
        if !self.actions.contains(&RowAction::Delete) {
            let err = AdminError::PermissionDenied(format!("cannot delete {} rows", self.label));
            warn!(resource = %self.resource, id, "Refusing delete: {}", err);
            self.notifications.push(Notification::from_error(&err));
            return Err(err);
        }

        match ctx
            .backend
            .delete_one(&self.resource, id, self.schema.projection.as_deref())
            .await
        {
            Ok(_) => {
                info!(resource = %self.resource, id, "Record deleted");
                self.notifications.push(Notification::success("Deleted"));
                self.load(ctx).await;
                Ok(())
            }
            Err(e) => {
                warn!(resource = %self.resource, id, "Delete failed: {}", e);
                self.notifications.push(Notification::from_error(&e));
                Err(e)
            }
        }
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }
}

fn column(c: &ColumnSchema) -> ListColumn {
    ListColumn {
        key: c.key.clone(),
        title: c.title.clone(),
        width: c.width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::config::AdminConfig;
    use crate::permissions::{Role, StaticAccessOracle};
    use crate::query::FilterOperator;
    use crate::schema::catalog::default_registry;
    use serde_json::json;
    use std::sync::Arc;

    fn context() -> AdminContext {
        let backend = MemoryBackend::from_json(json!({
            "events": [
                { "id": 1, "name": "Gala", "organization_id": 7, "status": "published" },
                { "id": 2, "name": "Brunch", "organization_id": 8, "status": "published" },
                { "id": 3, "name": "Old", "organization_id": 7, "status": "archived" }
            ],
            "organization_members": [
                { "organization_id": "7", "user_id": "u1", "role": "owner" }
            ]
        }))
        .unwrap();
        AdminContext::new(default_registry().unwrap(), backend, AdminConfig::default())
    }

    fn session(role: Role) -> Session {
        let oracle = Arc::new(StaticAccessOracle::new().with_role("u1", "7", role));
        Session::new("u1", oracle).with_organization("7")
    }

    #[tokio::test]
    async fn test_org_scoped_list() {
        let ctx = context();
        let state = ListScreen::mount(&ctx, &session(Role::Owner), "events", NavigationContext::default()).await;
        let screen = state.ready().unwrap();

        assert_eq!(
            screen.permanent_filter,
            Some(Filter::eq("organization_id", json!("7")))
        );
        // archived rows are hidden by the configured initial filter
        assert_eq!(screen.total, 1);
        assert_eq!(screen.rows[0].id.as_deref(), Some("1"));
        assert_eq!(screen.actions, vec![RowAction::Edit, RowAction::Delete]);
    }

    #[tokio::test]
    async fn test_navigation_filter_applied() {
        let ctx = context();
        let nav = NavigationContext::from_query(
            "filters[0][field]=name&filters[0][operator]=contains&filters[0][value]=Ga",
        )
        .unwrap();
        let state = ListScreen::mount(&ctx, &session(Role::Owner), "events", nav).await;
        let screen = state.ready().unwrap();
        assert!(screen
            .query
            .filters
            .iter()
            .any(|f| f.operator == FilterOperator::Contains));
        assert_eq!(screen.total, 1);
    }

    #[tokio::test]
    async fn test_numeric_navigation_filter() {
        let backend = MemoryBackend::from_json(json!({
            "events": [
                { "id": 1, "name": "Gala", "organization_id": 7, "capacity": 50 },
                { "id": 2, "name": "Supper", "organization_id": 7, "capacity": 8 }
            ]
        }))
        .unwrap();
        let ctx = AdminContext::new(default_registry().unwrap(), backend, AdminConfig::default());
        let nav = NavigationContext::from_query(
            "filters[0][field]=capacity&filters[0][operator]=gt&filters[0][value]=10",
        )
        .unwrap();

        let state = ListScreen::mount(&ctx, &session(Role::Owner), "events", nav).await;
        let screen = state.ready().unwrap();
        assert_eq!(screen.total, 1);
        assert_eq!(screen.rows[0].id.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_composite_rows_use_extractor() {
        let ctx = context();
        let state = ListScreen::mount(
            &ctx,
            &session(Role::Owner),
            "organization_members",
            NavigationContext::default(),
        )
        .await;
        let screen = state.ready().unwrap();
        assert_eq!(screen.rows[0].id.as_deref(), Some("7:u1"));
        assert_eq!(
            screen.rows[0].edit_url.as_deref(),
            Some("/organization_members/edit/7%3Au1")
        );
    }

    #[tokio::test]
    async fn test_delete_omitted_for_editor() {
        let ctx = context();
        let mut state = ListScreen::mount(&ctx, &session(Role::Editor), "events", NavigationContext::default()).await;
        let screen = state.ready_mut().unwrap();
        assert_eq!(screen.actions, vec![RowAction::Edit]);
        assert!(matches!(
            screen.delete(&ctx, "1").await,
            Err(AdminError::PermissionDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_reloads() {
        let ctx = context();
        let mut state = ListScreen::mount(&ctx, &session(Role::Owner), "events", NavigationContext::default()).await;
        let screen = state.ready_mut().unwrap();
        screen.delete(&ctx, "1").await.unwrap();
        assert_eq!(screen.total, 0);
    }

    #[tokio::test]
    async fn test_unknown_and_unlisted_resources() {
        let ctx = context();
        let state = ListScreen::mount(&ctx, &session(Role::Owner), "ghosts", NavigationContext::default()).await;
        assert!(matches!(state, ScreenState::NotConfigured { .. }));

        let state = ListScreen::mount(
            &ctx,
            &session(Role::Owner),
            "announcement_translations",
            NavigationContext::default(),
        )
        .await;
        assert!(matches!(state, ScreenState::MissingList { .. }));
    }
}
