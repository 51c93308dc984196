//! Generic list / create / edit screens
//!
//! One implementation per screen kind, parameterized by the resource name
//! taken from the route. Every screen degrades to an inline state instead
//! of failing:
//!
//! ```text
//! route ─> registry lookup ─┬─ missing ──────────> ScreenState::NotConfigured
//!                           ├─ list w/o columns ─> ScreenState::MissingList
//!                           ├─ record load fails > ScreenState::Unavailable
//!                           └─ ok ───────────────> ScreenState::Ready(screen)
//! ```

mod create;
mod edit;
mod list;

pub use create::CreateScreen;
pub use edit::EditScreen;
pub use list::{permanent_filter, ListColumn, ListRow, ListScreen, RowAction};

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::backend::RecordBackend;
use crate::composite::CompositeKeyBackend;
use crate::config::AdminConfig;
use crate::error::AdminError;
use crate::locks::LockedFieldSet;
use crate::navigation::{NavigationContext, NavigationTarget};
use crate::notification::Notification;
use crate::permissions::Capabilities;
use crate::query::value_to_param;
use crate::schema::{ResourceSchema, SchemaRegistry};
use crate::session::Session;

/// Everything a screen needs besides the session
#[derive(Clone)]
pub struct AdminContext {
    pub registry: Arc<SchemaRegistry>,
    pub backend: Arc<dyn RecordBackend>,
    pub config: AdminConfig,
}

impl AdminContext {
    /// Wraps `backend` in the composite-key translation layer
    pub fn new<B: RecordBackend + 'static>(
        registry: SchemaRegistry,
        backend: B,
        config: AdminConfig,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            backend: Arc::new(CompositeKeyBackend::new(backend)),
            config,
        }
    }

    pub fn schema(&self, resource: &str) -> Result<&ResourceSchema, AdminError> {
        self.registry.require(resource).inspect_err(|_| {
            warn!(resource, "Resource not configured");
        })
    }
}

/// Outcome of mounting a screen
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScreenState<T> {
    Ready(T),
    /// No schema for the requested resource (404-style)
    NotConfigured { resource: String, message: String },
    /// List requested for a schema without list configuration
    MissingList { resource: String, message: String },
    /// The screen's data could not be loaded
    Unavailable {
        resource: String,
        notification: Notification,
    },
}

impl<T> ScreenState<T> {
    pub(crate) fn from_error(resource: &str, err: AdminError) -> Self {
        match err {
            AdminError::NotConfigured(_) => ScreenState::NotConfigured {
                resource: resource.to_string(),
                message: format!("The resource '{}' is not configured.", resource),
            },
            AdminError::MissingListConfig(_) => ScreenState::MissingList {
                resource: resource.to_string(),
                message: format!("The resource '{}' has no list view configured.", resource),
            },
            other => ScreenState::Unavailable {
                resource: resource.to_string(),
                notification: Notification::from_error(&other),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ScreenState::Ready(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ScreenState::Ready(screen) => Some(screen),
            _ => None,
        }
    }

    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match self {
            ScreenState::Ready(screen) => Some(screen),
            _ => None,
        }
    }

    pub fn into_ready(self) -> Option<T> {
        match self {
            ScreenState::Ready(screen) => Some(screen),
            _ => None,
        }
    }
}

/// Capabilities in the organization a form writes to
///
/// A locked org key may name a different organization than the session's
/// active one (`?organizationId=`, or the record being edited); the caller's
/// role there is what counts.
pub(crate) async fn form_capabilities(
    session: &Session,
    schema: &ResourceSchema,
    locks: &LockedFieldSet,
) -> Capabilities {
    let target_org = schema
        .org_key
        .as_deref()
        .and_then(|key| locks.get(key))
        .filter(|value| !value.is_null())
        .map(value_to_param);
    match target_org {
        Some(org) => {
            if session.active_organization() != Some(org.as_str()) {
                debug!(resource = %schema.name, org = %org, "Checking access in locked organization");
            }
            session.capabilities_in(schema, Some(&org)).await
        }
        None => session.capabilities(schema).await,
    }
}

/// Where to go after a successful save
///
/// The group page when the resource belongs to one (on the caller's tab, or
/// the resource's own tab), else the list route. Tab, view, organization and
/// filter from the caller are re-attached.
pub fn return_target(
    registry: &SchemaRegistry,
    schema: &ResourceSchema,
    nav: &NavigationContext,
) -> NavigationTarget {
    let mut context = nav.preserved();
    match registry.group_of(&schema.name) {
        Some(group) => {
            if context.tab.is_none() {
                context.tab = Some(schema.name.clone());
            }
            NavigationTarget::new(group.route.clone(), context)
        }
        None => NavigationTarget::new(schema.routes.list.clone(), context),
    }
}
