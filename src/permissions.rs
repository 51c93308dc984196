//! Permission roles, capabilities and the access-oracle cache
//!
//! The policy itself lives outside this crate behind [`AccessOracle`]. The
//! engine only consumes its answer: a platform-admin flag and an optional
//! role within the active organization. [`Access::capabilities`] turns that
//! into per-resource action flags plus a warning banner.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AdminError;
use crate::schema::ResourceSchema;

/// Role within an organization, ordered by privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer = 0,
    Editor = 1,
    Admin = 2,
    Owner = 3,
}

impl Role {
    pub fn parse(s: &str) -> Result<Self, AdminError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viewer" => Ok(Role::Viewer),
            "editor" => Ok(Role::Editor),
            "admin" => Ok(Role::Admin),
            "owner" => Ok(Role::Owner),
            other => Err(AdminError::Config(format!("unknown role '{}'", other))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Viewer => write!(f, "viewer"),
            Role::Editor => write!(f, "editor"),
            Role::Admin => write!(f, "admin"),
            Role::Owner => write!(f, "owner"),
        }
    }
}

/// What the oracle says about one user in one organization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Access {
    pub platform_admin: bool,
    pub role: Option<Role>,
}

/// Action flags for one resource screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
}

impl Capabilities {
    pub fn full() -> Self {
        Self {
            can_create: true,
            can_edit: true,
            can_delete: true,
            banner: None,
        }
    }

    pub fn read_only(banner: impl Into<String>) -> Self {
        Self {
            can_create: false,
            can_edit: false,
            can_delete: false,
            banner: Some(banner.into()),
        }
    }
}

impl Access {
    pub fn platform_admin() -> Self {
        Self {
            platform_admin: true,
            role: None,
        }
    }

    pub fn member(role: Role) -> Self {
        Self {
            platform_admin: false,
            role: Some(role),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn capabilities(&self, schema: &ResourceSchema) -> Capabilities {
        let mut caps = if self.platform_admin {
            Capabilities::full()
        } else if schema.requires_platform_admin {
            Capabilities::read_only(format!(
                "Only platform administrators can modify {}",
                schema.label
            ))
        } else {
            match self.role {
                None => Capabilities::read_only("You are not a member of this organization"),
                Some(Role::Viewer) => Capabilities::read_only("You have read-only access"),
                Some(Role::Editor) => Capabilities {
                    can_create: true,
                    can_edit: true,
                    can_delete: false,
                    banner: None,
                },
                Some(Role::Admin) | Some(Role::Owner) => Capabilities::full(),
            }
        };
        caps.can_delete &= schema.deletable;
        caps
    }
}

// ============================================================================
// Oracle
// ============================================================================

/// External permission check
#[async_trait]
pub trait AccessOracle: Send + Sync {
    async fn access(
        &self,
        user_id: &str,
        organization_id: Option<&str>,
    ) -> Result<Access, AdminError>;
}

/// Fixed answers, for the CLI and tests
#[derive(Debug, Default)]
pub struct StaticAccessOracle {
    platform_admins: HashSet<String>,
    roles: HashMap<(String, String), Role>,
    calls: AtomicUsize,
}

impl StaticAccessOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_platform_admin(mut self, user_id: &str) -> Self {
        self.platform_admins.insert(user_id.to_string());
        self
    }

    pub fn with_role(mut self, user_id: &str, organization_id: &str, role: Role) -> Self {
        self.roles
            .insert((user_id.to_string(), organization_id.to_string()), role);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccessOracle for StaticAccessOracle {
    async fn access(
        &self,
        user_id: &str,
        organization_id: Option<&str>,
    ) -> Result<Access, AdminError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let role = organization_id.and_then(|org| {
            self.roles
                .get(&(user_id.to_string(), org.to_string()))
                .copied()
        });
        Ok(Access {
            platform_admin: self.platform_admins.contains(user_id),
            role,
        })
    }
}

// ============================================================================
// Cache
// ============================================================================

type CacheKey = (String, Option<String>);

/// Session-owned cache in front of an [`AccessOracle`]
///
/// Entries live until [`PermissionCache::invalidate`]; oracle errors are
/// not cached.
pub struct PermissionCache {
    oracle: Arc<dyn AccessOracle>,
    entries: DashMap<CacheKey, Access>,
}

impl PermissionCache {
    pub fn new(oracle: Arc<dyn AccessOracle>) -> Self {
        Self {
            oracle,
            entries: DashMap::new(),
        }
    }

    pub async fn access(
        &self,
        user_id: &str,
        organization_id: Option<&str>,
    ) -> Result<Access, AdminError> {
        let key = (user_id.to_string(), organization_id.map(str::to_string));
        if let Some(hit) = self.entries.get(&key) {
            return Ok(*hit);
        }

        let access = self.oracle.access(user_id, organization_id).await?;
        debug!(user = user_id, org = ?organization_id, ?access, "Cached access");
        self.entries.insert(key, access);
        Ok(access)
    }

    pub fn invalidate(&self) {
        let dropped = self.entries.len();
        self.entries.clear();
        debug!(dropped, "Permission cache invalidated");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
