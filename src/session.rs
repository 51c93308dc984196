//! Signed-in staff session
//!
//! Owns the active organization and the [`PermissionCache`]. Nothing about
//! permissions is process-wide; a new session starts with an empty cache and
//! [`Session::sign_out`] empties it.

use std::sync::Arc;

use tracing::{info, warn};

use crate::permissions::{Access, AccessOracle, Capabilities, PermissionCache};
use crate::schema::ResourceSchema;

pub struct Session {
    user_id: Option<String>,
    active_organization: Option<String>,
    permissions: PermissionCache,
}

impl Session {
    pub fn new(user_id: &str, oracle: Arc<dyn AccessOracle>) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            active_organization: None,
            permissions: PermissionCache::new(oracle),
        }
    }

    pub fn with_organization(mut self, organization_id: &str) -> Self {
        self.active_organization = Some(organization_id.to_string());
        self
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn active_organization(&self) -> Option<&str> {
        self.active_organization.as_deref()
    }

    pub fn switch_organization(&mut self, organization_id: Option<&str>) {
        self.active_organization = organization_id.map(str::to_string);
    }

    pub fn is_signed_in(&self) -> bool {
        self.user_id.is_some()
    }

    /// Access in the active organization; oracle failures deny
    pub async fn access(&self) -> Access {
        self.access_in(self.active_organization.as_deref()).await
    }

    /// Access in a specific organization, which may differ from the active one
    pub async fn access_in(&self, organization_id: Option<&str>) -> Access {
        let Some(user) = &self.user_id else {
            return Access::none();
        };
        match self.permissions.access(user, organization_id).await {
            Ok(access) => access,
            Err(e) => {
                warn!(user = %user, "Access check failed, denying: {}", e);
                Access::none()
            }
        }
    }

    pub async fn capabilities(&self, schema: &ResourceSchema) -> Capabilities {
        self.access().await.capabilities(schema)
    }

    pub async fn capabilities_in(
        &self,
        schema: &ResourceSchema,
        organization_id: Option<&str>,
    ) -> Capabilities {
        self.access_in(organization_id).await.capabilities(schema)
    }

    pub fn permissions(&self) -> &PermissionCache {
        &self.permissions
    }

    pub fn sign_out(&mut self) {
        if let Some(user) = self.user_id.take() {
            info!(user = %user, "Signed out");
        }
        self.active_organization = None;
        self.permissions.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{Role, StaticAccessOracle};

    #[tokio::test]
    async fn test_access_in_active_organization() {
        let oracle = Arc::new(StaticAccessOracle::new().with_role("u1", "7", Role::Admin));
        let mut session = Session::new("u1", oracle).with_organization("7");
        assert_eq!(session.access().await, Access::member(Role::Admin));

        session.switch_organization(Some("8"));
        assert_eq!(session.access().await, Access::none());
    }

    #[tokio::test]
    async fn test_sign_out_invalidates_cache() {
        let oracle = Arc::new(StaticAccessOracle::new().with_platform_admin("u1"));
        let mut session = Session::new("u1", oracle);
        assert!(session.access().await.platform_admin);
        assert_eq!(session.permissions().len(), 1);

        session.sign_out();
        assert!(!session.is_signed_in());
        assert!(session.permissions().is_empty());
        assert_eq!(session.access().await, Access::none());
    }
}
