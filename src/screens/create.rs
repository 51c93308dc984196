//! Generic create screen

use tracing::{info, warn};

use super::{form_capabilities, return_target, AdminContext, ScreenState};
use crate::error::AdminError;
use crate::form::FormOrchestrator;
use crate::locks::LockedFieldSet;
use crate::navigation::{NavigationContext, NavigationTarget};
use crate::options::{load_relation_options, MountGuard};
use crate::permissions::Capabilities;
use crate::renderer::{FormMode, Widget};
use crate::schema::ResourceSchema;
use crate::session::Session;

pub struct CreateScreen {
    schema: ResourceSchema,
    form: FormOrchestrator,
    nav: NavigationContext,
    capabilities: Capabilities,
    guard: MountGuard,
}

impl CreateScreen {
    /// Resolve locks from the navigation context before the first render,
    /// then load relation options
    pub async fn mount(
        ctx: &AdminContext,
        session: &Session,
        resource: &str,
        nav: NavigationContext,
    ) -> ScreenState<CreateScreen> {
        let schema = match ctx.schema(resource) {
            Ok(schema) => schema.clone(),
            Err(e) => return ScreenState::from_error(resource, e),
        };

        let locks = LockedFieldSet::for_create(&schema, &nav, session.active_organization());
        let capabilities = form_capabilities(session, &schema, &locks).await;
        let form = FormOrchestrator::new(schema.fields.clone(), FormMode::Create, None, locks)
            .with_permission(capabilities.can_create);

        let mut screen = Self {
            schema,
            form,
            nav,
            capabilities,
            guard: MountGuard::new(),
        };
        screen.load_options(ctx, session).await;
        info!(resource, mode = "create", "Screen mounted");
        ScreenState::Ready(screen)
    }

    pub async fn load_options(&mut self, ctx: &AdminContext, session: &Session) {
        let guard = self.guard.clone();
        let options = load_relation_options(
            &ctx.registry,
            ctx.backend.as_ref(),
            &self.schema.fields,
            session.active_organization(),
            ctx.config.relations.option_limit,
        )
        .await;
        self.form.apply_options(&guard, options);
    }

    /// Create the record and return where to navigate next
    pub async fn submit(&mut self, ctx: &AdminContext) -> Result<NavigationTarget, AdminError> {
        let backend = ctx.backend.clone();
        let resource = self.schema.name.clone();
        let projection = self.schema.projection.clone();

        let created = self
            .form
            .submit(move |payload| async move {
                backend
                    .create(&resource, payload, projection.as_deref())
                    .await
            })
            .await
            .inspect_err(|e| warn!(resource = %self.schema.name, "Create rejected: {}", e))?;

        info!(
            resource = %self.schema.name,
            id = ?self.schema.record_id(&created),
            "Record created"
        );
        Ok(return_target(&ctx.registry, &self.schema, &self.nav))
    }

    pub fn widgets(&self) -> Vec<Widget> {
        self.form.widgets()
    }

    pub fn form(&self) -> &FormOrchestrator {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormOrchestrator {
        &mut self.form
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    /// Handle for in-flight reads; see [`CreateScreen::unmount`]
    pub fn mount_guard(&self) -> MountGuard {
        self.guard.clone()
    }

    pub fn unmount(&self) {
        self.guard.unmount();
    }
}
