//! Generic edit screen

use tracing::{info, warn};

use super::{form_capabilities, return_target, AdminContext, ScreenState};
use crate::error::AdminError;
use crate::form::FormOrchestrator;
use crate::locks::LockedFieldSet;
use crate::navigation::{NavigationContext, NavigationTarget};
use crate::options::{load_relation_options, MountGuard};
use crate::permissions::Capabilities;
use crate::renderer::{FormMode, Widget};
use crate::schema::{Record, ResourceSchema};
use crate::session::Session;

pub struct EditScreen {
    schema: ResourceSchema,
    id: String,
    record: Record,
    form: FormOrchestrator,
    nav: NavigationContext,
    capabilities: Capabilities,
    guard: MountGuard,
}

impl EditScreen {
    /// Load the record, lock its org and translation keys, load options
    pub async fn mount(
        ctx: &AdminContext,
        session: &Session,
        resource: &str,
        id: &str,
        nav: NavigationContext,
    ) -> ScreenState<EditScreen> {
        let schema = match ctx.schema(resource) {
            Ok(schema) => schema.clone(),
            Err(e) => return ScreenState::from_error(resource, e),
        };

        let record = match ctx
            .backend
            .get_one(resource, id, schema.projection.as_deref())
            .await
        {
            Ok(record) => record,
            Err(e) => {
                warn!(resource, id, "Failed to load record: {}", e);
                return ScreenState::from_error(resource, e);
            }
        };

        let locks = LockedFieldSet::for_edit(&schema, &record);
        let capabilities = form_capabilities(session, &schema, &locks).await;
        let form = FormOrchestrator::new(
            schema.fields.clone(),
            FormMode::Edit,
            Some(&record),
            locks,
        )
        .with_permission(capabilities.can_edit);

        let mut screen = Self {
            schema,
            id: id.to_string(),
            record,
            form,
            nav,
            capabilities,
            guard: MountGuard::new(),
        };
        screen.load_options(ctx, session).await;
        info!(resource, id, mode = "edit", "Screen mounted");
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

    /// Update the record; on success return to the caller's place
    pub async fn submit(&mut self, ctx: &AdminContext) -> Result<NavigationTarget, AdminError> {
        let backend = ctx.backend.clone();
        let resource = self.schema.name.clone();
        let id = self.id.clone();
        let projection = self.schema.projection.clone();

        let updated = self
            .form
            .submit(move |payload| async move {
                backend
                    .update(&resource, &id, payload, projection.as_deref())
                    .await
            })
            .await
            .inspect_err(|e| warn!(resource = %self.schema.name, id = %self.id, "Update rejected: {}", e))?;

        info!(resource = %self.schema.name, id = %self.id, "Record updated");
        self.record = updated;
        Ok(return_target(&ctx.registry, &self.schema, &self.nav))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The record as last loaded or saved
    pub fn record(&self) -> &Record {
        &self.record
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

    pub fn mount_guard(&self) -> MountGuard {
        self.guard.clone()
    }

    pub fn unmount(&self) {
        self.guard.unmount();
    }
}
