//! Form orchestrator
//!
//! Assembles one form from a field list and drives its submission.
//!
//! ```text
//!   defaults ─┐
//!             ├─ merge (server wins) ─ inbound codec ─ force locks ─ values
//!   record  ──┘
//!
//!   submit:  Idle ─> Validating ─┬─ rules/codec fail ──────────> Idle
//!                                └─> Submitting ─ on_submit ──> Idle
//! ```
//!
//! Locked keys are forced on every read and again into the outbound payload,
//! so no edit can change a locked value.

use std::future::Future;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec::{inbound_value, to_form, to_storage, FormValue, FormValues};
use crate::error::AdminError;
use crate::locks::LockedFieldSet;
use crate::notification::Notification;
use crate::options::{MountGuard, OptionMap};
use crate::renderer::{render_field, FieldState, FormMode, Widget};
use crate::schema::{FieldSchema, Record, SelectOption};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormState {
    Idle,
    Validating,
    Submitting,
}

pub struct FormOrchestrator {
    fields: Vec<FieldSchema>,
    mode: FormMode,
    locks: LockedFieldSet,
    values: FormValues,
    options: OptionMap,
    state: FormState,
    permitted: bool,
    notifications: Vec<Notification>,
}

impl FormOrchestrator {
    /// `initial` is the server record in edit mode; its values beat defaults.
    pub fn new(
        fields: Vec<FieldSchema>,
        mode: FormMode,
        initial: Option<&Record>,
        locks: LockedFieldSet,
    ) -> Self {
        let empty = Record::new();
        let values = to_form(&fields, initial.unwrap_or(&empty));

        let mut form = Self {
            fields,
            mode,
            locks,
            values,
            options: OptionMap::new(),
            state: FormState::Idle,
            permitted: true,
            notifications: Vec::new(),
        };
        form.force_locks();
        form
    }

    /// Gate submission on the caller's capability
    pub fn with_permission(mut self, permitted: bool) -> Self {
        self.permitted = permitted;
        self
    }

    fn force_locks(&mut self) {
        for field in &self.fields {
            if let Some(locked) = self.locks.get(&field.key) {
                self.values
                    .insert(field.key.clone(), inbound_value(field, locked.clone()));
            }
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn locks(&self) -> &LockedFieldSet {
        &self.locks
    }

    pub fn value(&self, key: &str) -> Option<&FormValue> {
        self.values.get(key)
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    /// Set a user-entered value. Locked keys keep their value; returns
    /// whether the value was accepted.
    pub fn set_value(&mut self, key: &str, value: FormValue) -> bool {
        if self.locks.contains(key) {
            debug!(field = key, "Ignoring edit of locked field");
            return false;
        }
        self.values.insert(key.to_string(), value);
        true
    }

    /// Apply fetched relation options unless the screen was unmounted
    pub fn apply_options(&mut self, guard: &MountGuard, options: OptionMap) -> bool {
        if !guard.is_mounted() {
            debug!("Discarding relation options for unmounted form");
            return false;
        }
        self.options.extend(options);
        true
    }

    pub fn options(&self, key: &str) -> Option<&[SelectOption]> {
        self.options.get(key).map(Vec::as_slice)
    }

    pub fn widgets(&self) -> Vec<Widget> {
        self.fields
            .iter()
            .map(|field| {
                let options = if field.relation.is_some() {
                    self.options.get(&field.key).map(Vec::as_slice)
                } else {
                    None
                };
                render_field(
                    field,
                    self.mode,
                    FieldState {
                        value: self.values.get(&field.key),
                        locked: self.locks.contains(&field.key),
                        options,
                    },
                )
            })
            .collect()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    fn reject(&mut self, err: AdminError) -> AdminError {
        self.notifications.push(Notification::from_error(&err));
        self.state = FormState::Idle;
        err
    }

    /// Rules and codec, producing the outbound payload with locks applied
    pub fn validate(&mut self) -> Result<Record, AdminError> {
        let payload = self.prepare()?;
        self.state = FormState::Idle;
        Ok(payload)
    }

    fn prepare(&mut self) -> Result<Record, AdminError> {
        self.state = FormState::Validating;

        for widget in self.widgets() {
            if let Err((label, message)) = widget.validate(self.values.get(&widget.key)) {
                debug!(field = %widget.key, "Submit rejected by rule: {}", message);
                return Err(self.reject(AdminError::validation(&widget.key, label, message)));
            }
        }

        let mut payload = match to_storage(&self.fields, &self.values) {
            Ok(payload) => payload,
            Err(e) => {
                debug!("Submit rejected by codec: {}", e);
                return Err(self.reject(e));
            }
        };
        self.locks.apply(&mut payload);
        Ok(payload)
    }

    /// Validate, then hand the payload to `on_submit`
    ///
    /// `on_submit` is never called when the caller lacks permission or
    /// validation fails. Its error is surfaced as a notification.
    pub async fn submit<F, Fut>(&mut self, on_submit: F) -> Result<Record, AdminError>
    where
        F: FnOnce(Record) -> Fut,
        Fut: Future<Output = Result<Record, AdminError>>,
    {
        if !self.permitted {
            warn!("Refusing submit without permission");
            return Err(self.reject(AdminError::PermissionDenied(
                "you are not allowed to save this record".to_string(),
            )));
        }

        let payload = self.prepare()?;

        self.state = FormState::Submitting;
        let result = on_submit(payload).await;
        self.state = FormState::Idle;

        match result {
            Ok(record) => {
                info!("Record saved");
                self.notifications.push(Notification::success("Saved"));
                Ok(record)
            }
            Err(e) => {
                warn!("Submit failed: {}", e);
                self.notifications.push(Notification::from_error(&e));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationLevel;
    use crate::schema::FieldKind;
    use serde_json::{json, Value};
    use std::cell::Cell;

    fn fields() -> Vec<FieldSchema> {
        vec![
            FieldSchema::text("name", "Name").required(),
            FieldSchema::json("settings", "Settings").default_value(json!({})),
            FieldSchema::number("capacity", "Capacity").bounds(Some(0.0), Some(500.0)),
            FieldSchema::relation("event_id", "Event", "events", "name"),
            FieldSchema::new("kind", "Kind", FieldKind::select(&[("a", "A")])),
        ]
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_defaults_and_server_values() {
        let form = FormOrchestrator::new(fields(), FormMode::Create, None, LockedFieldSet::new());
        assert_eq!(form.value("settings"), Some(&FormValue::text("{}")));

        let initial = record(json!({ "name": "Gala", "settings": { "a": 1 } }));
        let form = FormOrchestrator::new(
            fields(),
            FormMode::Edit,
            Some(&initial),
            LockedFieldSet::new(),
        );
        assert_eq!(form.value("name"), Some(&FormValue::text("Gala")));
        assert_eq!(
            form.value("settings"),
            Some(&FormValue::text("{\n  \"a\": 1\n}"))
        );
    }

    #[test]
    fn test_locked_values_cannot_be_edited() {
        let mut locks = LockedFieldSet::new();
        locks.insert("event_id", json!(42));
        let initial = record(json!({ "event_id": 1 }));
        let mut form = FormOrchestrator::new(fields(), FormMode::Edit, Some(&initial), locks);

        assert_eq!(form.value("event_id"), Some(&FormValue::from(json!(42))));
        assert!(!form.set_value("event_id", FormValue::from(json!(7))));
        assert!(form.set_value("name", FormValue::text("x")));

        let widget = form
            .widgets()
            .into_iter()
            .find(|w| w.key == "event_id")
            .unwrap();
        assert!(widget.locked && widget.disabled);
    }

    #[tokio::test]
    async fn test_submit_forces_locked_values() {
        let mut locks = LockedFieldSet::new();
        locks.insert("event_id", json!(42));
        locks.insert("organization_id", json!(7));
        let mut form = FormOrchestrator::new(fields(), FormMode::Create, None, locks);
        form.set_value("name", FormValue::text("Gala"));

        let saved = form.submit(|payload| async move { Ok(payload) }).await.unwrap();
        assert_eq!(saved.get("event_id"), Some(&json!(42)));
        assert_eq!(saved.get("organization_id"), Some(&json!(7)));
        assert_eq!(saved.get("settings"), Some(&json!({})));
        assert_eq!(form.state(), FormState::Idle);
    }

    #[tokio::test]
    async fn test_required_field_blocks_callback() {
        let mut form = FormOrchestrator::new(fields(), FormMode::Create, None, LockedFieldSet::new());
        let called = Cell::new(false);

        let result = form
            .submit(|payload| {
                called.set(true);
                async move { Ok(payload) }
            })
            .await;

        assert!(matches!(result, Err(AdminError::Validation { ref field, .. }) if field == "name"));
        assert!(!called.get());
        assert_eq!(form.notifications().len(), 1);
        assert_eq!(form.state(), FormState::Idle);
    }

    #[tokio::test]
    async fn test_invalid_json_single_notification() {
        let mut form = FormOrchestrator::new(fields(), FormMode::Create, None, LockedFieldSet::new());
        form.set_value("name", FormValue::text("Gala"));
        form.set_value("settings", FormValue::text("{\"a\":1"));
        let called = Cell::new(false);

        let result = form
            .submit(|payload| {
                called.set(true);
                async move { Ok(payload) }
            })
            .await;

        assert!(result.is_err());
        assert!(!called.get());
        let notes = form.take_notifications();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].message.starts_with("Settings"));
        // entered values survive the rejection
        assert_eq!(form.value("settings"), Some(&FormValue::text("{\"a\":1")));
    }

    #[tokio::test]
    async fn test_bounds_rule() {
        let mut form = FormOrchestrator::new(fields(), FormMode::Create, None, LockedFieldSet::new());
        form.set_value("name", FormValue::text("Gala"));
        form.set_value("capacity", FormValue::text("900"));
        let result = form.submit(|payload| async move { Ok(payload) }).await;
        assert!(matches!(result, Err(AdminError::Validation { ref field, .. }) if field == "capacity"));
    }

    #[tokio::test]
    async fn test_permission_refusal() {
        let mut form = FormOrchestrator::new(fields(), FormMode::Create, None, LockedFieldSet::new())
            .with_permission(false);
        form.set_value("name", FormValue::text("Gala"));
        let called = Cell::new(false);

        let result = form
            .submit(|payload| {
                called.set(true);
                async move { Ok(payload) }
            })
            .await;

        assert!(matches!(result, Err(AdminError::PermissionDenied(_))));
        assert!(!called.get());
    }

    #[tokio::test]
    async fn test_backend_error_surfaced() {
        let mut form = FormOrchestrator::new(fields(), FormMode::Create, None, LockedFieldSet::new());
        form.set_value("name", FormValue::text("Gala"));

        let result = form
            .submit(|_| async { Err(AdminError::Backend("unique violation".into())) })
            .await;

        assert!(result.is_err());
        let notes = form.notifications();
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert_eq!(notes[0].message, "unique violation");
    }

    #[test]
    fn test_options_discarded_after_unmount() {
        let mut form = FormOrchestrator::new(fields(), FormMode::Create, None, LockedFieldSet::new());
        let guard = MountGuard::new();
        let mut options = OptionMap::new();
        options.insert("event_id".into(), vec![SelectOption::new("Gala", json!(1))]);

        guard.unmount();
        assert!(!form.apply_options(&guard, options.clone()));
        assert!(form.options("event_id").is_none());

        let guard = MountGuard::new();
        assert!(form.apply_options(&guard, options));
        assert_eq!(form.options("event_id").map(<[_]>::len), Some(1));
    }
}
