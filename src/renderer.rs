//! Field renderer - one field schema to one typed input configuration
//!
//! Each [`FieldKind`] maps to an explicit [`Input`] variant with its
//! validation [`Rule`]s attached. Two policies apply to every kind:
//!
//! - a field is disabled when locked, or when the current mode disables it
//! - a locked field is always rendered (read-only), never hidden

use serde::Serialize;
use serde_json::Value;

use crate::codec::FormValue;
use crate::schema::{FieldKind, FieldSchema, SelectOption};

/// Locales offered by locale inputs
pub const LOCALES: &[(&str, &str)] = &[
    ("en", "English"),
    ("fr", "French"),
    ("es", "Spanish"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("nl", "Dutch"),
    ("he", "Hebrew"),
    ("ar", "Arabic"),
    ("ja", "Japanese"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormMode {
    Create,
    Edit,
}

/// Validation rule attached to an input
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    Required { message: String },
    Min { value: f64, message: String },
    Max { value: f64, message: String },
    /// Well-formed URL, checked only when non-empty
    Url { message: String },
}

impl Rule {
    pub fn check(&self, value: Option<&FormValue>) -> Result<(), String> {
        match self {
            Rule::Required { message } => match value {
                Some(v) if !v.is_empty() => Ok(()),
                _ => Err(message.clone()),
            },
            Rule::Min { value: min, message } => match numeric(value) {
                Some(n) if n < *min => Err(message.clone()),
                _ => Ok(()),
            },
            Rule::Max { value: max, message } => match numeric(value) {
                Some(n) if n > *max => Err(message.clone()),
                _ => Ok(()),
            },
            Rule::Url { message } => match value.map(FormValue::to_value) {
                Some(Value::String(s)) if !s.trim().is_empty() => match url::Url::parse(s.trim()) {
                    Ok(_) => Ok(()),
                    Err(_) => Err(message.clone()),
                },
                _ => Ok(()),
            },
        }
    }
}

fn numeric(value: Option<&FormValue>) -> Option<f64> {
    match value? {
        FormValue::Value(Value::Number(n)) => n.as_f64(),
        FormValue::Value(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Interactive input, one variant per field kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum Input {
    Text {
        multiline: bool,
        rows: u16,
    },
    Number {
        min: Option<f64>,
        max: Option<f64>,
    },
    Switch,
    Select {
        options: Vec<SelectOption>,
        searchable: bool,
        clearable: bool,
        /// Relation options not fetched yet
        loading: bool,
        /// Target resource for relation-backed selects
        #[serde(skip_serializing_if = "Option::is_none")]
        resource: Option<String>,
    },
    JsonEditor {
        rows: u16,
    },
    DateTime {
        show_time: bool,
    },
    Locale {
        options: Vec<SelectOption>,
    },
    RichText,
    Image {
        bucket: String,
        accept: String,
    },
    /// Two nested inputs under one field key
    PrimaryAction {
        text: Box<Widget>,
        link: Box<Widget>,
    },
}

/// Bound input produced for one field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Widget {
    pub key: String,
    pub label: String,
    pub input: Input,
    pub rules: Vec<Rule>,
    pub disabled: bool,
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    pub value: Option<FormValue>,
}

impl Widget {
    /// Run this widget's rules (and nested widgets' rules) against a value.
    /// `Err` carries `(label, message)` of the first failing input.
    pub fn validate(&self, value: Option<&FormValue>) -> Result<(), (String, String)> {
        for rule in &self.rules {
            rule.check(value)
                .map_err(|message| (self.label.clone(), message))?;
        }

        if let Input::PrimaryAction { text, link } = &self.input {
            let object = value.map(FormValue::to_value);
            let part = |name: &str| {
                object
                    .as_ref()
                    .and_then(|o| o.get(name))
                    .cloned()
                    .map(FormValue::Value)
            };
            text.validate(part("text").as_ref())?;
            link.validate(part("link").as_ref())?;
        }
        Ok(())
    }
}

/// Per-render state of a field
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldState<'a> {
    pub value: Option<&'a FormValue>,
    pub locked: bool,
    /// Relation options, `None` while not yet loaded
    pub options: Option<&'a [SelectOption]>,
}

/// Disabled when locked or disabled for the current mode
pub fn is_disabled(field: &FieldSchema, mode: FormMode, locked: bool) -> bool {
    locked
        || (mode == FormMode::Create && field.disabled_on_create)
        || (mode == FormMode::Edit && field.disabled_on_edit)
}

/// Render one field
pub fn render_field(field: &FieldSchema, mode: FormMode, state: FieldState<'_>) -> Widget {
    let disabled = is_disabled(field, mode, state.locked);
    let mut rules = Vec::new();
    if field.required {
        rules.push(Rule::Required {
            message: format!("{} is required", field.label),
        });
    }

    let input = match &field.kind {
        FieldKind::ShortText => Input::Text {
            multiline: false,
            rows: 1,
        },
        FieldKind::LongText => Input::Text {
            multiline: true,
            rows: 4,
        },
        FieldKind::Number => {
            if let Some(min) = field.min {
                rules.push(Rule::Min {
                    value: min,
                    message: format!("{} must be at least {}", field.label, min),
                });
            }
            if let Some(max) = field.max {
                rules.push(Rule::Max {
                    value: max,
                    message: format!("{} must be at most {}", field.label, max),
                });
            }
            Input::Number {
                min: field.min,
                max: field.max,
            }
        }
        FieldKind::Boolean => Input::Switch,
        FieldKind::Select { options } => match &field.relation {
            Some(relation) => relation_select(field, relation.resource.as_str(), state),
            None => Input::Select {
                options: options.clone(),
                searchable: false,
                clearable: !field.required && !state.locked,
                loading: false,
                resource: None,
            },
        },
        FieldKind::RelationSelect => {
            let resource = field
                .relation
                .as_ref()
                .map(|r| r.resource.as_str())
                .unwrap_or_default();
            relation_select(field, resource, state)
        }
        FieldKind::Json => Input::JsonEditor { rows: 8 },
        FieldKind::DateTime => Input::DateTime { show_time: true },
        FieldKind::Locale => Input::Locale {
            options: LOCALES
                .iter()
                .map(|(code, name)| SelectOption::new(*name, Value::String(code.to_string())))
                .collect(),
        },
        FieldKind::RichText => Input::RichText,
        FieldKind::Image { bucket } => Input::Image {
            bucket: bucket.clone(),
            accept: "image/*".to_string(),
        },
        FieldKind::PrimaryAction => primary_action(field, disabled),
    };

    Widget {
        key: field.key.clone(),
        label: field.label.clone(),
        input,
        rules,
        disabled,
        locked: state.locked,
        placeholder: field.placeholder.clone(),
        help: field.help.clone(),
        value: state.value.cloned(),
    }
}

/// A locked relation is fixed: no search, no clearing
fn relation_select(field: &FieldSchema, resource: &str, state: FieldState<'_>) -> Input {
    Input::Select {
        options: state.options.map(<[SelectOption]>::to_vec).unwrap_or_default(),
        searchable: !state.locked,
        clearable: !state.locked && !field.required,
        loading: state.options.is_none(),
        resource: Some(resource.to_string()),
    }
}

fn primary_action(field: &FieldSchema, disabled: bool) -> Input {
    let nested = |suffix: &str, label: &str, rules: Vec<Rule>| Widget {
        key: format!("{}.{}", field.key, suffix),
        label: format!("{} {}", field.label, label),
        input: Input::Text {
            multiline: false,
            rows: 1,
        },
        rules,
        disabled,
        locked: false,
        placeholder: None,
        help: None,
        value: None,
    };

    Input::PrimaryAction {
        text: Box::new(nested("text", "text", Vec::new())),
        link: Box::new(nested(
            "link",
            "link",
            vec![Rule::Url {
                message: format!("{} link must be a valid URL", field.label),
            }],
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Relation;
    use serde_json::json;

    #[test]
    fn test_disablement_policy() {
        let field = FieldSchema::text("slug", "Slug").disabled_on_edit();
        assert!(!is_disabled(&field, FormMode::Create, false));
        assert!(is_disabled(&field, FormMode::Edit, false));
        assert!(is_disabled(&field, FormMode::Create, true));

        let field = FieldSchema::text("status", "Status").disabled_on_create();
        assert!(is_disabled(&field, FormMode::Create, false));
        assert!(!is_disabled(&field, FormMode::Edit, false));
    }

    #[test]
    fn test_locked_field_is_rendered_read_only() {
        let field = FieldSchema::text("organization_id", "Organization");
        let value = FormValue::from(json!(7));
        let widget = render_field(
            &field,
            FormMode::Create,
            FieldState {
                value: Some(&value),
                locked: true,
                options: None,
            },
        );
        assert!(widget.disabled);
        assert!(widget.locked);
        assert_eq!(widget.value, Some(value));
    }

    #[test]
    fn test_locked_relation_cannot_search_or_clear() {
        let field = FieldSchema::relation("event_id", "Event", "events", "name");
        let options = vec![SelectOption::new("Gala", json!(42))];

        let free = render_field(
            &field,
            FormMode::Create,
            FieldState {
                options: Some(&options),
                ..Default::default()
            },
        );
        assert!(matches!(
            free.input,
            Input::Select { searchable: true, clearable: true, loading: false, .. }
        ));

        let locked = render_field(
            &field,
            FormMode::Create,
            FieldState {
                locked: true,
                options: Some(&options),
                ..Default::default()
            },
        );
        assert!(matches!(
            locked.input,
            Input::Select { searchable: false, clearable: false, .. }
        ));
    }

    #[test]
    fn test_relation_without_options_is_loading() {
        let field = FieldSchema::new("venue_id", "Venue", FieldKind::select(&[]))
            .with_relation(Relation::new("venues", "name"));
        let widget = render_field(&field, FormMode::Edit, FieldState::default());
        match widget.input {
            Input::Select { loading, resource, .. } => {
                assert!(loading);
                assert_eq!(resource.as_deref(), Some("venues"));
            }
            other => panic!("unexpected input {:?}", other),
        }
    }

    #[test]
    fn test_required_and_bounds_rules() {
        let field = FieldSchema::number("capacity", "Capacity")
            .required()
            .bounds(Some(0.0), Some(10.0));
        let widget = render_field(&field, FormMode::Create, FieldState::default());
        assert_eq!(widget.rules.len(), 3);

        assert!(widget.validate(None).is_err());
        assert!(widget.validate(Some(&FormValue::text(""))).is_err());
        assert!(widget.validate(Some(&FormValue::from(json!(11)))).is_err());
        assert!(widget.validate(Some(&FormValue::text("-1"))).is_err());
        assert!(widget.validate(Some(&FormValue::from(json!(5)))).is_ok());
    }

    #[test]
    fn test_primary_action_validates_link_only_when_present() {
        let field = FieldSchema::new("primary_action", "Primary action", FieldKind::PrimaryAction);
        let widget = render_field(&field, FormMode::Create, FieldState::default());

        match &widget.input {
            Input::PrimaryAction { text, link } => {
                assert_eq!(text.key, "primary_action.text");
                assert_eq!(link.key, "primary_action.link");
            }
            other => panic!("unexpected input {:?}", other),
        }

        let empty_link = FormValue::from(json!({ "text": "RSVP", "link": "" }));
        assert!(widget.validate(Some(&empty_link)).is_ok());

        let good = FormValue::from(json!({ "text": "RSVP", "link": "https://example.com/rsvp" }));
        assert!(widget.validate(Some(&good)).is_ok());

        let bad = FormValue::from(json!({ "text": "RSVP", "link": "not a url" }));
        let (label, message) = widget.validate(Some(&bad)).unwrap_err();
        assert_eq!(label, "Primary action link");
        assert!(message.contains("valid URL"));
    }

    #[test]
    fn test_every_kind_renders() {
        let kinds = vec![
            FieldKind::ShortText,
            FieldKind::LongText,
            FieldKind::Number,
            FieldKind::Boolean,
            FieldKind::select(&[("a", "A")]),
            FieldKind::Json,
            FieldKind::DateTime,
            FieldKind::Locale,
            FieldKind::RichText,
            FieldKind::image("covers"),
            FieldKind::PrimaryAction,
        ];
        for kind in kinds {
            let field = FieldSchema::new("f", "F", kind);
            let widget = render_field(&field, FormMode::Create, FieldState::default());
            assert_eq!(widget.key, "f");
            assert!(!widget.disabled);
        }
    }
}
