//! Field schema - one editable attribute of a resource

use serde::Serialize;
use serde_json::Value;

use super::Record;

/// Input type of a field
///
/// Matched exhaustively by the renderer and the value codec, so adding a
/// variant is a compile error until every consumer handles it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    ShortText,
    LongText,
    Number,
    Boolean,
    /// Single-select over static options, or over another resource's rows
    /// when the field declares a [`Relation`]
    Select { options: Vec<SelectOption> },
    Json,
    DateTime,
    Locale,
    RichText,
    Image { bucket: String },
    /// Compound call-to-action: `{ "text": ..., "link": ... }`
    PrimaryAction,
    /// Select whose labels are computed from the related row
    RelationSelect,
}

impl FieldKind {
    pub fn select(options: &[(&str, &str)]) -> Self {
        FieldKind::Select {
            options: options
                .iter()
                .map(|(value, label)| SelectOption::new(*label, Value::String(value.to_string())))
                .collect(),
        }
    }

    pub fn image(bucket: &str) -> Self {
        FieldKind::Image {
            bucket: bucket.to_string(),
        }
    }

    pub fn accepts_relation(&self) -> bool {
        matches!(self, FieldKind::Select { .. } | FieldKind::RelationSelect)
    }
}

/// One entry of a select's option list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: Value,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: Value) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Derives an option label or value from a related row
#[derive(Debug, Clone)]
pub enum Projection {
    /// Read a column of the row
    Field(String),
    /// Compute from the whole row
    Computed(fn(&Record) -> Value),
}

impl Projection {
    pub fn field(name: &str) -> Self {
        Projection::Field(name.to_string())
    }

    pub fn apply(&self, row: &Record) -> Value {
        match self {
            Projection::Field(name) => row.get(name).cloned().unwrap_or(Value::Null),
            Projection::Computed(f) => f(row),
        }
    }
}

/// Populates a select from another resource's rows
#[derive(Debug, Clone)]
pub struct Relation {
    /// Target resource name
    pub resource: String,
    pub label: Projection,
    pub value: Projection,
}

impl Relation {
    /// Relation labelled by `label_field`, valued by the target's `id`
    pub fn new(resource: &str, label_field: &str) -> Self {
        Self {
            resource: resource.to_string(),
            label: Projection::field(label_field),
            value: Projection::field("id"),
        }
    }

    pub fn computed_label(resource: &str, label: fn(&Record) -> Value) -> Self {
        Self {
            resource: resource.to_string(),
            label: Projection::Computed(label),
            value: Projection::field("id"),
        }
    }

    pub fn value_field(mut self, field: &str) -> Self {
        self.value = Projection::field(field);
        self
    }

    /// Turn one related row into a select option
    pub fn option_for(&self, row: &Record) -> SelectOption {
        let label = match self.label.apply(row) {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        SelectOption::new(label, self.value.apply(row))
    }
}

/// One editable attribute of a resource
#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub placeholder: Option<String>,
    pub help: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub default: Option<Value>,
    pub disabled_on_create: bool,
    pub disabled_on_edit: bool,
    pub relation: Option<Relation>,
}

impl FieldSchema {
    pub fn new(key: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind,
            required: false,
            placeholder: None,
            help: None,
            min: None,
            max: None,
            default: None,
            disabled_on_create: false,
            disabled_on_edit: false,
            relation: None,
        }
    }

    pub fn text(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::ShortText)
    }

    pub fn number(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::Number)
    }

    pub fn boolean(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::Boolean)
    }

    pub fn datetime(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::DateTime)
    }

    pub fn json(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::Json)
    }

    /// Relation-select over `resource`, labelled by `label_field`
    pub fn relation(key: &str, label: &str, resource: &str, label_field: &str) -> Self {
        Self::new(key, label, FieldKind::RelationSelect).with_relation(Relation::new(resource, label_field))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn placeholder(mut self, text: &str) -> Self {
        self.placeholder = Some(text.to_string());
        self
    }

    pub fn help(mut self, text: &str) -> Self {
        self.help = Some(text.to_string());
        self
    }

    pub fn bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn disabled_on_create(mut self) -> Self {
        self.disabled_on_create = true;
        self
    }

    pub fn disabled_on_edit(mut self) -> Self {
        self.disabled_on_edit = true;
        self
    }

    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relation = Some(relation);
        self
    }
}
