//! Invitees, RSVPs and imports

use serde_json::{json, Value};

use crate::query::Sort;
use crate::schema::{
    ColumnKind, ColumnSchema, FieldKind, FieldSchema, ListConfig, Record, Relation, ResourceSchema,
};

fn invitee_label(row: &Record) -> Value {
    let name = row.get("name").and_then(Value::as_str).unwrap_or_default();
    let email = row.get("email").and_then(Value::as_str).unwrap_or_default();
    match (name.is_empty(), email.is_empty()) {
        (false, false) => Value::String(format!("{} ({})", name, email)),
        (false, true) => Value::String(name.to_string()),
        _ => Value::String(email.to_string()),
    }
}

fn rsvp_status_cell(value: &Value, _row: &Record) -> String {
    match value.as_str() {
        Some("yes") => "Attending".to_string(),
        Some("no") => "Declined".to_string(),
        Some("maybe") => "Maybe".to_string(),
        _ => "Awaiting reply".to_string(),
    }
}

pub fn invitees() -> ResourceSchema {
    ResourceSchema::new("invitees", "Invitees")
        .org_scoped("organization_id")
        .fields(vec![
            FieldSchema::relation("organization_id", "Organization", "organizations", "name")
                .required(),
            FieldSchema::relation("event_id", "Event", "events", "name"),
            FieldSchema::text("email", "Email")
                .required()
                .placeholder("guest@example.com"),
            FieldSchema::text("name", "Name"),
            FieldSchema::text("phone", "Phone"),
            FieldSchema::new("locale", "Locale", FieldKind::Locale),
            FieldSchema::number("plus_ones", "Plus ones")
                .bounds(Some(0.0), Some(10.0))
                .default_value(json!(0)),
            FieldSchema::json("metadata", "Metadata"),
        ])
        .list(
            ListConfig::new(vec![
                ColumnSchema::new("email", "Email"),
                ColumnSchema::new("name", "Name"),
                ColumnSchema::new("plus_ones", "+1").kind(ColumnKind::Number).width(60),
            ])
            .sort(Sort::asc("email"))
            .page_size(50),
        )
}

pub fn tags() -> ResourceSchema {
    ResourceSchema::new("tags", "Tags")
        .org_scoped("organization_id")
        .fields(vec![
            FieldSchema::relation("organization_id", "Organization", "organizations", "name")
                .required(),
            FieldSchema::text("name", "Name").required(),
            FieldSchema::text("color", "Color").placeholder("#ff8800"),
        ])
        .list(ListConfig::new(vec![
            ColumnSchema::new("name", "Name"),
            ColumnSchema::new("color", "Color").width(100),
        ]))
}

pub fn invitee_tags() -> ResourceSchema {
    ResourceSchema::new("invitee_tags", "Invitee tags")
        .fields(vec![
            FieldSchema::new("invitee_id", "Invitee", FieldKind::RelationSelect)
                .with_relation(Relation::computed_label("invitees", invitee_label))
                .required(),
            FieldSchema::relation("tag_id", "Tag", "tags", "name").required(),
        ])
        .list(ListConfig::new(vec![
            ColumnSchema::new("invitee_id", "Invitee"),
            ColumnSchema::new("tag_id", "Tag"),
        ]))
}

pub fn rsvps() -> ResourceSchema {
    ResourceSchema::new("rsvps", "RSVPs")
        .fields(vec![
            FieldSchema::relation("event_id", "Event", "events", "name").required(),
            FieldSchema::new("invitee_id", "Invitee", FieldKind::RelationSelect)
                .with_relation(Relation::computed_label("invitees", invitee_label))
                .required(),
            FieldSchema::new(
                "status",
                "Status",
                FieldKind::select(&[("yes", "Attending"), ("no", "Declined"), ("maybe", "Maybe")]),
            ),
            FieldSchema::number("guests", "Guests").bounds(Some(0.0), Some(10.0)),
            FieldSchema::new("note", "Note", FieldKind::LongText),
            FieldSchema::datetime("responded_at", "Responded at"),
        ])
        .list(
            ListConfig::new(vec![
                ColumnSchema::new("invitee_id", "Invitee"),
                ColumnSchema::new("status", "Status").render(rsvp_status_cell),
                ColumnSchema::new("guests", "Guests").kind(ColumnKind::Number),
                ColumnSchema::new("responded_at", "Responded").kind(ColumnKind::DateTime),
            ])
            .sort(Sort::desc("responded_at")),
        )
}

pub fn rsvp_questions() -> ResourceSchema {
    ResourceSchema::new("rsvp_questions", "RSVP questions")
        .fields(vec![
            FieldSchema::relation("event_id", "Event", "events", "name").required(),
            FieldSchema::text("prompt", "Prompt").required(),
            FieldSchema::new(
                "kind",
                "Answer type",
                FieldKind::select(&[
                    ("text", "Free text"),
                    ("choice", "Single choice"),
                    ("boolean", "Yes / no"),
                ]),
            )
            .required()
            .default_value(json!("text")),
            FieldSchema::json("choices", "Choices").help("JSON array of choice labels"),
            FieldSchema::boolean("mandatory", "Mandatory").default_value(json!(false)),
            FieldSchema::number("position", "Position").default_value(json!(0)),
        ])
        .list(
            ListConfig::new(vec![
                ColumnSchema::new("position", "#").kind(ColumnKind::Number).width(60),
                ColumnSchema::new("prompt", "Prompt"),
                ColumnSchema::new("kind", "Type"),
                ColumnSchema::new("mandatory", "Mandatory").kind(ColumnKind::Boolean),
            ])
            .sort(Sort::asc("position")),
        )
}

pub fn rsvp_answers() -> ResourceSchema {
    ResourceSchema::new("rsvp_answers", "RSVP answers")
        .fields(vec![
            FieldSchema::relation("rsvp_id", "RSVP", "rsvps", "id").required(),
            FieldSchema::relation("question_id", "Question", "rsvp_questions", "prompt").required(),
            FieldSchema::json("answer", "Answer"),
        ])
        .list(ListConfig::new(vec![
            ColumnSchema::new("question_id", "Question"),
            ColumnSchema::new("answer", "Answer").kind(ColumnKind::Json),
        ]))
}

pub fn imports() -> ResourceSchema {
    ResourceSchema::new("imports", "Imports")
        .org_scoped("organization_id")
        .not_deletable()
        .fields(vec![
            FieldSchema::relation("organization_id", "Organization", "organizations", "name")
                .required()
                .disabled_on_edit(),
            FieldSchema::text("file_name", "File").required().disabled_on_edit(),
            FieldSchema::new(
                "status",
                "Status",
                FieldKind::select(&[
                    ("pending", "Pending"),
                    ("running", "Running"),
                    ("done", "Done"),
                    ("failed", "Failed"),
                ]),
            )
            .default_value(json!("pending"))
            .disabled_on_create(),
            FieldSchema::json("report", "Report").disabled_on_create().disabled_on_edit(),
        ])
        .list(
            ListConfig::new(vec![
                ColumnSchema::new("file_name", "File"),
                ColumnSchema::new("status", "Status"),
                ColumnSchema::new("created_at", "Uploaded").kind(ColumnKind::DateTime),
            ])
            .sort(Sort::desc("created_at")),
        )
}
