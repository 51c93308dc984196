//! Templates, trivia and announcements

use serde_json::json;

use super::translation_fields;
use crate::query::Sort;
use crate::schema::{ColumnKind, ColumnSchema, FieldKind, FieldSchema, ListConfig, ResourceSchema};

pub fn templates() -> ResourceSchema {
    ResourceSchema::new("templates", "Templates")
        .org_scoped("organization_id")
        .fields(vec![
            FieldSchema::relation("organization_id", "Organization", "organizations", "name")
                .required(),
            FieldSchema::text("name", "Name").required(),
            FieldSchema::new(
                "channel",
                "Channel",
                FieldKind::select(&[("email", "Email"), ("sms", "SMS"), ("page", "Landing page")]),
            )
            .required()
            .default_value(json!("email")),
            FieldSchema::text("subject", "Subject"),
            FieldSchema::new("body", "Body", FieldKind::RichText).required(),
            FieldSchema::json("variables", "Variables").default_value(json!([])),
        ])
        .list(
            ListConfig::new(vec![
                ColumnSchema::new("name", "Name"),
                ColumnSchema::new("channel", "Channel").width(120),
                ColumnSchema::new("updated_at", "Updated").kind(ColumnKind::DateTime),
            ])
            .sort(Sort::asc("name")),
        )
}

pub fn template_translations() -> ResourceSchema {
    let mut fields = translation_fields("template_id", "Template", "templates", "name");
    fields.extend([
        FieldSchema::text("subject", "Subject"),
        FieldSchema::new("body", "Body", FieldKind::RichText).required(),
    ]);

    ResourceSchema::new("template_translations", "Template translations")
        .translation_of("templates", "template_id")
        .fields(fields)
        .list(ListConfig::new(vec![
            ColumnSchema::new("template_id", "Template"),
            ColumnSchema::new("locale", "Locale"),
            ColumnSchema::new("subject", "Subject"),
        ]))
}

pub fn trivia() -> ResourceSchema {
    ResourceSchema::new("trivia", "Trivia")
        .org_scoped("organization_id")
        .fields(vec![
            FieldSchema::relation("organization_id", "Organization", "organizations", "name")
                .required(),
            FieldSchema::text("question", "Question").required(),
            FieldSchema::json("answers", "Answers")
                .required()
                .help("JSON array of answer strings"),
            FieldSchema::number("correct_index", "Correct answer index")
                .bounds(Some(0.0), None)
                .default_value(json!(0)),
            FieldSchema::new("image", "Image", FieldKind::image("trivia")),
            FieldSchema::boolean("published", "Published").default_value(json!(false)),
        ])
        .list(ListConfig::new(vec![
            ColumnSchema::new("question", "Question"),
            ColumnSchema::new("published", "Published").kind(ColumnKind::Boolean),
        ]))
}

pub fn trivia_translations() -> ResourceSchema {
    let mut fields = translation_fields("trivia_id", "Trivia", "trivia", "question");
    fields.extend([
        FieldSchema::text("question", "Question").required(),
        FieldSchema::json("answers", "Answers").required(),
    ]);

    ResourceSchema::new("trivia_translations", "Trivia translations")
        .translation_of("trivia", "trivia_id")
        .fields(fields)
        .list(ListConfig::new(vec![
            ColumnSchema::new("trivia_id", "Trivia"),
            ColumnSchema::new("locale", "Locale"),
            ColumnSchema::new("question", "Question"),
        ]))
}

pub fn announcements() -> ResourceSchema {
    ResourceSchema::new("announcements", "Announcements")
        .org_scoped("organization_id")
        .fields(vec![
            FieldSchema::relation("organization_id", "Organization", "organizations", "name")
                .required(),
            FieldSchema::relation("event_id", "Event", "events", "name"),
            FieldSchema::text("title", "Title").required(),
            FieldSchema::new("body", "Body", FieldKind::RichText),
            FieldSchema::new("primary_action", "Call to action", FieldKind::PrimaryAction),
            FieldSchema::datetime("publish_at", "Publish at"),
            FieldSchema::boolean("pinned", "Pinned").default_value(json!(false)),
        ])
        .list(
            ListConfig::new(vec![
                ColumnSchema::new("title", "Title"),
                ColumnSchema::new("publish_at", "Publish at").kind(ColumnKind::DateTime),
                ColumnSchema::new("pinned", "Pinned").kind(ColumnKind::Boolean),
            ])
            .sort(Sort::desc("publish_at")),
        )
}

pub fn announcement_translations() -> ResourceSchema {
    let mut fields =
        translation_fields("announcement_id", "Announcement", "announcements", "title");
    fields.extend([
        FieldSchema::text("title", "Title").required(),
        FieldSchema::new("body", "Body", FieldKind::RichText),
        FieldSchema::new("primary_action", "Call to action", FieldKind::PrimaryAction),
    ]);

    // No list view: reached only from the parent announcement
    ResourceSchema::new("announcement_translations", "Announcement translations")
        .translation_of("announcements", "announcement_id")
        .fields(fields)
}
