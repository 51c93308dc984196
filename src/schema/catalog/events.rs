//! Events, schedules and venues

use serde_json::json;

use super::translation_fields;
use crate::query::{Filter, FilterOperator, Sort};
use crate::schema::{ColumnKind, ColumnSchema, FieldKind, FieldSchema, ListConfig, ResourceSchema};

pub fn events() -> ResourceSchema {
    ResourceSchema::new("events", "Events")
        .org_scoped("organization_id")
        .projection("*, venues(name)")
        .fields(vec![
            FieldSchema::relation("organization_id", "Organization", "organizations", "name")
                .required(),
            FieldSchema::text("name", "Name").required(),
            FieldSchema::text("slug", "Slug").required().disabled_on_edit(),
            FieldSchema::relation("venue_id", "Venue", "venues", "name"),
            FieldSchema::relation("template_id", "Template", "templates", "name"),
            FieldSchema::datetime("starts_at", "Starts at").required(),
            FieldSchema::datetime("ends_at", "Ends at"),
            FieldSchema::number("capacity", "Capacity").bounds(Some(0.0), Some(100_000.0)),
            FieldSchema::new(
                "status",
                "Status",
                FieldKind::select(&[
                    ("draft", "Draft"),
                    ("published", "Published"),
                    ("archived", "Archived"),
                ]),
            )
            .required()
            .default_value(json!("draft")),
            FieldSchema::new("cover_image", "Cover image", FieldKind::image("event-covers")),
            FieldSchema::new("description", "Description", FieldKind::RichText),
            FieldSchema::new("primary_action", "Primary action", FieldKind::PrimaryAction)
                .help("Button shown on the event page"),
            FieldSchema::json("settings", "Settings").default_value(json!({})),
        ])
        .list(
            ListConfig::new(vec![
                ColumnSchema::new("name", "Name"),
                ColumnSchema::new("status", "Status").width(120),
                ColumnSchema::new("starts_at", "Starts").kind(ColumnKind::DateTime),
                ColumnSchema::new("capacity", "Capacity").kind(ColumnKind::Number),
            ])
            .sort(Sort::desc("starts_at"))
            .filter(Filter::new("status", FilterOperator::Ne, json!("archived"))),
        )
}

pub fn event_translations() -> ResourceSchema {
    let mut fields = translation_fields("event_id", "Event", "events", "name");
    fields.extend([
        FieldSchema::text("name", "Name").required(),
        FieldSchema::new("description", "Description", FieldKind::RichText),
        FieldSchema::new("primary_action", "Primary action", FieldKind::PrimaryAction),
    ]);

    ResourceSchema::new("event_translations", "Event translations")
        .translation_of("events", "event_id")
        .fields(fields)
        .list(ListConfig::new(vec![
            ColumnSchema::new("event_id", "Event"),
            ColumnSchema::new("locale", "Locale").width(100),
            ColumnSchema::new("name", "Name"),
        ]))
}

pub fn event_schedules() -> ResourceSchema {
    ResourceSchema::new("event_schedules", "Schedule")
        .fields(vec![
            FieldSchema::relation("event_id", "Event", "events", "name").required(),
            FieldSchema::text("title", "Title").required(),
            FieldSchema::datetime("starts_at", "Starts at").required(),
            FieldSchema::datetime("ends_at", "Ends at"),
            FieldSchema::new("details", "Details", FieldKind::LongText),
            FieldSchema::number("position", "Position")
                .bounds(Some(0.0), None)
                .default_value(json!(0)),
        ])
        .list(
            ListConfig::new(vec![
                ColumnSchema::new("position", "#").kind(ColumnKind::Number).width(60),
                ColumnSchema::new("title", "Title"),
                ColumnSchema::new("starts_at", "Starts").kind(ColumnKind::DateTime),
            ])
            .sort(Sort::asc("position")),
        )
}

pub fn venues() -> ResourceSchema {
    ResourceSchema::new("venues", "Venues")
        .org_scoped("organization_id")
        .fields(vec![
            FieldSchema::relation("organization_id", "Organization", "organizations", "name")
                .required(),
            FieldSchema::text("name", "Name").required(),
            FieldSchema::new("address", "Address", FieldKind::LongText),
            FieldSchema::number("latitude", "Latitude").bounds(Some(-90.0), Some(90.0)),
            FieldSchema::number("longitude", "Longitude").bounds(Some(-180.0), Some(180.0)),
            FieldSchema::new("photo", "Photo", FieldKind::image("venue-photos")),
        ])
        .list(
            ListConfig::new(vec![
                ColumnSchema::new("name", "Name"),
                ColumnSchema::new("address", "Address"),
            ])
            .sort(Sort::asc("name")),
        )
}

pub fn venue_translations() -> ResourceSchema {
    let mut fields = translation_fields("venue_id", "Venue", "venues", "name");
    fields.extend([
        FieldSchema::text("name", "Name").required(),
        FieldSchema::new("directions", "Directions", FieldKind::LongText),
    ]);

    ResourceSchema::new("venue_translations", "Venue translations")
        .translation_of("venues", "venue_id")
        .fields(fields)
        .list(ListConfig::new(vec![
            ColumnSchema::new("venue_id", "Venue"),
            ColumnSchema::new("locale", "Locale"),
            ColumnSchema::new("name", "Name"),
        ]))
}
