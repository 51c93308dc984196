//! Organizations, membership, profiles and platform tables

use serde_json::{json, Value};

use crate::composite::member_record_id;
use crate::query::Sort;
use crate::schema::{
    ColumnKind, ColumnSchema, FieldKind, FieldSchema, ListConfig, Record, Relation, ResourceSchema,
};

fn profile_name(row: &Record) -> Value {
    let name = row.get("full_name").and_then(Value::as_str).unwrap_or_default();
    let email = row.get("email").and_then(Value::as_str).unwrap_or_default();
    if name.is_empty() {
        Value::String(email.to_string())
    } else {
        Value::String(format!("{} <{}>", name, email))
    }
}

pub fn organizations() -> ResourceSchema {
    ResourceSchema::new("organizations", "Organizations")
        .platform_admin_only()
        .not_deletable()
        .fields(vec![
            FieldSchema::text("name", "Name").required(),
            FieldSchema::text("slug", "Slug")
                .required()
                .disabled_on_edit()
                .help("Used in public URLs; cannot change after creation"),
            FieldSchema::new("logo", "Logo", FieldKind::image("organization-logos")),
            FieldSchema::new("default_locale", "Default locale", FieldKind::Locale)
                .default_value(json!("en")),
            FieldSchema::json("settings", "Settings").default_value(json!({})),
        ])
        .list(
            ListConfig::new(vec![
                ColumnSchema::new("id", "ID").width(80),
                ColumnSchema::new("name", "Name"),
                ColumnSchema::new("slug", "Slug"),
                ColumnSchema::new("created_at", "Created").kind(ColumnKind::DateTime),
            ])
            .sort(Sort::asc("name")),
        )
}

pub fn organization_members() -> ResourceSchema {
    ResourceSchema::new("organization_members", "Members")
        .org_scoped("organization_id")
        .id_extractor(member_record_id)
        .fields(vec![
            FieldSchema::relation("organization_id", "Organization", "organizations", "name")
                .required()
                .disabled_on_edit(),
            FieldSchema::new("user_id", "User", FieldKind::RelationSelect)
                .with_relation(Relation::computed_label("profiles", profile_name))
                .required()
                .disabled_on_edit(),
            FieldSchema::new(
                "role",
                "Role",
                FieldKind::select(&[
                    ("owner", "Owner"),
                    ("admin", "Admin"),
                    ("editor", "Editor"),
                    ("viewer", "Viewer"),
                ]),
            )
            .required()
            .default_value(json!("viewer")),
        ])
        .list(ListConfig::new(vec![
            ColumnSchema::new("user_id", "User"),
            ColumnSchema::new("role", "Role"),
            ColumnSchema::new("created_at", "Joined").kind(ColumnKind::DateTime),
        ]))
}

pub fn organization_aliases() -> ResourceSchema {
    ResourceSchema::new("organization_aliases", "Aliases")
        .org_scoped("organization_id")
        .fields(vec![
            FieldSchema::relation("organization_id", "Organization", "organizations", "name")
                .required(),
            FieldSchema::text("alias", "Alias")
                .required()
                .placeholder("acme-events"),
            FieldSchema::boolean("primary", "Primary").default_value(json!(false)),
        ])
        .list(ListConfig::new(vec![
            ColumnSchema::new("alias", "Alias"),
            ColumnSchema::new("primary", "Primary").kind(ColumnKind::Boolean),
        ]))
}

pub fn profiles() -> ResourceSchema {
    ResourceSchema::new("profiles", "Users")
        .platform_admin_only()
        .not_deletable()
        .fields(vec![
            FieldSchema::text("email", "Email").required().disabled_on_edit(),
            FieldSchema::text("full_name", "Full name"),
            FieldSchema::boolean("is_platform_admin", "Platform admin")
                .default_value(json!(false)),
            FieldSchema::new("avatar", "Avatar", FieldKind::image("avatars")),
        ])
        .list(
            ListConfig::new(vec![
                ColumnSchema::new("email", "Email"),
                ColumnSchema::new("full_name", "Name"),
                ColumnSchema::new("is_platform_admin", "Admin").kind(ColumnKind::Boolean),
            ])
            .sort(Sort::asc("email")),
        )
}

pub fn locales() -> ResourceSchema {
    ResourceSchema::new("locales", "Locales")
        .platform_admin_only()
        .fields(vec![
            FieldSchema::text("code", "Code")
                .required()
                .placeholder("en-GB")
                .disabled_on_edit(),
            FieldSchema::text("name", "Name").required(),
            FieldSchema::boolean("enabled", "Enabled").default_value(json!(true)),
        ])
        .list(
            ListConfig::new(vec![
                ColumnSchema::new("code", "Code").width(100),
                ColumnSchema::new("name", "Name"),
                ColumnSchema::new("enabled", "Enabled").kind(ColumnKind::Boolean),
            ])
            .sort(Sort::asc("code")),
        )
}

pub fn audit_log() -> ResourceSchema {
    ResourceSchema::new("audit_log", "Audit log")
        .platform_admin_only()
        .not_deletable()
        .org_scoped("organization_id")
        .fields(vec![
            FieldSchema::text("action", "Action").disabled_on_edit(),
            FieldSchema::text("resource", "Resource").disabled_on_edit(),
            FieldSchema::text("record_id", "Record").disabled_on_edit(),
            FieldSchema::json("changes", "Changes").disabled_on_edit(),
        ])
        .list(
            ListConfig::new(vec![
                ColumnSchema::new("created_at", "When").kind(ColumnKind::DateTime),
                ColumnSchema::new("action", "Action"),
                ColumnSchema::new("resource", "Resource"),
                ColumnSchema::new("record_id", "Record"),
            ])
            .sort(Sort::desc("created_at"))
            .page_size(100),
        )
}
