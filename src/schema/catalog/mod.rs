//! The platform's resource catalog
//!
//! Static configuration only; [`default_registry`] validates it into a
//! [`SchemaRegistry`] at startup.

mod content;
mod events;
mod invitees;
mod organizations;

use crate::error::AdminError;
use crate::schema::{FieldKind, FieldSchema, ResourceGroup, ResourceSchema, SchemaRegistry};

/// Foreign key to the translated record plus the locale
pub(crate) fn translation_fields(
    foreign_key: &str,
    label: &str,
    parent: &str,
    parent_label: &str,
) -> Vec<FieldSchema> {
    vec![
        FieldSchema::relation(foreign_key, label, parent, parent_label).required(),
        FieldSchema::new("locale", "Locale", FieldKind::Locale).required(),
    ]
}

/// Every resource, in navigation order
pub fn resources() -> Vec<ResourceSchema> {
    vec![
        organizations::organizations(),
        organizations::organization_members(),
        organizations::organization_aliases(),
        organizations::profiles(),
        organizations::locales(),
        events::events(),
        events::event_translations(),
        events::event_schedules(),
        events::venues(),
        events::venue_translations(),
        content::templates(),
        content::template_translations(),
        invitees::invitees(),
        invitees::tags(),
        invitees::invitee_tags(),
        invitees::rsvps(),
        invitees::rsvp_questions(),
        invitees::rsvp_answers(),
        content::trivia(),
        content::trivia_translations(),
        content::announcements(),
        content::announcement_translations(),
        invitees::imports(),
        organizations::audit_log(),
    ]
}

pub fn groups() -> Vec<ResourceGroup> {
    vec![
        ResourceGroup::new(
            "organization",
            "Organization",
            &["organization_members", "organization_aliases", "trivia"],
        ),
        ResourceGroup::new(
            "event",
            "Event",
            &["event_schedules", "invitees", "rsvps", "event_translations"],
        ),
        ResourceGroup::new("content", "Content", &["templates", "announcements"]),
        ResourceGroup::new("import", "Imports", &["imports"]).hidden(),
    ]
}

/// Registry over the full catalog
pub fn default_registry() -> Result<SchemaRegistry, AdminError> {
    SchemaRegistry::build(resources(), groups())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_builds() {
        let registry = default_registry().unwrap();
        assert!(registry.len() >= 20);
    }

    #[test]
    fn test_translation_resources_are_linked() {
        let registry = default_registry().unwrap();
        for schema in registry.iter().filter(|s| s.name.ends_with("_translations")) {
            let link = schema
                .translation
                .as_ref()
                .unwrap_or_else(|| panic!("{} has no translation link", schema.name));
            assert!(registry.contains(&link.parent));
            assert!(schema.field(&link.foreign_key).is_some());
        }
    }

    #[test]
    fn test_group_lookup() {
        let registry = default_registry().unwrap();
        assert_eq!(registry.group_of("invitees").unwrap().name, "event");
        assert_eq!(registry.group_of("imports").unwrap().name, "import");
        assert!(registry.group_of("locales").is_none());
        assert_eq!(registry.visible_groups().count(), 3);
    }

    #[test]
    fn test_members_use_composite_ids() {
        let registry = default_registry().unwrap();
        let members = registry.get("organization_members").unwrap();
        assert!(members.id_extractor.is_some());
    }
}
