//! Schema registry - lookup table from resource name to schema
//!
//! Built once at startup and read-only afterwards. Construction validates the
//! whole catalog and reports every problem at once, so a misconfigured
//! resource is caught when the registry is built rather than when its screen
//! is first opened.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use super::{FieldKind, ResourceGroup, ResourceSchema};
use crate::error::AdminError;

/// Which generic screen a route points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    List,
    Create,
    Edit,
}

/// Result of resolving a concrete route path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub resource: String,
    pub screen: ScreenKind,
    pub id: Option<String>,
    /// Set when the path was a group page
    pub group: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    resources: BTreeMap<String, ResourceSchema>,
    /// Declaration order, for navigation menus
    order: Vec<String>,
    groups: Vec<ResourceGroup>,
}

impl SchemaRegistry {
    /// Build and validate a registry
    pub fn build(
        resources: Vec<ResourceSchema>,
        groups: Vec<ResourceGroup>,
    ) -> Result<Self, AdminError> {
        let mut errors = Vec::new();
        let mut map = BTreeMap::new();
        let mut order = Vec::new();

        for resource in resources {
            if map.contains_key(&resource.name) {
                errors.push(format!("duplicate resource '{}'", resource.name));
                continue;
            }
            order.push(resource.name.clone());
            map.insert(resource.name.clone(), resource);
        }

        for resource in map.values() {
            validate_resource(resource, &map, &mut errors);
        }
        validate_groups(&groups, &map, &mut errors);

        if !errors.is_empty() {
            return Err(AdminError::Config(errors.join("; ")));
        }

        info!(
            resources = map.len(),
            groups = groups.len(),
            "Schema registry built"
        );

        Ok(Self {
            resources: map,
            order,
            groups,
        })
    }

    pub fn get(&self, name: &str) -> Option<&ResourceSchema> {
        self.resources.get(name)
    }

    /// Look up a schema, treating a missing entry as a configuration error
    pub fn require(&self, name: &str) -> Result<&ResourceSchema, AdminError> {
        self.get(name)
            .ok_or_else(|| AdminError::NotConfigured(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Schemas in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &ResourceSchema> {
        self.order.iter().filter_map(|name| self.resources.get(name))
    }

    pub fn groups(&self) -> &[ResourceGroup] {
        &self.groups
    }

    pub fn visible_groups(&self) -> impl Iterator<Item = &ResourceGroup> {
        self.groups.iter().filter(|g| !g.hidden)
    }

    pub fn group(&self, name: &str) -> Option<&ResourceGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Group page a resource is shown in, preferring visible groups
    pub fn group_of(&self, resource: &str) -> Option<&ResourceGroup> {
        self.visible_groups()
            .find(|g| g.contains(resource))
            .or_else(|| self.groups.iter().find(|g| g.contains(resource)))
    }

    /// Map a concrete path (query string allowed) to a resource screen
    pub fn resolve_route(&self, path: &str) -> Option<RouteMatch> {
        let (path, query) = match path.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path, None),
        };
        let path = normalize(path);

        if let Some(group) = self.groups.iter().find(|g| normalize(&g.route) == path) {
            let tab = query.and_then(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .find(|(k, _)| k == "tab")
                    .map(|(_, v)| v.into_owned())
            });
            let resource = tab
                .filter(|t| group.contains(t))
                .or_else(|| group.default_tab().map(str::to_string))?;
            debug!(group = %group.name, resource = %resource, "Resolved group route");
            return Some(RouteMatch {
                resource,
                screen: ScreenKind::List,
                id: None,
                group: Some(group.name.clone()),
            });
        }

        for schema in self.iter() {
            let routes = &schema.routes;
            if normalize(&routes.list) == path {
                return Some(route_match(schema, ScreenKind::List, None));
            }
            if normalize(&routes.create) == path {
                return Some(route_match(schema, ScreenKind::Create, None));
            }
            if let Some(id) = match_template(&routes.edit, path) {
                return Some(route_match(schema, ScreenKind::Edit, Some(id)));
            }
        }
        None
    }
}

fn route_match(schema: &ResourceSchema, screen: ScreenKind, id: Option<String>) -> RouteMatch {
    RouteMatch {
        resource: schema.name.clone(),
        screen,
        id,
        group: None,
    }
}

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Match `/events/edit/:id` against `/events/edit/42`, returning the decoded id
fn match_template(template: &str, path: &str) -> Option<String> {
    let tpl: Vec<&str> = normalize(template).split('/').collect();
    let segs: Vec<&str> = path.split('/').collect();
    if tpl.len() != segs.len() {
        return None;
    }

    let mut id = None;
    for (t, s) in tpl.iter().zip(segs.iter()) {
        if *t == ":id" {
            if s.is_empty() {
                return None;
            }
            id = Some(decode_segment(s));
        } else if t != s {
            return None;
        }
    }
    id
}

fn decode_segment(segment: &str) -> String {
    let pair = format!("v={}", segment);
    url::form_urlencoded::parse(pair.as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_else(|| segment.to_string())
}

fn validate_resource(
    resource: &ResourceSchema,
    all: &BTreeMap<String, ResourceSchema>,
    errors: &mut Vec<String>,
) {
    let name = &resource.name;
    let mut keys = BTreeSet::new();

    for field in &resource.fields {
        if !keys.insert(field.key.as_str()) {
            errors.push(format!("{}: duplicate field '{}'", name, field.key));
        }

        match (&field.kind, &field.relation) {
            (FieldKind::RelationSelect, None) => errors.push(format!(
                "{}.{}: relation-select field has no relation",
                name, field.key
            )),
            (kind, Some(_)) if !kind.accepts_relation() => errors.push(format!(
                "{}.{}: relation declared on a non-select field",
                name, field.key
            )),
            _ => {}
        }

        if let Some(relation) = &field.relation {
            if !all.contains_key(&relation.resource) {
                errors.push(format!(
                    "{}.{}: relation target '{}' has no schema",
                    name, field.key, relation.resource
                ));
            }
        }

        if let (Some(min), Some(max)) = (field.min, field.max) {
            if min > max {
                errors.push(format!("{}.{}: min {} exceeds max {}", name, field.key, min, max));
            }
        }
    }

    if let Some(list) = &resource.list {
        for column in &list.columns {
            let known = keys.contains(column.key.as_str())
                || column.key == "id"
                || column.render.is_some()
                || resource.org_key.as_deref() == Some(column.key.as_str());
            if !known && column.kind.is_none() {
                errors.push(format!("{}: column '{}' names no field", name, column.key));
            }
        }
    }

    if let Some(link) = &resource.translation {
        if !all.contains_key(&link.parent) {
            errors.push(format!(
                "{}: translation parent '{}' has no schema",
                name, link.parent
            ));
        }
        if !keys.contains(link.foreign_key.as_str()) {
            errors.push(format!(
                "{}: translation key '{}' is not a field",
                name, link.foreign_key
            ));
        }
    }
}

fn validate_groups(
    groups: &[ResourceGroup],
    all: &BTreeMap<String, ResourceSchema>,
    errors: &mut Vec<String>,
) {
    let mut names = BTreeSet::new();
    let mut visible_owner: BTreeMap<&str, &str> = BTreeMap::new();

    for group in groups {
        if !names.insert(group.name.as_str()) {
            errors.push(format!("duplicate group '{}'", group.name));
        }
        if group.resources.is_empty() {
            errors.push(format!("group '{}' has no resources", group.name));
        }
        for resource in &group.resources {
            if !all.contains_key(resource) {
                errors.push(format!(
                    "group '{}': resource '{}' has no schema",
                    group.name, resource
                ));
            }
            if group.hidden {
                continue;
            }
            if let Some(owner) = visible_owner.insert(resource, &group.name) {
                errors.push(format!(
                    "resource '{}' is in visible groups '{}' and '{}'",
                    resource, owner, group.name
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSchema, FieldSchema, ListConfig};

    fn events() -> ResourceSchema {
        ResourceSchema::new("events", "Events")
            .org_scoped("organization_id")
            .fields(vec![FieldSchema::text("name", "Name").required()])
            .list(ListConfig::new(vec![ColumnSchema::new("name", "Name")]))
    }

    fn registry() -> SchemaRegistry {
        SchemaRegistry::build(
            vec![
                events(),
                ResourceSchema::new("invitees", "Invitees").fields(vec![
                    FieldSchema::relation("event_id", "Event", "events", "name"),
                ]),
            ],
            vec![ResourceGroup::new("event", "Event", &["invitees", "events"])],
        )
        .unwrap()
    }

    #[test]
    fn test_require_missing_is_configuration_error() {
        let reg = registry();
        assert!(reg.require("events").is_ok());
        let err = reg.require("ghosts").unwrap_err();
        assert!(matches!(err, AdminError::NotConfigured(name) if name == "ghosts"));
    }

    #[test]
    fn test_duplicate_resource_rejected() {
        let result = SchemaRegistry::build(vec![events(), events()], vec![]);
        assert!(result.unwrap_err().to_string().contains("duplicate resource"));
    }

    #[test]
    fn test_relation_to_unknown_target_fails_fast() {
        let result = SchemaRegistry::build(
            vec![ResourceSchema::new("rsvps", "RSVPs").fields(vec![FieldSchema::relation(
                "invitee_id",
                "Invitee",
                "invitees",
                "email",
            )])],
            vec![],
        );
        let message = result.unwrap_err().to_string();
        assert!(message.contains("relation target 'invitees' has no schema"));
    }

    #[test]
    fn test_relation_select_without_relation_rejected() {
        let result = SchemaRegistry::build(
            vec![ResourceSchema::new("rsvps", "RSVPs").fields(vec![FieldSchema::new(
                "invitee_id",
                "Invitee",
                FieldKind::RelationSelect,
            )])],
            vec![],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = SchemaRegistry::build(
            vec![ResourceSchema::new("tags", "Tags").fields(vec![
                FieldSchema::text("name", "Name"),
                FieldSchema::text("name", "Name again"),
            ])],
            vec![],
        );
        assert!(result.unwrap_err().to_string().contains("duplicate field 'name'"));
    }

    #[test]
    fn test_resource_in_two_visible_groups_rejected() {
        let result = SchemaRegistry::build(
            vec![events()],
            vec![
                ResourceGroup::new("a", "A", &["events"]),
                ResourceGroup::new("b", "B", &["events"]),
            ],
        );
        assert!(result.is_err());

        let hidden_ok = SchemaRegistry::build(
            vec![events()],
            vec![
                ResourceGroup::new("a", "A", &["events"]),
                ResourceGroup::new("b", "B", &["events"]).hidden(),
            ],
        );
        assert!(hidden_ok.is_ok());
    }

    #[test]
    fn test_resolve_resource_routes() {
        let reg = registry();
        let m = reg.resolve_route("/events").unwrap();
        assert_eq!(m.resource, "events");
        assert_eq!(m.screen, ScreenKind::List);

        let m = reg.resolve_route("/events/create?organizationId=7").unwrap();
        assert_eq!(m.screen, ScreenKind::Create);

        let m = reg.resolve_route("/events/edit/42").unwrap();
        assert_eq!(m.screen, ScreenKind::Edit);
        assert_eq!(m.id.as_deref(), Some("42"));

        assert!(reg.resolve_route("/nowhere").is_none());
    }

    #[test]
    fn test_resolve_group_route_uses_tab() {
        let reg = registry();
        let m = reg.resolve_route("/event?tab=events").unwrap();
        assert_eq!(m.resource, "events");
        assert_eq!(m.group.as_deref(), Some("event"));

        let default_tab = reg.resolve_route("/event").unwrap();
        assert_eq!(default_tab.resource, "invitees");

        let unknown_tab = reg.resolve_route("/event?tab=ghosts").unwrap();
        assert_eq!(unknown_tab.resource, "invitees");
    }

    #[test]
    fn test_decode_composite_id_segment() {
        assert_eq!(
            match_template("/organization_members/edit/:id", "/organization_members/edit/a%3Ab"),
            Some("a:b".to_string())
        );
    }
}
