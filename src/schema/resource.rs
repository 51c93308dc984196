//! Resource schema - one manageable entity type

use serde_json::Value;

use super::{ColumnSchema, FieldSchema, Record};
use crate::query::{value_to_param, Filter, Sort};

/// Derives a row identity when `id` is not enough (composite keys)
pub type IdExtractor = fn(&Record) -> Option<String>;

/// Route templates for the three generic screens. `:id` marks the record id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplates {
    pub list: String,
    pub create: String,
    pub edit: String,
}

impl RouteTemplates {
    /// `/{name}`, `/{name}/create`, `/{name}/edit/:id`
    pub fn standard(name: &str) -> Self {
        Self {
            list: format!("/{}", name),
            create: format!("/{}/create", name),
            edit: format!("/{}/edit/:id", name),
        }
    }

    pub fn edit_path(&self, id: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
        self.edit.replace(":id", &encoded)
    }
}

/// List-view configuration
#[derive(Debug, Clone, Default)]
pub struct ListConfig {
    pub columns: Vec<ColumnSchema>,
    pub initial_sort: Option<Sort>,
    pub initial_filters: Vec<Filter>,
    pub page_size: Option<usize>,
}

impl ListConfig {
    pub fn new(columns: Vec<ColumnSchema>) -> Self {
        Self {
            columns,
            ..Default::default()
        }
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.initial_sort = Some(sort);
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.initial_filters.push(filter);
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }
}

/// Links a `_translations` resource to the record it translates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationLink {
    pub parent: String,
    pub foreign_key: String,
}

/// One manageable entity type
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    /// Globally unique; join key for routes, relations and the backend
    pub name: String,
    pub label: String,
    pub routes: RouteTemplates,
    /// Field filtered to the caller's active organization
    pub org_key: Option<String>,
    pub id_extractor: Option<IdExtractor>,
    pub deletable: bool,
    pub requires_platform_admin: bool,
    pub fields: Vec<FieldSchema>,
    pub list: Option<ListConfig>,
    pub translation: Option<TranslationLink>,
    /// Column selection passed to the backend on get/update
    pub projection: Option<String>,
}

impl ResourceSchema {
    pub fn new(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            routes: RouteTemplates::standard(name),
            org_key: None,
            id_extractor: None,
            deletable: true,
            requires_platform_admin: false,
            fields: Vec::new(),
            list: None,
            translation: None,
            projection: None,
        }
    }

    pub fn fields(mut self, fields: Vec<FieldSchema>) -> Self {
        self.fields = fields;
        self
    }

    pub fn list(mut self, list: ListConfig) -> Self {
        self.list = Some(list);
        self
    }

    pub fn org_scoped(mut self, key: &str) -> Self {
        self.org_key = Some(key.to_string());
        self
    }

    pub fn id_extractor(mut self, extractor: IdExtractor) -> Self {
        self.id_extractor = Some(extractor);
        self
    }

    pub fn not_deletable(mut self) -> Self {
        self.deletable = false;
        self
    }

    pub fn platform_admin_only(mut self) -> Self {
        self.requires_platform_admin = true;
        self
    }

    pub fn translation_of(mut self, parent: &str, foreign_key: &str) -> Self {
        self.translation = Some(TranslationLink {
            parent: parent.to_string(),
            foreign_key: foreign_key.to_string(),
        });
        self
    }

    pub fn projection(mut self, projection: &str) -> Self {
        self.projection = Some(projection.to_string());
        self
    }

    pub fn routes(mut self, routes: RouteTemplates) -> Self {
        self.routes = routes;
        self
    }

    pub fn field(&self, key: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Row identity: the custom extractor when present, else `id`
    pub fn record_id(&self, record: &Record) -> Option<String> {
        if let Some(extract) = self.id_extractor {
            return extract(record);
        }
        match record.get("id") {
            None | Some(Value::Null) => None,
            Some(value) => Some(value_to_param(value)),
        }
    }

    pub fn translation_key(&self) -> Option<&str> {
        self.translation.as_ref().map(|t| t.foreign_key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_standard_routes() {
        let routes = RouteTemplates::standard("events");
        assert_eq!(routes.list, "/events");
        assert_eq!(routes.create, "/events/create");
        assert_eq!(routes.edit_path("42"), "/events/edit/42");
    }

    #[test]
    fn test_edit_path_encodes_composite_id() {
        let routes = RouteTemplates::standard("organization_members");
        assert_eq!(
            routes.edit_path("org-1:user-2"),
            "/organization_members/edit/org-1%3Auser-2"
        );
    }

    #[test]
    fn test_record_id_defaults_to_id() {
        let schema = ResourceSchema::new("events", "Events");
        let record = json!({ "id": 42 }).as_object().cloned().unwrap();
        assert_eq!(schema.record_id(&record), Some("42".to_string()));
        assert_eq!(schema.record_id(&Record::new()), None);
    }

    #[test]
    fn test_record_id_uses_extractor() {
        fn pair(record: &Record) -> Option<String> {
            Some(format!(
                "{}:{}",
                record.get("a")?.as_str()?,
                record.get("b")?.as_str()?
            ))
        }
        let schema = ResourceSchema::new("pairs", "Pairs").id_extractor(pair);
        let record = json!({ "a": "x", "b": "y", "id": 1 }).as_object().cloned().unwrap();
        assert_eq!(schema.record_id(&record), Some("x:y".to_string()));
    }
}
