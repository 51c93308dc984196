//! Navigation context carried between screens
//!
//! Query parameters and router state are folded into one explicit value.
//! When both are present, the explicit query parameter wins over inherited
//! state, field by field.
//!
//! Recognized parameters:
//!
//! - `tab`, `view` - position within a group page
//! - `organizationId` - organization the caller arrived from
//! - `filters[0][field]`, `filters[0][operator]`, `filters[0][value]`
//! - anything else (e.g. `event_id=42`) is kept in `params`

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::AdminError;
use crate::locks::coerce_param;
use crate::query::{Filter, FilterOperator};
use crate::schema::FieldSchema;

const FILTER_FIELD: &str = "filters[0][field]";
const FILTER_OPERATOR: &str = "filters[0][operator]";
const FILTER_VALUE: &str = "filters[0][value]";

/// `(field, operator, value)` filter carried in the query string
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterTriple {
    pub field: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl FilterTriple {
    /// Filter with the value typed like the target field stores it
    ///
    /// `capacity gt 10` compares against the number 10. `in` and `contains`
    /// keep the raw text.
    pub fn to_filter(&self, field: Option<&FieldSchema>) -> Filter {
        let value = match self.operator {
            FilterOperator::In | FilterOperator::Contains => Value::String(self.value.clone()),
            _ => coerce_param(field, &self.value),
        };
        Filter::new(&self.field, self.operator, value)
    }

    /// The value when this triple pins `key` by equality
    pub fn pinned_value(&self, key: &str) -> Option<&str> {
        (self.operator == FilterOperator::Eq && self.field == key).then_some(self.value.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NavigationContext {
    pub tab: Option<String>,
    pub view: Option<String>,
    pub organization_id: Option<String>,
    pub filter: Option<FilterTriple>,
    pub params: BTreeMap<String, String>,
}

impl NavigationContext {
    /// Parse a query string, with or without the leading `?`
    pub fn from_query(query: &str) -> Result<Self, AdminError> {
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_str(query.trim_start_matches('?'))
                .map_err(|e| AdminError::Navigation(e.to_string()))?;

        let mut ctx = Self::default();
        let (mut f_field, mut f_op, mut f_value) = (None, None, None);

        for (key, value) in pairs {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "tab" => ctx.tab = Some(value),
                "view" => ctx.view = Some(value),
                "organizationId" => ctx.organization_id = Some(value),
                FILTER_FIELD => f_field = Some(value),
                FILTER_OPERATOR => f_op = Some(value),
                FILTER_VALUE => f_value = Some(value),
                _ => {
                    ctx.params.insert(key, value);
                }
            }
        }

        ctx.filter = match (f_field, f_op, f_value) {
            (Some(field), Some(op), Some(value)) => match FilterOperator::parse(&op) {
                Ok(operator) => Some(FilterTriple {
                    field,
                    operator,
                    value,
                }),
                Err(e) => {
                    warn!("Ignoring navigation filter: {}", e);
                    None
                }
            },
            (None, None, None) => None,
            _ => {
                warn!("Ignoring incomplete navigation filter triple");
                None
            }
        };

        Ok(ctx)
    }

    /// Combine explicit query parameters with inherited router state
    pub fn resolve(explicit: Self, inherited: Option<Self>) -> Self {
        let Some(inherited) = inherited else {
            return explicit;
        };

        let mut params = inherited.params;
        params.extend(explicit.params);

        Self {
            tab: explicit.tab.or(inherited.tab),
            view: explicit.view.or(inherited.view),
            organization_id: explicit.organization_id.or(inherited.organization_id),
            filter: explicit.filter.or(inherited.filter),
            params,
        }
    }

    pub fn with_tab(mut self, tab: &str) -> Self {
        self.tab = Some(tab.to_string());
        self
    }

    pub fn with_organization(mut self, organization_id: &str) -> Self {
        self.organization_id = Some(organization_id.to_string());
        self
    }

    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The part re-attached when returning to the caller: tab, view,
    /// organization and filter. Parent-record params are dropped.
    pub fn preserved(&self) -> Self {
        Self {
            tab: self.tab.clone(),
            view: self.view.clone(),
            organization_id: self.organization_id.clone(),
            filter: self.filter.clone(),
            params: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tab.is_none()
            && self.view.is_none()
            && self.organization_id.is_none()
            && self.filter.is_none()
            && self.params.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        let mut pairs: Vec<(&str, &str)> = Vec::new();
        if let Some(tab) = &self.tab {
            pairs.push(("tab", tab));
        }
        if let Some(view) = &self.view {
            pairs.push(("view", view));
        }
        if let Some(org) = &self.organization_id {
            pairs.push(("organizationId", org));
        }
        if let Some(filter) = &self.filter {
            pairs.push((FILTER_FIELD, &filter.field));
            pairs.push((FILTER_OPERATOR, filter.operator.as_str()));
            pairs.push((FILTER_VALUE, &filter.value));
        }
        for (key, value) in &self.params {
            pairs.push((key, value));
        }
        serde_urlencoded::to_string(pairs).unwrap_or_default()
    }
}

/// Where a screen sends the user next
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationTarget {
    pub path: String,
    pub context: NavigationContext,
}

impl NavigationTarget {
    pub fn new(path: impl Into<String>, context: NavigationContext) -> Self {
        Self {
            path: path.into(),
            context,
        }
    }

    pub fn to_url(&self) -> String {
        let query = self.context.to_query_string();
        if query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, query)
        }
    }
}
