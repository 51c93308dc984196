//! Resource groups - several resources rendered as tabs of one page

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGroup {
    pub name: String,
    pub label: String,
    pub route: String,
    /// Member resources in tab order
    pub resources: Vec<String>,
    /// Routable but not listed in primary navigation
    pub hidden: bool,
}

impl ResourceGroup {
    pub fn new(name: &str, label: &str, resources: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            route: format!("/{}", name),
            resources: resources.iter().map(|r| r.to_string()).collect(),
            hidden: false,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.resources.iter().any(|r| r == resource)
    }

    /// First tab, shown when no `tab` parameter is given
    pub fn default_tab(&self) -> Option<&str> {
        self.resources.first().map(String::as_str)
    }
}
