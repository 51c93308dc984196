//! Declarative resource schemas
//!
//! Pure data describing every manageable resource: its fields, list columns,
//! routes and organization scoping. The generic screens read nothing else.
//!
//! ```text
//! SchemaRegistry
//!   └── ResourceSchema (one per resource)
//!         ├── FieldSchema  (form inputs, optional Relation)
//!         ├── ListConfig   (ColumnSchema, initial sort/filter)
//!         └── TranslationLink (for *_translations resources)
//! ```

pub mod catalog;
mod column;
mod field;
mod group;
mod registry;
mod resource;

pub use column::{CellRenderer, ColumnKind, ColumnSchema};
pub use field::{FieldKind, FieldSchema, Projection, Relation, SelectOption};
pub use group::ResourceGroup;
pub use registry::{RouteMatch, SchemaRegistry, ScreenKind};
pub use resource::{IdExtractor, ListConfig, ResourceSchema, RouteTemplates, TranslationLink};

/// One row as stored by the record backend
pub type Record = serde_json::Map<String, serde_json::Value>;
