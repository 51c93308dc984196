//! Backoffice - declarative resource engine for a multi-tenant admin UI
//!
//! Static per-resource configuration (fields, columns, relations, routes)
//! drives one generic set of list, create and edit screens. No screen is
//! written per table.
//!
//! ## Pipeline
//!
//! ```text
//! route ─> SchemaRegistry ─> Screen ─> FormOrchestrator ─> FieldRenderer
//!                               │            │
//!                               │        Value codec (inbound / outbound)
//!                               ↓            ↓
//!                      CompositeKeyBackend ─> RecordBackend
//! ```
//!
//! ## Modules
//!
//! | Module | Role |
//! |--------|------|
//! | `schema` | Resource, field and column schemas; the catalog; the registry |
//! | `codec` | Storage ⇄ form value conversion |
//! | `renderer` | One field schema to one typed input with rules |
//! | `form` | Defaults, locks, validation and the submit state machine |
//! | `screens` | Generic list / create / edit screens |
//! | `locks` | Values fixed by navigation context |
//! | `navigation` | Query parameters and router state as one value |
//! | `composite` | `organization_members` id translation |
//! | `permissions`, `session` | Roles, capabilities, the access cache |
//! | `import` | Bulk invitee upsert |

pub mod backend;
pub mod codec;
pub mod composite;
pub mod config;
pub mod error;
pub mod form;
pub mod import;
pub mod locks;
pub mod navigation;
pub mod notification;
pub mod options;
pub mod permissions;
pub mod query;
pub mod renderer;
pub mod schema;
pub mod screens;
pub mod session;

// Re-exports
pub use backend::{ListPage, MemoryBackend, RecordBackend};
pub use codec::{FormValue, FormValues};
pub use composite::{parse_composite_id, CompositeKeyBackend, MemberKey};
pub use config::{AdminConfig, Args};
pub use error::{AdminError, ErrorKind};
pub use form::{FormOrchestrator, FormState};
pub use import::{ImportReport, InviteeImporter};
pub use locks::LockedFieldSet;
pub use navigation::{NavigationContext, NavigationTarget};
pub use notification::{Notification, NotificationLevel};
pub use options::MountGuard;
pub use permissions::{Access, AccessOracle, Capabilities, PermissionCache, Role, StaticAccessOracle};
pub use renderer::{FormMode, Widget};
pub use schema::catalog::default_registry;
pub use schema::SchemaRegistry;
pub use screens::{AdminContext, CreateScreen, EditScreen, ListScreen, ScreenState};
pub use session::Session;
