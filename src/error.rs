//! Error types for the back-office engine
//!
//! Every failure the engine can produce is one `AdminError`. Screens recover
//! locally based on [`ErrorKind`]; nothing here is fatal to the application.

use thiserror::Error;

/// Recovery class of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or inconsistent static configuration - render a placeholder
    Configuration,
    /// Bad user input - block submission, keep the form values
    Validation,
    /// Record backend failure - surface verbatim, never retry
    Backend,
    /// Action not allowed for the caller
    Permission,
}

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Resource not configured: {0}")]
    NotConfigured(String),

    #[error("Resource {0} has no list configuration")]
    MissingListConfig(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{label}: {reason}")]
    Validation {
        field: String,
        label: String,
        reason: String,
    },

    #[error("Invalid composite id '{id}': {reason}")]
    InvalidCompositeId { id: String, reason: String },

    #[error("Invalid navigation parameters: {0}")]
    Navigation(String),

    #[error("Record not found: {resource}/{id}")]
    NotFound { resource: String, id: String },

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl AdminError {
    /// Build a field-scoped validation error
    pub fn validation(
        field: impl Into<String>,
        label: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        AdminError::Validation {
            field: field.into(),
            label: label.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AdminError::NotConfigured(_)
            | AdminError::MissingListConfig(_)
            | AdminError::Config(_)
            | AdminError::Toml(_)
            | AdminError::TomlSerialize(_) => ErrorKind::Configuration,
            AdminError::Validation { .. }
            | AdminError::InvalidCompositeId { .. }
            | AdminError::Navigation(_) => ErrorKind::Validation,
            AdminError::PermissionDenied(_) => ErrorKind::Permission,
            AdminError::NotFound { .. }
            | AdminError::Backend(_)
            | AdminError::Io(_)
            | AdminError::Json(_) => ErrorKind::Backend,
        }
    }

    /// Field key for field-scoped errors
    pub fn field(&self) -> Option<&str> {
        match self {
            AdminError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}
