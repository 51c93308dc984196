//! User-visible notifications

use serde::Serialize;

use crate::error::{AdminError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    /// Field the message is about, for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
            field: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.into(),
            field: None,
        }
    }

    /// Backend messages are passed through verbatim.
    pub fn from_error(err: &AdminError) -> Self {
        let message = match err {
            AdminError::Backend(message) => message.clone(),
            other => other.to_string(),
        };
        let level = match err.kind() {
            ErrorKind::Configuration => NotificationLevel::Warning,
            ErrorKind::Validation | ErrorKind::Backend | ErrorKind::Permission => {
                NotificationLevel::Error
            }
        };
        Self {
            level,
            message,
            field: err.field().map(str::to_string),
        }
    }
}
