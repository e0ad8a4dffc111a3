use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Category of a template backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorKind {
    /// The subscription (or its entity) does not exist on the backend
    NotFound,
    /// The template failed to render
    TemplateError,
    /// The connection to the backend is gone
    Disconnected,
    Other,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendErrorKind::NotFound => "not_found",
            BackendErrorKind::TemplateError => "template_error",
            BackendErrorKind::Disconnected => "disconnected",
            BackendErrorKind::Other => "other",
        })
    }
}

/// Failure reported by a [`TemplateBackend`](crate::TemplateBackend).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::NotFound, message)
    }

    pub fn template(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::TemplateError, message)
    }

    pub fn disconnected(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Disconnected, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Other, message)
    }

    /// Unsubscribe failures of these kinds mean the subscription is already
    /// gone on the backend side.
    #[must_use]
    pub fn is_already_gone(&self) -> bool {
        matches!(
            self.kind,
            BackendErrorKind::NotFound | BackendErrorKind::TemplateError
        )
    }
}
