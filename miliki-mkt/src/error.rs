//! Error types for miliki-mkt
//!
//! Defines the service error taxonomy using thiserror. Validation errors
//! are field-scoped and block submission locally; configuration errors
//! name the missing credential; upstream errors carry whatever
//! message/detail/hint the remote service provided.

use thiserror::Error;

/// Field-scoped validation messages collected before any network call
#[derive(Debug, Clone, Default)]
pub struct FieldErrors {
    pub errors: Vec<FieldError>,
}

/// One validation message tied to a form field
#[derive(Debug, Clone)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Ok when no field failed, otherwise a Validation error
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Main error type for miliki-mkt
#[derive(Error, Debug)]
pub enum Error {
    /// Form validation failure (local, blocks submission, never a system failure)
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// A required external credential or setting is absent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Action attempted with no signed-in user
    #[error("Authentication required")]
    AuthRequired,

    /// Persistence, upload, or blockchain call rejected or timed out
    #[error("Upstream error: {message}")]
    Upstream {
        message: String,
        detail: Option<String>,
        hint: Option<String>,
    },

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// Errors bubbled up from the common crate
    #[error(transparent)]
    Common(#[from] miliki_common::Error),
}

impl Error {
    /// Upstream error with just a message
    pub fn upstream(message: impl Into<String>) -> Self {
        Error::Upstream {
            message: message.into(),
            detail: None,
            hint: None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Upstream {
            message: format!("HTTP request failed: {}", e),
            detail: e.url().map(|u| u.to_string()),
            hint: None,
        }
    }
}

/// Convenience Result type using miliki-mkt Error
pub type Result<T> = std::result::Result<T, Error>;
