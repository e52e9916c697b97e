// ── Core error types ──
//
// User-facing errors from fieldops-core. Consumers never see reqwest or
// serde failures directly; `From<fieldops_api::Error>` translates
// transport-layer errors into domain variants.

use std::fmt;

use thiserror::Error;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every field error found in one submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors {
    pub fields: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.fields.push(FieldError {
            field: field.to_owned(),
            message: message.into(),
        });
    }

    /// Errors for one field.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach API: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Not authorized: {message}")]
    Unauthorized { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
        /// `message` is the server's own explanation.
        from_server: bool,
    },

    #[error("{entity_type} '{identifier}' not found")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Client-side refusals ─────────────────────────────────────────
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("{entity_type} '{id}' is {status} and cannot be deleted")]
    Locked {
        entity_type: String,
        id: String,
        status: String,
    },

    #[error("Unknown column '{key}' for {page}")]
    UnknownColumn { page: String, key: String },

    #[error("Unknown filter '{key}' for {page}")]
    UnknownFilter { page: String, key: String },

    #[error("Unknown pipeline stage '{stage}'")]
    UnknownStage { stage: String },

    #[error("Card '{card}' is not in stage '{stage}'")]
    CardNotInStage { card: String, stage: String },

    // ── Local state ──────────────────────────────────────────────────
    #[error("Preferences error: {message}")]
    Preferences { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Message suitable for a toast: the server's own text when it sent one,
    /// otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api {
                message,
                from_server: true,
                ..
            } => message.clone(),
            Self::Validation(errors) => errors.to_string(),
            Self::Locked { .. } | Self::Unauthorized { .. } => self.to_string(),
            _ => fallback.to_owned(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<fieldops_api::Error> for CoreError {
    fn from(err: fieldops_api::Error) -> Self {
        use fieldops_api::Error as ApiError;

        if err.is_timeout() {
            return Self::Timeout;
        }
        if err.is_transient() {
            return Self::ConnectionFailed {
                reason: err.to_string(),
            };
        }

        match err {
            ApiError::Unauthorized { message } => Self::Unauthorized { message },
            ApiError::Api {
                status,
                message,
                from_body,
            } => Self::Api {
                message,
                status: Some(status),
                from_server: from_body,
            },
            ApiError::NotFound { message, from_body } => Self::Api {
                message,
                status: Some(404),
                from_server: from_body,
            },
            ApiError::Deserialization { message, .. } => Self::Api {
                message: format!("unexpected response: {message}"),
                status: None,
                from_server: false,
            },
            ApiError::Transport(e) => Self::ConnectionFailed {
                reason: e.to_string(),
            },
            ApiError::InvalidUrl(e) => Self::Internal(format!("invalid URL: {e}")),
            ApiError::Tls(message) => Self::ConnectionFailed { reason: message },
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Preferences {
            message: err.to_string(),
        }
    }
}
