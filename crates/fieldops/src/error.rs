//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use fieldops_config::ConfigError;
use fieldops_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the API")]
    #[diagnostic(
        code(fieldops::connection_failed),
        help(
            "{reason}\n\
             Check the API URL and your network. Self-signed staging servers need --insecure (-k)."
        )
    )]
    ConnectionFailed { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not authorized: {message}")]
    #[diagnostic(
        code(fieldops::auth_failed),
        help(
            "Set a token with --token or FIELDOPS_TOKEN,\n\
             or store one with: fieldops config init"
        )
    )]
    AuthFailed { message: String },

    // ── Records ──────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(fieldops::not_found),
        help("Run: fieldops list {list_command} to see available records")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{message}")]
    #[diagnostic(
        code(fieldops::locked),
        help("Records in status '{status}' cannot be deleted.")
    )]
    Locked { message: String, status: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({status}): {message}")]
    #[diagnostic(code(fieldops::api_error))]
    ApiError { status: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(fieldops::validation))]
    Validation { field: String, reason: String },

    #[error("The record has invalid fields")]
    #[diagnostic(code(fieldops::invalid_fields), help("{details}"))]
    InvalidFields { details: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(fieldops::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: fieldops config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No API URL configured")]
    #[diagnostic(
        code(fieldops::no_config),
        help(
            "Create a profile with: fieldops config init\n\
             Or pass --api-url / set FIELDOPS_API_URL.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(fieldops::config))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(fieldops::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out")]
    #[diagnostic(
        code(fieldops::timeout),
        help("Increase the timeout with --timeout or check the API's responsiveness.")
    )]
    Timeout,

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(fieldops::json), help("Check the JSON input and try again."))]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Locked { .. } => exit_code::CONFLICT,
            Self::ApiError { status, .. } if status == "409" => exit_code::CONFLICT,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::InvalidFields { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { reason } => Self::ConnectionFailed { reason },

            CoreError::Timeout => Self::Timeout,

            CoreError::Unauthorized { message } => Self::AuthFailed { message },

            CoreError::Api {
                message, status, ..
            } => Self::ApiError {
                status: status.map_or_else(|| "-".into(), |s| s.to_string()),
                message,
            },

            CoreError::NotFound {
                entity_type,
                identifier,
            } => Self::NotFound {
                list_command: entity_type.replace(' ', "-") + "s",
                resource_type: entity_type,
                identifier,
            },

            CoreError::Validation(errors) => Self::InvalidFields {
                details: errors
                    .fields
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join("\n"),
            },

            CoreError::Locked {
                entity_type,
                id,
                status,
            } => Self::Locked {
                message: format!("{entity_type} '{id}' is {status} and cannot be deleted"),
                status,
            },

            CoreError::UnknownColumn { page, key } => Self::Validation {
                field: "column".into(),
                reason: format!("'{key}' is not a column of {page}"),
            },

            CoreError::UnknownFilter { page, key } => Self::Validation {
                field: "filter".into(),
                reason: format!("'{key}' is not a filter of {page}"),
            },

            CoreError::UnknownStage { stage } => Self::Validation {
                field: "stage".into(),
                reason: format!("unknown stage '{stage}'"),
            },

            CoreError::CardNotInStage { card, stage } => Self::Validation {
                field: "id".into(),
                reason: format!("'{card}' is not in stage '{stage}'"),
            },

            CoreError::Preferences { message } => Self::Validation {
                field: "preferences".into(),
                reason: message,
            },

            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}
