//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use ecowatch_config::ConfigError;
use ecowatch_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach {url}")]
    #[diagnostic(
        code(ecowatch::connection_failed),
        help(
            "Check that the API is running and reachable.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(ecowatch::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not authorized (HTTP {status})")]
    #[diagnostic(
        code(ecowatch::unauthorized),
        help(
            "Provide a token with --token, ECOWATCH_TOKEN, or token_env in your profile.\n\
             Run: ecowatch config show"
        )
    )]
    Unauthorized { status: u16 },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(ecowatch::not_found), help("{hint}"))]
    NotFound {
        resource_type: String,
        identifier: String,
        hint: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(ecowatch::api_error))]
    ApiError { code: String, message: String },

    #[error("Unexpected response: {message}")]
    #[diagnostic(
        code(ecowatch::bad_response),
        help("Expected a JSON array or an object with a `data` array.")
    )]
    BadResponse { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(ecowatch::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(ecowatch::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: ecowatch config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No API base URL configured")]
    #[diagnostic(
        code(ecowatch::no_config),
        help(
            "Pass --base-url, or create a config with: ecowatch config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(ecowatch::config))]
    Config(ConfigError),

    // ── Local state ──────────────────────────────────────────────────
    #[error("Local state error: {message}")]
    #[diagnostic(code(ecowatch::state))]
    State { message: String },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to encode output: {0}")]
    #[diagnostic(code(ecowatch::encode))]
    Encode(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Unauthorized { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },

            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },

            CoreError::Unauthorized { status } => Self::Unauthorized { status },

            CoreError::NotFound { resource } => Self::NotFound {
                resource_type: "resource".into(),
                identifier: resource,
                hint: "Check the table path in your config.".into(),
            },

            CoreError::Api { message, code, .. } => Self::ApiError {
                code: code.unwrap_or_else(|| "unknown".into()),
                message,
            },

            CoreError::Decode { message } => Self::BadResponse { message },

            CoreError::Validation { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Persistence { message } => Self::State { message },

            CoreError::Internal(message) => Self::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

impl From<ecowatch_api::Error> for CliError {
    fn from(err: ecowatch_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownTable { table } => Self::NotFound {
                resource_type: "table".into(),
                identifier: table,
                hint: "Define it under [tables.<id>] or pass a PATH argument.".into(),
            },
            other => Self::Config(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err.to_string())
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Encode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases = [
            (
                CoreError::ConnectionFailed {
                    url: "http://x".into(),
                    reason: "refused".into(),
                },
                exit_code::CONNECTION,
            ),
            (CoreError::Timeout { timeout_secs: 5 }, exit_code::TIMEOUT),
            (CoreError::Unauthorized { status: 401 }, exit_code::AUTH),
            (
                CoreError::NotFound {
                    resource: "/x".into(),
                },
                exit_code::NOT_FOUND,
            ),
            (
                CoreError::Validation {
                    message: "bad".into(),
                },
                exit_code::USAGE,
            ),
            (CoreError::Internal("boom".into()), exit_code::GENERAL),
        ];
        for (core, code) in cases {
            assert_eq!(CliError::from(core).exit_code(), code);
        }
    }

    #[test]
    fn unknown_table_is_not_found() {
        let err = CliError::from(ConfigError::UnknownTable {
            table: "alerts".into(),
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        assert!(err.to_string().contains("alerts"));
    }
}
