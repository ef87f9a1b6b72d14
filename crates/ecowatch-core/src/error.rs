// ── Core error types ──
//
// User-facing errors from ecowatch-core. These are NOT transport-specific:
// consumers never see reqwest errors directly. The error is `Clone`
// because a single failed fetch is handed to every caller waiting on it.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Network failures ─────────────────────────────────────────────
    #[error("Cannot reach {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Not authorized to read this resource (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// The server-specific error code (e.g., "station.not_found").
        code: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Unexpected response: {message}")]
    Decode { message: String },

    // ── Grid / column registration ───────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── Persistence ──────────────────────────────────────────────────
    #[error("Preference store error: {message}")]
    Persistence { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether the error came from the network (as opposed to local state).
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::Timeout { .. }
                | Self::Unauthorized { .. }
                | Self::NotFound { .. }
                | Self::Api { .. }
                | Self::Decode { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<ecowatch_api::Error> for CoreError {
    fn from(err: ecowatch_api::Error) -> Self {
        match err {
            ecowatch_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else if e.status().map(|s| s.as_u16()) == Some(404) {
                    CoreError::NotFound {
                        resource: e.url().map(|u| u.path().to_string()).unwrap_or_default(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ecowatch_api::Error::InvalidUrl(e) => CoreError::Validation {
                message: format!("Invalid URL: {e}"),
            },
            ecowatch_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            ecowatch_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ecowatch_api::Error::Unauthorized { status } => CoreError::Unauthorized { status },
            ecowatch_api::Error::Api {
                message,
                code: _,
                status: 404,
            } => CoreError::NotFound { resource: message },
            ecowatch_api::Error::Api {
                message,
                code,
                status,
            } => CoreError::Api {
                message,
                code,
                status: Some(status),
            },
            ecowatch_api::Error::Deserialization { message, body: _ } => {
                CoreError::Decode { message }
            }
            ecowatch_api::Error::InvalidRequest(message) => CoreError::Validation { message },
        }
    }
}
