use thiserror::Error;

/// Top-level error type for the `ecowatch-api` crate.
///
/// Covers every failure mode of the transport: HTTP, URL handling,
/// server-reported errors and response decoding. `ecowatch-core` maps
/// these into domain errors that can be shared between waiters.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Server ──────────────────────────────────────────────────────
    /// The server rejected the request credentials (HTTP 401/403).
    #[error("Unauthorized (HTTP {status})")]
    Unauthorized { status: u16 },

    /// Structured error reported by the server.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        message: String,
        code: Option<String>,
        status: u16,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// The request could not be built (bad path, unsupported method, ...).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Extract the server error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Unauthorized { status } | Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = Error::Api {
            message: "bad gateway".into(),
            code: None,
            status: 502,
        };
        assert!(err.is_transient());
        assert_eq!(err.status(), Some(502));
    }

    #[test]
    fn not_found_is_detected_from_status() {
        let err = Error::Api {
            message: "missing".into(),
            code: Some("station.not_found".into()),
            status: 404,
        };
        assert!(err.is_not_found());
        assert!(!err.is_transient());
        assert_eq!(err.api_error_code(), Some("station.not_found"));
    }
}
