// HTTP implementation of the fetch capability.
//
// Wraps `reqwest::Client` with base-URL path joining, wire encoding of
// query parameters, bearer-token injection for authenticated requests and
// error-body parsing.

use std::future::Future;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::fetch::Fetcher;
use crate::request::FetchRequest;
use crate::transport::TransportConfig;

// ── Error response shape from the monitoring API ─────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// JSON-over-HTTP fetcher for the monitoring REST API.
pub struct HttpFetcher {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl HttpFetcher {
    /// Build a fetcher from a base URL and transport settings.
    pub fn new(
        base_url: &str,
        token: Option<SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, Url::parse(base_url)?, token))
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, token: Option<SecretString>) -> Self {
        Self {
            http,
            base_url,
            token,
        }
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append `path` to the base URL path (never replaces it, unlike `Url::join`).
    fn url(&self, path: &str) -> Result<Url, Error> {
        if path.contains("://") || path.contains('?') {
            return Err(Error::InvalidRequest(format!(
                "path must be relative and carry no query string: {path}"
            )));
        }
        let mut url = self.base_url.clone();
        let base = url.path().trim_end_matches('/').to_owned();
        let rel = path.trim_start_matches('/');
        url.set_path(&format!("{base}/{rel}"));
        Ok(url)
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response(resp: reqwest::Response) -> Result<Value, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            if body.trim().is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Error::Unauthorized {
                status: status.as_u16(),
            };
        }

        let raw = resp.text().await.unwrap_or_default();

        if let Ok(err) = serde_json::from_str::<ErrorResponse>(&raw) {
            Error::Api {
                status: status.as_u16(),
                message: err.message.unwrap_or_else(|| status.to_string()),
                code: err.code,
            }
        } else {
            Error::Api {
                status: status.as_u16(),
                message: if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                },
                code: None,
            }
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, request: &FetchRequest) -> impl Future<Output = Result<Value, Error>> + Send {
        async move {
            let url = self.url(&request.path)?;
            let pairs = request.params.pairs();
            debug!(method = %request.method, %url, params = ?pairs, "fetch");

            let mut builder = self.http.request(request.method.into(), url).query(&pairs);
            if request.authenticated {
                if let Some(ref token) = self.token {
                    builder = builder.bearer_auth(token.expose_secret());
                }
            }

            let resp = builder.send().await?;
            Self::handle_response(resp).await
        }
    }
}
