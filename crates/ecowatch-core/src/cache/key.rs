// ── Canonical cache keys ──
//
// `METHOD:path?sorted=pairs:a|p`. Parameter order and blank values never
// influence the key, so logically identical reads share one cache slot.

use std::fmt;

use ecowatch_api::{FetchRequest, Method, QueryParams};
use url::form_urlencoded;

/// Auth suffix for requests carrying credentials.
const AUTHENTICATED: char = 'a';
/// Auth suffix for anonymous requests.
const PUBLIC: char = 'p';

/// Canonical, order-independent key of a read request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(String);

impl QueryKey {
    /// Encode a request tuple into its canonical key.
    pub fn encode(method: Method, path: &str, params: &QueryParams, authenticated: bool) -> Self {
        let mut pairs = params.pairs();
        pairs.sort();

        let query = if pairs.is_empty() {
            String::new()
        } else {
            let encoded = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&pairs)
                .finish();
            format!("?{encoded}")
        };

        let flag = if authenticated { AUTHENTICATED } else { PUBLIC };
        Self(format!("{method}:{path}{query}:{flag}"))
    }

    pub fn for_request(request: &FetchRequest) -> Self {
        Self::encode(
            request.method,
            &request.path,
            &request.params,
            request.authenticated,
        )
    }

    /// The key prefix shared by every variant of `method path`.
    pub fn path_prefix(method: Method, path: &str) -> String {
        format!("{method}:{path}")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Whether `key` reads the resource named by `prefix` (a
/// [`QueryKey::path_prefix`]) or one below it.
///
/// The match must end on `/`, `?` or the trailing auth flag. A `:` inside
/// the path is part of the path, so `/users` does not cover `/users:batch`.
pub(crate) fn covers_path(prefix: &str, key: &str) -> bool {
    let Some(rest) = key.strip_prefix(prefix) else {
        return false;
    };
    if prefix.ends_with('/') || rest.is_empty() || rest.starts_with(['?', '/']) {
        return true;
    }
    let mut tail = rest.chars();
    tail.next() == Some(':')
        && matches!(tail.next(), Some(AUTHENTICATED | PUBLIC))
        && tail.next().is_none()
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for QueryKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&FetchRequest> for QueryKey {
    fn from(request: &FetchRequest) -> Self {
        Self::for_request(request)
    }
}
