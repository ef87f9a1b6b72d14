//! Async transport for the ecowatch monitoring REST API.
//!
//! - **[`FetchRequest`]**: method, path, query parameters and an
//!   authenticated/anonymous flag. Parameter values are JSON; blank values
//!   never reach the wire and arrays expand into repeated pairs.
//!
//! - **[`Fetcher`]**: the opaque "fetch(request) → response" capability
//!   the cache layer is built on.
//!
//! - **[`HttpFetcher`]**: `reqwest` implementation of [`Fetcher`] with
//!   bearer-token injection and structured error parsing.

pub mod error;
pub mod fetch;
pub mod http;
pub mod request;
pub mod transport;

pub use error::Error;
pub use fetch::Fetcher;
pub use http::HttpFetcher;
pub use request::{FetchRequest, Method, QueryParams};
pub use transport::{TlsMode, TransportConfig};
