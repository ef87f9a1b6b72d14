//! The fetch capability consumed by the cache layer.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Error;
use crate::request::FetchRequest;

/// Asynchronous "fetch(request) → response" capability.
///
/// The cache never talks HTTP itself; it is handed something that
/// implements this trait. [`HttpFetcher`](crate::HttpFetcher) is the real
/// implementation; tests substitute in-memory fakes.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, request: &FetchRequest) -> impl Future<Output = Result<Value, Error>> + Send;
}

impl<F: Fetcher> Fetcher for Arc<F> {
    fn fetch(&self, request: &FetchRequest) -> impl Future<Output = Result<Value, Error>> + Send {
        (**self).fetch(request)
    }
}
