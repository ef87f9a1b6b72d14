// ── Cached, deduplicated reads ──
//
// Cache hit → return. In-flight request for the key → attach to it.
// Otherwise spawn the loader, cache its value on success, and release the
// pending slot however it settles.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ecowatch_api::{FetchRequest, Fetcher};
use serde_json::Value;
use tracing::{debug, warn};

use super::key::QueryKey;
use super::pending::{PendingRegistry, Registration};
use super::store::ResponseCache;
use crate::config::CacheConfig;
use crate::error::CoreError;

/// Where a value returned by [`CachedFetch::get_json_or_stale`] came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Freshness<V> {
    /// Served fresh from the cache or the network.
    Fresh(V),
    /// The network failed; this is an older cached copy.
    Stale { value: V, error: CoreError },
}

impl<V> Freshness<V> {
    pub fn into_value(self) -> V {
        match self {
            Self::Fresh(value) | Self::Stale { value, .. } => value,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }
}

/// The read entry point shared by every screen.
///
/// Cheap to clone: the cache and registry are shared behind `Arc`s, so
/// clones see the same entries and in-flight requests.
pub struct CachedFetch<V = Value> {
    cache: Arc<ResponseCache<V>>,
    pending: Arc<PendingRegistry<V>>,
    config: CacheConfig,
}

impl<V> Clone for CachedFetch<V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            pending: Arc::clone(&self.pending),
            config: self.config.clone(),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> CachedFetch<V> {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_parts(
            Arc::new(ResponseCache::new()),
            Arc::new(PendingRegistry::new()),
            config,
        )
    }

    /// Build on an existing cache and registry.
    pub fn with_parts(
        cache: Arc<ResponseCache<V>>,
        pending: Arc<PendingRegistry<V>>,
        config: CacheConfig,
    ) -> Self {
        Self {
            cache,
            pending,
            config,
        }
    }

    pub fn cache(&self) -> &Arc<ResponseCache<V>> {
        &self.cache
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Number of requests currently in flight.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Drop every cached read of `path` (see [`ResponseCache::clear_by_prefix`]).
    ///
    /// Reads of `path` still in flight are detached first: their callers get
    /// the response they asked for, but it is not cached, and later callers
    /// start a new request.
    pub fn invalidate(&self, path: &str) -> usize {
        let detached = self.pending.forget_under(path);
        if detached > 0 {
            debug!(path, detached, "detached in-flight reads");
        }
        self.cache.clear_by_prefix(path)
    }

    /// Read `key` through the cache, calling `loader` at most once for any
    /// number of concurrent callers.
    ///
    /// `loader` runs on a spawned task, so the request completes even if
    /// every caller goes away.
    pub async fn cached_fetch<F, Fut>(
        &self,
        key: &QueryKey,
        ttl: Duration,
        loader: F,
    ) -> Result<V, CoreError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, CoreError>> + Send + 'static,
    {
        self.cached_fetch_with_max_age(key, ttl, ttl, loader).await
    }

    /// Like [`cached_fetch`](Self::cached_fetch), accepting cached values
    /// up to `max_age` old while storing new ones with `ttl`.
    pub async fn cached_fetch_with_max_age<F, Fut>(
        &self,
        key: &QueryKey,
        ttl: Duration,
        max_age: Duration,
        loader: F,
    ) -> Result<V, CoreError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, CoreError>> + Send + 'static,
    {
        if let Some(value) = self.cache.get(key, max_age) {
            debug!(%key, "cache hit");
            return Ok(value);
        }

        // A request that finished since the lookup above has already stored
        // its value, so the registry checks the cache again under the slot.
        let (handle, completion) =
            match self.pending.join_or_start(key, || self.cache.get(key, max_age)) {
                Registration::Ready(value) => {
                    debug!(%key, "cache hit after in-flight request settled");
                    return Ok(value);
                }
                Registration::Joined(handle) => {
                    debug!(%key, "joined in-flight request");
                    return handle.await;
                }
                Registration::Started { handle, completion } => (handle, completion),
            };
        debug!(%key, "cache miss");

        let load = tokio::spawn(async move { loader().await });
        let cache = Arc::clone(&self.cache);
        let pending = Arc::clone(&self.pending);
        let task_key = key.clone();
        tokio::spawn(async move {
            let result = match load.await {
                Ok(result) => result,
                Err(e) => {
                    warn!(key = %task_key, error = %e, "fetch task aborted");
                    Err(CoreError::Internal(format!("fetch task aborted: {e}")))
                }
            };
            // Store before release: a caller finding the slot free must
            // find the value.
            let owned = pending.settle(&task_key, completion.ticket(), || {
                if let Ok(value) = &result {
                    cache.set(&task_key, value.clone(), ttl);
                }
            });
            if let Err(error) = &result {
                debug!(key = %task_key, %error, "fetch failed");
            } else if !owned {
                debug!(key = %task_key, "invalidated while in flight, not cached");
            }
            completion.resolve(result);
        });

        handle.await
    }
}

impl CachedFetch<Value> {
    /// Read a JSON resource through the cache using the configured TTL.
    ///
    /// Non-read methods bypass the cache entirely.
    pub async fn get_json<F: Fetcher>(
        &self,
        fetcher: &Arc<F>,
        request: &FetchRequest,
    ) -> Result<Value, CoreError> {
        if !request.method.is_read() {
            return Ok(fetcher.fetch(request).await?);
        }

        let key = QueryKey::for_request(request);
        let fetcher = Arc::clone(fetcher);
        let request = request.clone();
        self.cached_fetch(&key, self.config.ttl, move || async move {
            Ok(fetcher.fetch(&request).await?)
        })
        .await
    }

    /// Read through the cache, falling back to a cached copy up to
    /// `stale_max_age` old when the network fails.
    pub async fn get_json_or_stale<F: Fetcher>(
        &self,
        fetcher: &Arc<F>,
        request: &FetchRequest,
    ) -> Result<Freshness<Value>, CoreError> {
        match self.get_json(fetcher, request).await {
            Ok(value) => Ok(Freshness::Fresh(value)),
            Err(error) if error.is_network() => {
                let key = QueryKey::for_request(request);
                match self.cache.get(&key, self.config.stale_max_age) {
                    Some(value) => {
                        warn!(%key, %error, "serving stale response");
                        Ok(Freshness::Stale { value, error })
                    }
                    None => Err(error),
                }
            }
            Err(error) => Err(error),
        }
    }

    /// Send a mutation, then invalidate every cached read under `paths`.
    ///
    /// Nothing is invalidated when the mutation fails.
    pub async fn mutate<F: Fetcher>(
        &self,
        fetcher: &Arc<F>,
        request: &FetchRequest,
        paths: &[&str],
    ) -> Result<Value, CoreError> {
        let response = fetcher.fetch(request).await?;
        for path in paths {
            self.invalidate(path);
        }
        Ok(response)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ecowatch_api::Method;
    use serde_json::json;
    use tokio::sync::Notify;

    use super::*;

    // ── Fakes ───────────────────────────────────────────────────────

    /// Fetcher answering every request with a canned value after `gate`
    /// is notified (or immediately when `gate` is `None`).
    struct FakeFetcher {
        calls: AtomicUsize,
        response: std::sync::Mutex<Result<Value, u16>>,
        gate: Option<Arc<Notify>>,
    }

    impl FakeFetcher {
        fn ok(value: Value) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                response: std::sync::Mutex::new(Ok(value)),
                gate: None,
            })
        }

        fn gated(value: Value, gate: Arc<Notify>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                response: std::sync::Mutex::new(Ok(value)),
                gate: Some(gate),
            })
        }

        fn fail_with(&self, status: u16) {
            *self.response.lock().unwrap() = Err(status);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Fetcher for FakeFetcher {
        fn fetch(
            &self,
            _request: &FetchRequest,
        ) -> impl Future<Output = Result<Value, ecowatch_api::Error>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let response = self.response.lock().unwrap().clone();
            let gate = self.gate.clone();
            async move {
                if let Some(gate) = gate {
                    gate.notified().await;
                }
                response.map_err(|status| ecowatch_api::Error::Api {
                    message: "upstream failure".into(),
                    code: None,
                    status,
                })
            }
        }
    }

    fn fetch() -> CachedFetch {
        CachedFetch::new(CacheConfig {
            ttl: Duration::from_secs(30),
            stale_max_age: Duration::from_secs(600),
        })
    }

    fn key() -> QueryKey {
        QueryKey::for_request(&FetchRequest::get("/stations"))
    }

    // ── Deduplication ───────────────────────────────────────────────

    #[tokio::test]
    async fn concurrent_calls_share_one_loader() {
        let cf = fetch();
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let loader = |calls: Arc<AtomicUsize>, gate: Arc<Notify>| {
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    gate.notified().await;
                    Ok::<_, CoreError>(json!(["st-1", "st-2"]))
                }
            }
        };

        let k = key();
        let ttl = Duration::from_secs(30);
        let first = cf.cached_fetch(&k, ttl, loader(Arc::clone(&calls), Arc::clone(&gate)));
        let second = cf.cached_fetch(&k, ttl, loader(Arc::clone(&calls), Arc::clone(&gate)));
        let release = async {
            tokio::task::yield_now().await;
            gate.notify_one();
        };

        let (a, b, ()) = tokio::join!(first, second, release);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), json!(["st-1", "st-2"]));
        assert_eq!(b.unwrap(), json!(["st-1", "st-2"]));
        assert_eq!(cf.in_flight(), 0);
    }

    #[tokio::test]
    async fn hit_skips_loader() {
        let cf = fetch();
        let k = key();
        let ttl = Duration::from_secs(30);

        cf.cached_fetch(&k, ttl, || async { Ok(json!(1)) })
            .await
            .unwrap();
        let again = cf
            .cached_fetch(&k, ttl, || async {
                Err(CoreError::Internal("loader must not run".into()))
            })
            .await
            .unwrap();

        assert_eq!(again, json!(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_callers_never_load_twice() {
        const KEYS: usize = 500;
        const CALLERS: usize = 4;

        let cf = fetch();
        let ttl = Duration::from_secs(30);
        let loads: Arc<Vec<AtomicUsize>> =
            Arc::new((0..KEYS).map(|_| AtomicUsize::new(0)).collect());

        let mut tasks = Vec::with_capacity(KEYS * CALLERS);
        for i in 0..KEYS {
            let k = QueryKey::for_request(&FetchRequest::get(format!("/stations/{i}")));
            for _ in 0..CALLERS {
                let cf = cf.clone();
                let k = k.clone();
                let loads = Arc::clone(&loads);
                tasks.push(tokio::spawn(async move {
                    cf.cached_fetch(&k, ttl, move || {
                        loads[i].fetch_add(1, Ordering::SeqCst);
                        async move { Ok(json!(i)) }
                    })
                    .await
                }));
            }
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let repeated: Vec<usize> = (0..KEYS)
            .filter(|&i| loads[i].load(Ordering::SeqCst) != 1)
            .collect();
        assert!(repeated.is_empty(), "keys loaded more than once: {repeated:?}");
        assert_eq!(cf.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn loader_may_inspect_the_cache() {
        let cf = fetch();
        let inner = cf.clone();

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            cf.cached_fetch(&key(), Duration::from_secs(30), move || {
                let running = inner.in_flight();
                async move { Ok(json!(running)) }
            }),
        )
        .await
        .expect("loader must not block on the registry");

        assert_eq!(outcome.unwrap(), json!(1));
    }

    // ── Failure semantics ───────────────────────────────────────────

    #[tokio::test]
    async fn failure_reaches_every_waiter_and_leaves_cache_alone() {
        let cf = fetch();
        let gate = Arc::new(Notify::new());
        let fetcher = FakeFetcher::gated(json!("unused"), Arc::clone(&gate));
        fetcher.fail_with(503);
        let req = FetchRequest::get("/stations");

        let release = async {
            tokio::task::yield_now().await;
            gate.notify_one();
        };
        let (a, b, ()) = tokio::join!(
            cf.get_json(&fetcher, &req),
            cf.get_json(&fetcher, &req),
            release
        );

        assert_eq!(fetcher.calls(), 1);
        let expected = CoreError::Api {
            message: "upstream failure".into(),
            code: None,
            status: Some(503),
        };
        assert_eq!(a.unwrap_err(), expected);
        assert_eq!(b.unwrap_err(), expected);
        assert!(cf.cache().is_empty());
        assert_eq!(cf.in_flight(), 0);
    }

    #[tokio::test]
    async fn retry_after_failure_runs_loader_again() {
        let cf = fetch();
        let k = key();
        let ttl = Duration::from_secs(30);

        let first = cf
            .cached_fetch(&k, ttl, || async {
                Err::<Value, _>(CoreError::Timeout { timeout_secs: 5 })
            })
            .await;
        assert!(first.is_err());

        let second = cf
            .cached_fetch(&k, ttl, || async { Ok(json!("recovered")) })
            .await
            .unwrap();
        assert_eq!(second, json!("recovered"));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_copy_served_when_network_fails() {
        let cf = fetch();
        let fetcher = FakeFetcher::ok(json!(["st-1"]));
        let req = FetchRequest::get("/stations");

        cf.get_json(&fetcher, &req).await.unwrap();
        tokio::time::advance(Duration::from_secs(60)).await;
        fetcher.fail_with(502);

        let outcome = cf.get_json_or_stale(&fetcher, &req).await.unwrap();
        assert!(outcome.is_stale());
        assert_eq!(outcome.into_value(), json!(["st-1"]));
        assert_eq!(fetcher.calls(), 2);
    }

    // ── Mutations ───────────────────────────────────────────────────

    #[tokio::test]
    async fn mutation_invalidates_listed_paths() {
        let cf = fetch();
        let fetcher = FakeFetcher::ok(json!([]));
        let list = FetchRequest::get("/admin/users").param("page", 1);
        cf.get_json(&fetcher, &list).await.unwrap();
        assert_eq!(cf.cache().len(), 1);

        let update = FetchRequest::get("/admin/users/42").with_method(Method::Put);
        cf.mutate(&fetcher, &update, &["/admin/users"]).await.unwrap();

        assert!(cf.cache().is_empty());
        cf.get_json(&fetcher, &list).await.unwrap();
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn invalidation_detaches_in_flight_reads() {
        let cf = fetch();
        let gate = Arc::new(Notify::new());
        let fetcher = FakeFetcher::gated(json!(["before"]), Arc::clone(&gate));
        let list = FetchRequest::get("/admin/users");

        let write = async {
            tokio::task::yield_now().await;
            assert_eq!(cf.in_flight(), 1);
            cf.invalidate("/admin/users");
            gate.notify_one();
        };
        let (read, ()) = tokio::join!(cf.get_json(&fetcher, &list), write);

        // The caller still gets its answer; the cache does not keep it.
        assert_eq!(read.unwrap(), json!(["before"]));
        assert!(cf.cache().is_empty());
        assert_eq!(cf.in_flight(), 0);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn non_read_requests_bypass_cache() {
        let cf = fetch();
        let fetcher = FakeFetcher::ok(json!({ "ok": true }));
        let req = FetchRequest::get("/admin/users").with_method(Method::Post);

        cf.get_json(&fetcher, &req).await.unwrap();
        cf.get_json(&fetcher, &req).await.unwrap();

        assert_eq!(fetcher.calls(), 2);
        assert!(cf.cache().is_empty());
    }
}
