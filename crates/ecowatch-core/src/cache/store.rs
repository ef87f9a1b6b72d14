// ── Response cache ──
//
// Key → (value, stored_at) map with caller-chosen freshness on read and
// prefix-based bulk invalidation after mutations. Entries are replaced,
// never mutated in place.

use std::time::Duration;

use dashmap::DashMap;
use ecowatch_api::Method;
use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use super::key::{QueryKey, covers_path};

/// A stored response.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub stored_at: Instant,
    /// TTL the entry was stored with. Only housekeeping reads it;
    /// [`ResponseCache::get`] uses the caller's `max_age`.
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }

    fn is_older_than(&self, max_age: Duration) -> bool {
        self.age() > max_age
    }
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Total number of entries in the cache.
    pub total_entries: usize,
    /// Entries younger than the TTL they were stored with.
    pub fresh_entries: usize,
    /// Entries past their TTL, still available to a caller passing a
    /// larger `max_age`.
    pub expired_entries: usize,
}

/// Concurrent response cache.
///
/// Stale entries are never dropped by [`get`](Self::get): they stay until
/// the next successful [`set`](Self::set) replaces them, so a caller whose
/// revalidation failed can still read them with a larger `max_age`.
pub struct ResponseCache<V = serde_json::Value> {
    entries: DashMap<String, CacheEntry<V>>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Return the value for `key` if it was stored no more than `max_age` ago.
    pub fn get(&self, key: &QueryKey, max_age: Duration) -> Option<V> {
        let entry = self.entries.get(key.as_str())?;
        if entry.is_older_than(max_age) {
            debug!(%key, age = ?entry.age(), "cache entry stale");
            return None;
        }
        Some(entry.value.clone())
    }

    /// Full entry lookup regardless of age.
    pub fn entry(&self, key: &QueryKey) -> Option<CacheEntry<V>> {
        self.entries.get(key.as_str()).map(|e| e.value().clone())
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn set(&self, key: &QueryKey, value: V, ttl: Duration) {
        self.entries.insert(
            key.as_str().to_owned(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Invalidate every cached `GET` of `path`, whatever its query string or
    /// auth flag. Matching stops at path-segment boundaries: `/admin/users`
    /// clears `/admin/users?page=2` and `/admin/users/42` but leaves
    /// `/admin/user-settings` and `/admin/users:batch` alone. Returns the
    /// number of entries removed.
    pub fn clear_by_prefix(&self, path: &str) -> usize {
        let prefix = QueryKey::path_prefix(Method::Get, path);
        let removed = self.remove_where(|key| covers_path(&prefix, key));
        debug!(%prefix, removed, "cache invalidated by path");
        removed
    }

    /// Invalidate every key that literally starts with `prefix`.
    pub fn clear_by_raw_prefix(&self, prefix: &str) -> usize {
        let removed = self.remove_where(|key| key.starts_with(prefix));
        debug!(%prefix, removed, "cache invalidated by raw prefix");
        removed
    }

    pub fn remove(&self, key: &QueryKey) -> bool {
        self.entries.remove(key.as_str()).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drop entries older than the TTL they were stored with.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_older_than(entry.ttl));
        before.saturating_sub(self.entries.len())
    }

    pub fn stats(&self) -> CacheStats {
        let total_entries = self.entries.len();
        let expired_entries = self
            .entries
            .iter()
            .filter(|e| e.is_older_than(e.ttl))
            .count();
        CacheStats {
            total_entries,
            fresh_entries: total_entries.saturating_sub(expired_entries),
            expired_entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_where(&self, pred: impl Fn(&str) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !pred(key));
        before.saturating_sub(self.entries.len())
    }
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
