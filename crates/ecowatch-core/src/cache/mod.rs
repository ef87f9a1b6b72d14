// ── Response caching ──
//
// Canonical keys, TTL store, in-flight deduplication, and the composed
// read entry point.

mod fetch;
mod key;
mod pending;
mod store;

pub use fetch::{CachedFetch, Freshness};
pub use key::QueryKey;
pub use pending::{Completion, PendingRegistry, Registration, SharedResult};
pub use store::{CacheEntry, CacheStats, ResponseCache};
