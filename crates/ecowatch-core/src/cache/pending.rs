// ── In-flight request registry ──
//
// One shared handle per key. Later callers attach to the handle of the
// first caller instead of starting another request. The owner of an entry
// settles it once its request finishes; an entry dropped by `forget_under`
// settles as a no-op.
//
// Only registry code runs while a key's slot is held. The caller's loader
// runs after registration returns.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use ecowatch_api::Method;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::oneshot;

use super::key::{QueryKey, covers_path};
use crate::error::CoreError;

/// Cloneable handle resolving to the outcome of one in-flight operation.
pub type SharedResult<V> = Shared<BoxFuture<'static, Result<V, CoreError>>>;

struct PendingEntry<V> {
    /// Identifies the operation that owns the entry.
    ticket: u64,
    handle: SharedResult<V>,
}

/// Sending half of a started operation. Dropping it unsent fails every
/// waiter.
pub struct Completion<V> {
    ticket: u64,
    sender: oneshot::Sender<Result<V, CoreError>>,
}

impl<V> Completion<V> {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Hand `result` to every waiter.
    pub fn resolve(self, result: Result<V, CoreError>) {
        // Every waiter may already be gone.
        let _ = self.sender.send(result);
    }
}

/// Outcome of [`PendingRegistry::join_or_start`].
pub enum Registration<V> {
    /// The slot was free and the value was available without a request.
    Ready(V),
    /// An operation for the key was already running; await its handle.
    Joined(SharedResult<V>),
    /// The caller now owns the key: run the operation, settle the entry
    /// and resolve `completion`.
    Started {
        handle: SharedResult<V>,
        completion: Completion<V>,
    },
}

impl<V> Registration<V> {
    pub fn is_joined(&self) -> bool {
        matches!(self, Self::Joined(_))
    }

    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started { .. })
    }
}

/// Registration table of in-flight operations keyed by cache key.
pub struct PendingRegistry<V> {
    entries: DashMap<String, PendingEntry<V>>,
    next_ticket: AtomicU64,
}

impl<V: Clone + Send + Sync + 'static> PendingRegistry<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_ticket: AtomicU64::new(1),
        }
    }

    /// Attach to the operation running for `key`, or claim the key.
    ///
    /// `ready` is consulted only when the slot is free, while it is held:
    /// a value it returns is handed back instead of starting an operation.
    /// Together with [`settle`](Self::settle) this closes the window in
    /// which a finishing operation has stored its value but a racing caller
    /// has not seen it yet. `ready` must not touch this registry.
    pub fn join_or_start(
        &self,
        key: &QueryKey,
        ready: impl FnOnce() -> Option<V>,
    ) -> Registration<V> {
        match self.entries.entry(key.as_str().to_owned()) {
            Entry::Occupied(entry) => Registration::Joined(entry.get().handle.clone()),
            Entry::Vacant(slot) => {
                if let Some(value) = ready() {
                    return Registration::Ready(value);
                }
                let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
                let (sender, receiver) = oneshot::channel();
                let handle = async move {
                    receiver.await.unwrap_or_else(|_| {
                        Err(CoreError::Internal("in-flight request abandoned".into()))
                    })
                }
                .boxed()
                .shared();
                slot.insert(PendingEntry {
                    ticket,
                    handle: handle.clone(),
                });
                Registration::Started {
                    handle,
                    completion: Completion { ticket, sender },
                }
            }
        }
    }

    /// Release `key` if it still belongs to `ticket`, running `on_owned`
    /// first while the slot is held. Returns whether the entry was owned.
    ///
    /// `on_owned` must not touch this registry.
    pub fn settle(&self, key: &QueryKey, ticket: u64, on_owned: impl FnOnce()) -> bool {
        match self.entries.entry(key.as_str().to_owned()) {
            Entry::Occupied(entry) if entry.get().ticket == ticket => {
                on_owned();
                entry.remove();
                true
            }
            _ => false,
        }
    }

    /// Remove the entry for `key` if it still belongs to `ticket`.
    pub fn complete(&self, key: &QueryKey, ticket: u64) -> bool {
        self.settle(key, ticket, || {})
    }

    /// Drop the entries of every `GET` under `path` (see
    /// [`ResponseCache::clear_by_prefix`](super::ResponseCache::clear_by_prefix)).
    /// Their operations keep running and their waiters still get a result,
    /// but settling them becomes a no-op.
    pub fn forget_under(&self, path: &str) -> usize {
        let prefix = QueryKey::path_prefix(Method::Get, path);
        let before = self.entries.len();
        self.entries.retain(|key, _| !covers_path(&prefix, key));
        before.saturating_sub(self.entries.len())
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.contains_key(key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone + Send + Sync + 'static> Default for PendingRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}
