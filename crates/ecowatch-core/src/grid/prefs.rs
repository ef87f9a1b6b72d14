// ── Per-table preference records ──
//
// Every record lives under its own `{table}.{field}` key as JSON text.
// Reads that fail or no longer decode are treated as absent; writes that
// fail are logged and dropped. In-memory grid state never rolls back.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::sort::SortState;
use crate::persist::KeyValueStore;

const HIDDEN: &str = "hidden";
const WIDTHS: &str = "widths";
const SEEN: &str = "seen";
const SEARCH: &str = "search";
const FILTERS: &str = "filters";
const SORT: &str = "sort";

/// Typed view of one table's persisted records.
#[derive(Clone)]
pub struct TablePrefs {
    table_id: String,
    store: Arc<dyn KeyValueStore>,
}

impl TablePrefs {
    pub fn new(table_id: impl Into<String>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            table_id: table_id.into(),
            store,
        }
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    fn key(&self, field: &str) -> String {
        format!("{}.{field}", self.table_id)
    }

    fn load<T: DeserializeOwned>(&self, field: &str) -> Option<T> {
        let key = self.key(field);
        let raw = match self.store.get(&key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to read preference");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %key, error = %e, "discarding undecodable preference");
                None
            }
        }
    }

    fn save<T: Serialize + ?Sized>(&self, field: &str, value: &T) {
        let key = self.key(field);
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to encode preference");
                return;
            }
        };
        if let Err(e) = self.store.set(&key, &raw) {
            warn!(key = %key, error = %e, "failed to persist preference");
        }
    }

    fn clear(&self, field: &str) {
        let key = self.key(field);
        if let Err(e) = self.store.remove(&key) {
            warn!(key = %key, error = %e, "failed to remove preference");
        }
    }

    // ── Column layout ────────────────────────────────────────────────

    pub fn hidden(&self) -> Option<Vec<String>> {
        self.load(HIDDEN)
    }

    pub fn save_hidden(&self, ids: &[String]) {
        self.save(HIDDEN, ids);
    }

    pub fn widths(&self) -> Option<BTreeMap<String, u32>> {
        self.load(WIDTHS)
    }

    pub fn save_widths(&self, widths: &BTreeMap<String, u32>) {
        self.save(WIDTHS, widths);
    }

    /// Column ids whose default visibility has already been applied.
    pub fn seen(&self) -> Option<Vec<String>> {
        self.load(SEEN)
    }

    pub fn save_seen(&self, ids: &[String]) {
        self.save(SEEN, ids);
    }

    pub fn clear_layout(&self) {
        self.clear(HIDDEN);
        self.clear(WIDTHS);
        self.clear(SEEN);
    }

    // ── View state ───────────────────────────────────────────────────

    pub fn search(&self) -> Option<String> {
        self.load(SEARCH)
    }

    pub fn save_search(&self, text: &str) {
        if text.is_empty() {
            self.clear(SEARCH);
        } else {
            self.save(SEARCH, text);
        }
    }

    pub fn filters(&self) -> Option<BTreeMap<String, String>> {
        self.load(FILTERS)
    }

    pub fn save_filters(&self, filters: &BTreeMap<String, String>) {
        if filters.is_empty() {
            self.clear(FILTERS);
        } else {
            self.save(FILTERS, filters);
        }
    }

    pub fn sort(&self) -> Option<SortState> {
        self.load(SORT)
    }

    pub fn save_sort(&self, sort: &SortState) {
        if sort.is_none() {
            self.clear(SORT);
        } else {
            self.save(SORT, sort);
        }
    }
}

impl fmt::Debug for TablePrefs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TablePrefs")
            .field("table_id", &self.table_id)
            .finish_non_exhaustive()
    }
}
