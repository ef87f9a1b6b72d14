// ── Column visibility and widths ──
//
// Holds the user's layout for one table and reconciles it against the
// current column set. A locked column is never hidden and at least one
// hideable column always stays visible.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::column::{ColumnSet, ColumnSpec};
use super::prefs::TablePrefs;
use crate::config::GridConfig;

/// Persisted layout for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnState {
    /// Hidden column ids, in the order they were hidden.
    pub hidden_ids: Vec<String>,
    /// User-chosen widths in pixels, keyed by column id.
    pub widths: BTreeMap<String, u32>,
}

impl ColumnState {
    pub fn is_hidden(&self, id: &str) -> bool {
        self.hidden_ids.iter().any(|h| h == id)
    }
}

/// Columns of `columns` not hidden by `state`, in declaration order.
/// Locked columns are always included.
pub fn visible_columns<'a, R>(
    columns: &'a ColumnSet<R>,
    state: &ColumnState,
) -> Vec<&'a ColumnSpec<R>> {
    columns
        .iter()
        .filter(|c| c.locked || !state.is_hidden(&c.id))
        .collect()
}

/// Column layout for one table, optionally persisted.
#[derive(Debug)]
pub struct ColumnRegistry<R> {
    columns: ColumnSet<R>,
    state: ColumnState,
    /// Ids whose `default_hidden` flag has already been applied.
    seen: Vec<String>,
    prefs: Option<TablePrefs>,
    min_width: u32,
    default_width: u32,
}

impl<R> ColumnRegistry<R> {
    /// In-memory registry with no persisted layout.
    pub fn new(columns: ColumnSet<R>, config: &GridConfig) -> Self {
        let mut registry = Self {
            columns,
            state: ColumnState::default(),
            seen: Vec::new(),
            prefs: None,
            min_width: config.min_column_width,
            default_width: config.default_column_width,
        };
        registry.reconcile();
        registry
    }

    /// Registry restored from, and saving to, `prefs`.
    pub fn with_prefs(columns: ColumnSet<R>, config: &GridConfig, prefs: TablePrefs) -> Self {
        let state = ColumnState {
            hidden_ids: prefs.hidden().unwrap_or_default(),
            widths: prefs.widths().unwrap_or_default(),
        };
        let seen = prefs.seen().unwrap_or_default();
        let mut registry = Self {
            columns,
            state,
            seen,
            prefs: Some(prefs),
            min_width: config.min_column_width,
            default_width: config.default_column_width,
        };
        if registry.reconcile() {
            registry.persist_layout();
        }
        registry
    }

    /// Swap in a new column set and reconcile the layout against it.
    pub fn set_columns(&mut self, columns: ColumnSet<R>) {
        self.columns = columns;
        if self.reconcile() {
            self.persist_layout();
        }
    }

    pub fn columns(&self) -> &ColumnSet<R> {
        &self.columns
    }

    pub fn state(&self) -> &ColumnState {
        &self.state
    }

    pub fn visible_columns(&self) -> Vec<&ColumnSpec<R>> {
        visible_columns(&self.columns, &self.state)
    }

    /// Columns flagged locked by their spec.
    pub fn always_visible(&self) -> Vec<&ColumnSpec<R>> {
        self.columns.iter().filter(|c| c.locked).collect()
    }

    /// Columns the user may hide or show.
    pub fn hideable_columns(&self) -> Vec<&ColumnSpec<R>> {
        self.columns.iter().filter(|c| !c.locked).collect()
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.columns
            .get(id)
            .is_some_and(|c| !c.locked && self.state.is_hidden(id))
    }

    /// Locked by its spec, or the last visible hideable column.
    pub fn is_locked(&self, id: &str) -> bool {
        let Some(column) = self.columns.get(id) else {
            return false;
        };
        if column.locked {
            return true;
        }
        if self.state.is_hidden(id) {
            return false;
        }
        self.visible_hideable_count() <= 1
    }

    /// Flip a column's visibility. Returns whether anything changed.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.is_hidden(id) {
            self.show(id)
        } else {
            self.hide(id)
        }
    }

    /// Hide a column. No-op for unknown, locked, or already hidden columns.
    pub fn hide(&mut self, id: &str) -> bool {
        if !self.columns.contains(id) || self.state.is_hidden(id) || self.is_locked(id) {
            debug!(column = id, "hide ignored");
            return false;
        }
        self.state.hidden_ids.push(id.to_owned());
        self.persist_hidden();
        true
    }

    /// Show a column. No-op unless it is currently hidden.
    pub fn show(&mut self, id: &str) -> bool {
        let before = self.state.hidden_ids.len();
        self.state.hidden_ids.retain(|h| h != id);
        if self.state.hidden_ids.len() == before {
            return false;
        }
        self.persist_hidden();
        true
    }

    /// Set a column width, clamped to the minimum. Returns the stored width,
    /// or `None` for an unknown column.
    pub fn resize(&mut self, id: &str, px: u32) -> Option<u32> {
        if !self.columns.contains(id) {
            return None;
        }
        let width = px.max(self.min_width);
        if self.state.widths.get(id) != Some(&width) {
            self.state.widths.insert(id.to_owned(), width);
            if let Some(prefs) = &self.prefs {
                prefs.save_widths(&self.state.widths);
            }
        }
        Some(width)
    }

    /// Effective width: user resize, else spec width, else the default.
    pub fn width_of(&self, id: &str) -> u32 {
        self.state
            .widths
            .get(id)
            .copied()
            .or_else(|| self.columns.get(id).and_then(|c| c.width))
            .unwrap_or(self.default_width)
            .max(self.min_width)
    }

    /// Forget hidden ids and widths, then apply defaults again.
    pub fn reset(&mut self) {
        self.state = ColumnState::default();
        self.seen.clear();
        if let Some(prefs) = &self.prefs {
            prefs.clear_layout();
        }
        self.reconcile();
        self.persist_layout();
    }

    fn visible_hideable_count(&self) -> usize {
        self.columns
            .iter()
            .filter(|c| !c.locked && !self.state.is_hidden(&c.id))
            .count()
    }

    /// Bring the state in line with the current column set. Returns whether
    /// the state changed.
    fn reconcile(&mut self) -> bool {
        let before = (self.state.clone(), self.seen.clone());
        let columns = &self.columns;

        // Stale or locked ids drop out; duplicates collapse.
        let mut hidden: Vec<String> = Vec::with_capacity(self.state.hidden_ids.len());
        for id in &self.state.hidden_ids {
            let hideable = columns.get(id).is_some_and(|c| !c.locked);
            if hideable && !hidden.contains(id) {
                hidden.push(id.clone());
            }
        }
        self.state.widths.retain(|id, _| columns.contains(id));

        // Default-hidden columns the user has never seen start hidden.
        for column in columns {
            if !self.seen.contains(&column.id) {
                if column.default_hidden && !column.locked && !hidden.contains(&column.id) {
                    hidden.push(column.id.clone());
                }
                self.seen.push(column.id.clone());
            }
        }
        self.state.hidden_ids = hidden;

        // Keep one hideable column visible.
        if self.visible_hideable_count() == 0 {
            if let Some(first) = self.columns.iter().find(|c| !c.locked) {
                let id = first.id.clone();
                self.state.hidden_ids.retain(|h| *h != id);
            }
        }

        (self.state.clone(), self.seen.clone()) != before
    }

    fn persist_hidden(&self) {
        if let Some(prefs) = &self.prefs {
            prefs.save_hidden(&self.state.hidden_ids);
        }
    }

    fn persist_layout(&self) {
        if let Some(prefs) = &self.prefs {
            prefs.save_hidden(&self.state.hidden_ids);
            prefs.save_widths(&self.state.widths);
            prefs.save_seen(&self.seen);
        }
    }
}
