// ── DataGrid ──
//
// Composes the column registry, sort, pagination and windowing into one
// view model. Interaction methods return the `GridEvent` the owning screen
// reacts to (for example by refetching a server-side page); `view()`
// produces everything needed to draw the current frame.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::column::ColumnSet;
use super::columns::ColumnRegistry;
use super::pagination::{PageState, PaginationController};
use super::prefs::TablePrefs;
use super::sort::{SortDirection, SortState, sort_indices};
use super::viewport::{Viewport, ViewportStream};
use super::window::{Virtualization, Window, compute_window};
use crate::config::GridConfig;

/// Per-row action (button or menu item).
pub struct RowAction<R> {
    pub id: String,
    pub label: String,
    enabled: Option<Arc<dyn Fn(&R) -> bool + Send + Sync>>,
}

impl<R> RowAction<R> {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            enabled: None,
        }
    }

    /// Enable the action only for rows matching `f`.
    pub fn enabled_when(mut self, f: impl Fn(&R) -> bool + Send + Sync + 'static) -> Self {
        self.enabled = Some(Arc::new(f));
        self
    }

    pub fn is_enabled(&self, row: &R) -> bool {
        self.enabled.as_ref().is_none_or(|f| f(row))
    }
}

impl<R> Clone for RowAction<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            label: self.label.clone(),
            enabled: self.enabled.clone(),
        }
    }
}

impl<R> fmt::Debug for RowAction<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowAction")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// What a user interaction changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GridEvent {
    ColumnToggled { column_id: String, hidden: bool },
    ColumnResized { column_id: String, width: u32 },
    ColumnsReset,
    PageChanged { page: usize },
    SortChanged { sort: SortState },
    SearchChanged { text: String },
    FilterChanged { column_id: String, value: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewColumn {
    pub id: String,
    pub header: String,
    pub width: u32,
    pub locked: bool,
    pub sortable: bool,
    pub sort: Option<SortDirection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewAction {
    pub id: String,
    pub label: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewRow {
    /// Index into the row set handed to the grid.
    pub index: usize,
    /// Position within the current page.
    pub position: usize,
    pub cells: Vec<String>,
    pub actions: Vec<ViewAction>,
}

/// One renderable frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridView {
    pub columns: Vec<ViewColumn>,
    pub rows: Vec<ViewRow>,
    pub top_spacer: u64,
    pub bottom_spacer: u64,
    pub page: PageState,
    pub sort: SortState,
    /// Rows matching search and filters, across all pages.
    pub matching_rows: usize,
    pub loading: bool,
}

pub struct DataGrid<R> {
    columns: ColumnRegistry<R>,
    rows: Arc<Vec<R>>,
    /// Indices of matching rows in display order.
    order: Vec<usize>,
    actions: Vec<RowAction<R>>,
    pagination: PaginationController,
    sort: SortState,
    search: String,
    filters: BTreeMap<String, String>,
    viewport: Viewport,
    loading: bool,
    config: GridConfig,
    prefs: Option<TablePrefs>,
}

impl<R> DataGrid<R> {
    /// Client-side grid with an in-memory layout.
    pub fn new(columns: ColumnSet<R>, config: GridConfig) -> Self {
        let registry = ColumnRegistry::new(columns, &config);
        Self::from_parts(registry, config, None)
    }

    /// Client-side grid whose layout and view state persist in `prefs`.
    pub fn with_prefs(columns: ColumnSet<R>, config: GridConfig, prefs: TablePrefs) -> Self {
        let registry = ColumnRegistry::with_prefs(columns, &config, prefs.clone());
        let mut grid = Self::from_parts(registry, config, Some(prefs.clone()));

        grid.search = prefs.search().unwrap_or_default();
        grid.filters = prefs
            .filters()
            .unwrap_or_default()
            .into_iter()
            .filter(|(id, value)| grid.columns.columns().contains(id) && !value.is_empty())
            .collect();
        if let Some(sort) = prefs.sort() {
            if grid.is_sortable(sort.column_id.as_deref()) {
                grid.sort = sort;
            }
        }
        grid
    }

    fn from_parts(columns: ColumnRegistry<R>, config: GridConfig, prefs: Option<TablePrefs>) -> Self {
        Self {
            columns,
            rows: Arc::new(Vec::new()),
            order: Vec::new(),
            actions: Vec::new(),
            pagination: PaginationController::client(config.page_size),
            sort: SortState::none(),
            search: String::new(),
            filters: BTreeMap::new(),
            viewport: Viewport::default(),
            loading: false,
            config,
            prefs,
        }
    }

    /// Switch to server-side paging: rows are rendered as given and
    /// navigation is reported back through `GridEvent::PageChanged`.
    #[must_use]
    pub fn server_side(mut self, page: usize, total_pages: usize) -> Self {
        self.pagination = PaginationController::server(page, total_pages, self.config.page_size);
        self.recompute();
        self
    }

    #[must_use]
    pub fn with_actions(mut self, actions: Vec<RowAction<R>>) -> Self {
        self.actions = actions;
        self
    }

    // ── Inputs ───────────────────────────────────────────────────────

    /// Replace the row set. A different allocation counts as a new result
    /// and returns to page 1; the same `Arc` is a no-op.
    pub fn set_rows(&mut self, rows: Arc<Vec<R>>) {
        if Arc::ptr_eq(&self.rows, &rows) {
            return;
        }
        self.rows = rows;
        self.recompute();
        self.pagination.rows_replaced(self.order.len());
    }

    /// Page metadata from a server response.
    pub fn set_server_page(&mut self, page: usize, total_pages: usize) {
        self.pagination.set_server_meta(page, total_pages);
    }

    pub fn set_columns(&mut self, columns: ColumnSet<R>) {
        self.columns.set_columns(columns);
        if !self.is_sortable(self.sort.column_id.as_deref()) {
            self.sort = SortState::none();
        }
        let known = self.columns.columns();
        self.filters.retain(|id, _| known.contains(id));
        self.refresh();
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.pagination.set_page_size(page_size);
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Wait for the next viewport change and apply it. Returns `false` once
    /// the host has dropped its handle.
    pub async fn follow(&mut self, stream: &mut ViewportStream) -> bool {
        match stream.changed().await {
            Some(viewport) => {
                self.set_viewport(viewport);
                true
            }
            None => false,
        }
    }

    // ── Interactions ─────────────────────────────────────────────────

    pub fn toggle_column(&mut self, column_id: &str) -> Option<GridEvent> {
        if !self.columns.toggle(column_id) {
            return None;
        }
        self.refresh();
        Some(GridEvent::ColumnToggled {
            column_id: column_id.to_owned(),
            hidden: self.columns.is_hidden(column_id),
        })
    }

    pub fn resize_column(&mut self, column_id: &str, px: u32) -> Option<GridEvent> {
        let width = self.columns.resize(column_id, px)?;
        Some(GridEvent::ColumnResized {
            column_id: column_id.to_owned(),
            width,
        })
    }

    pub fn reset_columns(&mut self) -> GridEvent {
        self.columns.reset();
        self.refresh();
        GridEvent::ColumnsReset
    }

    /// Header click: cycle the sort on `column_id`. Ignored for unknown or
    /// unsortable columns.
    pub fn toggle_sort(&mut self, column_id: &str) -> Option<GridEvent> {
        if !self.is_sortable(Some(column_id)) {
            debug!(column = column_id, "sort toggle ignored");
            return None;
        }
        let next = super::sort::apply_toggle(&self.sort, column_id);
        self.set_sort(next)
    }

    pub fn set_sort(&mut self, sort: SortState) -> Option<GridEvent> {
        if sort == self.sort || !self.is_sortable(sort.column_id.as_deref()) {
            return None;
        }
        self.sort = sort;
        if let Some(prefs) = &self.prefs {
            prefs.save_sort(&self.sort);
        }
        self.recompute();
        Some(GridEvent::SortChanged {
            sort: self.sort.clone(),
        })
    }

    pub fn set_search(&mut self, text: impl Into<String>) -> Option<GridEvent> {
        let text = text.into();
        if text == self.search {
            return None;
        }
        self.search = text;
        if let Some(prefs) = &self.prefs {
            prefs.save_search(&self.search);
        }
        self.recompute();
        self.pagination.rows_replaced(self.order.len());
        Some(GridEvent::SearchChanged {
            text: self.search.clone(),
        })
    }

    /// Set (or with `None`/empty, clear) the equality filter on a column.
    pub fn set_filter(&mut self, column_id: &str, value: Option<String>) -> Option<GridEvent> {
        if !self.columns.columns().contains(column_id) {
            return None;
        }
        let value = value.filter(|v| !v.is_empty());
        let changed = match &value {
            Some(v) => self.filters.insert(column_id.to_owned(), v.clone()).as_ref() != Some(v),
            None => self.filters.remove(column_id).is_some(),
        };
        if !changed {
            return None;
        }
        if let Some(prefs) = &self.prefs {
            prefs.save_filters(&self.filters);
        }
        self.recompute();
        self.pagination.rows_replaced(self.order.len());
        Some(GridEvent::FilterChanged {
            column_id: column_id.to_owned(),
            value,
        })
    }

    pub fn next_page(&mut self) -> Option<GridEvent> {
        let page = self.pagination.next()?;
        Some(GridEvent::PageChanged { page })
    }

    pub fn prev_page(&mut self) -> Option<GridEvent> {
        let page = self.pagination.prev()?;
        Some(GridEvent::PageChanged { page })
    }

    pub fn go_to_page(&mut self, page: usize) -> Option<GridEvent> {
        let page = self.pagination.go_to(page)?;
        Some(GridEvent::PageChanged { page })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn columns(&self) -> &ColumnRegistry<R> {
        &self.columns
    }

    pub fn rows(&self) -> &Arc<Vec<R>> {
        &self.rows
    }

    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    pub fn page(&self) -> PageState {
        self.pagination.state()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Rows of the current page, windowed to the viewport when the list is
    /// large enough.
    pub fn view(&self) -> GridView {
        let page_rows = self.pagination.slice(&self.order);
        let window = self.window_for(page_rows.len());

        let visible = self.columns.visible_columns();
        let columns = visible
            .iter()
            .map(|c| ViewColumn {
                id: c.id.clone(),
                header: c.header.clone(),
                width: self.columns.width_of(&c.id),
                locked: self.columns.is_locked(&c.id),
                sortable: c.sortable,
                sort: self.sort.direction_for(&c.id),
            })
            .collect();

        let rows = page_rows[window.range()]
            .iter()
            .enumerate()
            .filter_map(|(offset, &index)| {
                let row = self.rows.get(index)?;
                Some(ViewRow {
                    index,
                    position: window.start + offset,
                    cells: visible.iter().map(|c| c.render_cell(row)).collect(),
                    actions: self
                        .actions
                        .iter()
                        .map(|a| ViewAction {
                            id: a.id.clone(),
                            label: a.label.clone(),
                            enabled: a.is_enabled(row),
                        })
                        .collect(),
                })
            })
            .collect();

        GridView {
            columns,
            rows,
            top_spacer: window.top_spacer,
            bottom_spacer: window.bottom_spacer,
            page: self.pagination.state(),
            sort: self.sort.clone(),
            matching_rows: self.order.len(),
            loading: self.loading,
        }
    }

    fn window_for(&self, row_count: usize) -> Window {
        let policy = Virtualization {
            min_rows: self.config.virtualize_min_rows,
            min_viewport_width: self.config.virtualize_min_width,
        };
        if self.viewport.height == 0 || !policy.applies(row_count, self.viewport.width) {
            return Window::full(row_count);
        }
        compute_window(
            row_count,
            self.config.row_height,
            self.viewport.height,
            self.viewport.scroll_offset,
            self.config.overscan,
        )
    }

    fn is_sortable(&self, column_id: Option<&str>) -> bool {
        column_id.is_none_or(|id| self.columns.columns().get(id).is_some_and(|c| c.sortable))
    }

    /// Recompute matches after a change that keeps the current page when
    /// it is still in range.
    fn refresh(&mut self) {
        self.recompute();
        self.pagination.set_row_count(self.order.len());
    }

    /// Rebuild `order`: search, then filters, then sort. Server-side rows
    /// are already shaped by the server and keep their order.
    fn recompute(&mut self) {
        let rows = self.rows.as_slice();
        if self.pagination.is_server_side() {
            self.order = (0..rows.len()).collect();
            return;
        }

        let needle = self.search.trim().to_lowercase();
        let visible = self.columns.visible_columns();
        let filters: Vec<_> = self
            .filters
            .iter()
            .filter_map(|(id, value)| {
                let column = self.columns.columns().get(id)?;
                Some((column, value.to_lowercase()))
            })
            .collect();

        let mut order: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                needle.is_empty()
                    || visible
                        .iter()
                        .any(|c| c.render_cell(row).to_lowercase().contains(&needle))
            })
            .filter(|(_, row)| {
                filters
                    .iter()
                    .all(|(column, value)| column.render_cell(row).to_lowercase() == *value)
            })
            .map(|(i, _)| i)
            .collect();

        if let Some(column) = self
            .sort
            .column_id
            .as_deref()
            .and_then(|id| self.columns.columns().get(id))
        {
            sort_indices(rows, &mut order, column, self.sort.direction);
        }

        debug!(
            total = rows.len(),
            matching = order.len(),
            "grid rows recomputed"
        );
        self.order = order;
    }
}

impl<R> fmt::Debug for DataGrid<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataGrid")
            .field("rows", &self.rows.len())
            .field("matching", &self.order.len())
            .field("page", &self.pagination.state())
            .field("sort", &self.sort)
            .field("search", &self.search)
            .field("filters", &self.filters)
            .field("loading", &self.loading)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::grid::column::{CellValue, ColumnSpec};
    use crate::grid::viewport::ViewportHandle;
    use crate::persist::{BrokenStore, MemoryStore};

    #[derive(Debug, Clone)]
    struct Station {
        name: String,
        region: String,
        aqi: Option<f64>,
        online: bool,
    }

    fn station(name: &str, region: &str, aqi: Option<f64>) -> Station {
        Station {
            name: name.into(),
            region: region.into(),
            aqi,
            online: aqi.is_some(),
        }
    }

    fn columns() -> ColumnSet<Station> {
        ColumnSet::new(vec![
            ColumnSpec::new("name", "Name")
                .accessor(|s: &Station| CellValue::from(s.name.as_str()))
                .locked(),
            ColumnSpec::new("region", "Region").render(|s: &Station| s.region.clone()),
            ColumnSpec::new("aqi", "AQI")
                .accessor(|s: &Station| s.aqi.into())
                .render(|s: &Station| s.aqi.map_or_else(|| "-".into(), |v| format!("{v:.0}"))),
        ])
        .unwrap()
    }

    fn sample() -> Arc<Vec<Station>> {
        Arc::new(vec![
            station("Harbor", "north", Some(42.0)),
            station("Airport", "south", Some(88.0)),
            station("Quay", "north", None),
            station("Mill", "east", Some(12.0)),
        ])
    }

    fn config() -> GridConfig {
        GridConfig {
            page_size: 2,
            ..GridConfig::default()
        }
    }

    fn names(view: &GridView) -> Vec<&str> {
        view.rows.iter().map(|r| r.cells[0].as_str()).collect()
    }

    #[test]
    fn client_mode_pages_rows() {
        let mut grid = DataGrid::new(columns(), config());
        grid.set_rows(sample());

        let view = grid.view();
        assert_eq!(names(&view), vec!["Harbor", "Airport"]);
        assert_eq!(view.page.total_pages, 2);

        assert_eq!(grid.next_page(), Some(GridEvent::PageChanged { page: 2 }));
        assert_eq!(names(&grid.view()), vec!["Quay", "Mill"]);
        assert_eq!(grid.next_page(), None);
    }

    #[test]
    fn sort_cycles_and_orders_rows() {
        let mut grid = DataGrid::new(columns(), GridConfig::default());
        grid.set_rows(sample());

        grid.toggle_sort("aqi");
        assert_eq!(names(&grid.view()), vec!["Mill", "Harbor", "Airport", "Quay"]);
        grid.toggle_sort("aqi");
        assert_eq!(names(&grid.view()), vec!["Airport", "Harbor", "Mill", "Quay"]);
        let event = grid.toggle_sort("aqi");
        assert_eq!(
            event,
            Some(GridEvent::SortChanged {
                sort: SortState::none()
            })
        );
        assert_eq!(names(&grid.view()), vec!["Harbor", "Airport", "Quay", "Mill"]);
    }

    #[test]
    fn search_matches_visible_cells_case_insensitively() {
        let mut grid = DataGrid::new(columns(), GridConfig::default());
        grid.set_rows(sample());

        grid.set_search("NORTH");
        assert_eq!(names(&grid.view()), vec!["Harbor", "Quay"]);

        // Hidden columns are not searched.
        grid.toggle_column("region");
        assert!(grid.view().rows.is_empty());
    }

    #[test]
    fn filters_require_equality() {
        let mut grid = DataGrid::new(columns(), GridConfig::default());
        grid.set_rows(sample());

        let event = grid.set_filter("region", Some("North".into()));
        assert!(matches!(event, Some(GridEvent::FilterChanged { .. })));
        assert_eq!(names(&grid.view()), vec!["Harbor", "Quay"]);

        assert_eq!(grid.set_filter("unknown", Some("x".into())), None);
        grid.set_filter("region", None);
        assert_eq!(grid.view().matching_rows, 4);
    }

    #[test]
    fn new_row_set_returns_to_first_page() {
        let mut grid = DataGrid::new(columns(), config());
        let rows = sample();
        grid.set_rows(rows.clone());
        grid.next_page();

        // Same allocation: page kept.
        grid.set_rows(rows);
        assert_eq!(grid.page().page, 2);

        grid.set_rows(sample());
        assert_eq!(grid.page().page, 1);
    }

    #[test]
    fn server_mode_renders_rows_as_given() {
        let mut grid = DataGrid::new(columns(), config()).server_side(3, 7);
        grid.set_rows(sample());
        grid.toggle_sort("aqi");

        let view = grid.view();
        assert_eq!(view.rows.len(), 4);
        assert_eq!(names(&view), vec!["Harbor", "Airport", "Quay", "Mill"]);
        assert_eq!(view.page.page, 3);
        assert_eq!(view.columns[2].sort, Some(SortDirection::Asc));

        assert_eq!(grid.next_page(), Some(GridEvent::PageChanged { page: 4 }));
        assert_eq!(grid.page().page, 3);
        grid.set_server_page(4, 7);
        assert_eq!(grid.page().page, 4);
    }

    #[test]
    fn large_pages_are_windowed() {
        let rows: Vec<Station> = (0..1_000)
            .map(|i| station(&format!("s{i}"), "north", Some(f64::from(i))))
            .collect();
        let config = GridConfig {
            page_size: 1_000,
            ..GridConfig::default()
        };
        let mut grid = DataGrid::new(columns(), config);
        grid.set_rows(Arc::new(rows));
        grid.set_viewport(Viewport {
            width: 1_024,
            height: 400,
            scroll_offset: 4_000,
        });

        let view = grid.view();
        assert_eq!(view.rows.len(), 20);
        assert_eq!(view.rows[0].position, 95);
        assert_eq!(view.rows[0].index, 95);
        assert_eq!(view.top_spacer, 95 * 40);

        // Narrow viewports render everything.
        grid.set_viewport(Viewport {
            width: 320,
            height: 400,
            scroll_offset: 4_000,
        });
        assert_eq!(grid.view().rows.len(), 1_000);
    }

    #[test]
    fn row_actions_respect_enabled_predicate() {
        let mut grid = DataGrid::new(columns(), GridConfig::default()).with_actions(vec![
            RowAction::new("open", "Open"),
            RowAction::new("restart", "Restart").enabled_when(|s: &Station| s.online),
        ]);
        grid.set_rows(sample());

        let view = grid.view();
        let quay = view.rows.iter().find(|r| r.cells[0] == "Quay").unwrap();
        assert!(quay.actions[0].enabled);
        assert!(!quay.actions[1].enabled);
    }

    #[test]
    fn view_state_persists_across_instances() {
        let store = Arc::new(MemoryStore::new());
        let prefs = || TablePrefs::new("stations", store.clone());

        let mut grid = DataGrid::with_prefs(columns(), GridConfig::default(), prefs());
        grid.toggle_column("aqi");
        grid.resize_column("region", 10);
        grid.toggle_sort("name");
        grid.set_search("a");

        let restored = DataGrid::<Station>::with_prefs(columns(), GridConfig::default(), prefs());
        assert!(restored.columns().is_hidden("aqi"));
        assert_eq!(
            restored.columns().width_of("region"),
            GridConfig::default().min_column_width
        );
        assert_eq!(restored.sort(), &SortState::asc("name"));
        assert_eq!(restored.search(), "a");
    }

    #[test]
    fn failing_store_does_not_roll_back_interactions() {
        let prefs = TablePrefs::new("stations", Arc::new(BrokenStore));
        let mut grid = DataGrid::with_prefs(columns(), GridConfig::default(), prefs);
        grid.set_rows(sample());

        assert_eq!(
            grid.toggle_column("region"),
            Some(GridEvent::ColumnToggled {
                column_id: "region".into(),
                hidden: true,
            })
        );
        assert_eq!(
            grid.resize_column("aqi", 200),
            Some(GridEvent::ColumnResized {
                column_id: "aqi".into(),
                width: 200,
            })
        );
        assert_eq!(
            grid.toggle_sort("aqi"),
            Some(GridEvent::SortChanged {
                sort: SortState::asc("aqi")
            })
        );
        assert_eq!(
            grid.set_search("r"),
            Some(GridEvent::SearchChanged { text: "r".into() })
        );

        let visible: Vec<&str> = grid
            .columns()
            .visible_columns()
            .into_iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(visible, vec!["name", "aqi"]);
        assert_eq!(grid.columns().width_of("aqi"), 200);
        assert_eq!(grid.sort(), &SortState::asc("aqi"));
        assert_eq!(grid.search(), "r");
        assert_eq!(names(&grid.view()), vec!["Harbor", "Airport"]);
    }

    #[test]
    fn locked_column_toggle_emits_nothing() {
        let mut grid = DataGrid::new(columns(), GridConfig::default());
        assert_eq!(grid.toggle_column("name"), None);
        assert!(grid.toggle_column("region").is_some());
        // aqi is now the last hideable column.
        assert_eq!(grid.toggle_column("aqi"), None);
        assert!(grid.view().columns.iter().any(|c| c.id == "aqi" && c.locked));
    }

    #[tokio::test]
    async fn follow_applies_viewport_changes() {
        let handle = ViewportHandle::default();
        let mut stream = handle.subscribe();
        let mut grid = DataGrid::new(columns(), GridConfig::default());

        handle.resize(800, 600);
        assert!(grid.follow(&mut stream).await);
        assert_eq!(grid.viewport().height, 600);

        drop(handle);
        assert!(!grid.follow(&mut stream).await);
    }
}
