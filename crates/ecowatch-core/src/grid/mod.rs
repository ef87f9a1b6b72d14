// ── Headless data grid ──
//
// Column layout, sorting, pagination and row windowing. Nothing here draws;
// `DataGrid::view()` yields a frame the host renders however it likes.

mod column;
mod columns;
mod data_grid;
mod pagination;
mod prefs;
mod sort;
mod viewport;
mod window;

pub use column::{Accessor, CellValue, ColumnSet, ColumnSpec, Renderer};
pub use columns::{ColumnRegistry, ColumnState, visible_columns};
pub use data_grid::{DataGrid, GridEvent, GridView, RowAction, ViewAction, ViewColumn, ViewRow};
pub use pagination::{PageState, PaginationController, slice, total_pages};
pub use prefs::TablePrefs;
pub use sort::{SortDirection, SortState, apply_toggle, compare_cells, sort_indices};
pub use viewport::{Viewport, ViewportHandle, ViewportStream};
pub use window::{Virtualization, Window, compute_window};
