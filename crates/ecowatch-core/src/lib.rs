// ecowatch-core: response caching and the data-grid engine used by screens.

pub mod cache;
pub mod config;
pub mod error;
pub mod grid;
pub mod persist;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{CachedFetch, Freshness, QueryKey, ResponseCache};
pub use config::{CacheConfig, GridConfig};
pub use error::CoreError;
pub use grid::{
    CellValue, ColumnRegistry, ColumnSet, ColumnSpec, DataGrid, GridEvent, GridView, RowAction,
    SortDirection, SortState, TablePrefs, Viewport, ViewportHandle, ViewportStream,
};
pub use persist::{FileStore, KeyValueStore, MemoryStore, PersistError};

// The transport types screens need alongside the cache.
pub use ecowatch_api::{FetchRequest, Fetcher, Method, QueryParams};
