// ── Runtime tuning ──
//
// These types describe how the cache and grids behave. They never touch
// disk: `ecowatch-config` (or a test) builds them and hands them in.

use std::time::Duration;

/// Cache behaviour for [`CachedFetch`](crate::CachedFetch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Freshness window for reads (also the TTL new entries are stored with).
    pub ttl: Duration,
    /// Oldest cached copy a screen accepts when the network is failing.
    pub stale_max_age: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            stale_max_age: Duration::from_secs(10 * 60),
        }
    }
}

/// Geometry and paging defaults for [`DataGrid`](crate::DataGrid).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridConfig {
    /// Height of one rendered row, in pixels.
    pub row_height: u32,
    /// Rows rendered above and below the viewport.
    pub overscan: u32,
    /// Narrowest width a column can be resized to.
    pub min_column_width: u32,
    /// Width used when neither the spec nor the user set one.
    pub default_column_width: u32,
    /// Rows per page.
    pub page_size: usize,
    /// Windowing kicks in at this many rows...
    pub virtualize_min_rows: usize,
    /// ...and only when the viewport is at least this wide.
    pub virtualize_min_width: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            row_height: 40,
            overscan: 5,
            min_column_width: 60,
            default_column_width: 150,
            page_size: 25,
            virtualize_min_rows: 100,
            virtualize_min_width: 640,
        }
    }
}
