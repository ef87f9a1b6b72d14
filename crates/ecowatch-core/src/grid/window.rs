// ── Row windowing ──
//
// Pure arithmetic deciding which rows of a fixed-row-height list need to be
// rendered for a given viewport. Spacers stand in for the rows outside the
// window so the scroll extent stays correct.

use std::ops::Range;

/// Rows `[start, end)` to render plus the pixel height of the gaps around
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    pub start: usize,
    pub end: usize,
    pub top_spacer: u64,
    pub bottom_spacer: u64,
}

impl Window {
    /// Every row, no spacers.
    pub fn full(row_count: usize) -> Self {
        Self {
            start: 0,
            end: row_count,
            top_spacer: 0,
            bottom_spacer: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Spacers plus the rendered rows at `row_height` each.
    pub fn total_height(&self, row_height: u32) -> u64 {
        self.top_spacer + self.bottom_spacer + to_u64(self.len()) * u64::from(row_height)
    }
}

/// Window for a viewport of `viewport_height` px scrolled to
/// `scroll_offset`, with `overscan` extra rows on each side.
///
/// A scroll offset past the end is clamped to the last full screen. A zero
/// row height cannot be windowed and yields every row.
pub fn compute_window(
    row_count: usize,
    row_height: u32,
    viewport_height: u32,
    scroll_offset: u64,
    overscan: u32,
) -> Window {
    if row_height == 0 {
        return Window::full(row_count);
    }
    let rh = u64::from(row_height);
    let vh = u64::from(viewport_height);
    let rows = to_u64(row_count);
    let overscan = u64::from(overscan);

    let max_scroll = (rows * rh).saturating_sub(vh);
    let scroll = scroll_offset.min(max_scroll);

    let first_visible = scroll / rh;
    let start = first_visible.saturating_sub(overscan);
    let last_visible = (scroll + vh).div_ceil(rh);
    let end = (last_visible + overscan).min(rows);
    let start = start.min(end);

    Window {
        start: to_usize(start),
        end: to_usize(end),
        top_spacer: start * rh,
        bottom_spacer: (rows - end) * rh,
    }
}

/// When windowing kicks in. Small lists and narrow viewports render every
/// row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Virtualization {
    pub min_rows: usize,
    pub min_viewport_width: u32,
}

impl Virtualization {
    pub fn applies(&self, row_count: usize, viewport_width: u32) -> bool {
        row_count >= self.min_rows && viewport_width >= self.min_viewport_width
    }
}

fn to_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}
