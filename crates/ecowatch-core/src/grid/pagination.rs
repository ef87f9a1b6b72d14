// ── Pagination ──
//
// Client mode slices an in-memory row set. Server mode only mirrors the
// page metadata of the last response and hands navigation back to the
// caller, which fetches the requested page.

use std::ops::Range;

use serde::Serialize;

/// Page metadata as shown to the user. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageState {
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub server_side: bool,
}

/// `max(1, ceil(row_count / page_size))`.
pub fn total_pages(row_count: usize, page_size: usize) -> usize {
    row_count.div_ceil(page_size.max(1)).max(1)
}

/// Rows on `page` (1-based). Out-of-range pages are empty.
pub fn slice<T>(rows: &[T], page: usize, page_size: usize) -> &[T] {
    let range = page_bounds(rows.len(), page, page_size);
    &rows[range]
}

fn page_bounds(row_count: usize, page: usize, page_size: usize) -> Range<usize> {
    let size = page_size.max(1);
    let start = page.saturating_sub(1).saturating_mul(size).min(row_count);
    let end = start.saturating_add(size).min(row_count);
    start..end
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Client { row_count: usize },
    Server { total_pages: usize },
}

#[derive(Debug, Clone)]
pub struct PaginationController {
    mode: Mode,
    page: usize,
    page_size: usize,
}

impl PaginationController {
    pub fn client(page_size: usize) -> Self {
        Self {
            mode: Mode::Client { row_count: 0 },
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn server(page: usize, total_pages: usize, page_size: usize) -> Self {
        let mut controller = Self {
            mode: Mode::Server { total_pages: 1 },
            page: 1,
            page_size: page_size.max(1),
        };
        controller.set_server_meta(page, total_pages);
        controller
    }

    pub fn is_server_side(&self) -> bool {
        matches!(self.mode, Mode::Server { .. })
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self) -> usize {
        match self.mode {
            Mode::Client { row_count } => total_pages(row_count, self.page_size),
            Mode::Server { total_pages } => total_pages,
        }
    }

    pub fn state(&self) -> PageState {
        PageState {
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages(),
            server_side: self.is_server_side(),
        }
    }

    /// A new row set arrived: back to page 1.
    pub fn rows_replaced(&mut self, row_count: usize) {
        if let Mode::Client { row_count: current } = &mut self.mode {
            *current = row_count;
            self.page = 1;
        }
    }

    /// Same rows, different count (search or filter changed). Keeps the
    /// page when it is still in range.
    pub fn set_row_count(&mut self, row_count: usize) {
        if let Mode::Client { row_count: current } = &mut self.mode {
            *current = row_count;
            self.page = self.page.min(self.total_pages());
        }
    }

    /// Mirror the page metadata of a server response.
    pub fn set_server_meta(&mut self, page: usize, total_pages: usize) {
        let total_pages = total_pages.max(1);
        self.mode = Mode::Server { total_pages };
        self.page = page.clamp(1, total_pages);
    }

    /// Changing the page size returns to page 1.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    /// Row index range of the current page in client mode; every row in
    /// server mode.
    pub fn page_range(&self) -> Range<usize> {
        match self.mode {
            Mode::Client { row_count } => page_bounds(row_count, self.page, self.page_size),
            Mode::Server { .. } => 0..usize::MAX,
        }
    }

    /// Current page of `rows`. Server-mode rows are already one page.
    pub fn slice<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        match self.mode {
            Mode::Client { .. } => slice(rows, self.page, self.page_size),
            Mode::Server { .. } => rows,
        }
    }

    pub fn prev(&mut self) -> Option<usize> {
        self.go_to(self.page.checked_sub(1)?)
    }

    pub fn next(&mut self) -> Option<usize> {
        self.go_to(self.page + 1)
    }

    /// Request `page`. Returns it when it is in range and differs from the
    /// current page. Client mode moves immediately; server mode waits for
    /// the response metadata.
    pub fn go_to(&mut self, page: usize) -> Option<usize> {
        if page == 0 || page > self.total_pages() || page == self.page {
            return None;
        }
        if matches!(self.mode, Mode::Client { .. }) {
            self.page = page;
        }
        Some(page)
    }
}
