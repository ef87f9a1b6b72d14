//! `grid` handler: fetch a table and render the current page.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use ecowatch_api::FetchRequest;
use ecowatch_core::{DataGrid, GridView, SortState, TablePrefs, Viewport};

use super::{Context, util};
use crate::cli::{GridArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Structured output for `-o json` / `-o yaml`.
#[derive(Debug, Serialize)]
struct GridOutput<'a> {
    table: &'a str,
    search: &'a str,
    filters: &'a BTreeMap<String, String>,
    #[serde(flatten)]
    view: &'a GridView,
}

/// View state after applying flags on top of what was saved.
struct ViewState {
    sort: SortState,
    search: String,
    filters: BTreeMap<String, String>,
}

impl ViewState {
    fn resolve(args: &GridArgs, prefs: &TablePrefs) -> Result<Self, CliError> {
        let sort = match args.sort.as_deref() {
            Some(raw) => util::parse_sort(raw)?,
            None => prefs.sort().unwrap_or_default(),
        };
        let search = args
            .search
            .clone()
            .unwrap_or_else(|| prefs.search().unwrap_or_default());
        let mut filters = if args.clear_filters {
            BTreeMap::new()
        } else {
            prefs.filters().unwrap_or_default()
        };
        for (column, value) in &args.filters {
            if value.is_empty() {
                filters.remove(column);
            } else {
                filters.insert(column.clone(), value.clone());
            }
        }
        Ok(Self {
            sort,
            search,
            filters,
        })
    }

    /// Query parameters asking the server to page, sort, search and filter.
    fn server_params(&self, request: &mut FetchRequest, page: usize, page_size: usize) {
        for (column, value) in &self.filters {
            request.params.insert(column.clone(), value.clone());
        }
        request.params.insert("page", page);
        request.params.insert("page_size", page_size);
        if let Some(column) = &self.sort.column_id {
            request.params.insert("sort", column.clone());
            request.params.insert("order", self.sort.direction.to_string());
        }
        if !self.search.is_empty() {
            request.params.insert("search", self.search.clone());
        }
    }
}

pub async fn handle(args: GridArgs, ctx: &Context<'_>) -> Result<(), CliError> {
    let schema = util::table_schema(ctx, &args.table, args.path.as_deref())?;
    let prefs = ctx.prefs(&args.table);
    let mut grid_config = ctx.grid_config();
    if let Some(size) = args.page_size {
        if size == 0 {
            return Err(CliError::Validation {
                field: "page-size".into(),
                reason: "must be at least 1".into(),
            });
        }
        grid_config.page_size = size;
    }

    let state = ViewState::resolve(&args, &prefs)?;
    let mut request = util::base_request(&schema, &args.params);
    if args.server_side {
        state.server_params(&mut request, args.page.max(1), grid_config.page_size);
    }

    let listing = util::fetch_listing(ctx, &request).await?;
    let columns = util::resolve_columns(&schema, &listing.rows)?;
    tracing::debug!(
        table = %args.table,
        rows = listing.rows.len(),
        columns = columns.len(),
        "listing fetched"
    );

    let mut grid = DataGrid::with_prefs(columns, grid_config, prefs);
    if args.server_side {
        let page = listing.page.unwrap_or(args.page).max(1);
        let total = listing.total_pages.unwrap_or(page).max(page);
        grid = grid.server_side(page, total);
    }

    apply_view_state(&mut grid, &state, &args, ctx);
    grid.set_rows(Arc::new(listing.rows));

    if !args.server_side && args.page > 1 && grid.go_to_page(args.page).is_none() {
        ctx.warn(&format!(
            "page {} is out of range; showing page {} of {}",
            args.page,
            grid.page().page,
            grid.page().total_pages
        ));
    }

    if let Some(height) = args.viewport {
        grid.set_viewport(Viewport {
            width: args.viewport_width,
            height,
            scroll_offset: args.scroll,
        });
    }

    let view = grid.view();
    let structured = GridOutput {
        table: &args.table,
        search: grid.search(),
        filters: grid.filters(),
        view: &view,
    };
    let out = output::render_grid(ctx.format, &view, &structured)?;
    output::print_output(&out, ctx.global.quiet);

    if ctx.format == OutputFormat::Table {
        ctx.notice(&footer(&view, grid.search(), grid.filters()));
    }
    Ok(())
}

/// Push resolved sort, search and filters into the grid, which persists them.
fn apply_view_state(
    grid: &mut DataGrid<Value>,
    state: &ViewState,
    args: &GridArgs,
    ctx: &Context<'_>,
) {
    if grid.sort() != &state.sort && grid.set_sort(state.sort.clone()).is_none() {
        let column = state.sort.column_id.as_deref().unwrap_or_default();
        ctx.warn(&format!("cannot sort by '{column}': unknown or unsortable column"));
    }
    grid.set_search(state.search.clone());

    let stale: Vec<String> = grid
        .filters()
        .keys()
        .filter(|id| !state.filters.contains_key(*id))
        .cloned()
        .collect();
    for column in stale {
        grid.set_filter(&column, None);
    }
    for (column, value) in &state.filters {
        if !grid.columns().columns().contains(column) {
            if args.filters.iter().any(|(c, _)| c == column) {
                ctx.warn(&format!("ignoring filter on unknown column '{column}'"));
            }
            continue;
        }
        grid.set_filter(column, Some(value.clone()));
    }
}

fn footer(view: &GridView, search: &str, filters: &BTreeMap<String, String>) -> String {
    let mut parts = vec![format!(
        "page {}/{}",
        view.page.page,
        view.page.total_pages.max(1)
    )];
    if view.page.server_side {
        parts.push(format!("{} rows", view.rows.len()));
    } else {
        parts.push(format!("{} matching rows", view.matching_rows));
    }
    if !view.sort.is_none() {
        parts.push(format!("sort: {}", util::describe_sort(&view.sort)));
    }
    if !search.is_empty() {
        parts.push(format!("search: \"{search}\""));
    }
    if !filters.is_empty() {
        let shown: Vec<String> = filters.iter().map(|(k, v)| format!("{k}={v}")).collect();
        parts.push(format!("filters: {}", shown.join(", ")));
    }
    if view.top_spacer > 0 || view.bottom_spacer > 0 {
        parts.push(format!(
            "rows {}-{} of page",
            view.rows.first().map_or(0, |r| r.position + 1),
            view.rows.last().map_or(0, |r| r.position + 1)
        ));
    }
    parts.join(" · ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ecowatch_core::MemoryStore;
    use ecowatch_core::grid::PageState;

    use super::*;

    fn args(extra: &[&str]) -> GridArgs {
        use clap::Parser;

        use crate::cli::{Cli, Command};

        let mut argv = vec!["ecowatch", "grid", "stations"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Grid(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    fn prefs() -> TablePrefs {
        TablePrefs::new("stations", Arc::new(MemoryStore::new()))
    }

    #[test]
    fn flags_override_saved_state() {
        let prefs = prefs();
        prefs.save_sort(&SortState::desc("aqi"));
        prefs.save_search("osl");
        prefs.save_filters(&BTreeMap::from([
            ("region".to_owned(), "north".to_owned()),
            ("kind".to_owned(), "urban".to_owned()),
        ]));

        let state = ViewState::resolve(&args(&["--filter", "kind="]), &prefs).unwrap();
        assert_eq!(state.sort, SortState::desc("aqi"));
        assert_eq!(state.search, "osl");
        assert_eq!(
            state.filters,
            BTreeMap::from([("region".to_owned(), "north".to_owned())])
        );

        let state = ViewState::resolve(
            &args(&["--sort", "none", "--search", "", "--clear-filters"]),
            &prefs,
        )
        .unwrap();
        assert!(state.sort.is_none());
        assert!(state.search.is_empty());
        assert!(state.filters.is_empty());
    }

    #[test]
    fn server_params_carry_view_state() {
        let state = ViewState {
            sort: SortState::desc("aqi"),
            search: "osl".into(),
            filters: BTreeMap::from([("region".to_owned(), "north".to_owned())]),
        };
        let mut request = FetchRequest::get("/stations");
        state.server_params(&mut request, 3, 50);
        let pairs = request.params.pairs();
        for expected in [
            ("page", "3"),
            ("page_size", "50"),
            ("sort", "aqi"),
            ("order", "desc"),
            ("search", "osl"),
            ("region", "north"),
        ] {
            assert!(
                pairs.contains(&(expected.0.to_owned(), expected.1.to_owned())),
                "missing {expected:?} in {pairs:?}"
            );
        }
    }

    #[test]
    fn footer_summarizes_view() {
        let view = GridView {
            columns: Vec::new(),
            rows: Vec::new(),
            top_spacer: 0,
            bottom_spacer: 0,
            page: PageState {
                page: 2,
                page_size: 25,
                total_pages: 4,
                server_side: false,
            },
            sort: SortState::asc("name"),
            matching_rows: 80,
            loading: false,
        };
        let filters = BTreeMap::from([("region".to_owned(), "north".to_owned())]);
        assert_eq!(
            footer(&view, "osl", &filters),
            "page 2/4 · 80 matching rows · sort: name asc · search: \"osl\" · filters: region=north"
        );
    }
}
