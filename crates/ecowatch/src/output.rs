//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits tab-separated lines.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Style, Width};
use tabled::{Table, Tabled};

use ecowatch_core::GridView;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

/// Approximate pixels per terminal cell when mapping column widths.
const PX_PER_CHAR: u32 = 8;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stderr().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Dimmed status line (page info, notices).
pub fn status_line(text: &str, color: bool) -> String {
    if color {
        text.dimmed().to_string()
    } else {
        text.to_owned()
    }
}

/// Yellow warning line.
pub fn warning_line(text: &str, color: bool) -> String {
    if color {
        format!("{} {text}", "warning:".yellow().bold())
    } else {
        format!("warning: {text}")
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one line per item
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(Table::new(rows).with(Style::rounded()).to_string())
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single serde-serializable item in the chosen format.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
{
    match format {
        OutputFormat::Table | OutputFormat::Plain => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
    }
}

/// Render a grid frame. Table and plain output only carry cells; the
/// structured formats serialize the whole view.
pub fn render_grid<T: Serialize>(
    format: OutputFormat,
    view: &GridView,
    structured: &T,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(grid_table(view)),
        OutputFormat::Plain => Ok(view
            .rows
            .iter()
            .map(|row| row.cells.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Json => render_json(structured, false),
        OutputFormat::JsonCompact => render_json(structured, true),
        OutputFormat::Yaml => render_yaml(structured),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Print a notice to stderr, respecting quiet mode.
pub fn print_notice(notice: &str, quiet: bool) {
    if quiet {
        return;
    }
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "{notice}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn grid_table(view: &GridView) -> String {
    let mut builder = Builder::default();
    builder.push_record(view.columns.iter().map(|c| match c.sort {
        Some(dir) => format!("{} ({dir})", c.header),
        None => c.header.clone(),
    }));
    for row in &view.rows {
        builder.push_record(row.cells.iter().cloned());
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    for (i, column) in view.columns.iter().enumerate() {
        let chars = usize::try_from((column.width / PX_PER_CHAR).max(3)).unwrap_or(usize::MAX);
        table.modify(Columns::single(i), Width::truncate(chars).suffix("…"));
    }
    table.to_string()
}

fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let out = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(out)
}

fn render_yaml<T: Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}
