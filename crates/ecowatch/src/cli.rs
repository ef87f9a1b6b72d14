//! Clap derive structures for the `ecowatch` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// ecowatch -- browse monitoring tables from the command line
#[derive(Debug, Parser)]
#[command(
    name = "ecowatch",
    version,
    about = "Browse ecowatch monitoring tables from the command line",
    long_about = "Fetches listings from an ecowatch API and renders them as sorted, \
        filtered, paginated grids.\n\n\
        Column layout, sort, search and filters persist per table between runs.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "ECOWATCH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base URL (overrides profile)
    #[arg(long, env = "ECOWATCH_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Bearer token (overrides profile)
    #[arg(long, env = "ECOWATCH_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Config file path
    #[arg(long, env = "ECOWATCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Preference state file path
    #[arg(long, env = "ECOWATCH_STATE", global = true)]
    pub state: Option<PathBuf>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "ECOWATCH_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds [default: from profile, else config]
    #[arg(long, env = "ECOWATCH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "ECOWATCH_INSECURE", global = true)]
    pub insecure: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, tab-separated (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch a table and render the current page
    #[command(alias = "g")]
    Grid(GridArgs),

    /// Show or change a table's column layout
    #[command(alias = "cols")]
    Columns(ColumnsArgs),

    /// Show or cycle a table's sort (asc -> desc -> none)
    Sort(SortArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Grid ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GridArgs {
    /// Table id (configured under [tables.<id>], or ad hoc with PATH)
    pub table: String,

    /// Resource path, required for tables not in the config
    pub path: Option<String>,

    /// Extra query parameter (repeatable)
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,

    /// Page to show (1-based)
    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Rows per page [default: from config]
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Sort column, optionally with direction ("aqi", "aqi:desc", "none")
    #[arg(long, value_name = "COL[:asc|desc]")]
    pub sort: Option<String>,

    /// Case-insensitive search over visible cells ("" clears)
    #[arg(long)]
    pub search: Option<String>,

    /// Equality filter on a column (repeatable; empty value clears)
    #[arg(long = "filter", value_name = "COL=VALUE", value_parser = parse_key_val)]
    pub filters: Vec<(String, String)>,

    /// Drop every saved filter before applying --filter
    #[arg(long)]
    pub clear_filters: bool,

    /// Let the server paginate, sort and search
    #[arg(long)]
    pub server_side: bool,

    /// Scroll offset within the page, in pixels
    #[arg(long, default_value = "0", value_name = "PX")]
    pub scroll: u64,

    /// Viewport height in pixels; renders only the visible window
    #[arg(long, value_name = "PX")]
    pub viewport: Option<u32>,

    /// Viewport width in pixels
    #[arg(long, default_value = "1280", value_name = "PX")]
    pub viewport_width: u32,
}

// ── Columns ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// Table id
    pub table: String,

    #[command(subcommand)]
    pub command: ColumnsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ColumnsCommand {
    /// List columns with visibility, lock state and width
    #[command(alias = "ls")]
    List,

    /// Hide a column
    Hide { column: String },

    /// Show a hidden column
    Show { column: String },

    /// Flip a column's visibility
    Toggle { column: String },

    /// Set a column's width in pixels
    Resize { column: String, px: u32 },

    /// Forget hidden columns and widths
    Reset,
}

// ── Sort ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SortArgs {
    /// Table id
    pub table: String,

    /// Column to cycle; omit to show the current sort
    pub column: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the resolved configuration (secrets masked)
    Show,

    /// Print the config and state file paths
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

// ── Value parsers ────────────────────────────────────────────────────

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}
