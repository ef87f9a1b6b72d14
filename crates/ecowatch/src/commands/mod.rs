//! Command dispatch: bridges CLI args -> core grids -> output formatting.

pub mod columns;
pub mod config_cmd;
pub mod grid;
pub mod sort;
pub mod util;

use std::sync::Arc;

use ecowatch_config::Config;
use ecowatch_core::{CachedFetch, GridConfig, KeyValueStore, TablePrefs};

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

/// Everything a table-bound command needs, resolved once per invocation.
pub struct Context<'a> {
    pub global: &'a GlobalOpts,
    pub config: Config,
    pub format: OutputFormat,
    pub color: bool,
    pub fetch: CachedFetch,
    state: Arc<dyn KeyValueStore>,
}

impl<'a> Context<'a> {
    pub fn new(global: &'a GlobalOpts) -> Result<Self, CliError> {
        let config = config::load(global)?;
        let format = config::output_format(global, &config);
        let fetch = CachedFetch::new(config.cache_config());
        Ok(Self {
            global,
            format,
            color: output::should_color(global.color),
            fetch,
            state: config::open_state(global),
            config,
        })
    }

    pub fn grid_config(&self) -> GridConfig {
        self.config.grid_config()
    }

    /// Preference handle for one table, backed by the state file.
    pub fn prefs(&self, table: &str) -> TablePrefs {
        TablePrefs::new(table, Arc::clone(&self.state))
    }

    pub fn notice(&self, text: &str) {
        output::print_notice(&output::status_line(text, self.color), self.global.quiet);
    }

    pub fn warn(&self, text: &str) {
        output::print_notice(&output::warning_line(text, self.color), self.global.quiet);
    }
}

/// Dispatch a table-bound command to its handler.
pub async fn dispatch(cmd: Command, ctx: &Context<'_>) -> Result<(), CliError> {
    match cmd {
        Command::Grid(args) => grid::handle(args, ctx).await,
        Command::Columns(args) => columns::handle(args, ctx).await,
        Command::Sort(args) => sort::handle(args, ctx).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
