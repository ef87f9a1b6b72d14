//! `sort` handler: show or cycle a table's saved sort.

use serde_json::Value;

use ecowatch_core::DataGrid;

use super::{Context, util};
use crate::cli::SortArgs;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: SortArgs, ctx: &Context<'_>) -> Result<(), CliError> {
    let columns = util::load_columns(ctx, &args.table).await?;
    let mut grid: DataGrid<Value> =
        DataGrid::with_prefs(columns, ctx.grid_config(), ctx.prefs(&args.table));

    if let Some(column) = &args.column {
        let Some(spec) = grid.columns().columns().get(column) else {
            return Err(util::unknown_column(&args.table, column));
        };
        if !spec.sortable {
            return Err(CliError::Validation {
                field: "column".into(),
                reason: format!("'{column}' is not sortable"),
            });
        }
        grid.toggle_sort(column);
    }

    let out = output::render_single(ctx.format, grid.sort(), util::describe_sort)?;
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}
