//! `columns` handlers: list and edit a table's persisted column layout.

use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use ecowatch_core::ColumnRegistry;

use super::{Context, util};
use crate::cli::{ColumnsArgs, ColumnsCommand};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Clone, Serialize, Tabled)]
struct ColumnRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Header")]
    header: String,
    #[tabled(rename = "Visible")]
    visible: bool,
    #[tabled(rename = "Locked")]
    locked: bool,
    #[tabled(rename = "Width")]
    width: u32,
}

fn column_rows(registry: &ColumnRegistry<Value>) -> Vec<ColumnRow> {
    registry
        .columns()
        .iter()
        .map(|c| ColumnRow {
            id: c.id.clone(),
            header: c.header.clone(),
            visible: !registry.is_hidden(&c.id),
            locked: registry.is_locked(&c.id),
            width: registry.width_of(&c.id),
        })
        .collect()
}

fn ensure_known(
    registry: &ColumnRegistry<Value>,
    table: &str,
    column: &str,
) -> Result<(), CliError> {
    if registry.columns().contains(column) {
        Ok(())
    } else {
        Err(util::unknown_column(table, column))
    }
}

pub async fn handle(args: ColumnsArgs, ctx: &Context<'_>) -> Result<(), CliError> {
    let columns = util::load_columns(ctx, &args.table).await?;
    let mut registry =
        ColumnRegistry::with_prefs(columns, &ctx.grid_config(), ctx.prefs(&args.table));

    match &args.command {
        ColumnsCommand::List => {}

        ColumnsCommand::Hide { column } => {
            ensure_known(&registry, &args.table, column)?;
            if !registry.hide(column) {
                ctx.notice(&format!("'{column}' is locked or already hidden"));
            }
        }

        ColumnsCommand::Show { column } => {
            ensure_known(&registry, &args.table, column)?;
            if !registry.show(column) {
                ctx.notice(&format!("'{column}' is already visible"));
            }
        }

        ColumnsCommand::Toggle { column } => {
            ensure_known(&registry, &args.table, column)?;
            if !registry.toggle(column) {
                ctx.notice(&format!("'{column}' is locked"));
            }
        }

        ColumnsCommand::Resize { column, px } => {
            ensure_known(&registry, &args.table, column)?;
            match registry.resize(column, *px) {
                Some(width) if width != *px => {
                    ctx.notice(&format!("'{column}' clamped to {width}px"));
                }
                _ => {}
            }
        }

        ColumnsCommand::Reset => {
            registry.reset();
            ctx.notice("column layout reset");
        }
    }

    let rows = column_rows(&registry);
    let out = output::render_list(
        ctx.format,
        &rows,
        ColumnRow::clone,
        |r| r.id.clone(),
    )?;
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}
