//! Shared helpers for command handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use ecowatch_api::FetchRequest;
use ecowatch_config::{ConfigError, TableSchema};
use ecowatch_core::{CellValue, ColumnSet, ColumnSpec, SortDirection, SortState};

use super::Context;
use crate::config;
use crate::error::CliError;

static NULL: Value = Value::Null;

/// One page of a listing response.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub rows: Vec<Value>,
    /// Server page metadata, when the response carried any.
    pub page: Option<usize>,
    pub total_pages: Option<usize>,
}

/// Resolve a table id to its schema, or build an ad-hoc one from `path`.
pub fn table_schema(
    ctx: &Context<'_>,
    table: &str,
    path: Option<&str>,
) -> Result<TableSchema, CliError> {
    match (ctx.config.tables.get(table), path) {
        (Some(schema), None) => Ok(schema.clone()),
        (Some(schema), Some(path)) => Ok(TableSchema {
            path: path.to_owned(),
            ..schema.clone()
        }),
        (None, Some(path)) => Ok(TableSchema {
            path: path.to_owned(),
            params: BTreeMap::new(),
            columns: Vec::new(),
        }),
        (None, None) => Err(ConfigError::UnknownTable {
            table: table.to_owned(),
        }
        .into()),
    }
}

/// The request for a table, before any view parameters.
pub fn base_request(schema: &TableSchema, extra: &[(String, String)]) -> FetchRequest {
    let mut request = FetchRequest::get(&schema.path);
    for (key, value) in &schema.params {
        request.params.insert(key.clone(), value.clone());
    }
    for (key, value) in extra {
        request.params.insert(key.clone(), value.clone());
    }
    request
}

/// Fetch one listing through the shared cache.
pub async fn fetch_listing(ctx: &Context<'_>, request: &FetchRequest) -> Result<Listing, CliError> {
    let fetcher = Arc::new(config::build_fetcher(ctx.global, &ctx.config)?);
    let body = ctx.fetch.get_json(&fetcher, request).await?;
    parse_listing(body)
}

/// Accept a bare array, or `{ "data": [...], "meta": { "page", "total_pages" } }`.
pub fn parse_listing(body: Value) -> Result<Listing, CliError> {
    match body {
        Value::Null => Ok(Listing {
            rows: Vec::new(),
            page: None,
            total_pages: None,
        }),
        Value::Array(rows) => Ok(Listing {
            rows,
            page: None,
            total_pages: None,
        }),
        Value::Object(mut map) => {
            let rows = match map.remove("data") {
                Some(Value::Array(rows)) => rows,
                Some(Value::Null) | None => {
                    return Err(CliError::BadResponse {
                        message: "object without a `data` array".into(),
                    });
                }
                Some(other) => {
                    return Err(CliError::BadResponse {
                        message: format!("`data` is {}, not an array", kind(&other)),
                    });
                }
            };
            let meta = map.get("meta");
            let number = |key: &str| {
                meta.and_then(|m| m.get(key))
                    .and_then(Value::as_u64)
                    .and_then(|n| usize::try_from(n).ok())
            };
            Ok(Listing {
                page: number("page"),
                total_pages: number("total_pages"),
                rows,
            })
        }
        other => Err(CliError::BadResponse {
            message: format!("got {}", kind(&other)),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Follow a dotted path (`location.city`) into a row. Missing keys read as null.
pub fn lookup_field<'v>(row: &'v Value, path: &str) -> &'v Value {
    path.split('.')
        .try_fold(row, |value, segment| match value {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
        .unwrap_or(&NULL)
}

fn field_column(id: &str, header: &str, field: String) -> ColumnSpec<Value> {
    ColumnSpec::new(id, header).accessor(move |row| CellValue::from_json(lookup_field(row, &field)))
}

/// Column specs from a configured schema.
pub fn columns_from_schema(schema: &TableSchema) -> Result<ColumnSet<Value>, CliError> {
    let specs = schema
        .columns
        .iter()
        .map(|c| {
            let mut spec = field_column(&c.id, c.header(), c.field().to_owned());
            if let Some(px) = c.width {
                spec = spec.width(px);
            }
            if c.locked {
                spec = spec.locked();
            }
            if c.hidden {
                spec = spec.hidden();
            }
            if !c.sortable {
                spec = spec.unsortable();
            }
            spec
        })
        .collect();
    Ok(ColumnSet::new(specs)?)
}

/// One column per top-level key of the first object row, in key order.
pub fn infer_columns(rows: &[Value]) -> Result<ColumnSet<Value>, CliError> {
    let Some(Value::Object(first)) = rows.iter().find(|r| r.is_object()) else {
        return Err(CliError::BadResponse {
            message: "cannot infer columns: no object rows; define [tables.<id>.columns]".into(),
        });
    };
    let specs = first
        .keys()
        .map(|key| field_column(key, key, key.clone()))
        .collect();
    Ok(ColumnSet::new(specs)?)
}

/// Columns for a table: the schema's when configured, else inferred from rows.
pub fn resolve_columns(schema: &TableSchema, rows: &[Value]) -> Result<ColumnSet<Value>, CliError> {
    if schema.columns.is_empty() {
        infer_columns(rows)
    } else {
        columns_from_schema(schema)
    }
}

/// Columns for commands that do not otherwise need rows. Only fetches
/// when the schema has no column list.
pub async fn load_columns(ctx: &Context<'_>, table: &str) -> Result<ColumnSet<Value>, CliError> {
    let schema = table_schema(ctx, table, None)?;
    if !schema.columns.is_empty() {
        return columns_from_schema(&schema);
    }
    let listing = fetch_listing(ctx, &base_request(&schema, &[])).await?;
    infer_columns(&listing.rows)
}

/// Parse `col`, `col:asc`, `col:desc` or `none`.
pub fn parse_sort(raw: &str) -> Result<SortState, CliError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
        return Ok(SortState::none());
    }
    let (column, direction) = match raw.split_once(':') {
        Some((column, dir)) => {
            let direction = dir.parse::<SortDirection>().map_err(|_| CliError::Validation {
                field: "sort".into(),
                reason: format!("direction must be 'asc' or 'desc', got '{dir}'"),
            })?;
            (column, direction)
        }
        None => (raw, SortDirection::Asc),
    };
    if column.is_empty() {
        return Err(CliError::Validation {
            field: "sort".into(),
            reason: format!("missing column in '{raw}'"),
        });
    }
    Ok(match direction {
        SortDirection::Asc => SortState::asc(column),
        SortDirection::Desc => SortState::desc(column),
    })
}

/// `aqi desc`, or `none`.
pub fn describe_sort(sort: &SortState) -> String {
    match &sort.column_id {
        Some(column) => format!("{column} {}", sort.direction),
        None => "none".into(),
    }
}

pub fn unknown_column(table: &str, column: &str) -> CliError {
    CliError::NotFound {
        resource_type: "column".into(),
        identifier: column.into(),
        hint: format!("Run: ecowatch columns {table} list"),
    }
}
