// ── Column specs ──
//
// Caller-supplied column descriptions. A `ColumnSet` is validated once at
// registration; everything downstream relies on its ids being unique and
// every column being renderable.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::CoreError;

/// Raw value of a cell, used for sorting and default rendering.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Map a JSON value onto a cell. Arrays and objects render as compact JSON.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n.as_f64().map_or_else(|| Self::Text(n.to_string()), Self::Number),
            Value::String(s) if s.is_empty() => Self::Empty,
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Self::Text(value.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s.to_owned())
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        if s.is_empty() { Self::Empty } else { Self::Text(s) }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Empty, Into::into)
    }
}

pub type Accessor<R> = Arc<dyn Fn(&R) -> CellValue + Send + Sync>;
pub type Renderer<R> = Arc<dyn Fn(&R) -> String + Send + Sync>;

/// One column of a grid.
pub struct ColumnSpec<R> {
    pub id: String,
    pub header: String,
    /// Preferred width in pixels, before any user resize.
    pub width: Option<u32>,
    /// Never hideable by the user.
    pub locked: bool,
    /// Hidden until the user shows it.
    pub default_hidden: bool,
    pub sortable: bool,
    accessor: Option<Accessor<R>>,
    renderer: Option<Renderer<R>>,
}

impl<R> ColumnSpec<R> {
    pub fn new(id: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            header: header.into(),
            width: None,
            locked: false,
            default_hidden: false,
            sortable: true,
            accessor: None,
            renderer: None,
        }
    }

    /// Value extractor, used for sorting and (absent a renderer) display.
    pub fn accessor(mut self, f: impl Fn(&R) -> CellValue + Send + Sync + 'static) -> Self {
        self.accessor = Some(Arc::new(f));
        self
    }

    /// Pure formatting function for the cell's text.
    pub fn render(mut self, f: impl Fn(&R) -> String + Send + Sync + 'static) -> Self {
        self.renderer = Some(Arc::new(f));
        self
    }

    pub fn width(mut self, px: u32) -> Self {
        self.width = Some(px);
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.default_hidden = true;
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    /// Sort value of `row` in this column.
    pub fn value(&self, row: &R) -> CellValue {
        match (&self.accessor, &self.renderer) {
            (Some(accessor), _) => accessor(row),
            (None, Some(renderer)) => CellValue::from(renderer(row)),
            (None, None) => CellValue::Empty,
        }
    }

    /// Display text of `row` in this column.
    pub fn render_cell(&self, row: &R) -> String {
        match (&self.renderer, &self.accessor) {
            (Some(renderer), _) => renderer(row),
            (None, Some(accessor)) => accessor(row).to_string(),
            (None, None) => String::new(),
        }
    }

    fn is_renderable(&self) -> bool {
        self.accessor.is_some() || self.renderer.is_some()
    }
}

impl<R> Clone for ColumnSpec<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            header: self.header.clone(),
            width: self.width,
            locked: self.locked,
            default_hidden: self.default_hidden,
            sortable: self.sortable,
            accessor: self.accessor.clone(),
            renderer: self.renderer.clone(),
        }
    }
}

impl<R> fmt::Debug for ColumnSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("width", &self.width)
            .field("locked", &self.locked)
            .field("default_hidden", &self.default_hidden)
            .field("sortable", &self.sortable)
            .finish_non_exhaustive()
    }
}

/// Validated, ordered list of columns.
pub struct ColumnSet<R> {
    columns: Vec<ColumnSpec<R>>,
}

impl<R> ColumnSet<R> {
    /// Validate `columns`: ids and headers non-empty, ids unique, and every
    /// column has an accessor or a renderer.
    pub fn new(columns: Vec<ColumnSpec<R>>) -> Result<Self, CoreError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if column.id.trim().is_empty() {
                return Err(CoreError::Validation {
                    message: "column id must not be empty".into(),
                });
            }
            if column.header.trim().is_empty() {
                return Err(CoreError::Validation {
                    message: format!("column '{}' has no header", column.id),
                });
            }
            if !seen.insert(column.id.as_str()) {
                return Err(CoreError::Validation {
                    message: format!("duplicate column id '{}'", column.id),
                });
            }
            if !column.is_renderable() {
                return Err(CoreError::Validation {
                    message: format!("column '{}' needs an accessor or a renderer", column.id),
                });
            }
        }
        Ok(Self { columns })
    }

    pub fn get(&self, id: &str) -> Option<&ColumnSpec<R>> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnSpec<R>> {
        self.columns.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<R> Clone for ColumnSet<R> {
    fn clone(&self) -> Self {
        Self {
            columns: self.columns.clone(),
        }
    }
}

impl<R> fmt::Debug for ColumnSet<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.columns).finish()
    }
}

impl<'a, R> IntoIterator for &'a ColumnSet<R> {
    type Item = &'a ColumnSpec<R>;
    type IntoIter = std::slice::Iter<'a, ColumnSpec<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct Station {
        name: &'static str,
        aqi: Option<f64>,
    }

    #[test]
    fn renderer_wins_for_display_accessor_for_value() {
        let col = ColumnSpec::<Station>::new("aqi", "AQI")
            .accessor(|s| s.aqi.into())
            .render(|s| s.aqi.map_or_else(|| "n/a".into(), |v| format!("{v:.0} AQI")));
        let row = Station {
            name: "harbor",
            aqi: Some(42.0),
        };

        assert_eq!(col.value(&row), CellValue::Number(42.0));
        assert_eq!(col.render_cell(&row), "42 AQI");
        assert_eq!(
            col.render_cell(&Station {
                name: "quay",
                aqi: None
            }),
            "n/a"
        );
    }

    #[test]
    fn renderer_only_column_sorts_by_text() {
        let col = ColumnSpec::<Station>::new("name", "Name").render(|s| s.name.to_uppercase());
        let row = Station {
            name: "harbor",
            aqi: None,
        };
        assert_eq!(col.value(&row), CellValue::Text("HARBOR".into()));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = ColumnSet::new(vec![
            ColumnSpec::<Station>::new("name", "Name").render(|s| s.name.into()),
            ColumnSpec::<Station>::new("name", "Again").render(|s| s.name.into()),
        ]);
        assert!(matches!(result, Err(CoreError::Validation { .. })));
    }

    #[test]
    fn column_without_accessor_or_renderer_is_rejected() {
        let result = ColumnSet::new(vec![ColumnSpec::<Station>::new("name", "Name")]);
        assert!(matches!(result, Err(CoreError::Validation { .. })));
    }

    #[test]
    fn blank_header_is_rejected() {
        let result =
            ColumnSet::new(vec![ColumnSpec::<Station>::new("name", " ").render(|_| String::new())]);
        assert!(result.is_err());
    }

    #[test]
    fn cell_values_from_json() {
        assert_eq!(CellValue::from_json(&json!(null)), CellValue::Empty);
        assert_eq!(CellValue::from_json(&json!("")), CellValue::Empty);
        assert_eq!(CellValue::from_json(&json!(3)), CellValue::Number(3.0));
        assert_eq!(CellValue::from_json(&json!(true)), CellValue::Bool(true));
        assert_eq!(
            CellValue::from_json(&json!({"a": 1})),
            CellValue::Text(r#"{"a":1}"#.into())
        );
    }
}
