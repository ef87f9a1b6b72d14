// ── Sorting ──
//
// Tri-state per-column toggle plus the comparison used by client-side
// sorting.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::column::{CellValue, ColumnSpec};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Current sort selection. `column_id == None` means unsorted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortState {
    pub column_id: Option<String>,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortState {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn asc(column_id: impl Into<String>) -> Self {
        Self {
            column_id: Some(column_id.into()),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column_id: impl Into<String>) -> Self {
        Self {
            column_id: Some(column_id.into()),
            direction: SortDirection::Desc,
        }
    }

    pub fn is_none(&self) -> bool {
        self.column_id.is_none()
    }

    /// Direction if this state sorts by `column_id`.
    pub fn direction_for(&self, column_id: &str) -> Option<SortDirection> {
        (self.column_id.as_deref() == Some(column_id)).then_some(self.direction)
    }

    /// Advance the toggle cycle in place.
    pub fn toggle(&mut self, column_id: &str) {
        *self = apply_toggle(self, column_id);
    }
}

/// Next sort state after a header click on `column_id`.
///
/// A different column starts at ascending; the same column cycles
/// asc → desc → none.
pub fn apply_toggle(state: &SortState, column_id: &str) -> SortState {
    match state.direction_for(column_id) {
        None => SortState::asc(column_id),
        Some(SortDirection::Asc) => SortState::desc(column_id),
        Some(SortDirection::Desc) => SortState::none(),
    }
}

/// Ascending comparison of two cells.
///
/// Numbers compare numerically, text case-insensitively, booleans
/// false-first. Mixed kinds order as bool < number < text.
pub fn compare_cells(a: &CellValue, b: &CellValue) -> Ordering {
    match (a, b) {
        (CellValue::Empty, CellValue::Empty) => Ordering::Equal,
        (CellValue::Empty, _) => Ordering::Greater,
        (_, CellValue::Empty) => Ordering::Less,
        (CellValue::Number(x), CellValue::Number(y)) => x.total_cmp(y),
        (CellValue::Text(x), CellValue::Text(y)) => x
            .to_lowercase()
            .cmp(&y.to_lowercase())
            .then_with(|| x.cmp(y)),
        (CellValue::Bool(x), CellValue::Bool(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn rank(value: &CellValue) -> u8 {
    match value {
        CellValue::Bool(_) => 0,
        CellValue::Number(_) => 1,
        CellValue::Text(_) => 2,
        CellValue::Empty => 3,
    }
}

/// Stable sort of `indices` into `rows` by `column`.
///
/// Empty cells stay at the end in both directions.
pub fn sort_indices<R>(
    rows: &[R],
    indices: &mut [usize],
    column: &ColumnSpec<R>,
    direction: SortDirection,
) {
    let mut keyed: Vec<(CellValue, usize)> = indices
        .iter()
        .filter_map(|&i| rows.get(i).map(|row| (column.value(row), i)))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match (a.is_empty(), b.is_empty()) {
        (false, false) => {
            let ord = compare_cells(a, b);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
        _ => compare_cells(a, b),
    });

    for (slot, (_, i)) in indices.iter_mut().zip(keyed) {
        *slot = i;
    }
}
