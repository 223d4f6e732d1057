//! Selection rectangles and the multi-cell selection state.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::position::{CellKey, CellPosition};

/// A rectangular block of cells in index space, inclusive on both ends.
///
/// Columns are indices into the *navigable* column order, so a rectangle is
/// only meaningful together with the column list it was computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl CellRect {
    /// Create a new rect, automatically normalizing so start <= end.
    pub fn new(r1: usize, c1: usize, r2: usize, c2: usize) -> Self {
        Self {
            start_row: r1.min(r2),
            start_col: c1.min(c2),
            end_row: r1.max(r2),
            end_col: c1.max(c2),
        }
    }

    /// Rect spanned by two positions. `None` if either column is not in `columns`.
    pub fn spanning(start: &CellPosition, end: &CellPosition, columns: &[String]) -> Option<Self> {
        let c1 = columns.iter().position(|c| *c == start.column_id)?;
        let c2 = columns.iter().position(|c| *c == end.column_id)?;
        Some(Self::new(start.row_index, c1, end.row_index, c2))
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.start_row && row <= self.end_row &&
        col >= self.start_col && col <= self.end_col
    }

    /// Number of cells in this rect.
    pub fn cell_count(&self) -> usize {
        (self.end_row - self.start_row + 1) * (self.end_col - self.start_col + 1)
    }

    /// Iterate over all cells in this rect (row-major order).
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let start_col = self.start_col;
        let end_col = self.end_col;

        (self.start_row..=self.end_row).flat_map(move |r| {
            (start_col..=end_col).map(move |c| (r, c))
        })
    }
}

/// The two corners a range selection was built from. `start` is the anchor,
/// `end` the moving edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start: CellPosition,
    pub end: CellPosition,
}

/// Multi-cell selection.
///
/// When `selection_range` is set, `selected_cells` is exactly the rectangle
/// between its corners over the navigable column order. Ctrl-toggled
/// selections drop the range and keep an arbitrary key set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub selected_cells: FxHashSet<CellKey>,
    pub selection_range: Option<SelectionRange>,
    /// True only while a pointer drag is in progress
    pub is_selecting: bool,
}

impl SelectionState {
    /// Rectangular selection between two corners. `None` when a corner's
    /// column is not navigable.
    pub fn rectangle(
        start: CellPosition,
        end: CellPosition,
        columns: &[String],
        is_selecting: bool,
    ) -> Option<Self> {
        let rect = CellRect::spanning(&start, &end, columns)?;
        let selected_cells = rect
            .cells()
            .map(|(row, col)| CellKey::from_parts(row, &columns[col]))
            .collect();
        Some(Self {
            selected_cells,
            selection_range: Some(SelectionRange { start, end }),
            is_selecting,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.selected_cells.is_empty()
    }

    pub fn cell_count(&self) -> usize {
        self.selected_cells.len()
    }

    pub fn contains(&self, position: &CellPosition) -> bool {
        self.selected_cells.contains(&position.key())
    }

    /// Add or remove one cell, dropping the range (the set is no longer a
    /// rectangle in general).
    pub fn toggle(&mut self, position: &CellPosition) {
        let key = position.key();
        if !self.selected_cells.remove(&key) {
            self.selected_cells.insert(key);
        }
        self.selection_range = None;
    }

    /// Decoded positions, sorted by row then column id.
    pub fn positions(&self) -> Vec<CellPosition> {
        let mut positions: Vec<CellPosition> =
            self.selected_cells.iter().map(CellKey::position).collect();
        positions.sort();
        positions
    }

    /// Distinct selected rows, ascending.
    pub fn rows(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = self.selected_cells.iter().map(|k| k.position().row_index).collect();
        rows.sort_unstable();
        rows.dedup();
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<String> {
        ["name", "age", "email", "active"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rect_multi() {
        let r = CellRect::new(1, 1, 3, 2);
        assert!(r.contains(1, 1));
        assert!(r.contains(2, 2));
        assert!(r.contains(3, 1));
        assert!(!r.contains(0, 0));
        assert_eq!(r.cell_count(), 6); // 3 rows x 2 cols
    }

    #[test]
    fn test_rect_normalizes() {
        let r = CellRect::new(5, 5, 1, 1);
        assert_eq!((r.start_row, r.start_col, r.end_row, r.end_col), (1, 1, 5, 5));
    }

    #[test]
    fn test_rectangle_selection_keys() {
        let cols = columns();
        let sel = SelectionState::rectangle(
            CellPosition::new(2, "email"),
            CellPosition::new(1, "age"),
            &cols,
            false,
        )
        .unwrap();

        assert_eq!(sel.cell_count(), 4);
        assert!(sel.contains(&CellPosition::new(1, "age")));
        assert!(sel.contains(&CellPosition::new(2, "email")));
        assert!(!sel.contains(&CellPosition::new(1, "name")));
        assert_eq!(sel.rows(), vec![1, 2]);
        let range = sel.selection_range.as_ref().unwrap();
        assert_eq!(range.start, CellPosition::new(2, "email"));
    }

    #[test]
    fn test_rectangle_rejects_unknown_column() {
        let cols = columns();
        assert!(SelectionState::rectangle(
            CellPosition::new(0, "select"),
            CellPosition::new(1, "age"),
            &cols,
            false,
        )
        .is_none());
    }

    #[test]
    fn test_toggle_drops_range() {
        let cols = columns();
        let mut sel = SelectionState::rectangle(
            CellPosition::new(0, "name"),
            CellPosition::new(0, "age"),
            &cols,
            false,
        )
        .unwrap();
        sel.toggle(&CellPosition::new(0, "age"));
        sel.toggle(&CellPosition::new(3, "active"));

        assert!(sel.selection_range.is_none());
        assert_eq!(
            sel.positions(),
            vec![CellPosition::new(0, "name"), CellPosition::new(3, "active")]
        );
    }
}
