//! Keyboard navigation and selection.
//!
//! Target resolution is a pure function over the navigable column order and
//! the row count: movement clamps at the edges and never wraps. In
//! right-to-left grids the horizontal directions are mirrored; home/end stay
//! logical (first/last column).

use std::collections::BTreeSet;

use cellgrid_config::TextDirection;
use cellgrid_core::{CellPosition, SelectionState};

use crate::error::GridError;
use crate::grid::GridEngine;
use crate::keys::Modifiers;
use crate::viewport::FocusOutcome;

// ============================================================================
// Direction resolution
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavDirection {
    Up,
    Down,
    Left,
    Right,
    /// First column of the row
    Home,
    /// Last column of the row
    End,
    /// First cell of the grid
    CtrlHome,
    /// Last cell of the grid
    CtrlEnd,
    /// First row, same column
    CtrlUp,
    /// Last row, same column
    CtrlDown,
    PageUp,
    PageDown,
    PageLeft,
    PageRight,
}

impl NavDirection {
    pub const ALL: [NavDirection; 14] = [
        NavDirection::Up,
        NavDirection::Down,
        NavDirection::Left,
        NavDirection::Right,
        NavDirection::Home,
        NavDirection::End,
        NavDirection::CtrlHome,
        NavDirection::CtrlEnd,
        NavDirection::CtrlUp,
        NavDirection::CtrlDown,
        NavDirection::PageUp,
        NavDirection::PageDown,
        NavDirection::PageLeft,
        NavDirection::PageRight,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            NavDirection::Up => "up",
            NavDirection::Down => "down",
            NavDirection::Left => "left",
            NavDirection::Right => "right",
            NavDirection::Home => "home",
            NavDirection::End => "end",
            NavDirection::CtrlHome => "ctrl+home",
            NavDirection::CtrlEnd => "ctrl+end",
            NavDirection::CtrlUp => "ctrl+up",
            NavDirection::CtrlDown => "ctrl+down",
            NavDirection::PageUp => "pageup",
            NavDirection::PageDown => "pagedown",
            NavDirection::PageLeft => "pageleft",
            NavDirection::PageRight => "pageright",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.token() == token)
    }

    /// Swap the horizontal directions whose meaning depends on text direction.
    fn mirrored(self) -> Self {
        match self {
            NavDirection::Left => NavDirection::Right,
            NavDirection::Right => NavDirection::Left,
            NavDirection::PageLeft => NavDirection::PageRight,
            NavDirection::PageRight => NavDirection::PageLeft,
            other => other,
        }
    }

    /// The "jump to edge" form used with Ctrl+Shift: vertical arrows go to
    /// the first/last row, horizontal arrows to the visual row edge.
    pub fn to_edge(self, direction: TextDirection) -> Self {
        match self {
            NavDirection::Up => NavDirection::CtrlUp,
            NavDirection::Down => NavDirection::CtrlDown,
            NavDirection::Left if direction.is_rtl() => NavDirection::End,
            NavDirection::Left => NavDirection::Home,
            NavDirection::Right if direction.is_rtl() => NavDirection::Home,
            NavDirection::Right => NavDirection::End,
            NavDirection::Home => NavDirection::CtrlHome,
            NavDirection::End => NavDirection::CtrlEnd,
            other => other,
        }
    }
}

/// Everything target resolution needs to know about the grid.
#[derive(Debug, Clone, Copy)]
pub struct NavContext<'a> {
    /// Navigable column ids in display order
    pub columns: &'a [String],
    pub row_count: usize,
    pub page_rows: usize,
    pub page_columns: usize,
    pub direction: TextDirection,
}

/// Where `direction` leads from `from`. `None` if the grid is empty or the
/// starting column is not navigable. Rows past the end are clamped first.
pub fn resolve_target(from: &CellPosition, direction: NavDirection, cx: &NavContext<'_>) -> Option<CellPosition> {
    if cx.row_count == 0 || cx.columns.is_empty() {
        return None;
    }
    let col = cx.columns.iter().position(|c| *c == from.column_id)?;
    let last_row = cx.row_count - 1;
    let last_col = cx.columns.len() - 1;
    let row = from.row_index.min(last_row);

    let direction = if cx.direction.is_rtl() { direction.mirrored() } else { direction };
    let (row, col) = match direction {
        NavDirection::Up => (row.saturating_sub(1), col),
        NavDirection::Down => ((row + 1).min(last_row), col),
        NavDirection::Left => (row, col.saturating_sub(1)),
        NavDirection::Right => (row, (col + 1).min(last_col)),
        NavDirection::Home => (row, 0),
        NavDirection::End => (row, last_col),
        NavDirection::CtrlHome => (0, 0),
        NavDirection::CtrlEnd => (last_row, last_col),
        NavDirection::CtrlUp => (0, col),
        NavDirection::CtrlDown => (last_row, col),
        NavDirection::PageUp => (row.saturating_sub(cx.page_rows), col),
        NavDirection::PageDown => (row.saturating_add(cx.page_rows).min(last_row), col),
        NavDirection::PageLeft => (row, col.saturating_sub(cx.page_columns)),
        NavDirection::PageRight => (row, col.saturating_add(cx.page_columns).min(last_col)),
    };
    Some(CellPosition::new(row, cx.columns[col].clone()))
}

// ============================================================================
// Engine operations
// ============================================================================

impl GridEngine {
    fn resolve(&self, from: &CellPosition, direction: NavDirection) -> Option<CellPosition> {
        let columns = self.navigable_column_ids();
        let cx = NavContext {
            columns: &columns,
            row_count: self.row_count(),
            page_rows: self.page_rows(),
            page_columns: self.settings.navigation.page_columns,
            direction: self.settings.navigation.text_direction,
        };
        resolve_target(from, direction, &cx)
    }

    /// Move focus one step. Returns the new focus, or `None` when nothing
    /// moved (no focus, clamped at an edge, or an editor is open).
    pub async fn navigate(&self, direction: NavDirection) -> Result<Option<CellPosition>, GridError> {
        self.ensure_mounted()?;
        if self.editing().is_some() {
            return Ok(None);
        }
        let Some(from) = self.focused() else {
            return Ok(None);
        };
        let Some(target) = self.resolve(&from, direction) else {
            return Ok(None);
        };
        if target == from {
            return Ok(None);
        }
        self.move_focus(target.clone()).await;
        Ok(Some(target))
    }

    /// Focus a cell, collapsing the selection. Waits for the row to render.
    pub(crate) async fn move_focus(&self, target: CellPosition) -> FocusOutcome {
        self.store.batch(|| {
            self.store.set(|s| &mut s.focused_cell, Some(target.clone()));
            self.store.set(|s| &mut s.selection, SelectionState::default());
            self.store.set(|s| &mut s.context_menu.open, false);
        });
        self.sync_dom_focus(&target).await
    }

    /// Focus a specific cell. An open editor on another cell is committed.
    pub async fn focus_cell(&self, position: CellPosition) -> Result<FocusOutcome, GridError> {
        self.ensure_mounted()?;
        self.validate_position(&position)?;
        if let Some(editing) = self.editing() {
            if editing != position {
                self.commit_edit(crate::editing::EditExit::Blur).await?;
            }
        }
        Ok(self.move_focus(position).await)
    }

    /// Grow the selection from its anchor one step in `direction`. The
    /// anchor is the current range start (or the focused cell); focus stays.
    pub fn extend_selection(&self, direction: NavDirection) -> Result<bool, GridError> {
        self.ensure_mounted()?;
        if self.editing().is_some() {
            return Ok(false);
        }
        let corners = self.store.read(|s| match &s.selection.selection_range {
            Some(range) => Some((range.start.clone(), range.end.clone())),
            None => s.focused_cell.clone().map(|f| (f.clone(), f)),
        });
        let Some((anchor, edge)) = corners else {
            return Ok(false);
        };
        let Some(target) = self.resolve(&edge, direction) else {
            return Ok(false);
        };
        let row = target.row_index;
        let changed = self.select_range(anchor, target)?;
        self.viewport.reveal(row);
        Ok(changed)
    }

    /// Ctrl+Shift+arrow: extend the selection to the grid edge.
    pub fn extend_selection_to_edge(&self, direction: NavDirection) -> Result<bool, GridError> {
        self.extend_selection(direction.to_edge(self.settings.navigation.text_direction))
    }

    /// Select the rectangle between two corners over the navigable columns.
    /// Returns false when a corner is not a navigable cell.
    pub fn select_range(&self, start: CellPosition, end: CellPosition) -> Result<bool, GridError> {
        self.ensure_mounted()?;
        self.apply_range(start, end, false)
    }

    fn apply_range(&self, start: CellPosition, end: CellPosition, is_selecting: bool) -> Result<bool, GridError> {
        let columns = self.navigable_column_ids();
        let row_count = self.row_count();
        if start.row_index >= row_count || end.row_index >= row_count {
            return Ok(false);
        }
        match SelectionState::rectangle(start, end, &columns, is_selecting) {
            Some(selection) => Ok(self.store.set(|s| &mut s.selection, selection)),
            None => Ok(false),
        }
    }

    /// Select every navigable cell.
    pub fn select_all(&self) -> Result<bool, GridError> {
        self.ensure_mounted()?;
        let columns = self.navigable_column_ids();
        let row_count = self.row_count();
        let (Some(first), Some(last)) = (columns.first(), columns.last()) else {
            return Ok(false);
        };
        if row_count == 0 {
            return Ok(false);
        }
        let start = CellPosition::new(0, first.clone());
        let end = CellPosition::new(row_count - 1, last.clone());
        self.apply_range(start, end, false)
    }

    /// Drop the cell selection and any cut marks.
    pub fn clear_selection(&self) -> Result<(), GridError> {
        self.ensure_mounted()?;
        self.store.batch(|| {
            self.store.set(|s| &mut s.selection, SelectionState::default());
            self.store.set(|s| &mut s.cut_cells, Default::default());
        });
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Pointer
    // ------------------------------------------------------------------------

    /// Mouse down on a cell. Plain click focuses and starts a drag
    /// selection; Shift extends from the focused cell; Ctrl/Cmd toggles the
    /// cell in the selection.
    pub async fn on_cell_pointer_down(&self, position: CellPosition, modifiers: Modifiers) -> Result<(), GridError> {
        self.ensure_mounted()?;
        let Some(column) = self.column(&position.column_id) else {
            return Ok(());
        };
        if !column.navigable || position.row_index >= self.row_count() {
            return Ok(());
        }
        if let Some(editing) = self.editing() {
            if editing == position {
                return Ok(());
            }
            self.commit_edit(crate::editing::EditExit::Blur).await?;
        }
        self.store.set(|s| &mut s.context_menu.open, false);

        let focus = self.focused();
        if modifiers.shift {
            if let Some(anchor) = focus {
                self.select_range(anchor, position)?;
                return Ok(());
            }
        }

        if modifiers.primary() {
            let mut selection = self.store.read(|s| s.selection.clone());
            if selection.is_empty() {
                if let Some(anchor) = &focus {
                    selection.toggle(anchor);
                }
            }
            selection.toggle(&position);
            self.store.batch(|| {
                self.store.set(|s| &mut s.selection, selection);
                self.store.set(|s| &mut s.focused_cell, Some(position.clone()));
            });
        } else {
            let columns = self.navigable_column_ids();
            let selection = SelectionState::rectangle(position.clone(), position.clone(), &columns, true)
                .unwrap_or_default();
            self.store.batch(|| {
                self.store.set(|s| &mut s.focused_cell, Some(position.clone()));
                self.store.set(|s| &mut s.selection, selection);
            });
        }
        self.sync_dom_focus(&position).await;
        Ok(())
    }

    /// Pointer entered a cell. Extends the drag selection while one is in
    /// progress.
    pub fn on_cell_pointer_enter(&self, position: CellPosition) -> Result<bool, GridError> {
        self.ensure_mounted()?;
        let anchor = self.store.read(|s| {
            s.selection
                .selection_range
                .as_ref()
                .filter(|_| s.selection.is_selecting)
                .map(|r| r.start.clone())
        });
        match anchor {
            Some(anchor) => self.apply_range(anchor, position, true),
            None => Ok(false),
        }
    }

    /// Pointer released anywhere: ends the drag selection.
    pub fn on_pointer_up(&self) -> Result<(), GridError> {
        self.ensure_mounted()?;
        self.store.set(|s| &mut s.selection.is_selecting, false);
        Ok(())
    }

    pub async fn on_cell_double_click(&self, position: CellPosition) -> Result<bool, GridError> {
        self.start_editing(position, crate::editing::EditTrigger::DoubleClick).await
    }

    // ------------------------------------------------------------------------
    // Row selection
    // ------------------------------------------------------------------------

    pub fn toggle_row_selection(&self, row_index: usize) -> Result<bool, GridError> {
        self.ensure_mounted()?;
        if row_index >= self.row_count() {
            return Ok(false);
        }
        let mut rows = self.store.read(|s| s.row_selection.clone());
        let selected = rows.insert(row_index) || !rows.remove(&row_index);
        self.store.set(|s| &mut s.row_selection, rows);
        Ok(selected)
    }

    pub fn select_all_rows(&self) -> Result<(), GridError> {
        self.ensure_mounted()?;
        let rows = (0..self.row_count()).collect::<BTreeSet<usize>>();
        self.store.set(|s| &mut s.row_selection, rows);
        Ok(())
    }

    pub fn clear_row_selection(&self) -> Result<(), GridError> {
        self.ensure_mounted()?;
        self.store.set(|s| &mut s.row_selection, Default::default());
        Ok(())
    }
}
