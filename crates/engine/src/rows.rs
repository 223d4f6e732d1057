//! Row lifecycle: adding and deleting rows through host hooks.

use std::collections::BTreeSet;

use cellgrid_core::{CellPosition, SelectionState};

use crate::collaborators::RowsDeleteRequest;
use crate::error::GridError;
use crate::events::{count_noun, Notice};
use crate::grid::GridEngine;
use crate::retry::{retry_until, RetryPolicy};

impl GridEngine {
    /// Ask the host for a new row, wait for it to appear, then focus it.
    /// Returns the focused cell, or `None` if no row was added.
    pub async fn add_row(&self) -> Result<Option<CellPosition>, GridError> {
        self.ensure_mounted()?;
        if self.settings.read_only {
            return Ok(None);
        }
        let Some(row_add) = self.hooks.row_add.as_ref() else {
            return Ok(None);
        };
        if self.editing().is_some() {
            self.commit_edit(crate::editing::EditExit::Blur).await?;
        }

        let before = self.row_count();
        let partial = match row_add().await {
            Ok(partial) => partial.unwrap_or_default(),
            Err(e) => {
                log::warn!("row_add hook failed: {}", e);
                self.notify(Notice::error(format!("Failed to add row: {}", e)));
                return Ok(None);
            }
        };
        if !self.is_mounted() {
            return Ok(None);
        }

        let row_index = partial.row_index.unwrap_or(before);
        let policy = RetryPolicy::new(self.settings.rows.max_create_attempts, self.settings.rows.retry_interval_ms);
        if !retry_until(policy, || self.row_count() > row_index).await.is_ready() {
            log::warn!("row {} did not appear after row_add", row_index);
            return Ok(None);
        }

        let navigable = self.navigable_column_ids();
        let column_id = partial
            .column_id
            .filter(|id| navigable.contains(id))
            .or_else(|| navigable.first().cloned());
        let Some(column_id) = column_id else {
            return Ok(None);
        };
        let target = CellPosition::new(row_index, column_id);
        self.move_focus(target.clone()).await;
        Ok(Some(target))
    }

    /// Rows a delete would remove: the row selection, else the rows of the
    /// cell selection, else the focused row.
    pub fn rows_to_delete(&self) -> Vec<usize> {
        let row_count = self.row_count();
        let rows: BTreeSet<usize> = self.store.read(|s| {
            if !s.row_selection.is_empty() {
                s.row_selection.clone()
            } else if !s.selection.is_empty() {
                s.selection.rows().into_iter().collect()
            } else {
                s.focused_cell.iter().map(|p| p.row_index).collect()
            }
        });
        rows.into_iter().filter(|&r| r < row_count).collect()
    }

    /// Delete the target rows through the host. Returns whether the host
    /// accepted the deletion.
    pub async fn delete_selected_rows(&self) -> Result<bool, GridError> {
        self.ensure_mounted()?;
        if self.settings.read_only || self.editing().is_some() {
            return Ok(false);
        }
        let Some(rows_delete) = self.hooks.rows_delete.as_ref() else {
            return Ok(false);
        };
        let indices = self.rows_to_delete();
        if indices.is_empty() {
            return Ok(false);
        }
        let row_ids = indices.iter().filter_map(|&i| self.model.row_id(i)).collect();
        let count = indices.len();

        if let Err(e) = rows_delete(RowsDeleteRequest { indices, row_ids }).await {
            log::warn!("rows_delete hook failed: {}", e);
            self.notify(Notice::error(format!("Failed to delete rows: {}", e)));
            return Ok(false);
        }
        if !self.is_mounted() {
            return Ok(false);
        }

        let row_count = self.row_count();
        let focus = self.focused().and_then(|f| match row_count {
            0 => None,
            n if f.row_index >= n => Some(CellPosition::new(n - 1, f.column_id)),
            _ => Some(f),
        });
        self.store.batch(|| {
            self.store.set(|s| &mut s.selection, SelectionState::default());
            self.store.set(|s| &mut s.row_selection, BTreeSet::new());
            self.store.set(|s| &mut s.cut_cells, Default::default());
            self.store.set(|s| &mut s.focused_cell, focus);
        });
        self.notify(Notice::success(format!("Deleted {}", count_noun(count, "row"))));
        Ok(true)
    }
}
