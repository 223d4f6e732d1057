//! Clipboard: copy, cut, paste and clear.
//!
//! Copy serializes the selection as tab-separated text over the bounding
//! rows and navigable columns of the selected cells, leaving unselected
//! cells in that block empty. Paste parses TSV, coerces every field through
//! the target column's variant and writes the accepted values in one update
//! batch. Cut only marks cells; they are cleared by the paste that consumes
//! the mark, in the same batch as the pasted values.

use rustc_hash::FxHashSet;

use cellgrid_core::{CellKey, CellPosition, Coercion, SelectionState};

use crate::collaborators::CellUpdate;
use crate::error::GridError;
use crate::events::{count_noun, Notice};
use crate::grid::{values_equivalent, GridEngine};
use crate::retry::{retry_until, RetryPolicy};
use crate::store::PasteDialogState;

/// Serialized selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardPayload {
    pub text: String,
    /// Cells that were actually selected, sorted
    pub cells: Vec<CellPosition>,
}

/// Outcome of a paste.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PasteReport {
    pub accepted: usize,
    /// Cells whose text didn't coerce, or whose column is read-only
    pub rejected: usize,
    pub rows_created: usize,
    /// Paused on the row-expansion dialog
    pub awaiting_decision: bool,
}

/// Answer to the row-expansion dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteDecision {
    /// Ask the host for the missing rows, then paste everything
    CreateRows,
    /// Paste only what fits
    FitOnly,
    Cancel,
}

/// Split clipboard text into rows of tab-separated fields. Line endings
/// are normalized and one trailing newline is ignored.
pub fn parse_clipboard_text(text: &str) -> Vec<Vec<String>> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let body = normalized.strip_suffix('\n').unwrap_or(&normalized);
    if body.is_empty() {
        return Vec::new();
    }
    body.split('\n').map(|line| line.split('\t').map(str::to_string).collect()).collect()
}

fn paste_message(accepted: usize, rejected: usize) -> String {
    match (accepted, rejected) {
        (a, 0) => format!("{} pasted", count_noun(a, "cell")),
        (0, r) => format!("{} skipped", count_noun(r, "cell")),
        (a, r) => format!("{} pasted, {} skipped", count_noun(a, "cell"), r),
    }
}

impl GridEngine {
    /// Cells the clipboard operations act on: the selection, else the
    /// focused cell. Only navigable cells on existing rows.
    fn target_cells(&self) -> Vec<CellPosition> {
        let (selected, focus) = self.store.read(|s| (s.selection.positions(), s.focused_cell.clone()));
        let cells = if selected.is_empty() { focus.into_iter().collect() } else { selected };
        let columns = self.navigable_column_ids();
        let row_count = self.row_count();
        cells
            .into_iter()
            .filter(|p| p.row_index < row_count && columns.contains(&p.column_id))
            .collect()
    }

    /// TSV for the current selection. `None` with nothing to copy.
    pub fn serialize_selection(&self) -> Option<ClipboardPayload> {
        let cells = self.target_cells();
        if cells.is_empty() {
            return None;
        }
        let navigable = self.navigable_columns();
        let selected: FxHashSet<CellKey> = cells.iter().map(CellPosition::key).collect();

        let mut rows: Vec<usize> = cells.iter().map(|p| p.row_index).collect();
        rows.sort_unstable();
        rows.dedup();
        let columns: Vec<_> = navigable
            .iter()
            .filter(|c| cells.iter().any(|p| p.column_id == c.id))
            .collect();

        let lines: Vec<String> = rows
            .iter()
            .map(|&row| {
                columns
                    .iter()
                    .map(|column| {
                        if selected.contains(&CellKey::from_parts(row, &column.id)) {
                            column.variant.serialize(&self.model.cell_value(row, &column.id))
                        } else {
                            String::new()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect();

        Some(ClipboardPayload { text: lines.join("\n"), cells })
    }

    /// Copy the selection. Clears cut marks. Returns whether anything was
    /// written to the clipboard.
    pub async fn copy(&self) -> Result<bool, GridError> {
        self.write_clipboard(false).await
    }

    /// Copy the selection and mark it cut.
    pub async fn cut(&self) -> Result<bool, GridError> {
        self.write_clipboard(true).await
    }

    async fn write_clipboard(&self, cut: bool) -> Result<bool, GridError> {
        self.ensure_mounted()?;
        if self.editing().is_some() || (cut && self.settings.read_only) {
            return Ok(false);
        }
        let Some(payload) = self.serialize_selection() else {
            return Ok(false);
        };

        if let Err(e) = self.clipboard.write_text(payload.text).await {
            log::warn!("clipboard write failed: {}", e);
            self.notify(Notice::error(format!("Failed to copy to clipboard: {}", e)));
            return Ok(false);
        }
        if !self.is_mounted() {
            return Ok(false);
        }

        let count = payload.cells.len();
        let marks: FxHashSet<CellKey> = if cut {
            payload.cells.iter().map(CellPosition::key).collect()
        } else {
            FxHashSet::default()
        };
        self.store.set(|s| &mut s.cut_cells, marks);
        let verb = if cut { "cut" } else { "copied" };
        self.notify(Notice::success(format!("{} {}", count_noun(count, "cell"), verb)));
        Ok(true)
    }

    /// Read the clipboard and paste at the focused cell.
    pub async fn paste(&self) -> Result<PasteReport, GridError> {
        self.ensure_mounted()?;
        if self.settings.read_only || self.editing().is_some() || self.paste_dialog_open() {
            return Ok(PasteReport::default());
        }
        let Some(origin) = self.focused() else {
            return Ok(PasteReport::default());
        };

        let text = match self.clipboard.read_text().await {
            Ok(text) => text,
            Err(crate::error::ClipboardError::Empty) => {
                self.notify(Notice::info("Clipboard is empty"));
                return Ok(PasteReport::default());
            }
            Err(e) => {
                log::warn!("clipboard read failed: {}", e);
                self.notify(Notice::error(format!("Failed to read clipboard: {}", e)));
                return Ok(PasteReport::default());
            }
        };
        if !self.is_mounted() || !self.is_focused(&origin) {
            log::debug!("focus moved during clipboard read, dropping paste");
            return Ok(PasteReport::default());
        }
        self.paste_at(origin, text, None).await
    }

    /// Paste `text` at the focused cell without touching the OS clipboard.
    pub async fn paste_text(&self, text: &str) -> Result<PasteReport, GridError> {
        self.ensure_mounted()?;
        if self.settings.read_only || self.editing().is_some() || self.paste_dialog_open() {
            return Ok(PasteReport::default());
        }
        let Some(origin) = self.focused() else {
            return Ok(PasteReport::default());
        };
        self.paste_at(origin, text.to_string(), None).await
    }

    /// Answer the row-expansion dialog and finish the paste it paused.
    pub async fn resolve_paste_dialog(&self, decision: PasteDecision) -> Result<PasteReport, GridError> {
        self.ensure_mounted()?;
        let dialog = self.store.read(|s| s.paste_dialog.clone());
        if !dialog.open {
            return Ok(PasteReport::default());
        }
        self.store.set(|s| &mut s.paste_dialog, PasteDialogState::default());
        if decision == PasteDecision::Cancel {
            return Ok(PasteReport::default());
        }
        let Some(origin) = dialog.origin else {
            return Ok(PasteReport::default());
        };
        self.paste_at(origin, dialog.clipboard_text, Some(decision)).await
    }

    pub(crate) fn paste_dialog_open(&self) -> bool {
        self.store.read(|s| s.paste_dialog.open)
    }

    async fn paste_at(
        &self,
        origin: CellPosition,
        text: String,
        decision: Option<PasteDecision>,
    ) -> Result<PasteReport, GridError> {
        let grid = parse_clipboard_text(&text);
        if grid.is_empty() {
            return Ok(PasteReport::default());
        }

        let row_count = self.row_count();
        let needed = origin.row_index + grid.len();
        let mut rows_created = 0;
        if needed > row_count && self.hooks.rows_add.is_some() {
            let missing = needed - row_count;
            match decision {
                None => {
                    self.store.set(
                        |s| &mut s.paste_dialog,
                        PasteDialogState {
                            open: true,
                            rows_needed: missing,
                            clipboard_text: text,
                            origin: Some(origin),
                        },
                    );
                    return Ok(PasteReport { awaiting_decision: true, ..PasteReport::default() });
                }
                Some(PasteDecision::CreateRows) => {
                    let focus = self.focused();
                    rows_created = self.create_rows(missing, needed).await;
                    if !self.is_mounted() || self.focused() != focus {
                        log::debug!("focus moved during row creation, dropping paste");
                        return Ok(PasteReport { rows_created, ..PasteReport::default() });
                    }
                }
                Some(_) => {}
            }
        }

        let mut report = self.apply_paste(&origin, &grid);
        report.rows_created = rows_created;
        Ok(report)
    }

    /// Ask the host for `count` rows and wait until the row model has
    /// `expected` rows. Returns how many rows actually appeared.
    pub(crate) async fn create_rows(&self, count: usize, expected: usize) -> usize {
        let Some(rows_add) = self.hooks.rows_add.as_ref() else {
            return 0;
        };
        let before = self.row_count();
        if let Err(e) = rows_add(count).await {
            log::warn!("rows_add hook failed: {}", e);
            self.notify(Notice::error(format!("Failed to add rows: {}", e)));
            return 0;
        }
        let policy = RetryPolicy::new(self.settings.rows.max_create_attempts, self.settings.rows.retry_interval_ms);
        if !retry_until(policy, || self.row_count() >= expected).await.is_ready() {
            log::warn!("expected {} rows after rows_add, have {}", expected, self.row_count());
        }
        self.row_count().saturating_sub(before)
    }

    /// Coerce and write a parsed TSV block anchored at `origin`.
    fn apply_paste(&self, origin: &CellPosition, grid: &[Vec<String>]) -> PasteReport {
        let navigable = self.navigable_columns();
        let Some(origin_col) = navigable.iter().position(|c| c.id == origin.column_id) else {
            return PasteReport::default();
        };
        let row_count = self.row_count();
        let cx = self.coercion_context();

        let mut updates = Vec::new();
        let mut written: FxHashSet<CellKey> = FxHashSet::default();
        let mut report = PasteReport::default();
        let mut last_row = origin.row_index;
        let mut last_col = origin_col;

        for (dr, fields) in grid.iter().enumerate() {
            let row = origin.row_index + dr;
            if row >= row_count {
                break;
            }
            for (dc, field) in fields.iter().enumerate() {
                let Some(column) = navigable.get(origin_col + dc) else {
                    break;
                };
                if !self.is_column_writable(column) {
                    report.rejected += 1;
                    continue;
                }
                match column.variant.coerce_paste(field, &cx) {
                    Coercion::Accepted(value) => {
                        report.accepted += 1;
                        last_row = last_row.max(row);
                        last_col = last_col.max(origin_col + dc);
                        written.insert(CellKey::from_parts(row, &column.id));
                        if !values_equivalent(&value, &self.model.cell_value(row, &column.id)) {
                            updates.push(CellUpdate::new(row, column.id.clone(), value));
                        }
                    }
                    Coercion::Rejected => report.rejected += 1,
                }
            }
        }

        if report.accepted == 0 {
            if report.rejected > 0 {
                self.notify(Notice::error(paste_message(0, report.rejected)));
            }
            return report;
        }

        // Cut sources are cleared in the same batch, unless just overwritten
        let cut = self.store.read(|s| s.cut_cells.clone());
        let mut cut_positions: Vec<CellPosition> = cut.iter().map(CellKey::position).collect();
        cut_positions.sort();
        for pos in cut_positions {
            if written.contains(&pos.key()) || pos.row_index >= row_count {
                continue;
            }
            let Some(column) = navigable.iter().find(|c| c.id == pos.column_id) else {
                continue;
            };
            if !self.is_column_writable(column) {
                continue;
            }
            let empty = column.variant.empty_value();
            if !values_equivalent(&empty, &self.cell_value(&pos)) {
                updates.push(CellUpdate::new(pos.row_index, pos.column_id.clone(), empty));
            }
        }

        log::info!(
            "pasted {} cell(s) at {} ({} skipped, {} update(s))",
            report.accepted,
            origin,
            report.rejected,
            updates.len()
        );
        self.emit(updates);

        let columns: Vec<String> = navigable.iter().map(|c| c.id.clone()).collect();
        let end = CellPosition::new(last_row, columns[last_col].clone());
        let selection = SelectionState::rectangle(origin.clone(), end, &columns, false).unwrap_or_default();
        self.store.batch(|| {
            self.store.set(|s| &mut s.selection, selection);
            self.store.set(|s| &mut s.cut_cells, FxHashSet::default());
        });
        self.notify(Notice::success(paste_message(report.accepted, report.rejected)));
        report
    }

    /// Delete/Backspace: reset the target cells to their empty values.
    pub fn clear_selected_cells(&self) -> Result<usize, GridError> {
        self.ensure_mounted()?;
        if self.settings.read_only || self.editing().is_some() {
            return Ok(0);
        }
        let cells = self.target_cells();
        let mut updates = Vec::new();
        for pos in &cells {
            let Some(column) = self.column(&pos.column_id) else {
                continue;
            };
            if !self.is_column_writable(&column) {
                continue;
            }
            let empty = column.variant.empty_value();
            if !values_equivalent(&empty, &self.cell_value(pos)) {
                updates.push(CellUpdate::new(pos.row_index, pos.column_id.clone(), empty));
            }
        }
        let cleared = updates.len();
        self.emit(updates);
        Ok(cleared)
    }
}
