//! Cell context menu.

use cellgrid_core::CellPosition;

use crate::error::GridError;
use crate::grid::GridEngine;
use crate::store::ContextMenuState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextAction {
    Copy,
    Cut,
    Paste,
    /// Clear the selected cells
    Clear,
    DeleteRows,
}

impl GridEngine {
    /// Open the menu at `(x, y)` for a cell. A cell outside the current
    /// selection takes focus first, so actions apply to it.
    pub async fn open_context_menu(&self, position: CellPosition, x: f32, y: f32) -> Result<(), GridError> {
        self.ensure_mounted()?;
        let column = self.validate_position(&position)?;
        let in_selection = self.store.read(|s| s.selection.contains(&position) || s.is_focused(&position));
        if column.navigable && !in_selection {
            self.focus_cell(position.clone()).await?;
            if !self.is_mounted() || !self.is_focused(&position) {
                return Ok(());
            }
        }
        self.store.set(|s| &mut s.context_menu, ContextMenuState { open: true, x, y, target: Some(position) });
        Ok(())
    }

    pub fn close_context_menu(&self) -> Result<(), GridError> {
        self.ensure_mounted()?;
        self.store.set(|s| &mut s.context_menu, ContextMenuState::default());
        Ok(())
    }

    /// Actions the menu should offer right now.
    pub fn context_actions(&self) -> Vec<ContextAction> {
        let mut actions = vec![ContextAction::Copy];
        if !self.settings.read_only {
            actions.extend([ContextAction::Cut, ContextAction::Paste, ContextAction::Clear]);
            if self.hooks.rows_delete.is_some() {
                actions.push(ContextAction::DeleteRows);
            }
        }
        actions
    }

    /// Close the menu and run one of its actions. Returns whether the
    /// action did anything.
    pub async fn run_context_action(&self, action: ContextAction) -> Result<bool, GridError> {
        self.close_context_menu()?;
        log::debug!("context action {:?}", action);
        match action {
            ContextAction::Copy => self.copy().await,
            ContextAction::Cut => self.cut().await,
            ContextAction::Paste => {
                let report = self.paste().await?;
                Ok(report.accepted > 0 || report.awaiting_decision)
            }
            ContextAction::Clear => Ok(self.clear_selected_cells()? > 0),
            ContextAction::DeleteRows => self.delete_selected_rows().await,
        }
    }
}
