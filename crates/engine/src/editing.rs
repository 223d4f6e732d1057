//! Cell editing.
//!
//! An edit session holds a draft for the one cell being edited. Nothing
//! reaches the host until commit, and a commit that leaves the value as it
//! was emits nothing. Checkbox cells have no editor: activating them flips
//! the value immediately.

use cellgrid_core::{CellPosition, CellValue, ColumnDescriptor, EditorKind, SelectionState};

use crate::collaborators::CellUpdate;
use crate::error::GridError;
use crate::events::Notice;
use crate::grid::{values_equivalent, GridEngine};

/// What opened the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTrigger {
    DoubleClick,
    Enter,
    F2,
    Space,
    /// A printable character typed on a focused cell
    Typed(char),
}

/// How the editor was left. Decides where focus goes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditExit {
    /// Commit, move down one row
    Enter,
    /// Commit, move to the next column
    Tab,
    /// Commit, move to the previous column
    ShiftTab,
    /// Discard the draft, stay on the cell
    Escape,
    /// Commit, leave focus alone
    Blur,
}

/// Editor contents.
#[derive(Debug, Clone, PartialEq)]
pub enum EditBuffer {
    /// Raw text from an input; parsed at commit
    Text(String),
    /// A typed value from a popover control
    Value(CellValue),
}

#[derive(Debug, Clone)]
pub struct EditSession {
    pub position: CellPosition,
    pub column: ColumnDescriptor,
    pub original: CellValue,
    pub buffer: EditBuffer,
    /// Distinguishes sessions so async work can tell if its session ended
    pub generation: u64,
}

impl GridEngine {
    /// Cell whose editor is open.
    pub fn editing_cell(&self) -> Option<CellPosition> {
        self.editing()
    }

    pub fn draft(&self) -> Option<EditBuffer> {
        self.edit.borrow().as_ref().map(|s| s.buffer.clone())
    }

    /// Draft as text: the raw input, or the plain form of a typed value.
    pub fn draft_text(&self) -> Option<String> {
        self.edit.borrow().as_ref().map(|s| match &s.buffer {
            EditBuffer::Text(text) => text.clone(),
            EditBuffer::Value(value) => value.to_plain_string(),
        })
    }

    /// Open the editor on a cell. Returns false when the cell can't be
    /// edited (read-only, structural, or a trigger its editor ignores).
    /// For checkbox cells, activation toggles the value instead.
    pub async fn start_editing(&self, position: CellPosition, trigger: EditTrigger) -> Result<bool, GridError> {
        self.ensure_mounted()?;
        let column = self.validate_position(&position)?;
        if !column.navigable || !self.is_column_writable(&column) {
            return Ok(false);
        }
        if let Some(editing) = self.editing() {
            if editing == position {
                return Ok(false);
            }
            self.commit_edit(EditExit::Blur).await?;
        }

        let current = self.cell_value(&position);
        let kind = column.variant.editor();
        let buffer = match (kind, trigger) {
            (EditorKind::Toggle, EditTrigger::DoubleClick | EditTrigger::Enter | EditTrigger::Space) => {
                self.toggle_checkbox(&position, &current);
                self.move_focus(position).await;
                return Ok(true);
            }
            (EditorKind::Toggle, _) => return Ok(false),
            (_, EditTrigger::Typed(c)) if column.variant.seeds_typed_char() => EditBuffer::Text(c.to_string()),
            (_, EditTrigger::Typed(_)) => return Ok(false),
            (EditorKind::Inline, EditTrigger::Space) => EditBuffer::Text(" ".to_string()),
            (EditorKind::Inline, _) => EditBuffer::Text(current.to_plain_string()),
            (EditorKind::Popover, _) if column.variant == cellgrid_core::CellVariant::LongText => {
                EditBuffer::Text(current.to_plain_string())
            }
            (EditorKind::Popover, _) => EditBuffer::Value(current.clone()),
        };

        let generation = self.bump_generation(&self.edit_generation);
        log::debug!("editing {} ({:?}, session {})", position, trigger, generation);
        *self.edit.borrow_mut() = Some(EditSession {
            position: position.clone(),
            column,
            original: current,
            buffer,
            generation,
        });
        self.store.batch(|| {
            self.store.set(|s| &mut s.focused_cell, Some(position.clone()));
            self.store.set(|s| &mut s.editing_cell, Some(position.clone()));
            self.store.set(|s| &mut s.selection, SelectionState::default());
            self.store.set(|s| &mut s.context_menu.open, false);
        });
        self.sync_dom_focus(&position).await;
        Ok(true)
    }

    fn toggle_checkbox(&self, position: &CellPosition, current: &CellValue) {
        let checked = matches!(current, CellValue::Boolean(true));
        self.emit(vec![CellUpdate::new(
            position.row_index,
            position.column_id.clone(),
            CellValue::Boolean(!checked),
        )]);
    }

    /// Replace the draft with a typed value (popover controls).
    pub fn update_draft(&self, value: CellValue) -> bool {
        match self.edit.borrow_mut().as_mut() {
            Some(session) => {
                session.buffer = EditBuffer::Value(value);
                true
            }
            None => false,
        }
    }

    /// Replace the draft with raw input text.
    pub fn update_draft_text(&self, text: impl Into<String>) -> bool {
        match self.edit.borrow_mut().as_mut() {
            Some(session) => {
                session.buffer = EditBuffer::Text(text.into());
                true
            }
            None => false,
        }
    }

    /// Close the editor. Every exit but Escape writes the draft if it differs
    /// from the cell's current value. Returns the focused cell afterwards.
    pub async fn commit_edit(&self, exit: EditExit) -> Result<Option<CellPosition>, GridError> {
        self.ensure_mounted()?;
        let Some(session) = self.edit.borrow_mut().take() else {
            return Ok(None);
        };
        let position = session.position.clone();
        if !self.store.read(|s| s.is_editing(&position)) {
            return Ok(None);
        }

        if exit == EditExit::Escape {
            self.store.set(|s| &mut s.editing_cell, None);
            self.sync_dom_focus(&position).await;
            return Ok(Some(position));
        }

        let variant = &session.column.variant;
        let new_value = match &session.buffer {
            EditBuffer::Text(text) => {
                let parsed = variant.value_from_input(text);
                if parsed.is_none() {
                    self.notify(Notice::error(format!("\"{}\" is not a valid {} value", text.trim(), variant.name())));
                }
                parsed
            }
            EditBuffer::Value(value) => Some(value.clone()),
        };
        let row_count = self.row_count();
        if let Some(value) = new_value {
            if position.row_index < row_count && !values_equivalent(&value, &self.cell_value(&position)) {
                self.emit(vec![CellUpdate::new(position.row_index, position.column_id.clone(), value)]);
            }
        }

        let target = match exit {
            EditExit::Enter if position.row_index + 1 < row_count => {
                CellPosition::new(position.row_index + 1, position.column_id.clone())
            }
            EditExit::Tab | EditExit::ShiftTab => {
                let columns = self.navigable_column_ids();
                let col = columns.iter().position(|c| *c == position.column_id);
                let next = match (col, exit) {
                    (Some(i), EditExit::Tab) => columns.get(i + 1),
                    (Some(i), _) => i.checked_sub(1).and_then(|j| columns.get(j)),
                    (None, _) => None,
                };
                match next {
                    Some(id) => CellPosition::new(position.row_index, id.clone()),
                    None => position.clone(),
                }
            }
            _ => position.clone(),
        };

        if exit == EditExit::Blur {
            self.store.set(|s| &mut s.editing_cell, None);
            return Ok(Some(position));
        }
        self.store.batch(|| {
            self.store.set(|s| &mut s.editing_cell, None);
            self.store.set(|s| &mut s.focused_cell, Some(target.clone()));
        });
        self.sync_dom_focus(&target).await;
        Ok(Some(target))
    }

    /// Escape: discard the draft.
    pub async fn cancel_edit(&self) -> Result<Option<CellPosition>, GridError> {
        self.commit_edit(EditExit::Escape).await
    }

    /// Generation of the open session on `position`, if any.
    pub(crate) fn session_generation(&self, position: &CellPosition) -> Option<u64> {
        self.edit
            .borrow()
            .as_ref()
            .filter(|s| s.position == *position)
            .map(|s| s.generation)
    }

    /// Rewrite the draft of session `generation`, if it is still open.
    pub(crate) fn with_session(&self, generation: u64, f: impl FnOnce(&mut EditSession)) {
        if let Some(session) = self.edit.borrow_mut().as_mut().filter(|s| s.generation == generation) {
            f(session);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{GridFixture, TestGrid};
    use cellgrid_core::{CellVariant, SelectOption};

    fn at(row: usize, col: &str) -> CellPosition {
        CellPosition::new(row, col)
    }

    #[test]
    fn test_unchanged_commit_emits_nothing() {
        let fx = GridFixture::people();
        fx.focus(0, "name");
        fx.key("f2").unwrap();
        assert_eq!(fx.engine.draft_text().as_deref(), Some("Alice"));
        fx.key("enter").unwrap();

        assert!(fx.sink.batches().is_empty());
        assert_eq!(fx.focused(), Some(at(1, "name")));
    }

    #[test]
    fn test_commit_writes_and_moves_down() {
        let fx = GridFixture::people();
        fx.focus(0, "name");
        fx.key("enter").unwrap();
        fx.engine.update_draft_text("Alicia");
        fx.key("enter").unwrap();

        assert_eq!(fx.sink.updates(), vec![CellUpdate::new(0, "name", CellValue::text("Alicia"))]);
        assert_eq!(fx.value(0, "name"), CellValue::text("Alicia"));
        assert_eq!(fx.focused(), Some(at(1, "name")));
        assert!(fx.engine.state().get().is_consistent());
    }

    #[test]
    fn test_enter_on_last_row_stays() {
        let fx = GridFixture::people();
        fx.focus(2, "name");
        fx.key("enter").unwrap();
        fx.key("enter").unwrap();
        assert_eq!(fx.focused(), Some(at(2, "name")));
        assert_eq!(fx.engine.editing_cell(), None);
    }

    #[test]
    fn test_escape_discards_draft() {
        let fx = GridFixture::people();
        fx.focus(1, "name");
        fx.key("Q").unwrap();
        assert_eq!(fx.engine.draft_text().as_deref(), Some("Q"));
        fx.key("escape").unwrap();

        assert!(fx.sink.batches().is_empty());
        assert_eq!(fx.value(1, "name"), CellValue::text("Bob"));
        assert_eq!(fx.focused(), Some(at(1, "name")));
        assert_eq!(fx.engine.editing_cell(), None);
    }

    #[test]
    fn test_tab_commits_and_moves_without_wrap() {
        let fx = GridFixture::people();
        fx.focus(0, "age");
        fx.key("4").unwrap();
        fx.key("tab").unwrap();
        assert_eq!(fx.value(0, "age"), CellValue::number(4.0));
        assert_eq!(fx.focused(), Some(at(0, "email")));

        fx.focus(0, "name");
        fx.key("f2").unwrap();
        fx.key("shift-tab").unwrap();
        assert_eq!(fx.focused(), Some(at(0, "name")));
    }

    #[test]
    fn test_invalid_number_keeps_cell() {
        let fx = GridFixture::people();
        fx.focus(0, "age");
        fx.key("x").unwrap();
        fx.key("enter").unwrap();

        assert!(fx.sink.batches().is_empty());
        assert_eq!(fx.value(0, "age"), CellValue::number(30.0));
        assert_eq!(fx.notices.errors(), vec!["\"x\" is not a valid number value".to_string()]);
        assert_eq!(fx.engine.editing_cell(), None);
    }

    #[test]
    fn test_blur_commits_in_place() {
        let fx = GridFixture::people();
        fx.focus(0, "email");
        fx.key("f2").unwrap();
        fx.engine.update_draft_text("alice@y.org");
        let focus = smol::block_on(fx.engine.commit_edit(EditExit::Blur)).unwrap();

        assert_eq!(focus, Some(at(0, "email")));
        assert_eq!(fx.value(0, "email"), CellValue::text("alice@y.org"));
        assert_eq!(fx.focused(), Some(at(0, "email")));
    }

    #[test]
    fn test_checkbox_toggles_without_editor() {
        let fx = GridFixture::people();
        fx.focus(0, "active");
        assert!(fx.key("space").unwrap());
        assert_eq!(fx.value(0, "active"), CellValue::Boolean(false));
        assert_eq!(fx.engine.editing_cell(), None);

        assert!(fx.key("enter").unwrap());
        assert_eq!(fx.value(0, "active"), CellValue::Boolean(true));
        assert!(!fx.key("x").unwrap());
        assert_eq!(fx.sink.batches().len(), 2);
    }

    #[test]
    fn test_read_only_refuses_edit() {
        let fx = GridFixture::builder().read_only().build();
        fx.focus(0, "name");
        assert!(!fx.key("enter").unwrap());
        assert!(!fx.key("space").unwrap());
        assert_eq!(fx.engine.editing_cell(), None);

        let columns = vec![
            ColumnDescriptor::new("id", CellVariant::ShortText).read_only(),
            ColumnDescriptor::new("note", CellVariant::ShortText),
        ];
        let fx = GridFixture::new(TestGrid::with_rows(columns, vec![vec![("id", CellValue::text("1"))]]));
        fx.focus(0, "id");
        assert!(!fx.key("f2").unwrap());
        fx.focus(0, "note");
        assert!(fx.key("f2").unwrap());
    }

    #[test]
    fn test_popover_value_draft() {
        let columns = vec![
            ColumnDescriptor::new("due", CellVariant::Date),
            ColumnDescriptor::new(
                "status",
                CellVariant::Select { options: vec![SelectOption::plain("open"), SelectOption::plain("done")] },
            ),
            ColumnDescriptor::new("notes", CellVariant::LongText),
        ];
        let fx = GridFixture::new(TestGrid::with_rows(
            columns,
            vec![vec![("status", CellValue::text("open")), ("notes", CellValue::text("hi"))]],
        ));

        fx.focus(0, "due");
        assert!(!fx.key("t").unwrap(), "date cells don't start on typing");
        fx.key("enter").unwrap();
        assert_eq!(fx.engine.draft(), Some(EditBuffer::Value(CellValue::Empty)));
        fx.engine.update_draft(CellValue::Date(Some("2024-06-01".into())));
        smol::block_on(fx.engine.commit_edit(EditExit::Blur)).unwrap();
        assert_eq!(fx.value(0, "due"), CellValue::Date(Some("2024-06-01".into())));

        fx.focus(0, "status");
        fx.key("f2").unwrap();
        fx.engine.update_draft_text("Done");
        smol::block_on(fx.engine.commit_edit(EditExit::Blur)).unwrap();
        assert_eq!(fx.value(0, "status"), CellValue::text("done"));

        fx.focus(0, "notes");
        fx.key("f2").unwrap();
        assert_eq!(fx.engine.draft(), Some(EditBuffer::Text("hi".into())));
    }

    #[test]
    fn test_clicking_another_cell_commits_open_editor() {
        let fx = GridFixture::people();
        fx.focus(0, "name");
        fx.key("f2").unwrap();
        fx.engine.update_draft_text("Ann");
        smol::block_on(fx.engine.on_cell_pointer_down(at(2, "age"), Default::default())).unwrap();

        assert_eq!(fx.value(0, "name"), CellValue::text("Ann"));
        let state = fx.engine.state().get();
        assert_eq!(state.editing_cell, None);
        assert_eq!(state.focused_cell, Some(at(2, "age")));
    }

    #[test]
    fn test_double_click_opens_editor() {
        let fx = GridFixture::people();
        assert!(smol::block_on(fx.engine.on_cell_double_click(at(1, "email"))).unwrap());
        let state = fx.engine.state().get();
        assert_eq!(state.editing_cell, Some(at(1, "email")));
        assert_eq!(state.focused_cell, Some(at(1, "email")));
    }

    #[test]
    fn test_session_generations_are_distinct() {
        let fx = GridFixture::people();
        fx.focus(0, "name");
        fx.key("f2").unwrap();
        let first = fx.engine.session_generation(&at(0, "name")).unwrap();
        fx.key("escape").unwrap();
        fx.key("f2").unwrap();
        let second = fx.engine.session_generation(&at(0, "name")).unwrap();
        assert_ne!(first, second);
        assert_eq!(fx.engine.session_generation(&at(1, "name")), None);
    }
}
