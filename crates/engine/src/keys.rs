//! Keyboard dispatch.
//!
//! Keystrokes arrive as `KeyEvent`s and are routed by priority: an open
//! editor first, then the paste dialog, the search bar and context menu,
//! then Ctrl/Cmd shortcuts, then plain grid keys. Key names follow the keystroke
//! vocabulary hosts already use (`"up"`, `"pagedown"`, `"f2"`,
//! `"ctrl-shift-end"`).

use cellgrid_core::CellPosition;

use crate::clipboard::PasteDecision;
use crate::editing::{EditExit, EditTrigger};
use crate::error::GridError;
use crate::grid::GridEngine;
use crate::navigation::NavDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Enter,
    Tab,
    Escape,
    F2,
    F3,
    Delete,
    Backspace,
    Space,
    Char(char),
}

impl Key {
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name.to_ascii_lowercase().as_str() {
            "up" | "arrowup" => Key::Up,
            "down" | "arrowdown" => Key::Down,
            "left" | "arrowleft" => Key::Left,
            "right" | "arrowright" => Key::Right,
            "home" => Key::Home,
            "end" => Key::End,
            "pageup" => Key::PageUp,
            "pagedown" => Key::PageDown,
            "enter" | "return" => Key::Enter,
            "tab" => Key::Tab,
            "escape" | "esc" => Key::Escape,
            "f2" => Key::F2,
            "f3" => Key::F3,
            "delete" => Key::Delete,
            "backspace" => Key::Backspace,
            "space" | " " => Key::Space,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => return None,
                }
            }
        };
        Some(key)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    /// Cmd on macOS
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on Linux/Windows, Cmd on macOS.
    pub fn primary(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self { key, modifiers: Modifiers::default() }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Parse a keystroke like `"shift-down"`, `"ctrl-c"`, `"cmd-shift-end"`.
    pub fn parse(keystroke: &str) -> Option<Self> {
        let mut modifiers = Modifiers::default();
        let mut rest = keystroke;
        while let Some((prefix, tail)) = rest.split_once('-') {
            if tail.is_empty() {
                break;
            }
            match prefix.to_ascii_lowercase().as_str() {
                "shift" => modifiers.shift = true,
                "ctrl" => modifiers.ctrl = true,
                "alt" => modifiers.alt = true,
                "cmd" | "meta" => modifiers.meta = true,
                _ => break,
            }
            rest = tail;
        }
        Some(Self { key: Key::from_name(rest)?, modifiers })
    }
}

fn arrow_direction(key: Key) -> Option<NavDirection> {
    match key {
        Key::Up => Some(NavDirection::Up),
        Key::Down => Some(NavDirection::Down),
        Key::Left => Some(NavDirection::Left),
        Key::Right => Some(NavDirection::Right),
        _ => None,
    }
}

impl GridEngine {
    /// Route one keystroke. Returns whether the engine handled it; unhandled
    /// keys belong to the host (or the open editor's input).
    pub async fn handle_key_event(&self, event: &KeyEvent) -> Result<bool, GridError> {
        self.ensure_mounted()?;
        let m = event.modifiers;
        let (editing, search_open, menu_open, focus) = self.store.read(|s| {
            (s.editing_cell.is_some(), s.search.open, s.context_menu.open, s.focused_cell.clone())
        });

        if editing {
            return self.handle_editor_key(event).await;
        }

        // The row-expansion dialog is modal
        if self.paste_dialog_open() {
            if event.key == Key::Escape {
                self.resolve_paste_dialog(PasteDecision::Cancel).await?;
                return Ok(true);
            }
            return Ok(false);
        }

        if event.key == Key::Escape {
            if menu_open {
                self.close_context_menu()?;
            } else if search_open {
                self.close_search()?;
            } else {
                self.store.batch(|| -> Result<(), GridError> {
                    self.clear_selection()?;
                    self.clear_row_selection()
                })?;
            }
            return Ok(true);
        }

        if m.primary() {
            return self.handle_shortcut(event).await;
        }
        if event.key == Key::F3 {
            if m.shift {
                self.previous_match().await?;
            } else {
                self.next_match().await?;
            }
            return Ok(true);
        }

        let Some(focus) = focus else {
            return Ok(false);
        };

        match event.key {
            Key::Up | Key::Down | Key::Left | Key::Right => {
                let Some(direction) = arrow_direction(event.key) else {
                    return Ok(false);
                };
                if m.shift {
                    self.extend_selection(direction)?;
                } else {
                    self.navigate(direction).await?;
                }
            }
            Key::Home | Key::End => {
                let direction = if event.key == Key::Home { NavDirection::Home } else { NavDirection::End };
                if m.shift {
                    self.extend_selection(direction)?;
                } else {
                    self.navigate(direction).await?;
                }
            }
            Key::PageUp | Key::PageDown => {
                let direction = match (event.key, m.alt) {
                    (Key::PageUp, true) => NavDirection::PageLeft,
                    (_, true) => NavDirection::PageRight,
                    (Key::PageUp, false) => NavDirection::PageUp,
                    (_, false) => NavDirection::PageDown,
                };
                if m.shift {
                    self.extend_selection(direction)?;
                } else {
                    self.navigate(direction).await?;
                }
            }
            Key::Tab => {
                self.step_column(&focus, !m.shift).await;
            }
            Key::Enter if !m.alt => {
                return self.start_editing(focus, EditTrigger::Enter).await;
            }
            Key::F2 => {
                return self.start_editing(focus, EditTrigger::F2).await;
            }
            Key::Space => {
                return self.start_editing(focus, EditTrigger::Space).await;
            }
            Key::Delete | Key::Backspace => {
                self.clear_selected_cells()?;
            }
            Key::Char(c) if !m.alt && !c.is_control() => {
                return self.start_editing(focus, EditTrigger::Typed(c)).await;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Keys routed to the search bar's input.
    pub async fn handle_search_key(&self, event: &KeyEvent) -> Result<bool, GridError> {
        self.ensure_mounted()?;
        match event.key {
            Key::Enter | Key::F3 if event.modifiers.shift => {
                self.previous_match().await?;
            }
            Key::Enter | Key::F3 => {
                self.next_match().await?;
            }
            Key::Escape => {
                self.close_search()?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    async fn handle_editor_key(&self, event: &KeyEvent) -> Result<bool, GridError> {
        let m = event.modifiers;
        let exit = match event.key {
            Key::Escape => EditExit::Escape,
            // Shift+Enter is a newline inside the editor
            Key::Enter if !m.shift && !m.alt => EditExit::Enter,
            Key::Tab if m.shift => EditExit::ShiftTab,
            Key::Tab => EditExit::Tab,
            _ => return Ok(false),
        };
        self.commit_edit(exit).await?;
        Ok(true)
    }

    async fn handle_shortcut(&self, event: &KeyEvent) -> Result<bool, GridError> {
        let m = event.modifiers;
        match event.key {
            Key::Char(c) => match c.to_ascii_lowercase() {
                'c' => {
                    self.copy().await?;
                }
                'x' => {
                    self.cut().await?;
                }
                'v' => {
                    self.paste().await?;
                }
                'a' => {
                    self.select_all()?;
                }
                'f' => {
                    self.open_search()?;
                }
                _ => return Ok(false),
            },
            Key::Up | Key::Down | Key::Left | Key::Right | Key::Home | Key::End => {
                let direction = match event.key {
                    Key::Home => NavDirection::Home,
                    Key::End => NavDirection::End,
                    key => match arrow_direction(key) {
                        Some(d) => d,
                        None => return Ok(false),
                    },
                };
                let edge = direction.to_edge(self.settings.navigation.text_direction);
                if m.shift {
                    self.extend_selection(edge)?;
                } else {
                    self.navigate(edge).await?;
                }
            }
            Key::Delete | Key::Backspace => {
                self.delete_selected_rows().await?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Tab/Shift+Tab: next or previous navigable column in display order,
    /// regardless of text direction. No wrap.
    async fn step_column(&self, from: &CellPosition, forward: bool) {
        let columns = self.navigable_column_ids();
        let Some(col) = columns.iter().position(|c| *c == from.column_id) else {
            return;
        };
        let next = if forward { col + 1 } else { col.wrapping_sub(1) };
        if let Some(column_id) = columns.get(next) {
            self.move_focus(CellPosition::new(from.row_index, column_id.clone())).await;
        }
    }
}
