//! Interaction engine for editable data grids: focus, selection, editing,
//! clipboard, search and row lifecycle over a host-owned row model.

pub mod clipboard;
pub mod collaborators;
pub mod editing;
pub mod error;
pub mod events;
pub mod files;
pub mod grid;
pub mod keys;
pub mod menu;
pub mod navigation;
pub mod retry;
pub mod rows;
pub mod search;
pub mod store;
pub mod viewport;

#[cfg(test)]
pub mod harness;

pub use clipboard::{parse_clipboard_text, ClipboardPayload, PasteDecision, PasteReport};
pub use collaborators::{
    CellUpdate, ClipboardProvider, FileDeleteRequest, FileUploadRequest, GridHooks, MemoryClipboard,
    PartialCellPosition, PendingFile, RowModel, RowsDeleteRequest, UpdateSink,
};
pub use editing::{EditBuffer, EditExit, EditTrigger};
pub use error::{ClipboardError, GridError, HookError};
pub use events::{LogNotifier, Notice, NoticeCollector, NoticeLevel, Notifier};
pub use grid::{GridEngine, GridEngineBuilder};
pub use keys::{Key, KeyEvent, Modifiers};
pub use menu::ContextAction;
pub use navigation::{resolve_target, NavContext, NavDirection};
pub use retry::{retry_until, RetryOutcome, RetryPolicy};
pub use store::{ContextMenuState, GridState, PasteDialogState, SearchState, StateReader, Subscription};
pub use viewport::{FocusOutcome, RowHandle, ScrollAlign, ViewportCoordinator, ViewportHost};
