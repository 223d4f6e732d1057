//! Host-provided collaborators.
//!
//! The engine never owns row data. It reads through a `RowModel`, writes
//! through an `UpdateSink`, and asks optional hooks to create rows, delete
//! rows, upload files and delete files. Every async collaborator returns a
//! local boxed future; the engine is single-threaded.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use serde::Serialize;
use smol::future::BoxedLocal;

use cellgrid_core::{CellValue, ColumnDescriptor, FileDescriptor};

use crate::error::{ClipboardError, HookError};

// ============================================================================
// Row model and update sink
// ============================================================================

/// Read access to the host's rows, in visual order (after sort/filter).
pub trait RowModel {
    fn row_count(&self) -> usize;
    /// Columns in display order
    fn columns(&self) -> Vec<ColumnDescriptor>;
    /// Stable id of the row at a visual index, if the host has one
    fn row_id(&self, row_index: usize) -> Option<String>;
    /// Value of one cell. Missing cells are `CellValue::Empty`.
    fn cell_value(&self, row_index: usize, column_id: &str) -> CellValue;
}

/// One cell write. Serializes as `{rowIndex, columnId, value}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellUpdate {
    pub row_index: usize,
    pub column_id: String,
    pub value: CellValue,
}

impl CellUpdate {
    pub fn new(row_index: usize, column_id: impl Into<String>, value: CellValue) -> Self {
        Self { row_index, column_id: column_id.into(), value }
    }
}

/// Receives cell writes. Each call is one logical batch the host should
/// apply atomically.
pub trait UpdateSink {
    fn on_data_update(&self, updates: Vec<CellUpdate>);
}

// ============================================================================
// Clipboard
// ============================================================================

/// Plain-text access to the OS clipboard.
pub trait ClipboardProvider {
    fn read_text(&self) -> BoxedLocal<Result<String, ClipboardError>>;
    fn write_text(&self, text: String) -> BoxedLocal<Result<(), ClipboardError>>;
}

/// In-process clipboard for headless hosts. Clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    text: Rc<RefCell<Option<String>>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.text.borrow().clone()
    }

    pub fn set_contents(&self, text: impl Into<String>) {
        *self.text.borrow_mut() = Some(text.into());
    }
}

impl ClipboardProvider for MemoryClipboard {
    fn read_text(&self) -> BoxedLocal<Result<String, ClipboardError>> {
        let result = self.text.borrow().clone().ok_or(ClipboardError::Empty);
        Box::pin(async move { result })
    }

    fn write_text(&self, text: String) -> BoxedLocal<Result<(), ClipboardError>> {
        *self.text.borrow_mut() = Some(text);
        Box::pin(async { Ok(()) })
    }
}

// ============================================================================
// Hook payloads
// ============================================================================

/// Where to put focus after `row_add`. Missing parts default to the first
/// new row and the first navigable column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialCellPosition {
    pub row_index: Option<usize>,
    pub column_id: Option<String>,
}

/// A file the user dropped or picked, not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl PendingFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUploadRequest {
    pub files: Vec<PendingFile>,
    pub row_index: usize,
    pub column_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDeleteRequest {
    pub file_ids: Vec<String>,
    pub row_index: usize,
    pub column_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowsDeleteRequest {
    /// Visual indices, ascending
    pub indices: Vec<usize>,
    /// Host ids of those rows, where known
    pub row_ids: Vec<String>,
}

// ============================================================================
// Hooks
// ============================================================================

pub type RowAddHook = Box<dyn Fn() -> BoxedLocal<Result<Option<PartialCellPosition>, HookError>>>;
pub type RowsAddHook = Box<dyn Fn(usize) -> BoxedLocal<Result<(), HookError>>>;
pub type RowsDeleteHook = Box<dyn Fn(RowsDeleteRequest) -> BoxedLocal<Result<(), HookError>>>;
pub type FilesUploadHook =
    Box<dyn Fn(FileUploadRequest) -> BoxedLocal<Result<Vec<FileDescriptor>, HookError>>>;
pub type FilesDeleteHook = Box<dyn Fn(FileDeleteRequest) -> BoxedLocal<Result<(), HookError>>>;

/// Optional mutation hooks. A missing hook disables the feature: no
/// add-row, no paste row expansion, no row deletion, no uploads.
#[derive(Default)]
pub struct GridHooks {
    pub row_add: Option<RowAddHook>,
    pub rows_add: Option<RowsAddHook>,
    pub rows_delete: Option<RowsDeleteHook>,
    pub files_upload: Option<FilesUploadHook>,
    pub files_delete: Option<FilesDeleteHook>,
}

impl GridHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_row_add<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<Option<PartialCellPosition>, HookError>> + 'static,
    {
        self.row_add = Some(Box::new(move || -> BoxedLocal<_> { Box::pin(f()) }));
        self
    }

    pub fn on_rows_add<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(usize) -> Fut + 'static,
        Fut: Future<Output = Result<(), HookError>> + 'static,
    {
        self.rows_add = Some(Box::new(move |count| -> BoxedLocal<_> { Box::pin(f(count)) }));
        self
    }

    pub fn on_rows_delete<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(RowsDeleteRequest) -> Fut + 'static,
        Fut: Future<Output = Result<(), HookError>> + 'static,
    {
        self.rows_delete = Some(Box::new(move |request| -> BoxedLocal<_> { Box::pin(f(request)) }));
        self
    }

    pub fn on_files_upload<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(FileUploadRequest) -> Fut + 'static,
        Fut: Future<Output = Result<Vec<FileDescriptor>, HookError>> + 'static,
    {
        self.files_upload = Some(Box::new(move |request| -> BoxedLocal<_> { Box::pin(f(request)) }));
        self
    }

    pub fn on_files_delete<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(FileDeleteRequest) -> Fut + 'static,
        Fut: Future<Output = Result<(), HookError>> + 'static,
    {
        self.files_delete = Some(Box::new(move |request| -> BoxedLocal<_> { Box::pin(f(request)) }));
        self
    }
}

impl std::fmt::Debug for GridHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridHooks")
            .field("row_add", &self.row_add.is_some())
            .field("rows_add", &self.rows_add.is_some())
            .field("rows_delete", &self.rows_delete.is_some())
            .field("files_upload", &self.files_upload.is_some())
            .field("files_delete", &self.files_delete.is_some())
            .finish()
    }
}
