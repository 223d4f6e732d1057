//! The grid engine: one instance per mounted grid.
//!
//! `GridEngine` owns the interaction state store and the viewport
//! coordinator, and holds the host's collaborators. The behavior lives in
//! sibling modules (`navigation`, `clipboard`, `editing`, `search`, `rows`,
//! `keys`) as further `impl GridEngine` blocks.
//!
//! The engine is single-threaded and shared as `Rc<GridEngine>`. Async
//! operations take `&self` and never hold a `RefCell` borrow across an
//! `.await`; anything read before a suspension point is re-validated after.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rustc_hash::FxHashSet;

use cellgrid_config::GridSettings;
use cellgrid_core::{CellPosition, CellValue, CoercionContext, ColumnDescriptor};

use crate::collaborators::{CellUpdate, ClipboardProvider, GridHooks, MemoryClipboard, RowModel, UpdateSink};
use crate::editing::EditSession;
use crate::error::GridError;
use crate::events::{LogNotifier, Notice, Notifier};
use crate::retry::RetryPolicy;
use crate::store::{StateReader, Store};
use crate::viewport::{FocusOutcome, ViewportCoordinator, ViewportHost};

pub struct GridEngine {
    pub(crate) store: Store,
    pub(crate) settings: GridSettings,
    pub(crate) model: Rc<dyn RowModel>,
    pub(crate) sink: Rc<dyn UpdateSink>,
    pub(crate) clipboard: Rc<dyn ClipboardProvider>,
    pub(crate) notifier: Rc<dyn Notifier>,
    pub(crate) viewport: ViewportCoordinator,
    pub(crate) hooks: GridHooks,
    /// Draft of the open editor, if any
    pub(crate) edit: RefCell<Option<EditSession>>,
    pub(crate) edit_generation: Cell<u64>,
    pub(crate) search_generation: Cell<u64>,
    /// Ids of placeholder files whose upload is in flight
    pub(crate) uploading: RefCell<FxHashSet<String>>,
    mounted: Cell<bool>,
}

// ============================================================================
// Builder
// ============================================================================

pub struct GridEngineBuilder {
    model: Rc<dyn RowModel>,
    sink: Rc<dyn UpdateSink>,
    clipboard: Option<Rc<dyn ClipboardProvider>>,
    notifier: Option<Rc<dyn Notifier>>,
    viewport_host: Option<Rc<dyn ViewportHost>>,
    hooks: GridHooks,
    settings: GridSettings,
}

impl GridEngineBuilder {
    pub fn new(model: Rc<dyn RowModel>, sink: Rc<dyn UpdateSink>) -> Self {
        Self {
            model,
            sink,
            clipboard: None,
            notifier: None,
            viewport_host: None,
            hooks: GridHooks::default(),
            settings: GridSettings::default(),
        }
    }

    /// Defaults to an in-process `MemoryClipboard`.
    pub fn clipboard(mut self, clipboard: Rc<dyn ClipboardProvider>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    /// Defaults to `LogNotifier`.
    pub fn notifier(mut self, notifier: Rc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Enables virtualization. Without a host every row counts as rendered.
    pub fn viewport_host(mut self, host: Rc<dyn ViewportHost>) -> Self {
        self.viewport_host = Some(host);
        self
    }

    pub fn hooks(mut self, hooks: GridHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn settings(mut self, settings: GridSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> Result<Rc<GridEngine>, GridError> {
        let mut seen = FxHashSet::default();
        for column in self.model.columns() {
            if !seen.insert(column.id.clone()) {
                return Err(GridError::DuplicateColumn(column.id));
            }
        }

        let settings = self.settings.sanitized();
        let policy = RetryPolicy::new(settings.viewport.max_focus_attempts, settings.viewport.retry_interval_ms);
        log::debug!(
            "mounting grid: {} columns, {} rows, virtualized={}",
            seen.len(),
            self.model.row_count(),
            self.viewport_host.is_some()
        );

        Ok(Rc::new(GridEngine {
            store: Store::new(),
            viewport: ViewportCoordinator::new(self.viewport_host, policy),
            model: self.model,
            sink: self.sink,
            clipboard: self.clipboard.unwrap_or_else(|| Rc::new(MemoryClipboard::new())),
            notifier: self.notifier.unwrap_or_else(|| Rc::new(LogNotifier)),
            hooks: self.hooks,
            settings,
            edit: RefCell::new(None),
            edit_generation: Cell::new(0),
            search_generation: Cell::new(0),
            uploading: RefCell::new(FxHashSet::default()),
            mounted: Cell::new(true),
        }))
    }
}

// ============================================================================
// Lifecycle and shared helpers
// ============================================================================

impl GridEngine {
    pub fn builder(model: Rc<dyn RowModel>, sink: Rc<dyn UpdateSink>) -> GridEngineBuilder {
        GridEngineBuilder::new(model, sink)
    }

    /// Read-only access to interaction state.
    pub fn state(&self) -> StateReader<'_> {
        StateReader::new(&self.store)
    }

    /// Deliver pending state notifications. Hosts call this once per
    /// event-loop turn.
    pub fn flush_notifications(&self) -> bool {
        self.store.flush()
    }

    pub fn viewport(&self) -> &ViewportCoordinator {
        &self.viewport
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    pub fn is_read_only(&self) -> bool {
        self.settings.read_only
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    /// Tear down: drop listeners, the open editor and viewport handles.
    /// In-flight async work sees the engine unmounted and abandons itself.
    pub fn unmount(&self) {
        if !self.mounted.replace(false) {
            return;
        }
        self.edit.borrow_mut().take();
        self.bump_generation(&self.edit_generation);
        self.bump_generation(&self.search_generation);
        self.uploading.borrow_mut().clear();
        self.viewport.clear();
        self.store.reset();
        log::debug!("grid unmounted");
    }

    pub(crate) fn ensure_mounted(&self) -> Result<(), GridError> {
        if self.mounted.get() {
            Ok(())
        } else {
            Err(GridError::Unmounted)
        }
    }

    pub(crate) fn bump_generation(&self, counter: &Cell<u64>) -> u64 {
        let next = counter.get().wrapping_add(1);
        counter.set(next);
        next
    }

    pub(crate) fn columns(&self) -> Vec<ColumnDescriptor> {
        self.model.columns()
    }

    pub(crate) fn navigable_columns(&self) -> Vec<ColumnDescriptor> {
        self.model.columns().into_iter().filter(|c| c.navigable).collect()
    }

    /// Ids of keyboard-reachable columns, in display order.
    pub fn navigable_column_ids(&self) -> Vec<String> {
        cellgrid_core::navigable_ids(&self.model.columns())
    }

    pub(crate) fn column(&self, column_id: &str) -> Option<ColumnDescriptor> {
        self.model.columns().into_iter().find(|c| c.id == column_id)
    }

    pub(crate) fn row_count(&self) -> usize {
        self.model.row_count()
    }

    pub(crate) fn cell_value(&self, position: &CellPosition) -> CellValue {
        self.model.cell_value(position.row_index, &position.column_id)
    }

    /// Resolve a host-supplied position to its column, rejecting unknown
    /// columns and rows past the end.
    pub(crate) fn validate_position(&self, position: &CellPosition) -> Result<ColumnDescriptor, GridError> {
        let column = self
            .column(&position.column_id)
            .ok_or_else(|| GridError::UnknownColumn(position.column_id.clone()))?;
        let row_count = self.row_count();
        if position.row_index >= row_count {
            return Err(GridError::RowOutOfRange { row: position.row_index, row_count });
        }
        Ok(column)
    }

    pub(crate) fn is_column_writable(&self, column: &ColumnDescriptor) -> bool {
        !self.settings.read_only && !column.read_only
    }

    pub(crate) fn coercion_context(&self) -> CoercionContext<'_> {
        CoercionContext { date_display_format: &self.settings.clipboard.date_display_format }
    }

    /// Send one batch of writes to the host. Empty batches are dropped.
    pub(crate) fn emit(&self, updates: Vec<CellUpdate>) {
        if updates.is_empty() {
            return;
        }
        log::debug!("emitting {} cell update(s)", updates.len());
        self.sink.on_data_update(updates);
    }

    pub(crate) fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }

    pub(crate) fn focused(&self) -> Option<CellPosition> {
        self.store.read(|s| s.focused_cell.clone())
    }

    pub(crate) fn editing(&self) -> Option<CellPosition> {
        self.store.read(|s| s.editing_cell.clone())
    }

    pub(crate) fn is_focused(&self, position: &CellPosition) -> bool {
        self.store.read(|s| s.is_focused(position))
    }

    /// Rows jumped by PageUp/PageDown: what's on screen, else the fallback.
    pub(crate) fn page_rows(&self) -> usize {
        self.viewport
            .materialized_count()
            .unwrap_or(self.settings.navigation.fallback_page_rows)
            .max(1)
    }

    /// Move real input focus to the store's focused cell, waiting for the row
    /// to materialize. Abandoned if focus moves on meanwhile.
    pub(crate) async fn sync_dom_focus(&self, position: &CellPosition) -> FocusOutcome {
        self.viewport
            .ensure_focus(position, || self.is_mounted() && self.is_focused(position))
            .await
    }
}

/// Equal values, treating every blank representation of a cell as the same
/// (a missing value and an empty string both render as nothing).
pub(crate) fn values_equivalent(a: &CellValue, b: &CellValue) -> bool {
    a == b || (a.is_blank() && b.is_blank())
}
