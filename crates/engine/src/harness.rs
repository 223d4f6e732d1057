//! Test harness for engine operations without a rendering host.
//!
//! This module provides `GridFixture`, a mounted `GridEngine` wired to:
//! - `TestGrid`, an in-memory row model
//! - `RecordingSink`, which records every update batch and applies it back
//!   to the grid the way a host would
//! - `MemoryClipboard` and `NoticeCollector`
//! - optionally `FakeViewport`, a virtualized host that materializes rows
//!   on request
//!
//! Retry intervals are 1ms and the search debounce is off, so async
//! operations finish immediately under `smol::block_on`.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use smol::future::BoxedLocal;

use cellgrid_config::{GridSettings, TextDirection};
use cellgrid_core::{CellPosition, CellValue, CellVariant, ColumnDescriptor};

use crate::collaborators::{CellUpdate, ClipboardProvider, GridHooks, MemoryClipboard, RowModel, UpdateSink};
use crate::error::{ClipboardError, GridError};
use crate::events::NoticeCollector;
use crate::grid::GridEngine;
use crate::keys::KeyEvent;
use crate::viewport::{RowHandle, ScrollAlign, ViewportHost};

// ============================================================================
// Row model
// ============================================================================

struct TestRow {
    id: String,
    values: FxHashMap<String, CellValue>,
}

/// In-memory rows. Missing values read as `CellValue::Empty`.
pub struct TestGrid {
    columns: Vec<ColumnDescriptor>,
    rows: RefCell<Vec<TestRow>>,
    next_id: Cell<usize>,
}

impl TestGrid {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self { columns, rows: RefCell::new(Vec::new()), next_id: Cell::new(0) }
    }

    pub fn with_rows(columns: Vec<ColumnDescriptor>, rows: Vec<Vec<(&str, CellValue)>>) -> Self {
        let grid = Self::new(columns);
        for values in rows {
            let row = grid.new_row(values.into_iter().map(|(k, v)| (k.to_string(), v)).collect());
            grid.rows.borrow_mut().push(row);
        }
        grid
    }

    /// select (structural checkbox), name, age, email, active
    pub fn people_columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("select", CellVariant::Checkbox).structural(),
            ColumnDescriptor::new("name", CellVariant::ShortText),
            ColumnDescriptor::new("age", CellVariant::Number),
            ColumnDescriptor::new("email", CellVariant::ShortText),
            ColumnDescriptor::new("active", CellVariant::Checkbox),
        ]
    }

    pub fn people() -> Self {
        Self::with_rows(
            Self::people_columns(),
            vec![
                person("Alice", 30.0, "a@x.com", true),
                person("Bob", 25.0, "bob@x.com", false),
                person("Carol", 41.0, "alice@x.com", true),
            ],
        )
    }

    /// `count` generated people: "Person 0", "Person 1", ...
    pub fn generated(count: usize) -> Self {
        let grid = Self::new(Self::people_columns());
        grid.push_rows(count);
        grid
    }

    fn new_row(&self, values: FxHashMap<String, CellValue>) -> TestRow {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        TestRow { id: format!("row-{}", id), values }
    }

    fn generated_values(i: usize) -> FxHashMap<String, CellValue> {
        person(&format!("Person {}", i), 20.0 + i as f64, &format!("person{}@x.com", i), i % 2 == 0)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.borrow().len()
    }

    pub fn set(&self, row: usize, column_id: &str, value: CellValue) {
        if let Some(row) = self.rows.borrow_mut().get_mut(row) {
            row.values.insert(column_id.to_string(), value);
        }
    }

    /// Append generated rows, as a host's `rows_add` would.
    pub fn push_rows(&self, count: usize) {
        for _ in 0..count {
            let i = self.row_count();
            let row = self.new_row(Self::generated_values(i));
            self.rows.borrow_mut().push(row);
        }
    }

    /// Insert one blank row at `index`.
    pub fn insert_row(&self, index: usize) {
        let row = self.new_row(FxHashMap::default());
        let mut rows = self.rows.borrow_mut();
        let index = index.min(rows.len());
        rows.insert(index, row);
    }

    pub fn remove_rows(&self, indices: &[usize]) {
        let mut i = 0;
        self.rows.borrow_mut().retain(|_| {
            let keep = !indices.contains(&i);
            i += 1;
            keep
        });
    }
}

fn person(name: &str, age: f64, email: &str, active: bool) -> Vec<(&'static str, CellValue)> {
    vec![
        ("name", CellValue::text(name)),
        ("age", CellValue::number(age)),
        ("email", CellValue::text(email)),
        ("active", CellValue::Boolean(active)),
    ]
}

impl RowModel for TestGrid {
    fn row_count(&self) -> usize {
        TestGrid::row_count(self)
    }

    fn columns(&self) -> Vec<ColumnDescriptor> {
        self.columns.clone()
    }

    fn row_id(&self, row_index: usize) -> Option<String> {
        self.rows.borrow().get(row_index).map(|r| r.id.clone())
    }

    fn cell_value(&self, row_index: usize, column_id: &str) -> CellValue {
        self.rows
            .borrow()
            .get(row_index)
            .and_then(|r| r.values.get(column_id).cloned())
            .unwrap_or_default()
    }
}

// ============================================================================
// Sink and clipboard
// ============================================================================

/// Records update batches and writes them back into the grid.
pub struct RecordingSink {
    grid: Rc<TestGrid>,
    batches: RefCell<Vec<Vec<CellUpdate>>>,
}

impl RecordingSink {
    pub fn new(grid: Rc<TestGrid>) -> Self {
        Self { grid, batches: RefCell::new(Vec::new()) }
    }

    pub fn batches(&self) -> Vec<Vec<CellUpdate>> {
        self.batches.borrow().clone()
    }

    /// Every update, flattened across batches.
    pub fn updates(&self) -> Vec<CellUpdate> {
        self.batches.borrow().iter().flatten().cloned().collect()
    }
}

impl UpdateSink for RecordingSink {
    fn on_data_update(&self, updates: Vec<CellUpdate>) {
        for update in &updates {
            self.grid.set(update.row_index, &update.column_id, update.value.clone());
        }
        self.batches.borrow_mut().push(updates);
    }
}

/// Clipboard whose every call fails with the same error.
pub struct FailingClipboard(pub ClipboardError);

impl ClipboardProvider for FailingClipboard {
    fn read_text(&self) -> BoxedLocal<Result<String, ClipboardError>> {
        let error = self.0.clone();
        Box::pin(async move { Err(error) })
    }

    fn write_text(&self, _text: String) -> BoxedLocal<Result<(), ClipboardError>> {
        let error = self.0.clone();
        Box::pin(async move { Err(error) })
    }
}

// ============================================================================
// Viewport
// ============================================================================

/// Virtualized host. A scroll request materializes the target row at once;
/// `materialize` does the same for rows "already on screen".
#[derive(Default)]
pub struct FakeViewport {
    engine: RefCell<Weak<GridEngine>>,
    scrolls: RefCell<Vec<usize>>,
    focused: RefCell<Vec<(usize, String)>>,
    container_focuses: Cell<usize>,
}

impl FakeViewport {
    fn attach(&self, engine: &Rc<GridEngine>) {
        *self.engine.borrow_mut() = Rc::downgrade(engine);
    }

    fn materialize(&self, row_index: usize) {
        if let Some(engine) = self.engine.borrow().upgrade() {
            engine.viewport().on_materialized(row_index, Some(RowHandle(row_index as u64)));
        }
    }

    pub fn scrolls(&self) -> Vec<usize> {
        self.scrolls.borrow().clone()
    }

    pub fn last_focused(&self) -> Option<(usize, String)> {
        self.focused.borrow().last().cloned()
    }

    pub fn container_focuses(&self) -> usize {
        self.container_focuses.get()
    }
}

impl ViewportHost for FakeViewport {
    fn scroll_to_index(&self, row_index: usize, _align: ScrollAlign) {
        self.scrolls.borrow_mut().push(row_index);
        self.materialize(row_index);
    }

    fn focus_cell(&self, row: RowHandle, column_id: &str) {
        self.focused.borrow_mut().push((row.0 as usize, column_id.to_string()));
    }

    fn focus_container(&self) {
        self.container_focuses.set(self.container_focuses.get() + 1);
    }
}

// ============================================================================
// Fixture
// ============================================================================

pub struct GridFixture {
    pub engine: Rc<GridEngine>,
    pub grid: Rc<TestGrid>,
    pub sink: Rc<RecordingSink>,
    pub clipboard: MemoryClipboard,
    pub notices: Rc<NoticeCollector>,
    pub viewport: Option<Rc<FakeViewport>>,
}

impl GridFixture {
    /// Three people, no hooks, not virtualized.
    pub fn people() -> Self {
        Self::builder().build()
    }

    pub fn new(grid: TestGrid) -> Self {
        FixtureBuilder::with_grid(grid).build()
    }

    pub fn builder() -> FixtureBuilder {
        FixtureBuilder::with_grid(TestGrid::people())
    }

    /// Dispatch a keystroke such as `"ctrl-shift-end"`.
    pub fn key(&self, keystroke: &str) -> Result<bool, GridError> {
        let event = KeyEvent::parse(keystroke).unwrap_or_else(|| panic!("bad keystroke {:?}", keystroke));
        smol::block_on(self.engine.handle_key_event(&event))
    }

    pub fn focus(&self, row: usize, column_id: &str) {
        smol::block_on(self.engine.focus_cell(CellPosition::new(row, column_id))).unwrap();
    }

    pub fn focused(&self) -> Option<CellPosition> {
        self.engine.state().get().focused_cell
    }

    pub fn value(&self, row: usize, column_id: &str) -> CellValue {
        RowModel::cell_value(self.grid.as_ref(), row, column_id)
    }

    /// Mark a row as rendered by the virtualized host.
    pub fn materialize(&self, row_index: usize) {
        self.engine.viewport().on_materialized(row_index, Some(RowHandle(row_index as u64)));
    }
}

pub struct FixtureBuilder {
    grid: Rc<TestGrid>,
    settings: GridSettings,
    virtualized: bool,
    clipboard: Option<Rc<dyn ClipboardProvider>>,
    hooks: Option<Box<dyn FnOnce(&Rc<TestGrid>) -> GridHooks>>,
}

impl FixtureBuilder {
    fn with_grid(grid: TestGrid) -> Self {
        let mut settings = GridSettings::default();
        settings.search.debounce_ms = 0;
        settings.viewport.max_focus_attempts = 3;
        settings.viewport.retry_interval_ms = 1;
        settings.rows.max_create_attempts = 3;
        settings.rows.retry_interval_ms = 1;
        Self { grid: Rc::new(grid), settings, virtualized: false, clipboard: None, hooks: None }
    }

    pub fn grid(mut self, grid: TestGrid) -> Self {
        self.grid = Rc::new(grid);
        self
    }

    /// Replace the rows with `count` generated people.
    pub fn rows(mut self, count: usize) -> Self {
        self.grid = Rc::new(TestGrid::generated(count));
        self
    }

    pub fn virtualized(mut self) -> Self {
        self.virtualized = true;
        self
    }

    pub fn rtl(mut self) -> Self {
        self.settings.navigation.text_direction = TextDirection::Rtl;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.settings.read_only = true;
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.settings.search.debounce_ms = ms;
        self
    }

    pub fn clipboard(mut self, clipboard: Rc<dyn ClipboardProvider>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    pub fn hooks(mut self, hooks: impl FnOnce(&Rc<TestGrid>) -> GridHooks + 'static) -> Self {
        self.hooks = Some(Box::new(hooks));
        self
    }

    /// A `rows_add` hook that appends generated rows.
    pub fn rows_add_hook(self) -> Self {
        self.hooks(|grid| {
            let grid = grid.clone();
            GridHooks::new().on_rows_add(move |count| {
                let grid = grid.clone();
                async move {
                    grid.push_rows(count);
                    Ok(())
                }
            })
        })
    }

    pub fn build(self) -> GridFixture {
        let sink = Rc::new(RecordingSink::new(self.grid.clone()));
        let memory = MemoryClipboard::new();
        let notices = Rc::new(NoticeCollector::new());
        let viewport = self.virtualized.then(|| Rc::new(FakeViewport::default()));
        let hooks = self.hooks.map(|f| f(&self.grid)).unwrap_or_default();

        let mut builder = GridEngine::builder(self.grid.clone(), sink.clone())
            .clipboard(self.clipboard.unwrap_or_else(|| Rc::new(memory.clone())))
            .notifier(notices.clone())
            .hooks(hooks)
            .settings(self.settings);
        if let Some(viewport) = &viewport {
            builder = builder.viewport_host(viewport.clone());
        }
        let engine = builder.build().unwrap();
        if let Some(viewport) = &viewport {
            viewport.attach(&engine);
        }

        GridFixture { engine, grid: self.grid, sink, clipboard: memory, notices, viewport }
    }
}
