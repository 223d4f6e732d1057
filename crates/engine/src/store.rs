//! Interaction state store.
//!
//! Holds everything about *how the user is interacting* with the grid:
//! focus, the cell being edited, selection, search, cut marks, the context
//! menu and the paste dialog. Row data is never stored here.
//!
//! Writes through `set` are skipped when the value is unchanged. Changes mark
//! the store dirty; `flush` (called by the host once per event-loop turn)
//! delivers a single notification with a snapshot, so a burst of writes
//! coalesces into one. `batch` defers delivery until the outermost batch
//! closes, so observers never see a half-applied transition.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashSet;

use cellgrid_core::{CellKey, CellPosition, SelectionState};

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    /// Matching cells in row-major order
    pub matches: Vec<CellPosition>,
    /// Index into `matches` of the active match
    pub match_index: Option<usize>,
    pub open: bool,
}

impl SearchState {
    pub fn active_match(&self) -> Option<&CellPosition> {
        self.match_index.and_then(|i| self.matches.get(i))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextMenuState {
    pub open: bool,
    pub x: f32,
    pub y: f32,
    /// Cell the menu was opened on
    pub target: Option<CellPosition>,
}

/// Shown when a paste needs more rows than exist and the host can create them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasteDialogState {
    pub open: bool,
    pub rows_needed: usize,
    pub clipboard_text: String,
    /// Top-left cell of the paused paste
    pub origin: Option<CellPosition>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridState {
    pub focused_cell: Option<CellPosition>,
    /// When set, always equal to `focused_cell`
    pub editing_cell: Option<CellPosition>,
    pub selection: SelectionState,
    /// Whole-row selection (row-select checkbox column)
    pub row_selection: BTreeSet<usize>,
    pub search: SearchState,
    pub cut_cells: FxHashSet<CellKey>,
    pub context_menu: ContextMenuState,
    pub paste_dialog: PasteDialogState,
}

impl GridState {
    /// Editing implies focus on the same cell.
    pub fn is_consistent(&self) -> bool {
        match (&self.editing_cell, &self.focused_cell) {
            (Some(editing), Some(focused)) => editing == focused,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    pub fn is_focused(&self, position: &CellPosition) -> bool {
        self.focused_cell.as_ref() == Some(position)
    }

    pub fn is_editing(&self, position: &CellPosition) -> bool {
        self.editing_cell.as_ref() == Some(position)
    }

    pub fn is_cut(&self, position: &CellPosition) -> bool {
        self.cut_cells.contains(&position.key())
    }
}

// ============================================================================
// Store
// ============================================================================

type Listener = Rc<dyn Fn(&GridState)>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

pub struct Store {
    state: RefCell<GridState>,
    listeners: Rc<RefCell<Listeners>>,
    batch_depth: Cell<u32>,
    dirty: Cell<bool>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(GridState::default()),
            listeners: Rc::new(RefCell::new(Listeners::default())),
            batch_depth: Cell::new(0),
            dirty: Cell::new(false),
        }
    }

    /// Snapshot of the full state.
    pub fn get(&self) -> GridState {
        self.state.borrow().clone()
    }

    /// Read without cloning. Must not call back into the store.
    pub fn read<R>(&self, f: impl FnOnce(&GridState) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Write one field. Returns false (and marks nothing) if the value is
    /// unchanged.
    pub fn set<T, F>(&self, field: F, value: T) -> bool
    where
        T: PartialEq,
        F: FnOnce(&mut GridState) -> &mut T,
    {
        let mut state = self.state.borrow_mut();
        let slot = field(&mut *state);
        if *slot == value {
            return false;
        }
        *slot = value;
        drop(state);
        self.dirty.set(true);
        true
    }

    /// Run `f` with notifications deferred until the outermost batch ends.
    /// Batches nest.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        self.batch_depth.set(self.batch_depth.get() + 1);
        let _guard = BatchGuard(&self.batch_depth);
        f()
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth.get() > 0
    }

    /// Whether a notification is waiting for `flush`.
    pub fn has_pending(&self) -> bool {
        self.dirty.get()
    }

    /// Deliver at most one notification for everything written since the
    /// last flush. No-op inside a batch. Returns whether listeners ran.
    pub fn flush(&self) -> bool {
        if self.is_batching() || !self.dirty.get() {
            return false;
        }
        self.dirty.set(false);
        let snapshot = self.get();
        debug_assert!(snapshot.is_consistent(), "editing cell must be the focused cell");

        let listeners: Vec<Listener> =
            self.listeners.borrow().entries.iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners {
            listener(&snapshot);
        }
        true
    }

    /// Observe every flushed change. The listener lives until the returned
    /// `Subscription` is dropped.
    pub fn subscribe(&self, listener: impl Fn(&GridState) + 'static) -> Subscription {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Rc::new(listener)));
        Subscription { listeners: Rc::downgrade(&self.listeners), id }
    }

    /// Observe one derived slice; the callback runs only when the slice
    /// differs from the last value it saw.
    pub fn subscribe_slice<T, S, C>(&self, selector: S, callback: C) -> Subscription
    where
        T: PartialEq + 'static,
        S: Fn(&GridState) -> T + 'static,
        C: Fn(&T) + 'static,
    {
        let last = RefCell::new(self.read(&selector));
        self.subscribe(move |state| {
            let next = selector(state);
            if *last.borrow() != next {
                callback(&next);
                *last.borrow_mut() = next;
            }
        })
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }

    /// Drop all listeners and reset to the initial state.
    pub fn reset(&self) {
        self.listeners.borrow_mut().entries.clear();
        *self.state.borrow_mut() = GridState::default();
        self.dirty.set(false);
    }
}

struct BatchGuard<'a>(&'a Cell<u32>);

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

/// Handle for a store listener. Dropping it unsubscribes.
pub struct Subscription {
    listeners: Weak<RefCell<Listeners>>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}

    /// Keep the listener for the lifetime of the store.
    pub fn detach(self) {
        std::mem::forget(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut().entries.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Read-only view of the store for renderers and host code.
#[derive(Clone, Copy)]
pub struct StateReader<'a> {
    store: &'a Store,
}

impl<'a> StateReader<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn get(&self) -> GridState {
        self.store.get()
    }

    pub fn read<R>(&self, f: impl FnOnce(&GridState) -> R) -> R {
        self.store.read(f)
    }

    pub fn subscribe(&self, listener: impl Fn(&GridState) + 'static) -> Subscription {
        self.store.subscribe(listener)
    }

    pub fn subscribe_slice<T, S, C>(&self, selector: S, callback: C) -> Subscription
    where
        T: PartialEq + 'static,
        S: Fn(&GridState) -> T + 'static,
        C: Fn(&T) + 'static,
    {
        self.store.subscribe_slice(selector, callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(store: &Store) -> (Rc<Cell<u32>>, Subscription) {
        let count = Rc::new(Cell::new(0));
        let seen = count.clone();
        let sub = store.subscribe(move |_| seen.set(seen.get() + 1));
        (count, sub)
    }

    #[test]
    fn test_set_equal_value_is_noop() {
        let store = Store::new();
        let (count, _sub) = counter(&store);

        assert!(!store.set(|s| &mut s.focused_cell, None));
        assert!(!store.flush());
        assert_eq!(count.get(), 0);

        assert!(store.set(|s| &mut s.focused_cell, Some(CellPosition::new(0, "a"))));
        assert!(!store.set(|s| &mut s.focused_cell, Some(CellPosition::new(0, "a"))));
        assert!(store.flush());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_writes_coalesce_into_one_notification() {
        let store = Store::new();
        let (count, _sub) = counter(&store);

        store.set(|s| &mut s.focused_cell, Some(CellPosition::new(0, "a")));
        store.set(|s| &mut s.focused_cell, Some(CellPosition::new(1, "a")));
        store.set(|s| &mut s.search.open, true);
        store.flush();
        store.flush();

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_batch_defers_until_outermost_end() {
        let store = Store::new();
        let (count, _sub) = counter(&store);

        store.batch(|| {
            store.set(|s| &mut s.focused_cell, Some(CellPosition::new(2, "b")));
            store.batch(|| {
                store.set(|s| &mut s.editing_cell, Some(CellPosition::new(2, "b")));
            });
            assert!(!store.flush(), "inner batch end must not notify");
        });
        assert!(store.flush());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_batch_depth_restored_after_panic() {
        let store = Store::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            store.batch(|| panic!("boom"));
        }));
        assert!(result.is_err());
        assert!(!store.is_batching());
    }

    #[test]
    fn test_subscriber_sees_consistent_snapshot() {
        let store = Store::new();
        let snapshots = Rc::new(RefCell::new(Vec::new()));
        let sink = snapshots.clone();
        let _sub = store.subscribe(move |s| sink.borrow_mut().push(s.clone()));

        let pos = CellPosition::new(4, "name");
        store.batch(|| {
            store.set(|s| &mut s.focused_cell, Some(pos.clone()));
            store.set(|s| &mut s.editing_cell, Some(pos.clone()));
        });
        store.flush();

        let snapshots = snapshots.borrow();
        assert_eq!(snapshots.len(), 1);
        assert!(snapshots[0].is_editing(&pos));
        assert!(snapshots[0].is_consistent());
    }

    #[test]
    fn test_unsubscribe_on_drop() {
        let store = Store::new();
        let (count, sub) = counter(&store);
        assert_eq!(store.listener_count(), 1);

        sub.unsubscribe();
        assert_eq!(store.listener_count(), 0);

        store.set(|s| &mut s.search.open, true);
        store.flush();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_slice_subscription_filters_unrelated_changes() {
        let store = Store::new();
        let hits = Rc::new(RefCell::new(Vec::new()));
        let sink = hits.clone();
        let _sub = store.subscribe_slice(
            |s| s.search.match_index,
            move |idx| sink.borrow_mut().push(*idx),
        );

        store.set(|s| &mut s.focused_cell, Some(CellPosition::new(0, "a")));
        store.flush();
        store.set(|s| &mut s.search.match_index, Some(0));
        store.flush();
        store.set(|s| &mut s.search.match_index, Some(1));
        store.flush();

        assert_eq!(*hits.borrow(), vec![Some(0), Some(1)]);
    }

    #[test]
    fn test_consistency_check() {
        let mut state = GridState::default();
        state.editing_cell = Some(CellPosition::new(0, "a"));
        assert!(!state.is_consistent());
        state.focused_cell = Some(CellPosition::new(0, "a"));
        assert!(state.is_consistent());
        state.focused_cell = Some(CellPosition::new(1, "a"));
        assert!(!state.is_consistent());
    }
}
