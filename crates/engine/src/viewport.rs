//! Viewport coordination for virtualized rendering.
//!
//! Only a window of rows is materialized by the host at any time. The
//! coordinator tracks which rows currently have a live handle, asks the host
//! to scroll a row into view, and moves real input focus to a cell once its
//! row exists. Without a host every row counts as materialized.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use cellgrid_core::CellPosition;

use crate::retry::{retry_until, RetryPolicy};

/// Opaque handle to a materialized row, issued by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollAlign {
    /// Scroll the minimum amount needed
    #[default]
    Auto,
    Start,
    Center,
    End,
}

/// Rendering side of the viewport.
pub trait ViewportHost {
    fn scroll_to_index(&self, row_index: usize, align: ScrollAlign);
    /// Give input focus to one cell of a materialized row.
    fn focus_cell(&self, row: RowHandle, column_id: &str);
    /// Focus the grid container itself.
    fn focus_container(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusOutcome {
    Focused,
    /// Row never materialized; the container got focus instead
    FellBack,
    /// Focus moved elsewhere while waiting
    Superseded,
}

pub struct ViewportCoordinator {
    host: Option<Rc<dyn ViewportHost>>,
    materialized: RefCell<BTreeMap<usize, RowHandle>>,
    policy: RetryPolicy,
}

impl ViewportCoordinator {
    pub fn new(host: Option<Rc<dyn ViewportHost>>, policy: RetryPolicy) -> Self {
        Self { host, materialized: RefCell::new(BTreeMap::new()), policy }
    }

    pub fn is_virtualized(&self) -> bool {
        self.host.is_some()
    }

    /// Called by the host as rows mount (`Some`) and unmount (`None`).
    pub fn on_materialized(&self, row_index: usize, handle: Option<RowHandle>) {
        let mut rows = self.materialized.borrow_mut();
        match handle {
            Some(handle) => {
                rows.insert(row_index, handle);
            }
            None => {
                rows.remove(&row_index);
            }
        }
    }

    pub fn is_row_materialized(&self, row_index: usize) -> bool {
        match self.host {
            None => true,
            Some(_) => self.materialized.borrow().contains_key(&row_index),
        }
    }

    /// Rows currently materialized; `None` when unknown. Drives page size.
    pub fn materialized_count(&self) -> Option<usize> {
        self.host.as_ref()?;
        match self.materialized.borrow().len() {
            0 => None,
            n => Some(n),
        }
    }

    pub fn handle(&self, row_index: usize) -> Option<RowHandle> {
        self.materialized.borrow().get(&row_index).copied()
    }

    pub fn request_scroll_to(&self, row_index: usize, align: ScrollAlign) {
        if let Some(host) = &self.host {
            host.scroll_to_index(row_index, align);
        }
    }

    /// Scroll a row into view if it is not already materialized.
    pub fn reveal(&self, row_index: usize) {
        if !self.is_row_materialized(row_index) {
            self.request_scroll_to(row_index, ScrollAlign::Auto);
        }
    }

    /// Move input focus to `position`, scrolling first if its row is not
    /// materialized. `still_current` is re-checked after every wait; when it
    /// turns false the attempt is abandoned.
    pub async fn ensure_focus(
        &self,
        position: &CellPosition,
        still_current: impl Fn() -> bool,
    ) -> FocusOutcome {
        let Some(host) = self.host.clone() else {
            return FocusOutcome::Focused;
        };

        if let Some(handle) = self.handle(position.row_index) {
            host.focus_cell(handle, &position.column_id);
            return FocusOutcome::Focused;
        }

        host.scroll_to_index(position.row_index, ScrollAlign::Auto);
        retry_until(self.policy, || {
            !still_current() || self.materialized.borrow().contains_key(&position.row_index)
        })
        .await;

        if !still_current() {
            log::debug!("focus request for {} superseded", position);
            return FocusOutcome::Superseded;
        }
        match self.handle(position.row_index) {
            Some(handle) => {
                host.focus_cell(handle, &position.column_id);
                FocusOutcome::Focused
            }
            None => {
                log::debug!("row {} never materialized, focusing container", position.row_index);
                host.focus_container();
                FocusOutcome::FellBack
            }
        }
    }

    /// Forget every handle. Called on unmount.
    pub fn clear(&self) {
        self.materialized.borrow_mut().clear();
    }
}
