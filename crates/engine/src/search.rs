//! In-grid search.
//!
//! Matching is a case-insensitive substring test over the plain string form
//! of every navigable cell, in row-major order. Running a search highlights
//! and scrolls to the first match without moving focus; stepping through
//! matches moves focus and wraps at both ends.

use std::time::Duration;

use cellgrid_core::{CellPosition, SelectionState};

use crate::error::GridError;
use crate::grid::GridEngine;
use crate::store::SearchState;

impl GridEngine {
    pub fn open_search(&self) -> Result<(), GridError> {
        self.ensure_mounted()?;
        self.store.set(|s| &mut s.search.open, true);
        Ok(())
    }

    /// Close the search bar, dropping the query and matches. Focus stays.
    pub fn close_search(&self) -> Result<(), GridError> {
        self.ensure_mounted()?;
        self.bump_generation(&self.search_generation);
        self.store.set(|s| &mut s.search, SearchState::default());
        Ok(())
    }

    /// Update the query and run it after the debounce interval. A newer
    /// query arriving during the wait supersedes this one, which then
    /// returns `None`.
    pub async fn set_search_query(&self, query: &str) -> Result<Option<usize>, GridError> {
        self.ensure_mounted()?;
        self.store.set(|s| &mut s.search.query, query.to_string());
        let generation = self.bump_generation(&self.search_generation);

        let debounce = self.settings.search.debounce_ms;
        if debounce > 0 {
            smol::Timer::after(Duration::from_millis(debounce)).await;
        }
        if !self.is_mounted() || self.search_generation.get() != generation {
            log::debug!("search for {:?} superseded", query);
            return Ok(None);
        }
        self.run_search().map(Some)
    }

    /// Scan for the current query. Returns the match count.
    pub fn run_search(&self) -> Result<usize, GridError> {
        self.ensure_mounted()?;
        let query = self.store.read(|s| s.search.query.to_lowercase());
        let matches = if query.trim().is_empty() { Vec::new() } else { self.find_matches(&query) };
        let count = matches.len();
        let first = matches.first().map(|p| p.row_index);

        self.store.batch(|| {
            self.store.set(|s| &mut s.search.matches, matches);
            self.store.set(|s| &mut s.search.match_index, first.map(|_| 0));
        });
        if let Some(row) = first {
            self.viewport.reveal(row);
        }
        log::debug!("search {:?}: {} match(es)", query, count);
        Ok(count)
    }

    fn find_matches(&self, needle: &str) -> Vec<CellPosition> {
        let columns = self.navigable_column_ids();
        let mut matches = Vec::new();
        for row in 0..self.row_count() {
            for column_id in &columns {
                let text = self.model.cell_value(row, column_id).to_plain_string();
                if text.to_lowercase().contains(needle) {
                    matches.push(CellPosition::new(row, column_id.clone()));
                }
            }
        }
        matches
    }

    pub async fn next_match(&self) -> Result<Option<CellPosition>, GridError> {
        self.step_match(true).await
    }

    pub async fn previous_match(&self) -> Result<Option<CellPosition>, GridError> {
        self.step_match(false).await
    }

    async fn step_match(&self, forward: bool) -> Result<Option<CellPosition>, GridError> {
        self.ensure_mounted()?;
        let (len, current) = self.store.read(|s| (s.search.matches.len(), s.search.match_index));
        if len == 0 {
            return Ok(None);
        }
        let index = match (current, forward) {
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
            (None, true) => 0,
            (None, false) => len - 1,
        };
        let Some(target) = self.store.read(|s| s.search.matches.get(index).cloned()) else {
            return Ok(None);
        };

        if self.editing().is_some() {
            self.commit_edit(crate::editing::EditExit::Blur).await?;
        }
        self.store.batch(|| {
            self.store.set(|s| &mut s.search.match_index, Some(index));
            self.store.set(|s| &mut s.focused_cell, Some(target.clone()));
            self.store.set(|s| &mut s.selection, SelectionState::default());
        });
        self.sync_dom_focus(&target).await;
        Ok(Some(target))
    }

    pub fn is_search_match(&self, position: &CellPosition) -> bool {
        self.store.read(|s| s.search.matches.contains(position))
    }

    pub fn is_active_match(&self, position: &CellPosition) -> bool {
        self.store.read(|s| s.search.active_match() == Some(position))
    }
}
