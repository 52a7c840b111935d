//! Filter state, per sheet, for the lifetime of a session.
//!
//! Key invariants:
//! - At most one selection per column
//! - A row enters `original_hidden` at most once between two clears; the first
//!   recorded flag wins
//! - `clear_all` is the only way a sheet's state is reset, and it resets both
//!   maps together

use std::collections::{BTreeMap, HashMap};

use mergefilter_core::SheetKey;
use rustc_hash::FxHashMap;

use crate::filter::FilterSelection;

/// Column -> selection, in ascending column order.
pub type ColumnFilters = BTreeMap<usize, FilterSelection>;

static NO_FILTERS: ColumnFilters = BTreeMap::new();

/// State of one sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    filters_by_column: ColumnFilters,
    /// Only rows the engine itself hid: row -> hidden flag before the engine
    /// touched it
    original_hidden_by_row: FxHashMap<usize, bool>,
}

impl FilterState {
    pub fn filters(&self) -> &ColumnFilters {
        &self.filters_by_column
    }

    pub fn original_hidden(&self) -> &FxHashMap<usize, bool> {
        &self.original_hidden_by_row
    }

    /// Recorded rows in ascending order.
    pub fn original_hidden_sorted(&self) -> Vec<(usize, bool)> {
        let mut rows: Vec<(usize, bool)> = self
            .original_hidden_by_row
            .iter()
            .map(|(&row, &hidden)| (row, hidden))
            .collect();
        rows.sort_unstable();
        rows
    }

    pub fn is_empty(&self) -> bool {
        self.filters_by_column.is_empty() && self.original_hidden_by_row.is_empty()
    }
}

/// Session-wide store of filter state, keyed by sheet.
///
/// Created once per session and passed by reference to the engine; separate
/// stores never share state.
#[derive(Debug, Default)]
pub struct FilterStateStore {
    sheets: HashMap<SheetKey, FilterState>,
}

impl FilterStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, sheet: &SheetKey) -> Option<&FilterState> {
        self.sheets.get(sheet)
    }

    /// Live filters of a sheet (empty if the sheet has none).
    pub fn filters(&self, sheet: &SheetKey) -> &ColumnFilters {
        self.sheets
            .get(sheet)
            .map(|s| &s.filters_by_column)
            .unwrap_or(&NO_FILTERS)
    }

    pub fn filter(&self, sheet: &SheetKey, col: usize) -> Option<&FilterSelection> {
        self.filters(sheet).get(&col)
    }

    pub fn has_filters(&self, sheet: &SheetKey) -> bool {
        !self.filters(sheet).is_empty()
    }

    /// Insert or replace the selection for `col`.
    pub fn set_filter(&mut self, sheet: &SheetKey, col: usize, selection: FilterSelection) {
        self.sheet_mut(sheet).filters_by_column.insert(col, selection);
    }

    /// Record the pre-filter hidden flag of `row`. Returns false (and changes
    /// nothing) if the row is already recorded.
    pub fn record_original_visibility(&mut self, sheet: &SheetKey, row: usize, was_hidden: bool) -> bool {
        let state = self.sheet_mut(sheet);
        if state.original_hidden_by_row.contains_key(&row) {
            return false;
        }
        state.original_hidden_by_row.insert(row, was_hidden);
        true
    }

    pub fn original_visibility(&self, sheet: &SheetKey, row: usize) -> Option<bool> {
        self.sheets
            .get(sheet)
            .and_then(|s| s.original_hidden_by_row.get(&row).copied())
    }

    /// Number of rows currently hidden by the engine on `sheet`.
    pub fn engine_hidden_count(&self, sheet: &SheetKey) -> usize {
        self.sheets
            .get(sheet)
            .map_or(0, |s| s.original_hidden_by_row.values().filter(|&&hidden| !hidden).count())
    }

    /// Empty both maps for `sheet`, returning what they held.
    pub fn clear_all(&mut self, sheet: &SheetKey) -> FilterState {
        self.sheets.remove(sheet).unwrap_or_default()
    }

    /// Sheets with any state.
    pub fn sheets(&self) -> impl Iterator<Item = &SheetKey> {
        self.sheets.keys()
    }

    fn sheet_mut(&mut self, sheet: &SheetKey) -> &mut FilterState {
        self.sheets.entry(sheet.clone()).or_default()
    }
}
