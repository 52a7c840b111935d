//! Merge-aware multi-column filtering.
//!
//! Filters on different columns intersect. Editing one column's filter never
//! edits the others in place; instead every apply runs:
//!
//! 1. snapshot the sheet's filters
//! 2. clear everything the engine did (rows, headers, state)
//! 3. replay every other column's stored selection, silently
//! 4. ask for the target column's selection and apply it
//!
//! so the visible rows always equal the intersection of the stored
//! selections, whatever order they were applied in. Nothing is asked of the
//! user until step 4, and nothing is changed by step 4 until the selection is
//! confirmed. A cancelled edit replays the target's old selection, which
//! leaves the sheet as it was.

use mergefilter_config::FilterSettings;
use mergefilter_core::{CellRef, SheetKey};

use crate::annotate::AnnotationManager;
use crate::batch::{self, VisibilityBatcher};
use crate::error::FilterError;
use crate::extract::extract;
use crate::feedback::{Feedback, Notice};
use crate::filter::{CandidateList, FilterSelection};
use crate::host::{best_effort, HostDocument};
use crate::selection::{Selection, SelectionCollector};
use crate::state::{ColumnFilters, FilterStateStore};

/// Result of `FilterEngine::apply_filter`. Everything except `Applied` is a
/// silent abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied(FilterSummary),
    /// The picker was dismissed; the sheet is as it was.
    Cancelled,
    /// No visible, non-empty value in the target column.
    NoCandidates,
    /// The used range ends at or above the header row.
    NoDataRows,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSummary {
    pub column: usize,
    /// Kept values, sorted
    pub selected: Vec<String>,
    /// Rows hidden by the target column's selection
    pub hidden_rows: usize,
    /// Rows hidden by the engine on this sheet, all columns together
    pub engine_hidden: usize,
    /// Other columns whose stored selection was replayed
    pub replayed_columns: Vec<usize>,
    /// Rows the host refused to change
    pub skipped_rows: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearSummary {
    /// Rows returned to their recorded visibility
    pub restored_rows: usize,
    pub cleared_columns: Vec<usize>,
    pub markers_removed: usize,
    /// Rows the host refused to change back
    pub skipped_rows: Vec<usize>,
}

/// How a column's selection is obtained.
enum Pick<'a> {
    /// Reuse a stored selection without asking.
    Replay(&'a FilterSelection),
    /// Ask the collector, offering the previous selection.
    Ask {
        previous: Option<&'a FilterSelection>,
        collector: &'a mut dyn SelectionCollector,
    },
}

enum ColumnOutcome {
    Applied {
        selection: FilterSelection,
        hidden: usize,
        skipped: Vec<usize>,
    },
    Cancelled,
    NoCandidates,
}

#[derive(Debug, Clone)]
pub struct FilterEngine {
    settings: FilterSettings,
    annotations: AnnotationManager,
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new(FilterSettings::default())
    }
}

impl FilterEngine {
    pub fn new(settings: FilterSettings) -> Self {
        let annotations = AnnotationManager::from_settings(&settings);
        Self { settings, annotations }
    }

    pub fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    pub fn annotations(&self) -> &AnnotationManager {
        &self.annotations
    }

    /// Filter the column under `header`, keeping only rows whose logical value
    /// the collector selects. Filters already stored for other columns stay in
    /// force.
    pub fn apply_filter(
        &self,
        store: &mut FilterStateStore,
        doc: &mut dyn HostDocument,
        header: CellRef,
        collector: &mut dyn SelectionCollector,
        feedback: &mut dyn Feedback,
    ) -> Result<ApplyOutcome, FilterError> {
        if header.row == 0 || header.col == 0 {
            let err = FilterError::InvalidTarget { row: header.row, col: header.col };
            report_failure(feedback, &err);
            return Err(err);
        }

        let previous_mode = doc.set_bulk_update(true);
        let result = self.apply_inner(store, doc, header, collector);
        doc.set_bulk_update(previous_mode);

        match &result {
            Ok(ApplyOutcome::Applied(summary)) => log::info!(
                "{}: column {} keeps {} value(s); {} row(s) hidden by this column, {} in total",
                doc.sheet_key(),
                summary.column,
                summary.selected.len(),
                summary.hidden_rows,
                summary.engine_hidden
            ),
            Ok(outcome) => log::debug!("{}: filter on column {} ended: {:?}", doc.sheet_key(), header.col, outcome),
            Err(e) => report_failure(feedback, e),
        }
        result
    }

    /// Undo everything the engine did on this sheet: restore row visibility,
    /// restore headers, forget all selections. `silent` suppresses the
    /// confirmation notice.
    pub fn clear_filter(
        &self,
        store: &mut FilterStateStore,
        doc: &mut dyn HostDocument,
        silent: bool,
        feedback: &mut dyn Feedback,
    ) -> Result<ClearSummary, FilterError> {
        let key = doc.sheet_key();

        let previous_mode = doc.set_bulk_update(true);
        let result = self.clear_inner(store, doc, &key);
        doc.set_bulk_update(previous_mode);

        match &result {
            Ok(summary) => {
                log::info!(
                    "{}: cleared {} column filter(s), restored {} row(s)",
                    key,
                    summary.cleared_columns.len(),
                    summary.restored_rows
                );
                if !silent {
                    feedback.notify(Notice::FiltersCleared);
                }
            }
            Err(e) => report_failure(feedback, e),
        }
        result
    }

    fn apply_inner(
        &self,
        store: &mut FilterStateStore,
        doc: &mut dyn HostDocument,
        header: CellRef,
        collector: &mut dyn SelectionCollector,
    ) -> Result<ApplyOutcome, FilterError> {
        let key = doc.sheet_key();

        let used = doc.used_range().map_err(FilterError::host("read used range", None))?;
        if used.data_rows_below(header.row).is_none() {
            return Ok(ApplyOutcome::NoDataRows);
        }

        let snapshot: ColumnFilters = store.filters(&key).clone();
        self.clear_inner(store, doc, &key)?;

        let mut replayed_columns = Vec::new();
        let mut skipped_rows = Vec::new();
        for (&col, selection) in snapshot.iter().filter(|&(&col, _)| col != header.col) {
            if let ColumnOutcome::Applied { skipped, .. } =
                self.filter_column(store, doc, &key, header.row, col, Pick::Replay(selection))?
            {
                skipped_rows.extend(skipped);
            }
            replayed_columns.push(col);
        }

        let previous = snapshot.get(&header.col);
        let pick = Pick::Ask { previous, collector };
        let outcome = match self.filter_column(store, doc, &key, header.row, header.col, pick)? {
            ColumnOutcome::Applied { selection, hidden, skipped } => {
                skipped_rows.extend(skipped);
                skipped_rows.sort_unstable();
                skipped_rows.dedup();
                ApplyOutcome::Applied(FilterSummary {
                    column: header.col,
                    selected: selection.to_vec(),
                    hidden_rows: hidden,
                    engine_hidden: store.engine_hidden_count(&key),
                    replayed_columns,
                    skipped_rows,
                })
            }
            aborted => {
                // Put the target's old selection back so the abort is invisible
                if let Some(previous) = previous {
                    self.filter_column(store, doc, &key, header.row, header.col, Pick::Replay(previous))?;
                }
                match aborted {
                    ColumnOutcome::Cancelled => ApplyOutcome::Cancelled,
                    _ => ApplyOutcome::NoCandidates,
                }
            }
        };

        if self.settings.freeze_header && store.has_filters(&key) {
            best_effort(doc.freeze_below(header.row), "freezing header row")
                .map_err(FilterError::host("freeze header row", Some(header.row)))?;
        }
        Ok(outcome)
    }

    /// Apply one column's selection to the rows that are visible right now.
    fn filter_column(
        &self,
        store: &mut FilterStateStore,
        doc: &mut dyn HostDocument,
        key: &SheetKey,
        header_row: usize,
        col: usize,
        pick: Pick<'_>,
    ) -> Result<ColumnOutcome, FilterError> {
        let used = doc.used_range().map_err(FilterError::host("read used range", None))?;
        let column = match used.data_rows_below(header_row) {
            Some(rows) => extract(&*doc, col, *rows.start(), *rows.end()),
            None => extract(&*doc, col, header_row + 1, header_row),
        };
        for row in column.unreadable() {
            log::warn!("{}: row {} column {} unreadable, treated as empty", key, row, col);
        }

        // Rows already hidden (by the user or by another column) take no part
        let mut visible: Vec<(usize, &str)> = Vec::with_capacity(column.len());
        for (row, value) in column.iter() {
            match doc.is_row_hidden(row) {
                Ok(false) => visible.push((row, value)),
                Ok(true) => {}
                Err(e) if e.is_fatal() => return Err(FilterError::host("read row visibility", Some(row))(e)),
                Err(e) => log::warn!("{}: row {} skipped: {}", key, row, e),
            }
        }

        let selection = match pick {
            Pick::Replay(selection) => {
                log::debug!("{}: replaying filter on column {}", key, col);
                selection.clone()
            }
            Pick::Ask { previous, collector } => {
                let candidates = CandidateList::from_values(visible.iter().map(|&(_, value)| value));
                if candidates.is_empty() {
                    return Ok(ColumnOutcome::NoCandidates);
                }
                match collector.collect(&candidates, previous) {
                    Selection::Confirmed(selection) => selection,
                    Selection::Cancelled => return Ok(ColumnOutcome::Cancelled),
                }
            }
        };

        let to_hide: Vec<usize> = visible
            .iter()
            .filter(|&&(_, value)| !selection.contains(value))
            .map(|&(row, _)| row)
            .collect();

        let mut batcher = VisibilityBatcher::hiding(self.settings.effective_batch_size());
        let flushed = batcher.extend(doc, to_hide.iter().copied());

        // Rows were visible when hidden, so their original flag is "shown"
        for &row in batcher.applied() {
            store.record_original_visibility(key, row, false);
        }
        if let Err(e) = flushed {
            let processed = batcher.report().applied.len() + batcher.report().skipped.len();
            return Err(FilterError::host("hide rows", to_hide.get(processed).copied())(e));
        }

        let report = batcher.into_report();
        store.set_filter(key, col, selection.clone());
        self.annotations
            .mark_filtered(doc, header_row, col, &selection)
            .map_err(FilterError::host("mark header", Some(header_row)))?;

        Ok(ColumnOutcome::Applied {
            selection,
            hidden: report.applied.len(),
            skipped: report.skipped.into_iter().map(|(row, _)| row).collect(),
        })
    }

    fn clear_inner(
        &self,
        store: &mut FilterStateStore,
        doc: &mut dyn HostDocument,
        key: &SheetKey,
    ) -> Result<ClearSummary, FilterError> {
        let recorded = store
            .state(key)
            .map(|state| state.original_hidden_sorted())
            .unwrap_or_default();
        let had_filters = store.has_filters(key);

        let (was_hidden, was_visible): (Vec<(usize, bool)>, Vec<(usize, bool)>) =
            recorded.into_iter().partition(|&(_, hidden)| hidden);
        let to_show: Vec<usize> = was_visible.into_iter().map(|(row, _)| row).collect();
        let to_rehide: Vec<usize> = was_hidden.into_iter().map(|(row, _)| row).collect();

        let batch_size = self.settings.effective_batch_size();
        let shown = batch::show_rows(doc, &to_show, batch_size)
            .map_err(FilterError::host("restore rows", to_show.first().copied()))?;
        let rehidden = batch::hide_rows(doc, &to_rehide, batch_size)
            .map_err(FilterError::host("restore rows", to_rehide.first().copied()))?;

        let columns: Vec<usize> = store.filters(key).keys().copied().collect();
        let markers_removed = self
            .annotations
            .clear_all_and_restore(doc, &columns)
            .map_err(FilterError::host("restore headers", None))?;

        if self.settings.freeze_header && (had_filters || markers_removed > 0) {
            best_effort(doc.unfreeze(), "unfreezing panes").map_err(FilterError::host("unfreeze panes", None))?;
        }

        let mut skipped_rows: Vec<usize> = shown
            .skipped
            .iter()
            .chain(rehidden.skipped.iter())
            .map(|(row, _)| *row)
            .collect();
        skipped_rows.sort_unstable();

        let cleared = store.clear_all(key);

        // Rows the host refused to restore keep their record for the next clear
        for (row, _) in &shown.skipped {
            store.record_original_visibility(key, *row, false);
        }
        for (row, _) in &rehidden.skipped {
            store.record_original_visibility(key, *row, true);
        }

        Ok(ClearSummary {
            restored_rows: shown.applied.len() + rehidden.applied.len(),
            cleared_columns: cleared.filters().keys().copied().collect(),
            markers_removed,
            skipped_rows,
        })
    }
}

fn report_failure(feedback: &mut dyn Feedback, err: &FilterError) {
    log::error!("{}", err);
    feedback.notify(Notice::Failure {
        operation: err.operation().to_string(),
        message: err.to_string(),
    });
}
