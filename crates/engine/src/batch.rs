//! Batched row-visibility changes.
//!
//! Rows are queued and flushed every `batch_size` rows as one host call over
//! the union of their spans. When the host rejects a batch for a recoverable
//! reason, the batch is retried row by row and rows that still fail are
//! skipped: they keep their visibility and are reported, never applied.

use mergefilter_core::{coalesce_rows, RowSpan};

use crate::host::{HostDocument, HostError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Rows whose flag was changed
    pub applied: Vec<usize>,
    /// Rows left untouched after a recoverable failure
    pub skipped: Vec<(usize, HostError)>,
    /// Batch-level host calls made
    pub flushes: usize,
}

#[derive(Debug)]
pub struct VisibilityBatcher {
    batch_size: usize,
    hidden: bool,
    pending: Vec<usize>,
    report: BatchReport,
}

impl VisibilityBatcher {
    pub fn new(batch_size: usize, hidden: bool) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch_size,
            hidden,
            pending: Vec::with_capacity(batch_size),
            report: BatchReport::default(),
        }
    }

    pub fn hiding(batch_size: usize) -> Self {
        Self::new(batch_size, true)
    }

    pub fn showing(batch_size: usize) -> Self {
        Self::new(batch_size, false)
    }

    /// Queue a row, flushing when the batch is full.
    pub fn push(&mut self, doc: &mut dyn HostDocument, row: usize) -> Result<(), HostError> {
        self.pending.push(row);
        if self.pending.len() >= self.batch_size {
            self.flush(doc)?;
        }
        Ok(())
    }

    /// Queue every row, then flush the final partial batch.
    pub fn extend<I>(&mut self, doc: &mut dyn HostDocument, rows: I) -> Result<(), HostError>
    where
        I: IntoIterator<Item = usize>,
    {
        for row in rows {
            self.push(doc, row)?;
        }
        self.flush(doc)
    }

    pub fn flush(&mut self, doc: &mut dyn HostDocument) -> Result<(), HostError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let rows = std::mem::take(&mut self.pending);
        let spans = coalesce_rows(&rows);
        self.report.flushes += 1;

        match doc.set_rows_hidden(&spans, self.hidden) {
            Ok(()) => {
                log::debug!(
                    "{} {} rows in {} spans",
                    if self.hidden { "hid" } else { "showed" },
                    rows.len(),
                    spans.len()
                );
                self.report.applied.extend(spans.iter().flat_map(RowSpan::rows));
                Ok(())
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                log::debug!("batch of {} rows rejected ({}), retrying per row", rows.len(), e);
                self.retry_rows(doc, spans)
            }
        }
    }

    fn retry_rows(&mut self, doc: &mut dyn HostDocument, spans: Vec<RowSpan>) -> Result<(), HostError> {
        for row in spans.iter().flat_map(RowSpan::rows) {
            match doc.set_rows_hidden(&[RowSpan::single(row)], self.hidden) {
                Ok(()) => self.report.applied.push(row),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    log::warn!("row {} left unchanged: {}", row, e);
                    self.report.skipped.push((row, e));
                }
            }
        }
        Ok(())
    }

    /// Rows applied so far. Valid after an error too: batches flushed before a
    /// fatal failure stay applied.
    pub fn applied(&self) -> &[usize] {
        &self.report.applied
    }

    pub fn report(&self) -> &BatchReport {
        &self.report
    }

    pub fn into_report(self) -> BatchReport {
        self.report
    }
}

/// Hide `rows` in batches of `batch_size`.
pub fn hide_rows(doc: &mut dyn HostDocument, rows: &[usize], batch_size: usize) -> Result<BatchReport, HostError> {
    let mut batcher = VisibilityBatcher::hiding(batch_size);
    batcher.extend(doc, rows.iter().copied())?;
    Ok(batcher.into_report())
}

/// Show `rows` in batches of `batch_size`.
pub fn show_rows(doc: &mut dyn HostDocument, rows: &[usize], batch_size: usize) -> Result<BatchReport, HostError> {
    let mut batcher = VisibilityBatcher::showing(batch_size);
    batcher.extend(doc, rows.iter().copied())?;
    Ok(batcher.into_report())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocument;

    fn doc_with_rows(n: usize) -> MemoryDocument {
        let mut doc = MemoryDocument::new("Book1", "Sheet1");
        for row in 1..=n {
            doc.set_cell(row, 1, &format!("v{row}"));
        }
        doc
    }

    #[test]
    fn test_flushes_per_batch_size() {
        let mut doc = doc_with_rows(200);
        let rows: Vec<usize> = (1..=120).collect();

        let report = hide_rows(&mut doc, &rows, 50).unwrap();
        assert_eq!(report.flushes, 3, "two full batches and one partial");
        assert_eq!(doc.hide_calls(), 3);
        assert_eq!(report.applied.len(), 120);
        assert!(report.skipped.is_empty());
        assert!((1..=120).all(|r| doc.is_hidden(r)));
        assert!(!doc.is_hidden(121));
    }

    #[test]
    fn test_partial_batch_always_flushed() {
        let mut doc = doc_with_rows(10);
        let report = hide_rows(&mut doc, &[2, 9], 50).unwrap();
        assert_eq!(report.flushes, 1);
        assert!(doc.is_hidden(2) && doc.is_hidden(9));
    }

    #[test]
    fn test_empty_input_makes_no_calls() {
        let mut doc = doc_with_rows(3);
        let report = hide_rows(&mut doc, &[], 50).unwrap();
        assert_eq!(report.flushes, 0);
        assert_eq!(doc.hide_calls(), 0);
    }

    #[test]
    fn test_locked_row_is_skipped_and_rest_applied() {
        let mut doc = doc_with_rows(10);
        doc.lock_row(5);

        let report = hide_rows(&mut doc, &[3, 4, 5, 6], 50).unwrap();
        assert_eq!(report.applied, vec![3, 4, 6]);
        assert_eq!(report.skipped, vec![(5, HostError::RowLocked { row: 5 })]);
        assert!(!doc.is_hidden(5));
        assert!(doc.is_hidden(4) && doc.is_hidden(6));
    }

    #[test]
    fn test_fatal_error_keeps_earlier_batches() {
        let mut doc = doc_with_rows(10);
        let mut batcher = VisibilityBatcher::hiding(2);
        batcher.push(&mut doc, 1).unwrap();
        batcher.push(&mut doc, 2).unwrap();
        doc.invalidate();

        let err = batcher.extend(&mut doc, [3, 4]).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(batcher.applied(), &[1, 2]);
    }

    #[test]
    fn test_show_rows() {
        let mut doc = doc_with_rows(5);
        hide_rows(&mut doc, &[1, 2, 3], 50).unwrap();
        let report = show_rows(&mut doc, &[1, 3], 50).unwrap();
        assert_eq!(report.applied, vec![1, 3]);
        assert!(!doc.is_hidden(1) && doc.is_hidden(2) && !doc.is_hidden(3));
    }
}
