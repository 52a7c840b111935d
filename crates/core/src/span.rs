//! Contiguous row spans.
//!
//! Row visibility is mutated span-wise: a host can hide `5..=40` in one call
//! where per-row updates would take 36.

use serde::{Deserialize, Serialize};

/// Inclusive run of rows `start..=end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowSpan {
    pub start: usize,
    pub end: usize,
}

impl RowSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    pub fn single(row: usize) -> Self {
        Self { start: row, end: row }
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, row: usize) -> bool {
        row >= self.start && row <= self.end
    }

    pub fn rows(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }
}

impl std::fmt::Display for RowSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

/// Union a set of row numbers into the fewest contiguous spans, ascending.
/// Input order and duplicates do not matter.
pub fn coalesce_rows(rows: &[usize]) -> Vec<RowSpan> {
    let mut sorted = rows.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut spans: Vec<RowSpan> = Vec::new();
    for row in sorted {
        match spans.last_mut() {
            Some(last) if last.end + 1 == row => last.end = row,
            _ => spans.push(RowSpan::single(row)),
        }
    }
    spans
}
