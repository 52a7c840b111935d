//! Logical values of a column.
//!
//! A row that belongs to a merge block takes the value of the block's anchor
//! cell, so every physical row of a merged block filters as one logical row.

use mergefilter_core::{CellRef, MergeBlock};

use crate::host::HostDocument;

/// Logical values for the rows `first_row..=last_row` of one column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicalColumn {
    pub col: usize,
    first_row: usize,
    values: Vec<String>,
    /// Rows whose value could not be read (treated as empty)
    unreadable: Vec<usize>,
}

impl LogicalColumn {
    /// Value at `row`, or `None` outside the extracted range.
    pub fn get(&self, row: usize) -> Option<&str> {
        row.checked_sub(self.first_row)
            .and_then(|i| self.values.get(i))
            .map(|s| s.as_str())
    }

    /// `(row, value)` pairs in row order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.values
            .iter()
            .enumerate()
            .map(move |(i, v)| (self.first_row + i, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn unreadable(&self) -> &[usize] {
        &self.unreadable
    }
}

/// Read the logical value of every row in `first_row..=last_row` at `col`.
/// Values are trimmed; blanks and unreadable cells become the empty string.
pub fn extract(doc: &dyn HostDocument, col: usize, first_row: usize, last_row: usize) -> LogicalColumn {
    let mut column = LogicalColumn {
        col,
        first_row,
        values: Vec::with_capacity(last_row.saturating_sub(first_row) + 1),
        unreadable: Vec::new(),
    };
    if last_row < first_row {
        return column;
    }

    // Merged blocks are contiguous, so the last block seen answers every
    // following row it still contains without another anchor read.
    let mut current_block: Option<(MergeBlock, String)> = None;

    for row in first_row..=last_row {
        let cell = CellRef::new(row, col);

        if let Some((block, value)) = &current_block {
            if block.contains(row, col) {
                column.values.push(value.clone());
                continue;
            }
        }

        let (source, block) = match doc.merge_area(cell) {
            Some(block) => (block.anchor(), Some(block)),
            None => (cell, None),
        };

        let value = match doc.cell_text(source) {
            Ok(text) => text.trim().to_string(),
            Err(_) => {
                column.unreadable.push(row);
                String::new()
            }
        };

        current_block = block.map(|b| (b, value.clone()));
        column.values.push(value);
    }

    column
}
