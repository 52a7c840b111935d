//! Sheet identity and cell coordinates.

use serde::{Deserialize, Serialize};

/// Identity of one worksheet inside one open document.
///
/// Filter state and saved header formats are keyed by this pair, so two sheets
/// with the same name in different documents never share state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SheetKey {
    pub document: String,
    pub sheet: String,
}

impl SheetKey {
    pub fn new(document: impl Into<String>, sheet: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            sheet: sheet.into(),
        }
    }
}

impl std::fmt::Display for SheetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}!{}", self.document, self.sheet)
    }
}

/// A single cell (1-based row and column).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    #[inline]
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl std::fmt::Display for CellRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", col_to_letters(self.col), self.row)
    }
}

/// Convert a 1-based column number to Excel-style letter(s): 1=A, 26=Z, 27=AA.
pub fn col_to_letters(col: usize) -> String {
    if col == 0 {
        return String::from("?");
    }
    let mut result = String::new();
    let mut n = col - 1;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Rectangular merge block. The anchor is the top-left cell and carries the
/// block's only value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MergeBlock {
    pub first_row: usize,
    pub first_col: usize,
    pub last_row: usize,
    pub last_col: usize,
}

impl MergeBlock {
    /// Build a block from two corners in any order.
    pub fn new(row_a: usize, col_a: usize, row_b: usize, col_b: usize) -> Self {
        Self {
            first_row: row_a.min(row_b),
            first_col: col_a.min(col_b),
            last_row: row_a.max(row_b),
            last_col: col_a.max(col_b),
        }
    }

    pub fn anchor(&self) -> CellRef {
        CellRef::new(self.first_row, self.first_col)
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.first_row && row <= self.last_row && col >= self.first_col && col <= self.last_col
    }

    /// Number of physical rows covered by the block.
    pub fn height(&self) -> usize {
        self.last_row - self.first_row + 1
    }

    pub fn overlaps(&self, other: &MergeBlock) -> bool {
        self.first_row <= other.last_row
            && other.first_row <= self.last_row
            && self.first_col <= other.last_col
            && other.first_col <= self.last_col
    }
}

/// Bounds of the region of a sheet that holds any content or formatting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedRange {
    pub first_row: usize,
    pub first_col: usize,
    pub last_row: usize,
    pub last_col: usize,
}

impl UsedRange {
    /// Data rows below `header_row`, or `None` when the used range ends at or
    /// above the header.
    pub fn data_rows_below(&self, header_row: usize) -> Option<std::ops::RangeInclusive<usize>> {
        if self.last_row <= header_row {
            None
        } else {
            Some(header_row + 1..=self.last_row)
        }
    }
}
