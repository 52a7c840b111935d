//! The narrow interface the filter engine needs from a spreadsheet host.
//!
//! One `HostDocument` is one worksheet of an open document. The engine only
//! reads cell values and merge blocks, flips row-hidden flags, and touches the
//! header cells it marks. Everything else about the document is the host's.

use mergefilter_core::{CellRef, HeaderStyle, MergeBlock, Rgb, RowSpan, SheetKey, UsedRange};
use serde::{Deserialize, Serialize};

/// Error reported by a host call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Row visibility could not be changed (protected sheet, locked row).
    RowLocked { row: usize },
    /// A cell's formatting, note or marker could not be written.
    CellLocked { cell: CellRef },
    /// A cell value could not be read.
    ReadFailed { cell: CellRef },
    /// The document or sheet reference is no longer valid.
    InvalidReference(String),
}

impl HostError {
    /// Fatal errors abort the current operation. All others are recovered by
    /// skipping the affected row or cell.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HostError::InvalidReference(_))
    }
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::RowLocked { row } => write!(f, "row {} is locked", row),
            HostError::CellLocked { cell } => write!(f, "cell {} is locked", cell),
            HostError::ReadFailed { cell } => write!(f, "cell {} could not be read", cell),
            HostError::InvalidReference(msg) => write!(f, "invalid document reference: {}", msg),
        }
    }
}

impl std::error::Error for HostError {}

/// A small graphic anchored to a header cell, marking the column as filtered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub name: String,
    pub anchor: CellRef,
    pub fill: Rgb,
}

/// What a header looked like before the engine first marked it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSnapshot {
    pub style: HeaderStyle,
    /// Note the user had on the header, if any
    pub note: Option<String>,
}

pub trait HostDocument {
    /// Document and sheet name of this worksheet.
    fn sheet_key(&self) -> SheetKey;

    fn used_range(&self) -> Result<UsedRange, HostError>;

    /// Raw display text of a cell (empty for blank cells).
    fn cell_text(&self, cell: CellRef) -> Result<String, HostError>;

    /// The merge block containing `cell`, or `None` if the cell is not merged.
    fn merge_area(&self, cell: CellRef) -> Option<MergeBlock>;

    fn is_row_hidden(&self, row: usize) -> Result<bool, HostError>;

    /// Set the hidden flag of every row in `spans` in a single mutation.
    fn set_rows_hidden(&mut self, spans: &[RowSpan], hidden: bool) -> Result<(), HostError>;

    fn header_style(&self, cell: CellRef) -> Result<HeaderStyle, HostError>;

    fn set_header_style(&mut self, cell: CellRef, style: &HeaderStyle) -> Result<(), HostError>;

    fn note(&self, cell: CellRef) -> Option<String>;

    /// Attach `text` as the cell's note, replacing any existing note.
    fn set_note(&mut self, cell: CellRef, text: &str) -> Result<(), HostError>;

    fn remove_note(&mut self, cell: CellRef) -> Result<(), HostError>;

    fn markers(&self) -> Vec<Marker>;

    fn find_marker(&self, name: &str) -> Option<Marker> {
        self.markers().into_iter().find(|m| m.name == name)
    }

    /// Add a marker, replacing one with the same name.
    fn add_marker(&mut self, marker: Marker) -> Result<(), HostError>;

    fn remove_marker(&mut self, name: &str) -> Result<(), HostError>;

    /// Saved header formats live in a hidden per-document registry keyed by
    /// sheet identity and column.
    fn saved_header(&self, key: &SheetKey, col: usize) -> Option<HeaderSnapshot>;

    fn save_header(&mut self, key: &SheetKey, col: usize, snapshot: &HeaderSnapshot) -> Result<(), HostError>;

    fn forget_header(&mut self, key: &SheetKey, col: usize);

    /// Suspend (or resume) screen updates and recalculation while many rows
    /// change. Returns the previous mode so callers can restore it.
    fn set_bulk_update(&mut self, on: bool) -> bool;

    /// Freeze panes so rows up to and including `row` stay in view.
    fn freeze_below(&mut self, row: usize) -> Result<(), HostError>;

    fn unfreeze(&mut self) -> Result<(), HostError>;
}

/// Swallow a non-fatal host error after logging it; pass fatal ones through.
pub(crate) fn best_effort(result: Result<(), HostError>, what: &str) -> Result<(), HostError> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            log::warn!("{} skipped: {}", what, e);
            Ok(())
        }
    }
}
