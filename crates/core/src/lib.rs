//! Plain value types shared by the filter engine and its hosts.
//!
//! Rows and columns are 1-based, matching the numbering a spreadsheet user sees.

pub mod coords;
pub mod span;
pub mod style;

pub use coords::{CellRef, MergeBlock, SheetKey, UsedRange};
pub use span::{coalesce_rows, RowSpan};
pub use style::{HeaderStyle, Rgb};
