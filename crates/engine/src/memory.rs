//! In-memory worksheet implementing `HostDocument`.
//!
//! Holds everything the engine can touch: cell text, merge blocks, hidden
//! rows, header styles, notes, markers, the saved-format registry, and the
//! bulk/freeze modes. Rows and cells can be locked to simulate a protected
//! sheet, and the whole document can be invalidated to simulate a closed one.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use mergefilter_core::{CellRef, HeaderStyle, MergeBlock, RowSpan, SheetKey, UsedRange};

use crate::host::{HeaderSnapshot, HostDocument, HostError, Marker};

#[derive(Debug, Clone)]
pub struct MemoryDocument {
    key: SheetKey,
    cells: HashMap<(usize, usize), String>,
    merges: Vec<MergeBlock>,
    hidden: BTreeSet<usize>,
    styles: HashMap<(usize, usize), HeaderStyle>,
    notes: HashMap<(usize, usize), String>,
    markers: Vec<Marker>,
    /// "document!sheet" -> column -> serialized `HeaderSnapshot`
    registry: BTreeMap<String, BTreeMap<usize, String>>,
    bulk_update: bool,
    frozen_below: Option<usize>,
    locked_rows: HashSet<usize>,
    locked_cells: HashSet<CellRef>,
    unreadable: HashSet<CellRef>,
    invalid: bool,
    hide_calls: usize,
}

impl MemoryDocument {
    pub fn new(document: &str, sheet: &str) -> Self {
        Self {
            key: SheetKey::new(document, sheet),
            cells: HashMap::new(),
            merges: Vec::new(),
            hidden: BTreeSet::new(),
            styles: HashMap::new(),
            notes: HashMap::new(),
            markers: Vec::new(),
            registry: BTreeMap::new(),
            bulk_update: false,
            frozen_below: None,
            locked_rows: HashSet::new(),
            locked_cells: HashSet::new(),
            unreadable: HashSet::new(),
            invalid: false,
            hide_calls: 0,
        }
    }

    pub fn set_cell(&mut self, row: usize, col: usize, value: &str) {
        if value.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value.to_string());
        }
    }

    /// Write `values` down column `col`, starting at `first_row`.
    pub fn set_column(&mut self, col: usize, first_row: usize, values: &[&str]) {
        for (i, value) in values.iter().enumerate() {
            self.set_cell(first_row + i, col, value);
        }
    }

    /// Merge a block. Like a spreadsheet, only the anchor keeps its value.
    pub fn merge(&mut self, block: MergeBlock) -> Result<(), String> {
        if let Some(existing) = self.merges.iter().find(|m| m.overlaps(&block)) {
            return Err(format!(
                "block {}..{} overlaps existing merge at {}",
                block.anchor(),
                CellRef::new(block.last_row, block.last_col),
                existing.anchor()
            ));
        }
        let anchor = block.anchor();
        for row in block.first_row..=block.last_row {
            for col in block.first_col..=block.last_col {
                if (row, col) != (anchor.row, anchor.col) {
                    self.cells.remove(&(row, col));
                }
            }
        }
        self.merges.push(block);
        Ok(())
    }

    /// Hide a row the way a user would, outside the engine.
    pub fn hide_row(&mut self, row: usize) {
        self.hidden.insert(row);
    }

    pub fn is_hidden(&self, row: usize) -> bool {
        self.hidden.contains(&row)
    }

    pub fn hidden_rows(&self) -> Vec<usize> {
        self.hidden.iter().copied().collect()
    }

    pub fn set_style(&mut self, cell: CellRef, style: HeaderStyle) {
        self.styles.insert((cell.row, cell.col), style);
    }

    pub fn style(&self, cell: CellRef) -> HeaderStyle {
        self.styles.get(&(cell.row, cell.col)).cloned().unwrap_or_default()
    }

    pub fn lock_row(&mut self, row: usize) {
        self.locked_rows.insert(row);
    }

    pub fn unlock_row(&mut self, row: usize) {
        self.locked_rows.remove(&row);
    }

    pub fn lock_cell(&mut self, cell: CellRef) {
        self.locked_cells.insert(cell);
    }

    pub fn unlock_cell(&mut self, cell: CellRef) {
        self.locked_cells.remove(&cell);
    }

    pub fn make_unreadable(&mut self, cell: CellRef) {
        self.unreadable.insert(cell);
    }

    /// Every later call fails as if the document had been closed.
    pub fn invalidate(&mut self) {
        self.invalid = true;
    }

    /// Number of `set_rows_hidden` calls received.
    pub fn hide_calls(&self) -> usize {
        self.hide_calls
    }

    pub fn bulk_update(&self) -> bool {
        self.bulk_update
    }

    pub fn frozen_below(&self) -> Option<usize> {
        self.frozen_below
    }

    /// Saved header formats across all sheets.
    pub fn registry_len(&self) -> usize {
        self.registry.values().map(BTreeMap::len).sum()
    }

    fn check(&self) -> Result<(), HostError> {
        if self.invalid {
            Err(HostError::InvalidReference(format!("{} is no longer open", self.key)))
        } else {
            Ok(())
        }
    }

    fn check_cell(&self, cell: CellRef) -> Result<(), HostError> {
        self.check()?;
        if self.locked_cells.contains(&cell) {
            return Err(HostError::CellLocked { cell });
        }
        Ok(())
    }
}

impl HostDocument for MemoryDocument {
    fn sheet_key(&self) -> SheetKey {
        self.key.clone()
    }

    fn used_range(&self) -> Result<UsedRange, HostError> {
        self.check()?;

        let corners = self
            .cells
            .keys()
            .chain(self.styles.keys())
            .copied()
            .chain(self.merges.iter().map(|m| (m.last_row, m.last_col)));

        let mut range: Option<UsedRange> = None;
        for (row, col) in corners {
            range = Some(match range {
                None => UsedRange { first_row: row, first_col: col, last_row: row, last_col: col },
                Some(r) => UsedRange {
                    first_row: r.first_row.min(row),
                    first_col: r.first_col.min(col),
                    last_row: r.last_row.max(row),
                    last_col: r.last_col.max(col),
                },
            });
        }

        // An empty sheet reports A1, like a spreadsheet does
        Ok(range.unwrap_or(UsedRange { first_row: 1, first_col: 1, last_row: 1, last_col: 1 }))
    }

    fn cell_text(&self, cell: CellRef) -> Result<String, HostError> {
        self.check()?;
        if self.unreadable.contains(&cell) {
            return Err(HostError::ReadFailed { cell });
        }
        Ok(self.cells.get(&(cell.row, cell.col)).cloned().unwrap_or_default())
    }

    fn merge_area(&self, cell: CellRef) -> Option<MergeBlock> {
        self.merges.iter().find(|m| m.contains(cell.row, cell.col)).copied()
    }

    fn is_row_hidden(&self, row: usize) -> Result<bool, HostError> {
        self.check()?;
        Ok(self.hidden.contains(&row))
    }

    fn set_rows_hidden(&mut self, spans: &[RowSpan], hidden: bool) -> Result<(), HostError> {
        self.check()?;
        self.hide_calls += 1;

        // All or nothing, like a single host mutation
        if let Some(row) = spans
            .iter()
            .flat_map(RowSpan::rows)
            .find(|row| self.locked_rows.contains(row))
        {
            return Err(HostError::RowLocked { row });
        }

        for row in spans.iter().flat_map(RowSpan::rows) {
            if hidden {
                self.hidden.insert(row);
            } else {
                self.hidden.remove(&row);
            }
        }
        Ok(())
    }

    fn header_style(&self, cell: CellRef) -> Result<HeaderStyle, HostError> {
        self.check()?;
        Ok(self.style(cell))
    }

    fn set_header_style(&mut self, cell: CellRef, style: &HeaderStyle) -> Result<(), HostError> {
        self.check_cell(cell)?;
        self.styles.insert((cell.row, cell.col), style.clone());
        Ok(())
    }

    fn note(&self, cell: CellRef) -> Option<String> {
        self.notes.get(&(cell.row, cell.col)).cloned()
    }

    fn set_note(&mut self, cell: CellRef, text: &str) -> Result<(), HostError> {
        self.check_cell(cell)?;
        self.notes.insert((cell.row, cell.col), text.to_string());
        Ok(())
    }

    fn remove_note(&mut self, cell: CellRef) -> Result<(), HostError> {
        self.check_cell(cell)?;
        self.notes.remove(&(cell.row, cell.col));
        Ok(())
    }

    fn markers(&self) -> Vec<Marker> {
        self.markers.clone()
    }

    fn add_marker(&mut self, marker: Marker) -> Result<(), HostError> {
        self.check_cell(marker.anchor)?;
        self.markers.retain(|m| m.name != marker.name);
        self.markers.push(marker);
        Ok(())
    }

    fn remove_marker(&mut self, name: &str) -> Result<(), HostError> {
        self.check()?;
        self.markers.retain(|m| m.name != name);
        Ok(())
    }

    fn saved_header(&self, key: &SheetKey, col: usize) -> Option<HeaderSnapshot> {
        let json = self.registry.get(&key.to_string())?.get(&col)?;
        match serde_json::from_str(json) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                log::warn!("discarding unreadable saved format for {} column {}: {}", key, col, e);
                None
            }
        }
    }

    fn save_header(&mut self, key: &SheetKey, col: usize, snapshot: &HeaderSnapshot) -> Result<(), HostError> {
        self.check()?;
        let json = serde_json::to_string(snapshot).map_err(|e| HostError::InvalidReference(e.to_string()))?;
        self.registry.entry(key.to_string()).or_default().insert(col, json);
        Ok(())
    }

    fn forget_header(&mut self, key: &SheetKey, col: usize) {
        let name = key.to_string();
        if let Some(columns) = self.registry.get_mut(&name) {
            columns.remove(&col);
            if columns.is_empty() {
                self.registry.remove(&name);
            }
        }
    }

    fn set_bulk_update(&mut self, on: bool) -> bool {
        std::mem::replace(&mut self.bulk_update, on)
    }

    fn freeze_below(&mut self, row: usize) -> Result<(), HostError> {
        self.check()?;
        self.frozen_below = Some(row);
        Ok(())
    }

    fn unfreeze(&mut self) -> Result<(), HostError> {
        self.check()?;
        self.frozen_below = None;
        Ok(())
    }
}
