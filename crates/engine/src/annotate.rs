//! Header markers for filtered columns.
//!
//! Marking a header saves its formatting (and any note the user had) into the
//! document's registry the first time, then highlights it, attaches a note
//! listing the kept values and anchors a small marker to it. Clearing walks
//! the markers and puts every header back the way the registry remembers it.
//!
//! Failures writing a single header are cosmetic: they are logged and skipped.

use mergefilter_config::FilterSettings;
use mergefilter_core::{CellRef, HeaderStyle, Rgb, SheetKey};

use crate::filter::FilterSelection;
use crate::host::{best_effort, HeaderSnapshot, HostDocument, HostError, Marker};

#[derive(Debug, Clone)]
pub struct AnnotationManager {
    marker_prefix: String,
    note_prefix: String,
    header_fill: Rgb,
    header_font: Rgb,
    marker_fill: Rgb,
}

impl AnnotationManager {
    pub fn from_settings(settings: &FilterSettings) -> Self {
        Self {
            marker_prefix: settings.marker_prefix.clone(),
            note_prefix: settings.note_prefix.clone(),
            header_fill: settings.header_fill_rgb(),
            header_font: settings.header_font_rgb(),
            marker_fill: settings.marker_fill_rgb(),
        }
    }

    pub fn marker_name(&self, col: usize) -> String {
        format!("{}{}", self.marker_prefix, col)
    }

    /// `"Filtered:\n{a, b}"`
    pub fn note_text(&self, selection: &FilterSelection) -> String {
        let values: Vec<&str> = selection.values().collect();
        format!("{}\n{{{}}}", self.note_prefix, values.join(", "))
    }

    fn is_our_note(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.note_prefix.to_lowercase())
    }

    /// Mark the header at (`header_row`, `col`) as filtered by `selection`.
    pub fn mark_filtered(
        &self,
        doc: &mut dyn HostDocument,
        header_row: usize,
        col: usize,
        selection: &FilterSelection,
    ) -> Result<(), HostError> {
        let key = doc.sheet_key();
        let header = CellRef::new(header_row, col);

        // First save wins: a header already in the registry keeps the
        // formatting it had before any marker touched it.
        if doc.saved_header(&key, col).is_none() {
            match doc.header_style(header) {
                Ok(style) => {
                    let snapshot = HeaderSnapshot {
                        style,
                        note: doc.note(header),
                    };
                    best_effort(doc.save_header(&key, col, &snapshot), "saving header format")?;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => log::warn!("header {} format not saved: {}", header, e),
            }
        }

        let current = match doc.header_style(header) {
            Ok(style) => style,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log::warn!("header {} format unreadable: {}", header, e);
                HeaderStyle::default()
            }
        };
        let highlighted = HeaderStyle {
            fill: Some(self.header_fill),
            font_color: Some(self.header_font),
            ..current
        };
        best_effort(doc.set_header_style(header, &highlighted), "highlighting header")?;
        best_effort(doc.set_note(header, &self.note_text(selection)), "writing header note")?;

        let name = self.marker_name(col);
        if doc.find_marker(&name).is_some() {
            best_effort(doc.remove_marker(&name), "replacing marker")?;
        }
        let marker = Marker {
            name,
            anchor: header,
            fill: self.marker_fill,
        };
        match doc.add_marker(marker) {
            Ok(()) => Ok(()),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                // Without a marker clear cannot find this header, so undo it now
                log::warn!("header {} not marked: {}", header, e);
                self.restore_header(doc, &key, header)
            }
        }
    }

    /// Remove every marker and restore each marked header. Saved formats left
    /// for `columns` without a marker are dropped too. Returns the number of
    /// markers removed.
    pub fn clear_all_and_restore(&self, doc: &mut dyn HostDocument, columns: &[usize]) -> Result<usize, HostError> {
        let key = doc.sheet_key();
        let ours: Vec<Marker> = doc
            .markers()
            .into_iter()
            .filter(|m| m.name.starts_with(&self.marker_prefix))
            .collect();

        let mut removed = 0;
        for marker in ours {
            self.restore_header(doc, &key, marker.anchor)?;
            best_effort(doc.remove_marker(&marker.name), "removing marker")?;
            removed += 1;
        }

        for &col in columns {
            if doc.saved_header(&key, col).is_some() {
                log::warn!("{}: dropping saved format of unmarked column {}", key, col);
                doc.forget_header(&key, col);
            }
        }
        Ok(removed)
    }

    /// Put `header` back the way the registry remembers it and forget the entry.
    fn restore_header(&self, doc: &mut dyn HostDocument, key: &SheetKey, header: CellRef) -> Result<(), HostError> {
        match doc.saved_header(key, header.col) {
            Some(snapshot) => {
                best_effort(doc.set_header_style(header, &snapshot.style), "restoring header format")?;
                match &snapshot.note {
                    Some(note) => best_effort(doc.set_note(header, note), "restoring header note")?,
                    None => self.remove_our_note(doc, header)?,
                }
            }
            None => {
                log::warn!("no saved format for header {}; leaving its style", header);
                self.remove_our_note(doc, header)?;
            }
        }
        doc.forget_header(key, header.col);
        Ok(())
    }

    fn remove_our_note(&self, doc: &mut dyn HostDocument, header: CellRef) -> Result<(), HostError> {
        match doc.note(header) {
            Some(text) if self.is_our_note(&text) => best_effort(doc.remove_note(header), "removing header note"),
            _ => Ok(()),
        }
    }
}
