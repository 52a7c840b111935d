// Filter settings
// Loaded from ~/.config/mergefilter/settings.json

use mergefilter_core::Rgb;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_MARKER_PREFIX: &str = "MergeFilterMarker_";
pub const DEFAULT_NOTE_PREFIX: &str = "Filtered:";

const DEFAULT_HEADER_FILL: Rgb = Rgb::from_hex(0xFFFFCC);
const DEFAULT_HEADER_FONT: Rgb = Rgb::BLACK;
const DEFAULT_MARKER_FILL: Rgb = Rgb::from_hex(0x646464);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Rows accumulated before a hide is flushed to the document
    #[serde(rename = "filter.batchSize")]
    pub batch_size: usize,

    /// Freeze panes below the header after an interactive filter
    #[serde(rename = "filter.freezeHeader")]
    pub freeze_header: bool,

    /// Marker names are `<prefix><column>`
    #[serde(rename = "marker.prefix")]
    pub marker_prefix: String,

    #[serde(rename = "marker.fillColor")]
    pub marker_fill: String,

    #[serde(rename = "header.fillColor")]
    pub header_fill: String,

    #[serde(rename = "header.fontColor")]
    pub header_font: String,

    /// First line of the note attached to a filtered header
    #[serde(rename = "note.prefix")]
    pub note_prefix: String,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            freeze_header: true,
            marker_prefix: DEFAULT_MARKER_PREFIX.to_string(),
            marker_fill: DEFAULT_MARKER_FILL.to_hex_string(),
            header_fill: DEFAULT_HEADER_FILL.to_hex_string(),
            header_font: DEFAULT_HEADER_FONT.to_hex_string(),
            note_prefix: DEFAULT_NOTE_PREFIX.to_string(),
        }
    }
}

impl FilterSettings {
    /// Batch size, never below one row
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }

    pub fn header_fill_rgb(&self) -> Rgb {
        parse_color("header.fillColor", &self.header_fill, DEFAULT_HEADER_FILL)
    }

    pub fn header_font_rgb(&self) -> Rgb {
        parse_color("header.fontColor", &self.header_font, DEFAULT_HEADER_FONT)
    }

    pub fn marker_fill_rgb(&self) -> Rgb {
        parse_color("marker.fillColor", &self.marker_fill, DEFAULT_MARKER_FILL)
    }

    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mergefilter")
            .join("settings.json")
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("Error parsing {}: {}; using default settings", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned)
    }

    /// Save current settings to the default location
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }
}

fn parse_color(key: &str, value: &str, fallback: Rgb) -> Rgb {
    match Rgb::parse(value) {
        Some(rgb) => rgb,
        None => {
            log::warn!("Invalid colour {:?} for {}; using {}", value, key, fallback.to_hex_string());
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = FilterSettings::default();
        assert_eq!(settings.effective_batch_size(), 50);
        assert!(settings.freeze_header);
        assert_eq!(settings.header_fill_rgb(), Rgb::new(255, 255, 204));
        assert_eq!(settings.header_font_rgb(), Rgb::BLACK);
        assert_eq!(settings.marker_fill_rgb(), Rgb::new(100, 100, 100));
        assert_eq!(settings.marker_prefix, "MergeFilterMarker_");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            // smaller batches for a slow host
            "filter.batchSize": 10,
            "note.prefix": "Gefiltert:"
        }"#;
        let settings = FilterSettings::from_json(json).unwrap();
        assert_eq!(settings.batch_size, 10);
        assert_eq!(settings.note_prefix, "Gefiltert:");
        assert_eq!(settings.marker_prefix, DEFAULT_MARKER_PREFIX);
        assert!(settings.freeze_header);
    }

    #[test]
    fn test_zero_batch_size_clamps() {
        let settings = FilterSettings::from_json(r#"{"filter.batchSize": 0}"#).unwrap();
        assert_eq!(settings.effective_batch_size(), 1);
    }

    #[test]
    fn test_invalid_colour_falls_back() {
        let settings = FilterSettings::from_json(r##"{"header.fillColor": "amber"}"##).unwrap();
        assert_eq!(settings.header_fill_rgb(), DEFAULT_HEADER_FILL);
    }

    #[test]
    fn test_save_and_load_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = FilterSettings::default();
        settings.batch_size = 200;
        settings.freeze_header = false;
        settings.save_to(&path).unwrap();

        let loaded = FilterSettings::load_from(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_or_broken_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert_eq!(FilterSettings::load_from(&missing), FilterSettings::default());

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert_eq!(FilterSettings::load_from(&broken), FilterSettings::default());
    }
}
