//! Filter selections and candidate lists.
//!
//! Values are compared in normalized form (trimmed, lowercase) and displayed
//! in the form first seen. The empty value never takes part: it is never a
//! candidate and never selected, so rows holding it are hidden whenever a
//! selection is applied to their column.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Normalized form for equality and ordering.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

// =============================================================================
// FilterSelection: values kept visible in one column
// =============================================================================

/// The set of values a user chose to keep visible for one column.
/// Membership is case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    /// normalized -> display (first seen)
    values: BTreeMap<String, String>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selection = Self::new();
        for value in values {
            selection.insert(value.as_ref());
        }
        selection
    }

    /// Add a value. Blank values are ignored; a value equal to one already
    /// present (ignoring case) keeps the existing display form.
    pub fn insert(&mut self, value: &str) -> bool {
        let key = normalize(value);
        if key.is_empty() || self.values.contains_key(&key) {
            return false;
        }
        self.values.insert(key, value.trim().to_string());
        true
    }

    pub fn contains(&self, value: &str) -> bool {
        let key = normalize(value);
        !key.is_empty() && self.values.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Display values in case-insensitive alphabetical order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.values().map(|s| s.as_str())
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.values().map(str::to_string).collect()
    }
}

// =============================================================================
// CandidateList: distinct values offered for selection
// =============================================================================

/// Distinct non-empty values of a column, deduplicated case-insensitively and
/// sorted alphabetically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateList {
    values: Vec<String>,
}

impl CandidateList {
    pub fn from_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        // Keep first raw display for each normalized key
        let mut seen: BTreeMap<String, String> = BTreeMap::new();
        for value in values {
            let key = normalize(value);
            if key.is_empty() {
                continue;
            }
            seen.entry(key).or_insert_with(|| value.trim().to_string());
        }

        Self {
            values: seen.into_values().collect(),
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        let key = normalize(value);
        self.values.iter().any(|v| normalize(v) == key)
    }

    /// Live substring narrowing for a picker's search box.
    /// Trimmed, case-insensitive; an empty term returns everything.
    pub fn narrow(&self, term: &str) -> Vec<&str> {
        let needle = normalize(term);
        self.values
            .iter()
            .filter(|v| needle.is_empty() || v.to_lowercase().contains(&needle))
            .map(|s| s.as_str())
            .collect()
    }

    /// Positions of previously selected values, for pre-selecting list items.
    /// Previous values no longer present are dropped.
    pub fn preselected_indices(&self, previous: &FilterSelection) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| previous.contains(v))
            .map(|(i, _)| i)
            .collect()
    }

    /// A selection keeping every candidate.
    pub fn select_all(&self) -> FilterSelection {
        FilterSelection::from_values(&self.values)
    }
}

// =============================================================================
// Tests
// =============================================================================
