// Property-based tests for multi-column filtering.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::BTreeSet;

use proptest::prelude::*;

use mergefilter_core::{CellRef, HeaderStyle, MergeBlock, Rgb};
use mergefilter_engine::feedback::SilentFeedback;
use mergefilter_engine::{ApplyOutcome, FilterEngine, FilterStateStore, HostDocument, MemoryDocument, ScriptedCollector};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

const COLUMNS: usize = 3;

/// Cell value from a small alphabet so selections overlap, with case noise.
fn arb_filled_value() -> BoxedStrategy<String> {
    prop::sample::select(vec!["red", "Red", " blue", "BLUE", "green "])
        .prop_map(String::from)
        .boxed()
}

/// Like `arb_filled_value`, sometimes empty.
fn arb_value() -> BoxedStrategy<String> {
    prop_oneof![
        3 => arb_filled_value(),
        1 => Just(String::new()),
    ]
    .boxed()
}

fn arb_selection() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::btree_set(prop::sample::select(vec!["red", "blue", "green"]), 0..=3)
        .prop_map(|set| set.into_iter().map(String::from).collect())
}

#[derive(Debug, Clone)]
struct Sheet {
    /// rows[i][c] is the value at row i + 2, column c + 1
    rows: Vec<Vec<String>>,
    user_hidden: BTreeSet<usize>,
    /// Vertical merge in column 1: (first_row, height)
    merge: Option<(usize, usize)>,
}

fn arb_sheet() -> impl Strategy<Value = Sheet> {
    arb_sheet_of(arb_value)
}

/// Sheets without blank cells. A column whose visible rows are all blank
/// offers no candidates, which is the one case where order can matter.
fn arb_filled_sheet() -> impl Strategy<Value = Sheet> {
    arb_sheet_of(arb_filled_value)
}

fn arb_sheet_of(value: fn() -> BoxedStrategy<String>) -> impl Strategy<Value = Sheet> {
    (2usize..=24)
        .prop_flat_map(move |n| {
            (
                proptest::collection::vec(proptest::collection::vec(value(), COLUMNS), n),
                proptest::collection::btree_set(2..n + 2, 0..=n / 3),
                proptest::option::of((2..n + 2, 2usize..=4)),
            )
        })
        .prop_map(|(rows, user_hidden, merge)| {
            let last = rows.len() + 1;
            Sheet {
                merge: merge.map(|(first, height)| (first, height.min(last + 1 - first))),
                rows,
                user_hidden,
            }
        })
}

fn build(sheet: &Sheet) -> MemoryDocument {
    let mut doc = MemoryDocument::new("Book1", "Sheet1");
    for col in 1..=COLUMNS {
        doc.set_cell(1, col, &format!("H{col}"));
        doc.set_style(
            CellRef::new(1, col),
            HeaderStyle {
                fill: Some(Rgb::new(col as u8 * 40, 10, 10)),
                font_color: None,
                bold: col % 2 == 0,
                italic: false,
            },
        );
    }
    for (i, values) in sheet.rows.iter().enumerate() {
        for (c, value) in values.iter().enumerate() {
            doc.set_cell(i + 2, c + 1, value);
        }
        // Keeps every row inside the used range
        doc.set_cell(i + 2, COLUMNS + 1, &format!("r{}", i + 2));
    }
    if let Some((first, height)) = sheet.merge {
        if height > 1 {
            doc.merge(MergeBlock::new(first, 1, first + height - 1, 1)).unwrap();
        }
    }
    for &row in &sheet.user_hidden {
        doc.hide_row(row);
    }
    doc
}

fn apply_all(doc: &mut MemoryDocument, store: &mut FilterStateStore, steps: &[(usize, Vec<String>)]) {
    let engine = FilterEngine::default();
    for (col, values) in steps {
        let outcome = engine
            .apply_filter(
                store,
                doc,
                CellRef::new(1, *col),
                &mut ScriptedCollector::confirm(values.clone()),
                &mut SilentFeedback,
            )
            .unwrap();
        assert!(!matches!(outcome, ApplyOutcome::Cancelled));
    }
}

/// Rows a column's selection excludes, judged on the logical (merge-filled)
/// value. Empty values are always excluded.
fn excluded_by(sheet: &Sheet, col: usize, selection: &[String]) -> BTreeSet<usize> {
    let logical = |row: usize| -> String {
        let source = match sheet.merge {
            Some((first, height)) if col == 1 && row >= first && row < first + height => first,
            _ => row,
        };
        sheet.rows[source - 2][col - 1].trim().to_lowercase()
    };
    (2..sheet.rows.len() + 2)
        .filter(|&row| {
            let value = logical(row);
            value.is_empty() || !selection.iter().any(|s| s.to_lowercase() == value)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    /// Visible rows are the rows visible before filtering that every stored
    /// selection keeps.
    #[test]
    fn prop_visible_rows_are_the_intersection(
        sheet in arb_sheet(),
        steps in proptest::collection::vec((1usize..=COLUMNS, arb_selection()), 1..=5),
    ) {
        let mut doc = build(&sheet);
        let mut store = FilterStateStore::new();
        apply_all(&mut doc, &mut store, &steps);

        let key = doc.sheet_key();
        let mut expected_hidden = sheet.user_hidden.clone();
        for (&col, selection) in store.filters(&key) {
            expected_hidden.extend(excluded_by(&sheet, col, &selection.to_vec()));
        }
        let hidden: BTreeSet<usize> = doc.hidden_rows().into_iter().collect();
        prop_assert_eq!(hidden, expected_hidden);
    }

    /// Applying two column filters in either order hides the same rows.
    #[test]
    fn prop_column_order_does_not_matter(
        sheet in arb_filled_sheet(),
        first in arb_selection(),
        second in arb_selection(),
    ) {
        let mut forward = build(&sheet);
        let mut store = FilterStateStore::new();
        apply_all(&mut forward, &mut store, &[(1, first.clone()), (2, second.clone())]);

        let mut backward = build(&sheet);
        let mut store = FilterStateStore::new();
        apply_all(&mut backward, &mut store, &[(2, second), (1, first)]);

        prop_assert_eq!(forward.hidden_rows(), backward.hidden_rows());
    }

    /// Clearing returns every row, header and marker to its pre-filter state,
    /// and clearing twice changes nothing more.
    #[test]
    fn prop_clear_restores_the_sheet(
        sheet in arb_sheet(),
        steps in proptest::collection::vec((1usize..=COLUMNS, arb_selection()), 0..=6),
    ) {
        let mut doc = build(&sheet);
        let pristine = doc.clone();
        let mut store = FilterStateStore::new();
        apply_all(&mut doc, &mut store, &steps);

        let engine = FilterEngine::default();
        engine.clear_filter(&mut store, &mut doc, true, &mut SilentFeedback).unwrap();
        let once = doc.hidden_rows();
        engine.clear_filter(&mut store, &mut doc, true, &mut SilentFeedback).unwrap();

        prop_assert_eq!(doc.hidden_rows(), pristine.hidden_rows());
        prop_assert_eq!(once, pristine.hidden_rows());
        for col in 1..=COLUMNS {
            let header = CellRef::new(1, col);
            prop_assert_eq!(doc.style(header), pristine.style(header));
            prop_assert_eq!(doc.note(header), None);
        }
        prop_assert!(doc.markers().is_empty());
        prop_assert_eq!(doc.registry_len(), 0);
        prop_assert!(store.state(&doc.sheet_key()).is_none());
    }
}
