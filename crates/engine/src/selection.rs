//! The value-picker seam.
//!
//! Picking values is a blocking call: the engine hands over the candidate list
//! and waits for either a confirmed selection or a cancellation.

use crate::filter::{CandidateList, FilterSelection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Confirmed(FilterSelection),
    Cancelled,
}

pub trait SelectionCollector {
    /// Ask for the values to keep. `preselected` is the column's previous
    /// selection, if it had one.
    fn collect(&mut self, candidates: &CandidateList, preselected: Option<&FilterSelection>) -> Selection;
}

impl<F> SelectionCollector for F
where
    F: FnMut(&CandidateList, Option<&FilterSelection>) -> Selection,
{
    fn collect(&mut self, candidates: &CandidateList, preselected: Option<&FilterSelection>) -> Selection {
        self(candidates, preselected)
    }
}

/// Collector with a predetermined answer, for automation and tests.
/// Records what it was shown.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCollector {
    answer: Option<Vec<String>>,
    shown: Vec<Vec<String>>,
    preselections: Vec<Option<Vec<String>>>,
}

impl ScriptedCollector {
    /// Confirm `values` every time.
    pub fn confirm<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answer: Some(values.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Cancel every time.
    pub fn cancel() -> Self {
        Self::default()
    }

    /// Candidate lists offered so far, one per call.
    pub fn shown(&self) -> &[Vec<String>] {
        &self.shown
    }

    /// Preselections offered so far, one per call.
    pub fn preselections(&self) -> &[Option<Vec<String>>] {
        &self.preselections
    }

    pub fn calls(&self) -> usize {
        self.shown.len()
    }
}

impl SelectionCollector for ScriptedCollector {
    fn collect(&mut self, candidates: &CandidateList, preselected: Option<&FilterSelection>) -> Selection {
        self.shown.push(candidates.values().to_vec());
        self.preselections.push(preselected.map(FilterSelection::to_vec));

        match &self.answer {
            Some(values) => Selection::Confirmed(FilterSelection::from_values(values)),
            None => Selection::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_collector() {
        let mut picker = |candidates: &CandidateList, _: Option<&FilterSelection>| {
            Selection::Confirmed(FilterSelection::from_values(candidates.narrow("an")))
        };
        let list = CandidateList::from_values(["Banana", "Cherry", "Mango"]);
        match picker.collect(&list, None) {
            Selection::Confirmed(sel) => assert_eq!(sel.to_vec(), vec!["Banana", "Mango"]),
            Selection::Cancelled => panic!("expected a selection"),
        }
    }

    #[test]
    fn test_scripted_records_calls() {
        let mut collector = ScriptedCollector::confirm(["a"]);
        let list = CandidateList::from_values(["A", "b"]);
        let previous = FilterSelection::from_values(["b"]);

        let answer = collector.collect(&list, Some(&previous));
        assert_eq!(answer, Selection::Confirmed(FilterSelection::from_values(["a"])));
        assert_eq!(collector.calls(), 1);
        assert_eq!(collector.shown()[0], vec!["A", "b"]);
        assert_eq!(collector.preselections()[0], Some(vec!["b".to_string()]));
    }

    #[test]
    fn test_scripted_cancel() {
        let mut collector = ScriptedCollector::cancel();
        let list = CandidateList::from_values(["x"]);
        assert_eq!(collector.collect(&list, None), Selection::Cancelled);
    }
}
