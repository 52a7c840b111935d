//! User-visible messages.
//!
//! The engine never shows UI itself; it hands notices to a `Feedback`
//! implementation supplied by the host.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Confirmation after an explicit (non-silent) clear.
    FiltersCleared,
    /// An operation was aborted. One notice per failure.
    Failure { operation: String, message: String },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::FiltersCleared => write!(f, "Filters cleared."),
            Notice::Failure { operation, message } => write!(f, "Filter could not {}: {}", operation, message),
        }
    }
}

pub trait Feedback {
    fn notify(&mut self, notice: Notice);
}

/// Drops every notice.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentFeedback;

impl Feedback for SilentFeedback {
    fn notify(&mut self, _notice: Notice) {}
}

/// Keeps every notice, for hosts that show them later and for tests.
#[derive(Debug, Default)]
pub struct FeedbackLog {
    notices: Vec<Notice>,
}

impl FeedbackLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn failures(&self) -> Vec<&Notice> {
        self.notices
            .iter()
            .filter(|n| matches!(n, Notice::Failure { .. }))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }
}

impl Feedback for FeedbackLog {
    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_collects() {
        let mut log = FeedbackLog::new();
        log.notify(Notice::FiltersCleared);
        log.notify(Notice::Failure {
            operation: "hide rows".into(),
            message: "row 9 is locked".into(),
        });
        assert_eq!(log.len(), 2);
        assert_eq!(log.failures().len(), 1);
        assert_eq!(log.notices()[0].to_string(), "Filters cleared.");
        assert_eq!(log.notices()[1].to_string(), "Filter could not hide rows: row 9 is locked");
    }
}
