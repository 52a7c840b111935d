use std::fmt;

use crate::host::HostError;

/// Errors that abort a filter operation.
///
/// Cancelled selections and columns with nothing to filter are not errors;
/// see `ApplyOutcome`. Row- and cell-level failures are skipped and counted
/// instead of surfacing here.
#[derive(Debug)]
pub enum FilterError {
    /// Header row and column are 1-based; zero is not a cell.
    InvalidTarget { row: usize, col: usize },
    /// A host call failed in a way the operation cannot continue past.
    /// Rows already hidden by earlier batches stay hidden.
    Host {
        operation: &'static str,
        row: Option<usize>,
        source: HostError,
    },
}

impl FilterError {
    pub(crate) fn host(operation: &'static str, row: Option<usize>) -> impl FnOnce(HostError) -> FilterError {
        move |source| FilterError::Host { operation, row, source }
    }

    /// Short name of the operation that failed, for user-facing messages.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::InvalidTarget { .. } => "select header",
            Self::Host { operation, .. } => *operation,
        }
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTarget { row, col } => {
                write!(f, "row {row}, column {col} is not a valid header cell")
            }
            Self::Host { operation, row: Some(row), source } => {
                write!(f, "{operation} failed at row {row}: {source}")
            }
            Self::Host { operation, row: None, source } => write!(f, "{operation} failed: {source}"),
        }
    }
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Host { source, .. } => Some(source),
            Self::InvalidTarget { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_row() {
        let err = FilterError::host("hide rows", Some(42))(HostError::InvalidReference("sheet deleted".into()));
        assert_eq!(
            err.to_string(),
            "hide rows failed at row 42: invalid document reference: sheet deleted"
        );
        assert_eq!(err.operation(), "hide rows");
    }

    #[test]
    fn test_display_without_row() {
        let err = FilterError::host("read used range", None)(HostError::InvalidReference("closed".into()));
        assert_eq!(err.to_string(), "read used range failed: invalid document reference: closed");
    }
}
