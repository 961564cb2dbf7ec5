use thiserror::Error;

use crate::source::SourceError;

#[derive(Debug, Error)]
/// Errors produced while ingesting diagnostics, applying changes or running lint sources.
pub enum LintError {
    #[error("diagnostic range {from}..{to} is invalid for a document of length {len}")]
    /// A diagnostic had `from > to` or ended past the end of the document.
    InvalidDiagnosticRange {
        /// Diagnostic start offset.
        from: usize,
        /// Diagnostic end offset.
        to: usize,
        /// Document length in chars.
        len: usize,
    },

    #[error("edit {from}..{to} is out of bounds for a document of length {len}")]
    /// A text edit had `from > to` or ended past the end of the document.
    EditOutOfBounds {
        /// Edit start offset.
        from: usize,
        /// Edit end offset.
        to: usize,
        /// Document length in chars.
        len: usize,
    },

    #[error("edits overlap at offset {at}")]
    /// Two edits in one change set touched the same text.
    OverlappingEdits {
        /// Offset (pre-edit) where the overlap starts.
        at: usize,
    },

    #[error("change set expects a document of length {expected}, got {actual}")]
    /// A change set was applied to a document it was not built against.
    LengthMismatch {
        /// Length the change set was built for.
        expected: usize,
        /// Length of the document it was applied to.
        actual: usize,
    },

    #[error("lint source #{index} failed: {source}")]
    /// A registered lint source returned an error.
    Source {
        /// Registration index of the failing source.
        index: usize,
        /// The error returned by the source.
        #[source]
        source: SourceError,
    },

    #[error("lint source #{index} panicked")]
    /// A registered lint source panicked while linting.
    SourcePanicked {
        /// Registration index of the failing source.
        index: usize,
    },

    #[error("diagnostic has no action #{index}")]
    /// An action index did not name one of the diagnostic's actions.
    UnknownAction {
        /// The requested action index.
        index: usize,
    },

    #[error("diagnostic is not in the current set")]
    /// The diagnostic is no longer tracked (replaced or collapsed away).
    UnknownDiagnostic,
}
