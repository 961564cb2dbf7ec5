//! Lint state and change notifications.
//!
//! [`LintState`] bundles the three derived views that must move together: the diagnostic set,
//! the selection and the per-line summaries. Every update goes through one of two entry points:
//! a full replacement or an edit mapping. Each keeps the three views consistent.
//!
//! # Example
//!
//! ```rust
//! use editor_lint::{Diagnostic, DocumentSnapshot, LintChangeType, Linter, Severity};
//!
//! let mut linter = Linter::new(DocumentSnapshot::new("let x = 1;"));
//! linter.subscribe(|change| {
//!     println!("lint state changed: {:?}", change.change_type);
//! });
//!
//! linter
//!     .replace_diagnostics(vec![Diagnostic::new(4..5, Severity::Warning, "unused")])
//!     .unwrap();
//! assert_eq!(linter.diagnostics().len(), 1);
//! ```

use std::ops::Range;
use std::sync::Arc;

use crate::change::ChangeSet;
use crate::diagnostics::{Diagnostic, same_diagnostic};
use crate::document::DocumentSnapshot;
use crate::error::LintError;
use crate::gutter::LineSummaries;
use crate::intervals::DiagnosticSet;
use crate::selection::{Selection, SelectionTracker};

/// Kind of lint state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintChangeType {
    /// The diagnostic set was replaced (a committed run or a host call).
    DiagnosticsReplaced,
    /// Diagnostics were re-anchored through a document edit.
    DiagnosticsMapped,
    /// The selected diagnostic (or its span) changed.
    SelectionChanged,
}

/// A lint state change record.
#[derive(Debug, Clone)]
pub struct LintChange {
    /// Change type
    pub change_type: LintChangeType,
    /// Old version number
    pub old_version: u64,
    /// New version number
    pub new_version: u64,
}

impl LintChange {
    /// Create a new change record.
    pub fn new(change_type: LintChangeType, old_version: u64, new_version: u64) -> Self {
        Self {
            change_type,
            old_version,
            new_version,
        }
    }
}

/// Lint state change callback function type
pub type LintChangeCallback = Box<dyn FnMut(&LintChange) + Send>;

/// Diagnostic set, selection and line summaries, kept in step.
#[derive(Debug, Clone, Default)]
pub struct LintState {
    diagnostics: DiagnosticSet,
    selection: SelectionTracker,
    lines: LineSummaries,
}

fn selection_key(selection: Option<&Selection>) -> Option<(Range<usize>, &Arc<Diagnostic>)> {
    selection.map(|s| (s.range(), &s.diagnostic))
}

fn same_selection(a: Option<&Selection>, b: Option<&Selection>) -> bool {
    match (selection_key(a), selection_key(b)) {
        (None, None) => true,
        (Some((ra, da)), Some((rb, db))) => ra == rb && same_diagnostic(da, db),
        _ => false,
    }
}

impl LintState {
    /// Empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current diagnostic set.
    pub fn diagnostics(&self) -> &DiagnosticSet {
        &self.diagnostics
    }

    /// The selected diagnostic.
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.selected()
    }

    /// Per-line summaries.
    pub fn line_summaries(&self) -> &LineSummaries {
        &self.lines
    }

    /// Replace every diagnostic. Returns whether the selection changed.
    ///
    /// On error nothing is modified.
    pub fn replace<I>(&mut self, diagnostics: I, doc: &DocumentSnapshot) -> Result<bool, LintError>
    where
        I: IntoIterator<Item = Arc<Diagnostic>>,
    {
        let set = DiagnosticSet::replace(diagnostics, doc)?;
        let before = self.selection.clone();

        self.selection.reanchor(&set);
        self.lines = LineSummaries::recompute(&set, doc);
        self.diagnostics = set;

        Ok(!same_selection(before.selected(), self.selection.selected()))
    }

    /// Map everything through an applied edit. Returns whether the selection changed.
    pub fn apply_change(&mut self, changes: &ChangeSet) -> bool {
        let before = self.selection.clone();

        let mapped = self.diagnostics.map(changes);
        self.selection.map(&mapped, changes);
        self.lines = self.lines.map(changes);
        self.diagnostics = mapped;

        !same_selection(before.selected(), self.selection.selected())
    }

    /// Select `diagnostic`, clearing the selection if it is not in the set. Returns whether the
    /// selection changed.
    pub fn select(&mut self, diagnostic: &Arc<Diagnostic>) -> bool {
        let before = self.selection.clone();
        self.selection.select(&self.diagnostics, diagnostic);
        !same_selection(before.selected(), self.selection.selected())
    }

    /// Drop the selection.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Select the diagnostic after `cursor`.
    pub fn advance(&mut self, cursor: Range<usize>) -> Option<&Selection> {
        self.selection.advance(&self.diagnostics, cursor)
    }

    /// Select the diagnostic before `cursor`.
    pub fn retreat(&mut self, cursor: Range<usize>) -> Option<&Selection> {
        self.selection.retreat(&self.diagnostics, cursor)
    }
}
