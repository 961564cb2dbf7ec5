//! The focused diagnostic.
//!
//! A [`Selection`] is a key into a [`DiagnosticSet`] (entry index plus the diagnostic's
//! identity), never a pointer into it, so the set can be replaced wholesale without leaving the
//! selection dangling. After every edit or replacement the tracker looks its diagnostic up again.

use std::ops::Range;
use std::sync::Arc;

use tracing::trace;

use crate::change::{Assoc, ChangeSet};
use crate::diagnostics::{Diagnostic, same_diagnostic};
use crate::intervals::DiagnosticSet;

/// The selected diagnostic and its live span.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Current start offset.
    pub from: usize,
    /// Current end offset.
    pub to: usize,
    /// The selected diagnostic.
    pub diagnostic: Arc<Diagnostic>,
    index: usize,
}

impl Selection {
    fn at(set: &DiagnosticSet, index: usize) -> Option<Self> {
        let entry = set.get(index)?;
        Some(Self {
            from: entry.from,
            to: entry.to,
            diagnostic: Arc::clone(&entry.diagnostic),
            index,
        })
    }

    /// Index of the selected entry in the set it was resolved against.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The live span.
    pub fn range(&self) -> Range<usize> {
        self.from..self.to
    }

    fn same_span(&self, range: &Range<usize>) -> bool {
        self.from == range.start && self.to == range.end
    }
}

/// Holds at most one selected diagnostic.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    selected: Option<Selection>,
}

impl SelectionTracker {
    /// A tracker with nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current selection.
    pub fn selected(&self) -> Option<&Selection> {
        self.selected.as_ref()
    }

    /// Drop the selection.
    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Select `diagnostic` in `set`. Clears the selection if it is not in the set.
    pub fn select(
        &mut self,
        set: &DiagnosticSet,
        diagnostic: &Arc<Diagnostic>,
    ) -> Option<&Selection> {
        self.selected = set
            .position_of(diagnostic)
            .and_then(|index| Selection::at(set, index));
        self.selected.as_ref()
    }

    /// Select the entry at `index` in `set`.
    pub fn select_index(&mut self, set: &DiagnosticSet, index: usize) -> Option<&Selection> {
        self.selected = Selection::at(set, index);
        self.selected.as_ref()
    }

    /// Re-anchor after `changes` produced `mapped`.
    ///
    /// Keeps the same diagnostic if it survived the edit. Otherwise selects the first entry that
    /// starts at or after the old start (mapped past any inserted text), or nothing.
    pub fn map(&mut self, mapped: &DiagnosticSet, changes: &ChangeSet) {
        let Some(selected) = self.selected.take() else {
            return;
        };
        let probe = changes.map_pos(selected.from, Assoc::After);

        self.selected = match mapped.position_of(&selected.diagnostic) {
            Some(index) => Selection::at(mapped, index),
            None => {
                let collapsed = mapped
                    .collapsed()
                    .iter()
                    .any(|entry| same_diagnostic(&entry.diagnostic, &selected.diagnostic));
                trace!(probe, collapsed, "lint.selection.fallback");
                mapped
                    .first_starting_at_or_after(probe)
                    .and_then(|index| Selection::at(mapped, index))
            }
        };
    }

    /// Re-derive after a full replacement.
    ///
    /// A diagnostic handed back in the new list (same `Arc`) stays selected; otherwise the first
    /// entry starting at or after the old start is selected, or nothing.
    pub fn reanchor(&mut self, set: &DiagnosticSet) {
        let Some(selected) = self.selected.take() else {
            return;
        };
        let index = set
            .position_of(&selected.diagnostic)
            .or_else(|| set.first_starting_at_or_after(selected.from));
        self.selected = index.and_then(|index| Selection::at(set, index));
    }

    /// The diagnostic after `cursor`.
    ///
    /// Picks the first entry starting strictly after `cursor.end`, wrapping to the first entry
    /// of the document. Returns `None` when the set is empty, or when the wrapped entry is the
    /// one the cursor already covers.
    pub fn next(set: &DiagnosticSet, cursor: Range<usize>) -> Option<Selection> {
        if let Some(index) = set.first_starting_after(cursor.end) {
            return Selection::at(set, index);
        }
        let first = Selection::at(set, 0)?;
        (!first.same_span(&cursor)).then_some(first)
    }

    /// The diagnostic before `cursor`; mirror image of [`SelectionTracker::next`].
    pub fn previous(set: &DiagnosticSet, cursor: Range<usize>) -> Option<Selection> {
        if let Some(index) = set.last_starting_before(cursor.start) {
            return Selection::at(set, index);
        }
        let last = Selection::at(set, set.len().checked_sub(1)?)?;
        (!last.same_span(&cursor)).then_some(last)
    }

    /// Move to the diagnostic after `cursor` and select it.
    pub fn advance(&mut self, set: &DiagnosticSet, cursor: Range<usize>) -> Option<&Selection> {
        let next = Self::next(set, cursor)?;
        self.selected = Some(next);
        self.selected.as_ref()
    }

    /// Move to the diagnostic before `cursor` and select it.
    pub fn retreat(&mut self, set: &DiagnosticSet, cursor: Range<usize>) -> Option<&Selection> {
        let previous = Self::previous(set, cursor)?;
        self.selected = Some(previous);
        self.selected.as_ref()
    }
}
