//! Diagnostic interval store.
//!
//! [`DiagnosticSet`] keeps every diagnostic as its own positioned entry. Entries may overlap
//! arbitrarily and are never merged: each keeps its own severity, message and actions and is
//! resolved independently by hover and selection.
//!
//! The set is immutable. A full replacement rebuilds it from scratch; an edit maps it into a new
//! set. Both share the previous entries' diagnostics through `Arc`, so clones are cheap.
//!
//! Entries are sorted by `(from, to)` (ties keep insertion order) and carry a prefix maximum of
//! their end offsets, which lets point and range queries stop scanning early instead of
//! degrading to a linear walk.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::change::{Assoc, ChangeSet};
use crate::diagnostics::{Diagnostic, Severity, max_severity, same_diagnostic};
use crate::document::DocumentSnapshot;
use crate::error::LintError;

/// How an entry is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// Covers `[from, to)` of text (an underline).
    Mark,
    /// Zero-footprint marker at `from` (a widget). Always has `from == to`.
    Point,
}

/// Which character next to a position a query is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The character ending at the position. A mark starting exactly there does not match.
    Left,
    /// The character starting at the position. A mark ending exactly there does not match.
    Right,
}

/// A diagnostic paired with its live span in the current document.
#[derive(Debug, Clone)]
pub struct PositionedDiagnostic {
    /// Current start offset.
    pub from: usize,
    /// Current end offset (exclusive).
    pub to: usize,
    /// Mark or point.
    pub kind: MarkerKind,
    /// The diagnostic itself (shared, compared by identity).
    pub diagnostic: Arc<Diagnostic>,
}

impl PositionedDiagnostic {
    fn moved(&self, from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            kind: self.kind,
            diagnostic: Arc::clone(&self.diagnostic),
        }
    }

    /// Whether a query at `pos` from `side` hits this entry.
    ///
    /// Points match at their position from either side. Marks match inside their span; on a
    /// boundary, only the side that faces into the mark matches, so a cursor between two
    /// adjacent marks resolves to exactly one of them.
    pub fn matches(&self, pos: usize, side: Side) -> bool {
        if pos < self.from || pos > self.to {
            return false;
        }
        if self.from == self.to {
            return true;
        }
        (pos > self.from || side == Side::Right) && (pos < self.to || side == Side::Left)
    }
}

/// A contiguous stretch of text covered by the same diagnostics.
#[derive(Debug, Clone)]
pub struct DiagnosticSpan {
    /// Span start.
    pub from: usize,
    /// Span end (exclusive).
    pub to: usize,
    /// Highest severity among `diagnostics`.
    pub severity: Severity,
    /// Covering diagnostics, in set order.
    pub diagnostics: Vec<Arc<Diagnostic>>,
}

/// Immutable, ordered multiset of positioned diagnostics.
#[derive(Clone)]
pub struct DiagnosticSet {
    entries: Arc<[PositionedDiagnostic]>,
    /// `prefix_max_end[i] = max(entries[0..=i].to)`
    prefix_max_end: Arc<[usize]>,
    /// Marks that collapsed during the edit that produced this set.
    collapsed: Arc<[PositionedDiagnostic]>,
}

impl DiagnosticSet {
    /// An empty set.
    pub fn empty() -> Self {
        Self {
            entries: Arc::from(Vec::new()),
            prefix_max_end: Arc::from(Vec::new()),
            collapsed: Arc::from(Vec::new()),
        }
    }

    fn from_entries(
        mut entries: Vec<PositionedDiagnostic>,
        collapsed: Vec<PositionedDiagnostic>,
    ) -> Self {
        // Stable: ties keep insertion (or previous) order.
        entries.sort_by_key(|entry| (entry.from, entry.to));

        let mut max_end = 0;
        let prefix_max_end: Vec<usize> = entries
            .iter()
            .map(|entry| {
                max_end = max_end.max(entry.to);
                max_end
            })
            .collect();

        Self {
            entries: Arc::from(entries),
            prefix_max_end: Arc::from(prefix_max_end),
            collapsed: Arc::from(collapsed),
        }
    }

    /// Build a set from a full diagnostic list for `doc`.
    ///
    /// A diagnostic becomes a [`MarkerKind::Point`] when it is empty, or when it covers exactly
    /// one character and that character ends its line (so no underline is drawn over a line
    /// break). Everything else becomes a [`MarkerKind::Mark`].
    ///
    /// A diagnostic with `from > to` or `to > doc.len()` rejects the whole list.
    pub fn replace<I>(diagnostics: I, doc: &DocumentSnapshot) -> Result<Self, LintError>
    where
        I: IntoIterator<Item = Arc<Diagnostic>>,
    {
        let len = doc.len();
        let mut entries = Vec::new();

        for diagnostic in diagnostics {
            let (from, to) = (diagnostic.from, diagnostic.to);
            if from > to || to > len {
                return Err(LintError::InvalidDiagnosticRange { from, to, len });
            }

            let on_line_break = to == from + 1 && doc.line_at(from).end == from;
            let entry = if from == to || on_line_break {
                PositionedDiagnostic {
                    from,
                    to: from,
                    kind: MarkerKind::Point,
                    diagnostic,
                }
            } else {
                PositionedDiagnostic {
                    from,
                    to,
                    kind: MarkerKind::Mark,
                    diagnostic,
                }
            };
            entries.push(entry);
        }

        Ok(Self::from_entries(entries, Vec::new()))
    }

    /// Re-anchor every entry through `changes`.
    ///
    /// Mark starts map with [`Assoc::After`] and ends with [`Assoc::Before`]: text typed inside a
    /// mark grows it, text typed at either boundary does not. Points map with
    /// [`Assoc::Before`] and stay zero-width. Marks left empty are dropped from the new set and
    /// reported by [`DiagnosticSet::collapsed`] until the next edit.
    pub fn map(&self, changes: &ChangeSet) -> Self {
        if changes.is_empty() {
            return Self {
                entries: Arc::clone(&self.entries),
                prefix_max_end: Arc::clone(&self.prefix_max_end),
                collapsed: Arc::from(Vec::new()),
            };
        }

        let mut kept = Vec::with_capacity(self.entries.len());
        let mut collapsed = Vec::new();

        for entry in self.entries.iter() {
            match entry.kind {
                MarkerKind::Point => {
                    let pos = changes.map_pos(entry.from, Assoc::Before);
                    kept.push(entry.moved(pos, pos));
                }
                MarkerKind::Mark => {
                    let from = changes.map_pos(entry.from, Assoc::After);
                    let to = changes.map_pos(entry.to, Assoc::Before);
                    if from < to {
                        kept.push(entry.moved(from, to));
                    } else {
                        collapsed.push(entry.moved(from, from));
                    }
                }
            }
        }

        trace!(
            kept = kept.len(),
            collapsed = collapsed.len(),
            "lint.diagnostics.map"
        );
        Self::from_entries(kept, collapsed)
    }

    /// Number of rendered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the set has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending `(from, to)` order.
    pub fn iter(&self) -> std::slice::Iter<'_, PositionedDiagnostic> {
        self.entries.iter()
    }

    /// Entry at `index` in iteration order.
    pub fn get(&self, index: usize) -> Option<&PositionedDiagnostic> {
        self.entries.get(index)
    }

    /// Marks dropped by the edit that produced this set.
    pub fn collapsed(&self) -> &[PositionedDiagnostic] {
        &self.collapsed
    }

    /// Index of the entry holding `diagnostic` (by identity).
    pub fn position_of(&self, diagnostic: &Arc<Diagnostic>) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| same_diagnostic(&entry.diagnostic, diagnostic))
    }

    /// Index of the first entry with `from >= pos`.
    pub fn first_starting_at_or_after(&self, pos: usize) -> Option<usize> {
        let idx = self.entries.partition_point(|entry| entry.from < pos);
        (idx < self.entries.len()).then_some(idx)
    }

    /// Index of the first entry with `from > pos`.
    pub fn first_starting_after(&self, pos: usize) -> Option<usize> {
        let idx = self.entries.partition_point(|entry| entry.from <= pos);
        (idx < self.entries.len()).then_some(idx)
    }

    /// Index of the last entry with `from < pos`.
    pub fn last_starting_before(&self, pos: usize) -> Option<usize> {
        self.entries
            .partition_point(|entry| entry.from < pos)
            .checked_sub(1)
    }

    /// Entries hit by a query at `pos` from `side` (see [`PositionedDiagnostic::matches`]).
    pub fn query(&self, pos: usize, side: Side) -> Vec<&PositionedDiagnostic> {
        self.query_impl(pos, side).0
    }

    fn query_impl(&self, pos: usize, side: Side) -> (Vec<&PositionedDiagnostic>, usize) {
        let mut result = Vec::new();
        let mut scanned = 0usize;

        // Everything that could contain `pos` starts at or before it.
        let end = self.entries.partition_point(|entry| entry.from <= pos);
        for idx in (0..end).rev() {
            scanned += 1;
            // No entry in `entries[0..=idx]` reaches `pos`.
            if self.prefix_max_end[idx] < pos {
                break;
            }
            let entry = &self.entries[idx];
            if entry.matches(pos, side) {
                result.push(entry);
            }
        }

        result.reverse();
        (result, scanned)
    }

    #[cfg(test)]
    fn query_scan_count(&self, pos: usize) -> usize {
        self.query_impl(pos, Side::Right).1
    }

    /// Entries overlapping or touching `[from, to]`, in set order.
    pub fn query_range(&self, from: usize, to: usize) -> Vec<&PositionedDiagnostic> {
        let mut result = Vec::new();

        let end = self.entries.partition_point(|entry| entry.from <= to);
        for idx in (0..end).rev() {
            if self.prefix_max_end[idx] < from {
                break;
            }
            let entry = &self.entries[idx];
            if entry.to >= from {
                result.push(entry);
            }
        }

        result.reverse();
        result
    }

    /// Split the marked text inside `[from, to)` at every mark boundary.
    ///
    /// Each returned span is covered by the same marks from start to end. Stretches covered by
    /// no mark are skipped, and points never contribute since they cover no text.
    pub fn spans(&self, from: usize, to: usize) -> Vec<DiagnosticSpan> {
        let marks: Vec<&PositionedDiagnostic> = self
            .query_range(from, to)
            .into_iter()
            .filter(|entry| entry.kind == MarkerKind::Mark && entry.from < to && entry.to > from)
            .collect();

        let mut bounds: Vec<usize> = marks
            .iter()
            .flat_map(|entry| [entry.from.max(from), entry.to.min(to)])
            .collect();
        bounds.sort_unstable();
        bounds.dedup();

        let mut spans = Vec::new();
        for pair in bounds.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let diagnostics: Vec<Arc<Diagnostic>> = marks
                .iter()
                .filter(|entry| entry.from <= start && entry.to >= end)
                .map(|entry| Arc::clone(&entry.diagnostic))
                .collect();
            if diagnostics.is_empty() {
                continue;
            }
            spans.push(DiagnosticSpan {
                from: start,
                to: end,
                severity: max_severity(diagnostics.iter().map(|d| d.as_ref())),
                diagnostics,
            });
        }
        spans
    }
}

impl Default for DiagnosticSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for DiagnosticSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.entries
                    .iter()
                    .map(|entry| (entry.from..entry.to, entry.kind, &entry.diagnostic.message)),
            )
            .finish()
    }
}

impl<'a> IntoIterator for &'a DiagnosticSet {
    type Item = &'a PositionedDiagnostic;
    type IntoIter = std::slice::Iter<'a, PositionedDiagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
