//! Per-line diagnostic summaries for gutter markers.
//!
//! Summaries are bucketed only when diagnostics are replaced. Ordinary edits just move each
//! summary's `line_start` through the change set, so a summary can drift off its line until the
//! next replacement re-buckets everything. Summaries that an edit moves onto the same start are
//! merged.

use std::sync::Arc;

use crate::change::{Assoc, ChangeSet};
use crate::diagnostics::{Diagnostic, Severity, max_severity};
use crate::document::DocumentSnapshot;
use crate::intervals::DiagnosticSet;

/// Diagnostics starting on one line.
#[derive(Debug, Clone)]
pub struct LineSummary {
    /// Offset of the line start (as of the last replacement, mapped through later edits).
    pub line_start: usize,
    /// Diagnostics whose `from` lies on the line, in set order.
    pub diagnostics: Vec<Arc<Diagnostic>>,
    /// Highest severity on the line.
    pub severity: Severity,
}

/// Ordered line summaries, one per line with at least one diagnostic.
#[derive(Debug, Clone)]
pub struct LineSummaries {
    lines: Arc<[LineSummary]>,
}

impl LineSummaries {
    /// No summaries.
    pub fn empty() -> Self {
        Self {
            lines: Arc::from(Vec::new()),
        }
    }

    /// Bucket every entry of `set` (points included) by the line holding its start.
    pub fn recompute(set: &DiagnosticSet, doc: &DocumentSnapshot) -> Self {
        let mut lines: Vec<LineSummary> = Vec::new();

        // Entries are sorted by `from`, so equal line starts are adjacent.
        for entry in set {
            let line_start = doc.line_at(entry.from).start;
            match lines.last_mut() {
                Some(last) if last.line_start == line_start => {
                    last.diagnostics.push(Arc::clone(&entry.diagnostic));
                }
                _ => lines.push(LineSummary {
                    line_start,
                    diagnostics: vec![Arc::clone(&entry.diagnostic)],
                    severity: Severity::Info,
                }),
            }
        }

        for line in &mut lines {
            line.severity = max_severity(line.diagnostics.iter().map(|d| d.as_ref()));
        }

        Self {
            lines: Arc::from(lines),
        }
    }

    /// Move every summary through `changes` without re-bucketing.
    ///
    /// Summaries that land on the same start (say, after joining two lines) are merged.
    pub fn map(&self, changes: &ChangeSet) -> Self {
        if changes.is_empty() {
            return self.clone();
        }
        let mut lines: Vec<LineSummary> = Vec::with_capacity(self.lines.len());

        // Mapping is monotone, so equal starts stay adjacent.
        for line in self.lines.iter() {
            let line_start = changes.map_pos(line.line_start, Assoc::Before);
            match lines.last_mut() {
                Some(last) if last.line_start == line_start => {
                    last.diagnostics.extend(line.diagnostics.iter().cloned());
                    last.severity = max_severity(last.diagnostics.iter().map(|d| d.as_ref()));
                }
                _ => lines.push(LineSummary {
                    line_start,
                    diagnostics: line.diagnostics.clone(),
                    severity: line.severity,
                }),
            }
        }

        Self {
            lines: Arc::from(lines),
        }
    }

    /// Summaries in ascending `line_start` order.
    pub fn iter(&self) -> std::slice::Iter<'_, LineSummary> {
        self.lines.iter()
    }

    /// Number of summarized lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` when no line has diagnostics.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The summary keyed by `line_start`.
    pub fn at_line(&self, line_start: usize) -> Option<&LineSummary> {
        let idx = self
            .lines
            .partition_point(|line| line.line_start < line_start);
        self.lines
            .get(idx)
            .filter(|line| line.line_start == line_start)
    }
}

impl Default for LineSummaries {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> IntoIterator for &'a LineSummaries {
    type Item = &'a LineSummary;
    type IntoIter = std::slice::Iter<'a, LineSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
