//! Diagnostics data model.
//!
//! A [`Diagnostic`] is produced by a lint source (or handed in by the host) and is immutable
//! afterwards. Once ingested, the core holds it as an `Arc<Diagnostic>` and compares entries by
//! pointer identity: two diagnostics with equal fields are still two distinct entries.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::change::ChangeSet;
use crate::document::DocumentSnapshot;
use crate::error::LintError;

/// Diagnostic severity levels, ordered `Info < Warning < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational diagnostics.
    Info,
    /// Warning diagnostics.
    Warning,
    /// Error diagnostics.
    Error,
}

/// The view an [`Action`] operates on.
///
/// [`Linter`](crate::Linter) implements this, so edits dispatched by an action are mapped through
/// the same path as any other edit.
pub trait ActionTarget {
    /// The current document.
    fn document(&self) -> &DocumentSnapshot;

    /// Apply a change built against [`ActionTarget::document`].
    fn dispatch(&mut self, changes: ChangeSet) -> Result<(), LintError>;
}

/// Callback behind an [`Action`]; receives the diagnostic's *current* range.
pub type ActionFn =
    Arc<dyn Fn(&mut dyn ActionTarget, Range<usize>) -> Result<(), LintError> + Send + Sync>;

/// A named remediation attached to a diagnostic.
#[derive(Clone)]
pub struct Action {
    /// Label shown to the user.
    pub name: String,
    apply: ActionFn,
}

impl Action {
    /// Create an action.
    pub fn new<F>(name: impl Into<String>, apply: F) -> Self
    where
        F: Fn(&mut dyn ActionTarget, Range<usize>) -> Result<(), LintError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            apply: Arc::new(apply),
        }
    }

    /// Run the action against `target` with the diagnostic's live range.
    pub fn apply(
        &self,
        target: &mut dyn ActionTarget,
        range: Range<usize>,
    ) -> Result<(), LintError> {
        (self.apply)(target, range)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").field("name", &self.name).finish()
    }
}

/// A single problem annotation.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Start offset (chars), as produced.
    pub from: usize,
    /// End offset (chars, exclusive), as produced. `from == to` marks a point diagnostic.
    pub to: usize,
    /// Severity.
    pub severity: Severity,
    /// Optional producer name (e.g. `"eslint"`).
    pub source: Option<String>,
    /// Diagnostic message.
    pub message: String,
    /// Remediation actions, in display order.
    pub actions: Vec<Action>,
}

impl Diagnostic {
    /// Create a diagnostic for `range`.
    pub fn new(range: Range<usize>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            from: range.start,
            to: range.end,
            severity,
            source: None,
            message: message.into(),
            actions: Vec::new(),
        }
    }

    /// Attach a producer name.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Append a remediation action.
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// The produced range.
    pub fn range(&self) -> Range<usize> {
        self.from..self.to
    }
}

/// Identity comparison used throughout the crate.
pub fn same_diagnostic(a: &Arc<Diagnostic>, b: &Arc<Diagnostic>) -> bool {
    Arc::ptr_eq(a, b)
}

/// Highest severity among `diagnostics`; `Info` when there are none.
///
/// A single fold rather than a sort, so line groups aggregate in O(n).
pub fn max_severity<'a, I>(diagnostics: I) -> Severity
where
    I: IntoIterator<Item = &'a Diagnostic>,
{
    diagnostics
        .into_iter()
        .fold(Severity::Info, |max, diagnostic| max.max(diagnostic.severity))
}
