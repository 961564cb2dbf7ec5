//! Render-time diagnostic filters.
//!
//! Filters never touch stored state. The same set is projected once for inline markers and once
//! for tooltips and gutter hovers, each through its own optional filter, while counts and
//! selection keep working on the unfiltered set.

use std::fmt;
use std::sync::Arc;

use crate::diagnostics::Diagnostic;

/// A shareable predicate deciding whether a diagnostic is shown.
#[derive(Clone)]
pub struct DiagnosticFilter(Arc<dyn Fn(&Diagnostic) -> bool + Send + Sync>);

impl DiagnosticFilter {
    /// Wrap a predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Diagnostic) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Whether `diagnostic` passes.
    pub fn allows(&self, diagnostic: &Diagnostic) -> bool {
        (self.0)(diagnostic)
    }

    /// A filter passing only what both `self` and `other` pass.
    pub fn and(self, other: DiagnosticFilter) -> Self {
        Self::new(move |diagnostic| self.allows(diagnostic) && other.allows(diagnostic))
    }
}

impl fmt::Debug for DiagnosticFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DiagnosticFilter(..)")
    }
}

/// Conjoin two optional filters; `None` passes everything.
pub fn combine(
    a: Option<DiagnosticFilter>,
    b: Option<DiagnosticFilter>,
) -> Option<DiagnosticFilter> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.and(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Keep the items whose diagnostic passes `filter`.
pub fn project<T, I, F>(filter: Option<&DiagnosticFilter>, items: I, diagnostic_of: F) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> &Diagnostic,
{
    match filter {
        Some(filter) => items
            .into_iter()
            .filter(|item| filter.allows(diagnostic_of(item)))
            .collect(),
        None => items.into_iter().collect(),
    }
}
