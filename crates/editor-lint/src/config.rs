//! Lint source configuration.

use std::time::Duration;

use crate::filter::{self, DiagnosticFilter};

/// Default quiet period between the last edit and a lint run.
pub const DEFAULT_LINT_DELAY: Duration = Duration::from_millis(750);

/// Per-source lint settings.
///
/// When several sources are registered their settings are merged with
/// [`LintConfig::combine`]: the longest delay wins and filters are conjoined.
#[derive(Debug, Clone)]
pub struct LintConfig {
    /// Quiet period after an edit before sources run.
    pub delay: Duration,
    /// Applied before diagnostics are rendered as inline markers.
    pub marker_filter: Option<DiagnosticFilter>,
    /// Applied before diagnostics are shown in tooltips and gutter hovers.
    pub tooltip_filter: Option<DiagnosticFilter>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_LINT_DELAY,
            marker_filter: None,
            tooltip_filter: None,
        }
    }
}

impl LintConfig {
    /// Set the quiet period.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the inline marker filter.
    pub fn with_marker_filter(mut self, filter: DiagnosticFilter) -> Self {
        self.marker_filter = Some(filter);
        self
    }

    /// Set the tooltip / gutter hover filter.
    pub fn with_tooltip_filter(mut self, filter: DiagnosticFilter) -> Self {
        self.tooltip_filter = Some(filter);
        self
    }

    /// Merge two configurations.
    pub fn combine(self, other: LintConfig) -> LintConfig {
        LintConfig {
            delay: self.delay.max(other.delay),
            marker_filter: filter::combine(self.marker_filter, other.marker_filter),
            tooltip_filter: filter::combine(self.tooltip_filter, other.tooltip_filter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Diagnostic, Severity};

    #[test]
    fn test_default_delay() {
        assert_eq!(LintConfig::default().delay, Duration::from_millis(750));
    }

    #[test]
    fn test_combine_takes_longest_delay_and_joins_filters() {
        let a = LintConfig::default()
            .with_delay(Duration::from_millis(200))
            .with_marker_filter(DiagnosticFilter::new(|d| d.severity >= Severity::Warning));
        let b = LintConfig::default()
            .with_delay(Duration::from_millis(1000))
            .with_tooltip_filter(DiagnosticFilter::new(|d| !d.message.is_empty()));

        let merged = a.combine(b);
        assert_eq!(merged.delay, Duration::from_millis(1000));

        let info = Diagnostic::new(0..1, Severity::Info, "x");
        assert!(!merged.marker_filter.as_ref().unwrap().allows(&info));
        assert!(merged.tooltip_filter.as_ref().unwrap().allows(&info));
    }
}
