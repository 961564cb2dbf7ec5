//! The lint driver.
//!
//! [`Linter`] is the serialized update path: the host applies edits, navigation and explicit
//! replacements to it one at a time, and polls [`Linter::next_event`] to let the debounce timer
//! and in-flight lint runs make progress. Lint results only ever land through the same `&mut
//! self` path as edits, so a run can never race an edit.
//!
//! ```rust,no_run
//! use editor_lint::{DocumentSnapshot, LintConfig, Linter, sync_source};
//!
//! # async fn drive() {
//! let mut linter = Linter::new(DocumentSnapshot::new("fn main() {}\n"));
//! linter.register_source(
//!     sync_source(|_doc: &DocumentSnapshot| Ok(Vec::new())),
//!     LintConfig::default(),
//! );
//!
//! loop {
//!     // Typically raced against host input with `tokio::select!`.
//!     let event = linter.next_event().await;
//!     println!("{event:?}");
//! }
//! # }
//! ```

use std::future;
use std::ops::Range;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, warn};

use crate::change::ChangeSet;
use crate::config::LintConfig;
use crate::diagnostics::{ActionTarget, Diagnostic};
use crate::document::DocumentSnapshot;
use crate::error::LintError;
use crate::filter::{self, DiagnosticFilter};
use crate::gutter::LineSummaries;
use crate::intervals::{DiagnosticSet, PositionedDiagnostic, Side};
use crate::scheduler::{LintPhase, LintScheduler, TimerOutcome};
use crate::selection::{Selection, SelectionTracker};
use crate::source::{self, LintSource};
use crate::state::{LintChange, LintChangeCallback, LintChangeType, LintState};

/// Progress reported by [`Linter::next_event`].
#[derive(Debug)]
pub enum LintEvent {
    /// The timer fired before the quiet period ended and was re-armed.
    Rearmed {
        /// New quiet period end.
        deadline: Instant,
    },
    /// Sources were invoked against document version `token`.
    Started {
        /// Document version the run was issued against.
        token: u64,
        /// Number of sources invoked.
        sources: usize,
    },
    /// The run's diagnostics replaced the current set.
    Committed {
        /// Document version the run was issued against.
        token: u64,
        /// Number of committed diagnostics.
        count: usize,
    },
    /// The document changed while the run was in flight; its result was dropped.
    Discarded {
        /// Document version the run was issued against.
        token: u64,
        /// Document version at completion.
        current: u64,
    },
    /// The run failed; nothing was committed.
    Failed {
        /// Document version the run was issued against.
        token: u64,
        /// The first failure.
        error: LintError,
    },
}

struct InFlight {
    token: u64,
    run: BoxFuture<'static, Result<Vec<Diagnostic>, LintError>>,
}

/// Diagnostics tracking plus debounced linting for one document.
pub struct Linter {
    doc: DocumentSnapshot,
    state: LintState,
    sources: Vec<Arc<dyn LintSource>>,
    /// Combined configuration of every registered source.
    config: Option<LintConfig>,
    scheduler: LintScheduler,
    in_flight: Option<InFlight>,
    /// State version, bumped on every notified change.
    version: u64,
    callbacks: Vec<LintChangeCallback>,
}

impl Linter {
    /// Track diagnostics for `doc`. Nothing is linted until a source is registered.
    pub fn new(doc: DocumentSnapshot) -> Self {
        Self {
            doc,
            state: LintState::new(),
            sources: Vec::new(),
            config: None,
            scheduler: LintScheduler::default(),
            in_flight: None,
            version: 0,
            callbacks: Vec::new(),
        }
    }

    /// Register a lint source and arm the scheduler.
    ///
    /// `config` is merged into the configuration of previously registered sources (see
    /// [`LintConfig::combine`]).
    pub fn register_source<S>(&mut self, source: S, config: LintConfig)
    where
        S: LintSource + 'static,
    {
        let config = match self.config.take() {
            Some(existing) => existing.combine(config),
            None => config,
        };
        self.scheduler.set_delay(config.delay);
        self.config = Some(config);
        self.sources.push(Arc::new(source));

        debug!(sources = self.sources.len(), "lint.source.register");
        self.scheduler.on_edit(Instant::now());
    }

    /// The current document.
    pub fn document(&self) -> &DocumentSnapshot {
        &self.doc
    }

    /// Lint state version, bumped on every notified change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Combined configuration of the registered sources.
    pub fn config(&self) -> Option<&LintConfig> {
        self.config.as_ref()
    }

    /// Scheduler phase.
    pub fn phase(&self) -> LintPhase {
        self.scheduler.phase()
    }

    /// Apply an edit to the document and re-anchor everything through it.
    pub fn apply_change(&mut self, changes: &ChangeSet) -> Result<(), LintError> {
        if changes.is_empty() {
            return Ok(());
        }
        self.doc = self.doc.apply(changes)?;

        let selection_changed = self.state.apply_change(changes);
        self.notify(LintChangeType::DiagnosticsMapped);
        if selection_changed {
            self.notify(LintChangeType::SelectionChanged);
        }

        if !self.sources.is_empty() {
            self.scheduler.on_edit(Instant::now());
        }
        Ok(())
    }

    /// Replace every diagnostic.
    ///
    /// Accepts owned diagnostics or shared ones; handing back an `Arc` that is currently
    /// selected keeps it selected. A malformed range rejects the whole list.
    pub fn replace_diagnostics<I, D>(&mut self, diagnostics: I) -> Result<(), LintError>
    where
        I: IntoIterator<Item = D>,
        D: Into<Arc<Diagnostic>>,
    {
        let selection_changed = self
            .state
            .replace(diagnostics.into_iter().map(Into::into), &self.doc)?;

        self.notify(LintChangeType::DiagnosticsReplaced);
        if selection_changed {
            self.notify(LintChangeType::SelectionChanged);
        }
        Ok(())
    }

    /// Run the sources now instead of waiting for the quiet period.
    ///
    /// Only takes effect while armed; the run's outcome is reported by
    /// [`Linter::next_event`].
    pub fn force(&mut self) -> bool {
        if !self.scheduler.force(self.doc.version()) {
            return false;
        }
        debug!("lint.run.force");
        self.start_run();
        true
    }

    /// Drive the scheduler until something happens.
    ///
    /// Cancel-safe: dropping the future loses no state. Pends forever when there is nothing to
    /// wait for, including after [`Linter::shutdown`].
    pub async fn next_event(&mut self) -> LintEvent {
        loop {
            if let Some(in_flight) = self.in_flight.as_mut() {
                let result = (&mut in_flight.run).await;
                let token = in_flight.token;
                self.in_flight = None;
                return self.complete(token, result);
            }

            let timer_at = match (self.scheduler.phase(), self.scheduler.timer_at()) {
                (LintPhase::Armed, Some(at)) => at,
                _ => return future::pending().await,
            };
            sleep_until(timer_at).await;

            match self.scheduler.on_timer(Instant::now(), self.doc.version()) {
                TimerOutcome::Rearm(deadline) => return LintEvent::Rearmed { deadline },
                TimerOutcome::Run => {
                    let token = self.doc.version();
                    self.start_run();
                    return LintEvent::Started {
                        token,
                        sources: self.sources.len(),
                    };
                }
                TimerOutcome::Ignored => continue,
            }
        }
    }

    fn start_run(&mut self) {
        let token = self.doc.version();
        debug!(token, sources = self.sources.len(), "lint.run.start");
        self.in_flight = Some(InFlight {
            token,
            run: source::run_sources(&self.sources, &self.doc),
        });
    }

    fn complete(&mut self, token: u64, result: Result<Vec<Diagnostic>, LintError>) -> LintEvent {
        let current = self.doc.version();
        let completion = self.scheduler.finish(current);
        if let Some(deadline) = completion.rearmed {
            debug!(?deadline, "lint.scheduler.rearm");
        }

        let diagnostics = match result {
            Ok(diagnostics) => diagnostics,
            Err(error) => return LintEvent::Failed { token, error },
        };

        if !completion.fresh {
            debug!(token, current, "lint.run.stale");
            return LintEvent::Discarded { token, current };
        }

        let count = diagnostics.len();
        match self.replace_diagnostics(diagnostics) {
            Ok(()) => {
                debug!(token, count, "lint.run.commit");
                LintEvent::Committed { token, count }
            }
            Err(error) => {
                warn!(token, %error, "lint.run.rejected");
                LintEvent::Failed { token, error }
            }
        }
    }

    /// Stop linting. The in-flight run is dropped and no source is invoked again.
    pub fn shutdown(&mut self) {
        self.scheduler.close();
        self.in_flight = None;
        debug!("lint.shutdown");
    }

    /// The current diagnostic set (unfiltered).
    pub fn diagnostics(&self) -> &DiagnosticSet {
        self.state.diagnostics()
    }

    /// The selected diagnostic.
    pub fn selection(&self) -> Option<&Selection> {
        self.state.selection()
    }

    /// Per-line summaries (unfiltered).
    pub fn line_summaries(&self) -> &LineSummaries {
        self.state.line_summaries()
    }

    /// Select `diagnostic`. Returns `None` (and clears the selection) if it is not in the set.
    pub fn set_selection(&mut self, diagnostic: &Arc<Diagnostic>) -> Option<&Selection> {
        if self.state.select(diagnostic) {
            self.notify(LintChangeType::SelectionChanged);
        }
        self.state.selection()
    }

    /// Drop the selection.
    pub fn clear_selection(&mut self) {
        if self.state.selection().is_some() {
            self.state.clear_selection();
            self.notify(LintChangeType::SelectionChanged);
        }
    }

    /// Select the diagnostic after `cursor`, wrapping around.
    pub fn advance_selection(&mut self, cursor: Range<usize>) -> Option<&Selection> {
        self.state.advance(cursor)?;
        self.notify(LintChangeType::SelectionChanged);
        self.state.selection()
    }

    /// Select the diagnostic before `cursor`, wrapping around.
    pub fn previous_selection(&mut self, cursor: Range<usize>) -> Option<&Selection> {
        self.state.retreat(cursor)?;
        self.notify(LintChangeType::SelectionChanged);
        self.state.selection()
    }

    /// The diagnostic after `cursor`, without selecting it.
    pub fn peek_next(&self, cursor: Range<usize>) -> Option<Selection> {
        SelectionTracker::next(self.state.diagnostics(), cursor)
    }

    fn marker_filter(&self) -> Option<&DiagnosticFilter> {
        self.config.as_ref()?.marker_filter.as_ref()
    }

    fn tooltip_filter(&self) -> Option<&DiagnosticFilter> {
        self.config.as_ref()?.tooltip_filter.as_ref()
    }

    /// Entries to render as inline markers, after the marker filter.
    pub fn markers(&self) -> Vec<&PositionedDiagnostic> {
        filter::project(self.marker_filter(), self.diagnostics().iter(), |entry| {
            entry.diagnostic.as_ref()
        })
    }

    /// Entries to show in a hover tooltip at `pos`, after the tooltip filter.
    pub fn tooltip(&self, pos: usize, side: Side) -> Vec<&PositionedDiagnostic> {
        filter::project(
            self.tooltip_filter(),
            self.diagnostics().query(pos, side),
            |entry| entry.diagnostic.as_ref(),
        )
    }

    /// Diagnostics to show when hovering the gutter of the line starting at `line_start`,
    /// after the tooltip filter.
    pub fn gutter_tooltip(&self, line_start: usize) -> Vec<Arc<Diagnostic>> {
        let Some(line) = self.line_summaries().at_line(line_start) else {
            return Vec::new();
        };
        filter::project(
            self.tooltip_filter(),
            line.diagnostics.iter().cloned(),
            |diagnostic| diagnostic.as_ref(),
        )
    }

    /// Run action `index` of `diagnostic` against its current span.
    pub fn run_action(
        &mut self,
        diagnostic: &Arc<Diagnostic>,
        index: usize,
    ) -> Result<(), LintError> {
        let set = self.state.diagnostics();
        let entry = set
            .position_of(diagnostic)
            .and_then(|position| set.get(position))
            .ok_or(LintError::UnknownDiagnostic)?;
        let range = entry.from..entry.to;

        let action = diagnostic
            .actions
            .get(index)
            .cloned()
            .ok_or(LintError::UnknownAction { index })?;

        debug!(action = %action.name, ?range, "lint.action.run");
        action.apply(self, range)
    }

    /// Subscribe to lint state changes.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&LintChange) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    fn notify(&mut self, change_type: LintChangeType) {
        let old_version = self.version;
        self.version += 1;
        let change = LintChange::new(change_type, old_version, self.version);
        for callback in &mut self.callbacks {
            callback(&change);
        }
    }
}

impl ActionTarget for Linter {
    fn document(&self) -> &DocumentSnapshot {
        &self.doc
    }

    fn dispatch(&mut self, changes: ChangeSet) -> Result<(), LintError> {
        self.apply_change(&changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Action, Severity, same_diagnostic};
    use crate::source::sync_source;
    use std::sync::Mutex;

    #[test]
    fn test_notifications_carry_versions() {
        let mut linter = Linter::new(DocumentSnapshot::new("0123456789"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        linter.subscribe(move |change| {
            sink.lock()
                .unwrap()
                .push((change.change_type, change.old_version, change.new_version));
        });

        let diagnostic = Arc::new(Diagnostic::new(2..4, Severity::Error, "e"));
        linter.replace_diagnostics(vec![diagnostic.clone()]).unwrap();
        linter.set_selection(&diagnostic);
        linter
            .apply_change(&ChangeSet::insert(10, 0, "ab").unwrap())
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (LintChangeType::DiagnosticsReplaced, 0, 1),
                (LintChangeType::SelectionChanged, 1, 2),
                (LintChangeType::DiagnosticsMapped, 2, 3),
                (LintChangeType::SelectionChanged, 3, 4),
            ]
        );
        assert_eq!(linter.version(), 4);
    }

    #[test]
    fn test_set_selection_notifies_only_on_change() {
        let mut linter = Linter::new(DocumentSnapshot::new("0123456789"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        linter.subscribe(move |change| sink.lock().unwrap().push(change.change_type));

        let diagnostic = Arc::new(Diagnostic::new(2..4, Severity::Error, "e"));
        let stranger = Arc::new(Diagnostic::new(2..4, Severity::Error, "e"));
        linter.replace_diagnostics(vec![diagnostic.clone()]).unwrap();

        // Nothing selected and nothing to select.
        assert!(linter.set_selection(&stranger).is_none());
        assert!(linter.set_selection(&diagnostic).is_some());
        assert!(linter.set_selection(&diagnostic).is_some());

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                LintChangeType::DiagnosticsReplaced,
                LintChangeType::SelectionChanged,
            ]
        );
        assert_eq!(linter.version(), 2);
    }

    #[test]
    fn test_run_action_uses_live_span() {
        let mut linter = Linter::new(DocumentSnapshot::new("let x = 1;"));
        let fix = Action::new("remove", |target, range| {
            let len = target.document().len();
            target.dispatch(ChangeSet::delete(len, range)?)
        });
        let diagnostic = Arc::new(
            Diagnostic::new(4..5, Severity::Warning, "unused").with_action(fix),
        );
        linter.replace_diagnostics(vec![diagnostic.clone()]).unwrap();

        // Shift the diagnostic before running its action.
        linter
            .apply_change(&ChangeSet::insert(10, 0, "  ").unwrap())
            .unwrap();
        assert_eq!(linter.diagnostics().get(0).unwrap().from, 6);

        linter.run_action(&diagnostic, 0).unwrap();
        assert_eq!(linter.document().text(), "  let  = 1;");
        assert!(linter.diagnostics().is_empty());

        assert!(matches!(
            linter.run_action(&diagnostic, 0),
            Err(LintError::UnknownDiagnostic)
        ));
    }

    #[test]
    fn test_run_action_rejects_unknown_index() {
        let mut linter = Linter::new(DocumentSnapshot::new("abc"));
        let diagnostic = Arc::new(Diagnostic::new(0..1, Severity::Info, "i"));
        linter.replace_diagnostics(vec![diagnostic.clone()]).unwrap();

        assert!(matches!(
            linter.run_action(&diagnostic, 2),
            Err(LintError::UnknownAction { index: 2 })
        ));
    }

    #[test]
    fn test_projections_apply_filters_but_storage_does_not() {
        let mut linter = Linter::new(DocumentSnapshot::new("0123456789"));
        let config = LintConfig::default()
            .with_marker_filter(DiagnosticFilter::new(|d| d.severity == Severity::Error))
            .with_tooltip_filter(DiagnosticFilter::new(|d| d.severity != Severity::Error));
        linter.register_source(sync_source(|_doc: &DocumentSnapshot| Ok(Vec::new())), config);

        linter
            .replace_diagnostics(vec![
                Diagnostic::new(0..4, Severity::Error, "e"),
                Diagnostic::new(2..6, Severity::Info, "i"),
            ])
            .unwrap();

        assert_eq!(linter.diagnostics().len(), 2);
        assert_eq!(linter.line_summaries().at_line(0).unwrap().diagnostics.len(), 2);

        let markers: Vec<_> = linter
            .markers()
            .iter()
            .map(|e| e.diagnostic.message.clone())
            .collect();
        assert_eq!(markers, vec!["e"]);

        let tooltip = linter.tooltip(3, Side::Right);
        assert_eq!(tooltip.len(), 1);
        assert_eq!(tooltip[0].diagnostic.message, "i");

        let gutter = linter.gutter_tooltip(0);
        assert_eq!(gutter.len(), 1);
        assert_eq!(gutter[0].message, "i");
    }

    #[test]
    fn test_navigation_selects_and_wraps() {
        let mut linter = Linter::new(DocumentSnapshot::new("0123456789"));
        let first = Arc::new(Diagnostic::new(1..2, Severity::Info, "a"));
        let second = Arc::new(Diagnostic::new(5..7, Severity::Info, "b"));
        linter
            .replace_diagnostics(vec![first.clone(), second.clone()])
            .unwrap();

        let selected = linter.advance_selection(2..2).unwrap();
        assert!(same_diagnostic(&selected.diagnostic, &second));
        assert!(same_diagnostic(&linter.peek_next(5..7).unwrap().diagnostic, &first));

        let selected = linter.previous_selection(1..2).unwrap();
        assert!(same_diagnostic(&selected.diagnostic, &second));

        linter.clear_selection();
        assert!(linter.selection().is_none());
    }

    #[test]
    fn test_force_is_noop_without_sources() {
        let mut linter = Linter::new(DocumentSnapshot::new("abc"));
        assert!(!linter.force());
        assert_eq!(linter.phase(), LintPhase::Idle);

        linter
            .apply_change(&ChangeSet::insert(3, 3, "d").unwrap())
            .unwrap();
        assert_eq!(linter.phase(), LintPhase::Idle);
    }
}
