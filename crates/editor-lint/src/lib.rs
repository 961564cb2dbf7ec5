#![warn(missing_docs)]
//! Editor Lint - Headless Diagnostics Tracking and Debounced Linting
//!
//! # Overview
//!
//! `editor-lint` keeps a set of diagnostics anchored to a mutable document and decides when
//! they are recomputed. It renders nothing and parses nothing: hosts register lint sources,
//! feed in edits, and read back the diagnostic set, the focused diagnostic and per-line
//! summaries.
//!
//! # Core Features
//!
//! - **Overlapping intervals**: every diagnostic is its own entry, never merged with others
//! - **Edit mapping**: boundary-biased re-anchoring through arbitrary change sets
//! - **Selection tracking**: the focused diagnostic follows edits and replacements
//! - **Gutter summaries**: worst severity per line, re-bucketed on replacement
//! - **Debounced linting**: quiet-period scheduling with stale results dropped and failing
//!   sources isolated
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Linter (serialized update path)            │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  LintScheduler + LintSource runs            │  ← When to lint
//! ├─────────────────────────────────────────────┤
//! │  LintState (selection + line summaries)     │  ← Derived views
//! ├─────────────────────────────────────────────┤
//! │  DiagnosticSet (immutable interval store)   │  ← Positioned diagnostics
//! ├─────────────────────────────────────────────┤
//! │  DocumentSnapshot + ChangeSet (rope-based)  │  ← Text and position mapping
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use editor_lint::{ChangeSet, Diagnostic, DocumentSnapshot, Linter, Severity, Side};
//!
//! let mut linter = Linter::new(DocumentSnapshot::new("let x = 1;\nlet y = 2;\n"));
//! linter
//!     .replace_diagnostics(vec![
//!         Diagnostic::new(4..5, Severity::Warning, "unused variable `x`"),
//!         Diagnostic::new(15..16, Severity::Warning, "unused variable `y`"),
//!     ])
//!     .unwrap();
//!
//! // Typing in front of a diagnostic moves it.
//! linter.apply_change(&ChangeSet::insert(22, 0, "// \n").unwrap()).unwrap();
//! assert_eq!(linter.diagnostics().get(0).unwrap().from, 8);
//!
//! // Hover and navigation.
//! assert_eq!(linter.tooltip(8, Side::Right).len(), 1);
//! let next = linter.advance_selection(9..9).unwrap();
//! assert_eq!(next.range(), 19..20);
//! ```
//!
//! # Module Description
//!
//! - [`change`] - Change sets and position mapping
//! - [`document`] - Immutable rope-backed document snapshots
//! - [`diagnostics`] - Diagnostic data model and actions
//! - [`intervals`] - The diagnostic interval store
//! - [`selection`] - Focused diagnostic tracking and navigation
//! - [`gutter`] - Per-line summaries
//! - [`filter`] / [`config`] - Render-time filters and source configuration
//! - [`source`] - Lint source trait and concurrent invocation
//! - [`scheduler`] - Debounce state machine
//! - [`state`] / [`linter`] - State bundle, notifications and the driver

pub mod change;
pub mod config;
pub mod diagnostics;
pub mod document;
mod error;
pub mod filter;
pub mod gutter;
pub mod intervals;
pub mod linter;
pub mod scheduler;
pub mod selection;
pub mod source;
pub mod state;

pub use change::{Assoc, ChangeSet, TextEdit};
pub use config::{DEFAULT_LINT_DELAY, LintConfig};
pub use diagnostics::{
    Action, ActionFn, ActionTarget, Diagnostic, Severity, max_severity, same_diagnostic,
};
pub use document::{DocumentSnapshot, LineRange};
pub use error::LintError;
pub use filter::DiagnosticFilter;
pub use gutter::{LineSummaries, LineSummary};
pub use intervals::{DiagnosticSet, DiagnosticSpan, MarkerKind, PositionedDiagnostic, Side};
pub use linter::{LintEvent, Linter};
pub use scheduler::{DEADLINE_TOLERANCE, LintPhase, LintScheduler, RunCompletion, TimerOutcome};
pub use selection::{Selection, SelectionTracker};
pub use source::{LintFuture, LintSource, SourceError, SyncSource, sync_source};
pub use state::{LintChange, LintChangeCallback, LintChangeType, LintState};
