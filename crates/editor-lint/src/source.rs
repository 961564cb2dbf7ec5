//! Diagnostic producers.
//!
//! A [`LintSource`] turns a document snapshot into diagnostics, synchronously or not. The core
//! never implements one; hosts register them on a [`Linter`](crate::Linter), which invokes all of
//! them together once the document has been quiet long enough.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use tracing::error;

use crate::diagnostics::Diagnostic;
use crate::document::DocumentSnapshot;
use crate::error::LintError;

/// Error type lint sources fail with.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Future returned by [`LintSource::lint`].
pub type LintFuture = BoxFuture<'static, Result<Vec<Diagnostic>, SourceError>>;

/// A producer of diagnostics.
///
/// Implemented for any `Fn(DocumentSnapshot) -> impl Future<Output = Result<Vec<Diagnostic>,
/// SourceError>>`. Wrap synchronous functions with [`sync_source`].
pub trait LintSource: Send + Sync {
    /// Lint `doc`.
    ///
    /// Called on the update path; expensive work belongs in the returned future.
    fn lint(&self, doc: DocumentSnapshot) -> LintFuture;
}

impl<F, Fut> LintSource for F
where
    F: Fn(DocumentSnapshot) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<Diagnostic>, SourceError>> + Send + 'static,
{
    fn lint(&self, doc: DocumentSnapshot) -> LintFuture {
        Box::pin(self(doc))
    }
}

/// A [`LintSource`] computing its diagnostics synchronously.
pub struct SyncSource<F>(F);

/// Adapt a synchronous lint function.
pub fn sync_source<F>(lint: F) -> SyncSource<F>
where
    F: Fn(&DocumentSnapshot) -> Result<Vec<Diagnostic>, SourceError> + Send + Sync,
{
    SyncSource(lint)
}

impl<F> LintSource for SyncSource<F>
where
    F: Fn(&DocumentSnapshot) -> Result<Vec<Diagnostic>, SourceError> + Send + Sync,
{
    fn lint(&self, doc: DocumentSnapshot) -> LintFuture {
        Box::pin(future::ready((self.0)(&doc)))
    }
}

type Outcome = Result<Result<Vec<Diagnostic>, SourceError>, ()>;

/// Invoke every source now and return a future joining their results.
///
/// Sources are isolated from each other: an error or a panic in one does not keep the others
/// from being awaited. The joined result concatenates diagnostics in registration order, or
/// fails with the first failure after logging all of them.
pub(crate) fn run_sources(
    sources: &[Arc<dyn LintSource>],
    doc: &DocumentSnapshot,
) -> BoxFuture<'static, Result<Vec<Diagnostic>, LintError>> {
    let runs: Vec<BoxFuture<'static, Outcome>> = sources
        .iter()
        .map(|source| {
            match std::panic::catch_unwind(AssertUnwindSafe(|| source.lint(doc.clone()))) {
                Ok(fut) => AssertUnwindSafe(fut).catch_unwind().map(|r| r.map_err(|_| ())).boxed(),
                Err(_) => future::ready(Err(())).boxed(),
            }
        })
        .collect();

    async move {
        let outcomes = future::join_all(runs).await;

        let mut diagnostics = Vec::new();
        let mut first_failure = None;
        for (index, outcome) in outcomes.into_iter().enumerate() {
            let failure = match outcome {
                Ok(Ok(found)) => {
                    diagnostics.extend(found);
                    continue;
                }
                Ok(Err(source)) => {
                    error!(index, error = %source, "lint.source.failed");
                    LintError::Source { index, source }
                }
                Err(()) => {
                    error!(index, "lint.source.panicked");
                    LintError::SourcePanicked { index }
                }
            };
            first_failure.get_or_insert(failure);
        }

        match first_failure {
            Some(failure) => Err(failure),
            None => Ok(diagnostics),
        }
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn block_on<T>(fut: BoxFuture<'static, T>) -> T {
        futures::executor::block_on(fut)
    }

    #[test]
    fn test_results_concatenate_in_registration_order() {
        let first: Arc<dyn LintSource> = Arc::new(sync_source(|_doc: &DocumentSnapshot| {
            Ok(vec![Diagnostic::new(3..4, Severity::Info, "first")])
        }));
        let second: Arc<dyn LintSource> = Arc::new(|_doc: DocumentSnapshot| async {
            Ok::<_, SourceError>(vec![Diagnostic::new(0..1, Severity::Error, "second")])
        });

        let doc = DocumentSnapshot::new("hello");
        let diagnostics = block_on(run_sources(&[first, second], &doc)).unwrap();
        let messages: Vec<_> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[test]
    fn test_failure_does_not_stop_other_sources() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);

        let failing: Arc<dyn LintSource> = Arc::new(sync_source(|_doc: &DocumentSnapshot| {
            Err::<Vec<Diagnostic>, SourceError>("boom".into())
        }));
        let panicking: Arc<dyn LintSource> = Arc::new(sync_source(|_doc: &DocumentSnapshot| {
            panic!("lint source bug")
        }));
        let healthy: Arc<dyn LintSource> = Arc::new(move |_doc: DocumentSnapshot| {
            let counted = Arc::clone(&counted);
            async move {
                counted.fetch_add(1, Ordering::SeqCst);
                Ok::<_, SourceError>(vec![Diagnostic::new(0..1, Severity::Info, "ok")])
            }
        });

        let doc = DocumentSnapshot::new("hello");
        let result = block_on(run_sources(&[healthy, failing, panicking], &doc));

        assert!(matches!(result, Err(LintError::Source { index: 1, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
