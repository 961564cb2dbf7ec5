//! Lint session example
//!
//! Simulates a user typing into a document while a trailing-whitespace linter runs in the
//! background. Run with `RUST_LOG`-style output enabled to watch the scheduler re-arm, run and
//! discard stale results.

use std::time::Duration;

use editor_lint::{
    ChangeSet, Diagnostic, DocumentSnapshot, LintConfig, LintEvent, Linter, Severity, SourceError,
    sync_source,
};
use regex::Regex;
use tokio::sync::mpsc;

fn trailing_whitespace(doc: &DocumentSnapshot) -> Result<Vec<Diagnostic>, SourceError> {
    let pattern = Regex::new(r"[ \t]+$")?;
    let text = doc.text();

    let mut diagnostics = Vec::new();
    let mut line_start = 0;
    for line in text.split('\n') {
        if let Some(found) = pattern.find(line) {
            let from = line_start + line[..found.start()].chars().count();
            let to = line_start + line[..found.end()].chars().count();
            diagnostics.push(
                Diagnostic::new(from..to, Severity::Warning, "trailing whitespace")
                    .with_source("whitespace"),
            );
        }
        line_start += line.chars().count() + 1;
    }
    Ok(diagnostics)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .init();

    let mut linter = Linter::new(DocumentSnapshot::new("fn main() {\n}\n"));
    linter.subscribe(|change| {
        println!(
            "  change: {:?} (version {} -> {})",
            change.change_type, change.old_version, change.new_version
        );
    });
    linter.register_source(
        sync_source(trailing_whitespace),
        LintConfig::default().with_delay(Duration::from_millis(300)),
    );

    // Keystrokes arrive faster than the quiet period, so only the last one leads to a run.
    let (tx, mut rx) = mpsc::channel::<&'static str>(8);
    tokio::spawn(async move {
        for keystroke in ["    let x = 1;", "  ", "\n", "    x  "] {
            tokio::time::sleep(Duration::from_millis(120)).await;
            if tx.send(keystroke).await.is_err() {
                return;
            }
        }
    });

    loop {
        tokio::select! {
            Some(text) = rx.recv() => {
                let at = linter.document().len() - 2;
                let changes = ChangeSet::insert(linter.document().len(), at, text)
                    .expect("insert inside the document");
                linter.apply_change(&changes).expect("change matches the document");
                println!("typed {text:?}");
            }
            event = linter.next_event() => {
                println!("event: {event:?}");
                if let LintEvent::Committed { .. } = event {
                    break;
                }
            }
        }
    }

    println!("\nfinal document:\n{}", linter.document().text());
    for entry in linter.diagnostics() {
        println!(
            "  {}..{} {:?}: {}",
            entry.from, entry.to, entry.diagnostic.severity, entry.diagnostic.message
        );
    }
    for line in linter.line_summaries() {
        println!(
            "  gutter @{}: {:?} ({} diagnostics)",
            line.line_start,
            line.severity,
            line.diagnostics.len()
        );
    }

    linter.shutdown();
}
