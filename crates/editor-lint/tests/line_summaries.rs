use editor_lint::{ChangeSet, Diagnostic, DocumentSnapshot, Linter, Severity};
use pretty_assertions::assert_eq;

fn shape(linter: &Linter) -> Vec<(usize, usize, Severity)> {
    linter
        .line_summaries()
        .iter()
        .map(|line| (line.line_start, line.diagnostics.len(), line.severity))
        .collect()
}

#[test]
fn test_summaries_follow_edits_until_replaced() {
    let text = "alpha\nbeta\ngamma\n";
    let mut linter = Linter::new(DocumentSnapshot::new(text));
    linter
        .replace_diagnostics(vec![
            Diagnostic::new(0..5, Severity::Info, "a"),
            Diagnostic::new(6..10, Severity::Warning, "b1"),
            Diagnostic::new(8..8, Severity::Error, "b2"),
            Diagnostic::new(11..16, Severity::Info, "c"),
        ])
        .unwrap();

    assert_eq!(
        shape(&linter),
        vec![
            (0, 1, Severity::Info),
            (6, 2, Severity::Error),
            (11, 1, Severity::Info),
        ]
    );

    // Insert a new first line. Summaries shift with the text.
    linter
        .apply_change(&ChangeSet::insert(text.len(), 0, "new\n").unwrap())
        .unwrap();
    assert_eq!(
        shape(&linter),
        vec![
            (0, 1, Severity::Info),
            (10, 2, Severity::Error),
            (15, 1, Severity::Info),
        ]
    );

    // Re-submit the live spans; replacement re-buckets them.
    let diagnostics: Vec<_> = linter
        .diagnostics()
        .iter()
        .map(|entry| {
            Diagnostic::new(
                entry.from..entry.to,
                entry.diagnostic.severity,
                entry.diagnostic.message.clone(),
            )
        })
        .collect();
    linter.replace_diagnostics(diagnostics).unwrap();
    assert_eq!(
        shape(&linter),
        vec![
            (4, 1, Severity::Info),
            (10, 2, Severity::Error),
            (15, 1, Severity::Info),
        ]
    );
}

#[test]
fn test_worst_severity_wins_regardless_of_order() {
    let mut linter = Linter::new(DocumentSnapshot::new("one line"));
    linter
        .replace_diagnostics(vec![
            Diagnostic::new(0..1, Severity::Warning, "w"),
            Diagnostic::new(2..3, Severity::Error, "e"),
            Diagnostic::new(4..5, Severity::Info, "i"),
        ])
        .unwrap();

    assert_eq!(shape(&linter), vec![(0, 3, Severity::Error)]);
    assert_eq!(linter.gutter_tooltip(0).len(), 3);
    assert!(linter.gutter_tooltip(1).is_empty());
}

#[test]
fn test_joined_lines_share_one_summary() {
    let text = "ab\ncd\nef";
    let mut linter = Linter::new(DocumentSnapshot::new(text));
    linter
        .replace_diagnostics(vec![
            Diagnostic::new(3..4, Severity::Warning, "line1"),
            Diagnostic::new(6..7, Severity::Error, "line2"),
        ])
        .unwrap();

    linter
        .apply_change(&ChangeSet::delete(text.len(), 3..6).unwrap())
        .unwrap();
    assert_eq!(shape(&linter), vec![(3, 2, Severity::Error)]);

    let tooltip: Vec<_> = linter
        .gutter_tooltip(3)
        .iter()
        .map(|diagnostic| diagnostic.message.clone())
        .collect();
    assert_eq!(tooltip, vec!["line1", "line2"]);
}
