//! Text changes and position mapping.
//!
//! A [`ChangeSet`] describes one document edit as a list of replaced spans, all expressed in
//! **pre-edit** character offsets (Unicode scalar values). Besides applying the edit to a
//! snapshot, a change set is the position mapper every piece of derived state goes through:
//! diagnostics, the selected diagnostic and gutter line summaries are all re-anchored with
//! [`ChangeSet::map_pos`] instead of being recomputed.

use std::ops::Range;

use ropey::Rope;

use crate::error::LintError;

/// Which side of inserted text a mapped position sticks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    /// Stay before text inserted exactly at the position.
    Before,
    /// Move past text inserted exactly at the position.
    After,
}

/// A single replaced span.
///
/// Semantics:
/// - `from..to` is the deleted range in the document **before** the change set is applied.
/// - `insert` replaces it (may be empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Start character offset of the replaced span.
    pub from: usize,
    /// End character offset (exclusive) of the replaced span.
    pub to: usize,
    /// Replacement text.
    pub insert: String,
}

impl TextEdit {
    /// Create an edit replacing `range` with `insert`.
    pub fn new(range: Range<usize>, insert: impl Into<String>) -> Self {
        Self {
            from: range.start,
            to: range.end,
            insert: insert.into(),
        }
    }

    /// Length of the deleted span in characters.
    pub fn deleted_len(&self) -> usize {
        self.to - self.from
    }

    /// Length of `insert` in characters.
    pub fn inserted_len(&self) -> usize {
        self.insert.chars().count()
    }
}

/// An edit to a document of known length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    len_before: usize,
    len_after: usize,
    /// Sorted by `from`, non-overlapping.
    edits: Vec<TextEdit>,
}

impl ChangeSet {
    /// Build a change set for a document of `len_before` chars.
    ///
    /// Edits are sorted by start offset. Edits may touch but not overlap, and at most one pure
    /// insertion may sit at any offset.
    pub fn new(len_before: usize, mut edits: Vec<TextEdit>) -> Result<Self, LintError> {
        edits.retain(|edit| edit.from != edit.to || !edit.insert.is_empty());
        edits.sort_by_key(|edit| (edit.from, edit.to));

        for edit in &edits {
            if edit.from > edit.to || edit.to > len_before {
                return Err(LintError::EditOutOfBounds {
                    from: edit.from,
                    to: edit.to,
                    len: len_before,
                });
            }
        }

        for pair in edits.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let both_inserts_at_same_spot =
                prev.from == prev.to && next.from == next.to && prev.from == next.from;
            if next.from < prev.to || both_inserts_at_same_spot {
                return Err(LintError::OverlappingEdits { at: next.from });
            }
        }

        let len_after = edits.iter().fold(len_before, |len, edit| {
            len - edit.deleted_len() + edit.inserted_len()
        });

        Ok(Self {
            len_before,
            len_after,
            edits,
        })
    }

    /// Insert `text` at `pos`.
    pub fn insert(
        len_before: usize,
        pos: usize,
        text: impl Into<String>,
    ) -> Result<Self, LintError> {
        Self::new(len_before, vec![TextEdit::new(pos..pos, text)])
    }

    /// Delete `range`.
    pub fn delete(len_before: usize, range: Range<usize>) -> Result<Self, LintError> {
        Self::new(len_before, vec![TextEdit::new(range, "")])
    }

    /// Replace `range` with `text`.
    pub fn replace(
        len_before: usize,
        range: Range<usize>,
        text: impl Into<String>,
    ) -> Result<Self, LintError> {
        Self::new(len_before, vec![TextEdit::new(range, text)])
    }

    /// Document length this change set applies to.
    pub fn len_before(&self) -> usize {
        self.len_before
    }

    /// Document length after applying the change set.
    pub fn len_after(&self) -> usize {
        self.len_after
    }

    /// Returns `true` if the change set leaves the document untouched.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// The edits, sorted by start offset (pre-edit coordinates).
    pub fn edits(&self) -> &[TextEdit] {
        &self.edits
    }

    /// Map a pre-edit position to its post-edit position.
    ///
    /// - A pure insertion at `pos` is skipped over only with [`Assoc::After`].
    /// - A position at the start of a replaced span maps to the start of its replacement, one at
    ///   the end maps past the replacement, and one strictly inside follows `assoc`.
    /// - Positions past the end of the document are clamped to it first.
    pub fn map_pos(&self, pos: usize, assoc: Assoc) -> usize {
        let pos = pos.min(self.len_before);
        let mut shift: isize = 0;

        for edit in &self.edits {
            if pos < edit.from {
                break;
            }

            let inserted = edit.inserted_len() as isize;
            let deleted = edit.deleted_len() as isize;
            let start = (edit.from as isize + shift) as usize;

            if edit.from == edit.to {
                // Pure insertion exactly at `pos` (earlier insertions fall in the `pos > to` case).
                if pos == edit.from && assoc == Assoc::Before {
                    return start;
                }
                shift += inserted;
                continue;
            }

            if pos >= edit.to {
                shift += inserted - deleted;
                continue;
            }

            if pos == edit.from {
                return start;
            }

            return match assoc {
                Assoc::Before => start,
                Assoc::After => start + inserted as usize,
            };
        }

        ((pos as isize + shift) as usize).min(self.len_after)
    }

    pub(crate) fn apply_to(&self, rope: &mut Rope) {
        for edit in self.edits.iter().rev() {
            if edit.to > edit.from {
                rope.remove(edit.from..edit.to);
            }
            if !edit.insert.is_empty() {
                rope.insert(edit.from, &edit.insert);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_respects_assoc() {
        let changes = ChangeSet::insert(10, 4, "abc").unwrap();
        assert_eq!(changes.len_after(), 13);

        assert_eq!(changes.map_pos(2, Assoc::After), 2);
        assert_eq!(changes.map_pos(4, Assoc::Before), 4);
        assert_eq!(changes.map_pos(4, Assoc::After), 7);
        assert_eq!(changes.map_pos(5, Assoc::Before), 8);
    }

    #[test]
    fn test_deletion_collapses_inner_positions() {
        let changes = ChangeSet::delete(10, 2..5).unwrap();
        assert_eq!(changes.len_after(), 7);

        assert_eq!(changes.map_pos(2, Assoc::After), 2);
        assert_eq!(changes.map_pos(3, Assoc::Before), 2);
        assert_eq!(changes.map_pos(3, Assoc::After), 2);
        assert_eq!(changes.map_pos(5, Assoc::Before), 2);
        assert_eq!(changes.map_pos(7, Assoc::Before), 4);
    }

    #[test]
    fn test_replacement_boundaries() {
        // "0123456789" -> replace 2..4 with "xyz"
        let changes = ChangeSet::replace(10, 2..4, "xyz").unwrap();

        assert_eq!(changes.map_pos(2, Assoc::After), 2);
        assert_eq!(changes.map_pos(4, Assoc::Before), 5);
        assert_eq!(changes.map_pos(3, Assoc::Before), 2);
        assert_eq!(changes.map_pos(3, Assoc::After), 5);
    }

    #[test]
    fn test_multiple_edits_accumulate_shift() {
        let changes = ChangeSet::new(
            10,
            vec![TextEdit::new(8..9, ""), TextEdit::new(1..1, "ab")],
        )
        .unwrap();
        assert_eq!(changes.edits()[0].from, 1);
        assert_eq!(changes.len_after(), 11);

        assert_eq!(changes.map_pos(5, Assoc::Before), 7);
        assert_eq!(changes.map_pos(10, Assoc::Before), 11);
    }

    #[test]
    fn test_insertion_followed_by_adjacent_deletion() {
        let changes = ChangeSet::new(
            10,
            vec![TextEdit::new(5..5, "x"), TextEdit::new(5..7, "")],
        )
        .unwrap();

        assert_eq!(changes.map_pos(5, Assoc::Before), 5);
        assert_eq!(changes.map_pos(5, Assoc::After), 6);
        assert_eq!(changes.map_pos(7, Assoc::Before), 6);
    }

    #[test]
    fn test_positions_past_end_are_clamped() {
        let changes = ChangeSet::delete(10, 0..8).unwrap();
        assert_eq!(changes.map_pos(42, Assoc::After), 2);
    }

    #[test]
    fn test_rejects_invalid_edits() {
        assert!(matches!(
            ChangeSet::delete(4, 2..6),
            Err(LintError::EditOutOfBounds { .. })
        ));
        assert!(matches!(
            ChangeSet::new(10, vec![TextEdit::new(1..4, ""), TextEdit::new(3..5, "x")]),
            Err(LintError::OverlappingEdits { at: 3 })
        ));
        assert!(matches!(
            ChangeSet::new(10, vec![TextEdit::new(3..3, "a"), TextEdit::new(3..3, "b")]),
            Err(LintError::OverlappingEdits { at: 3 })
        ));
    }

    #[test]
    fn test_apply_to_rope() {
        let mut rope = Rope::from_str("hello world");
        let changes = ChangeSet::new(
            11,
            vec![TextEdit::new(0..5, "goodbye"), TextEdit::new(11..11, "!")],
        )
        .unwrap();
        changes.apply_to(&mut rope);
        assert_eq!(rope.to_string(), "goodbye world!");
        assert_eq!(rope.len_chars(), changes.len_after());
    }
}
