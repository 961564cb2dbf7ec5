//! Immutable document snapshots.
//!
//! The lint core never edits text in place. Every applied [`ChangeSet`] yields a new
//! [`DocumentSnapshot`] with a bumped version, and that version is the token used to tell
//! whether a finished lint run still describes the current text.

use std::fmt;
use std::ops::Range;

use ropey::Rope;

use crate::change::ChangeSet;
use crate::error::LintError;

/// A logical line in character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    /// Line number (0-based).
    pub number: usize,
    /// Offset of the first character of the line.
    pub start: usize,
    /// Offset just before the line break (or the end of the document).
    pub end: usize,
}

/// An immutable view of the document text.
///
/// Cloning is O(1): the rope shares its nodes between snapshots.
#[derive(Clone)]
pub struct DocumentSnapshot {
    rope: Rope,
    version: u64,
}

impl DocumentSnapshot {
    /// Create the initial snapshot (version 0).
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            version: 0,
        }
    }

    /// Document length in characters.
    pub fn len(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns `true` if the document has no text.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Monotonically increasing version, bumped once per applied change set.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of logical lines (an empty document has one line).
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// The line containing `pos` (clamped to the document).
    pub fn line_at(&self, pos: usize) -> LineRange {
        let pos = pos.min(self.len());
        let number = self.rope.char_to_line(pos);
        let start = self.rope.line_to_char(number);

        let line = self.rope.line(number);
        let mut len = line.len_chars();
        // Strip "\n" or "\r\n".
        if len > 0 && line.char(len - 1) == '\n' {
            len -= 1;
            if len > 0 && line.char(len - 1) == '\r' {
                len -= 1;
            }
        }

        LineRange {
            number,
            start,
            end: start + len,
        }
    }

    /// The character at `pos`, if any.
    pub fn char_at(&self, pos: usize) -> Option<char> {
        (pos < self.len()).then(|| self.rope.char(pos))
    }

    /// Copy out a range of text (clamped to the document).
    pub fn slice(&self, range: Range<usize>) -> String {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        self.rope.slice(start..end).to_string()
    }

    /// The whole document text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Apply `changes`, producing the next snapshot.
    pub fn apply(&self, changes: &ChangeSet) -> Result<DocumentSnapshot, LintError> {
        if changes.len_before() != self.len() {
            return Err(LintError::LengthMismatch {
                expected: changes.len_before(),
                actual: self.len(),
            });
        }

        let mut rope = self.rope.clone();
        changes.apply_to(&mut rope);
        Ok(DocumentSnapshot {
            rope,
            version: self.version + 1,
        })
    }
}

impl fmt::Debug for DocumentSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentSnapshot")
            .field("len", &self.len())
            .field("version", &self.version)
            .finish()
    }
}
