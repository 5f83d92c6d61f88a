// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Source positions.

use serde::Serialize;

/// A half-open byte range into a decoded source buffer.
///
/// `line` is 1-indexed and `column` is the 0-indexed byte column of
/// `begin_pos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct SourceRange {
    pub begin_pos: usize,
    pub end_pos: usize,
    pub line: usize,
    pub column: usize,
}

impl SourceRange {
    pub fn new(begin_pos: usize, end_pos: usize, line: usize, column: usize) -> Self {
        SourceRange {
            begin_pos,
            end_pos,
            line,
            column,
        }
    }

    /// The smallest range covering both `self` and `other`.
    #[must_use]
    pub fn join(self, other: SourceRange) -> SourceRange {
        let (begin_pos, line, column) = if other.begin_pos < self.begin_pos {
            (other.begin_pos, other.line, other.column)
        } else {
            (self.begin_pos, self.line, self.column)
        };
        SourceRange {
            begin_pos,
            end_pos: self.end_pos.max(other.end_pos),
            line,
            column,
        }
    }

    /// A zero-width range at this range's end.
    #[must_use]
    pub fn end(self) -> SourceRange {
        SourceRange {
            begin_pos: self.end_pos,
            end_pos: self.end_pos,
            line: self.line,
            column: self.column + self.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.end_pos.saturating_sub(self.begin_pos)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The covered text, or `""` when the range does not fit `source`.
    pub fn source<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.begin_pos..self.end_pos).unwrap_or("")
    }
}

impl std::fmt::Display for SourceRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_covers_both_and_keeps_first_position() {
        let a = SourceRange::new(4, 7, 1, 4);
        let b = SourceRange::new(10, 12, 2, 1);
        let joined = a.join(b);
        assert_eq!(joined, SourceRange::new(4, 12, 1, 4));
        assert_eq!(b.join(a), joined);
    }

    #[test]
    fn source_slice() {
        let r = SourceRange::new(2, 5, 1, 2);
        assert_eq!(r.source("a.bcd(e)"), "bcd");
        assert_eq!(r.len(), 3);
        assert_eq!(SourceRange::new(0, 50, 1, 0).source("short"), "");
    }

    #[test]
    fn display_is_one_based() {
        assert_eq!(SourceRange::new(0, 1, 3, 0).to_string(), "3:1");
    }
}
