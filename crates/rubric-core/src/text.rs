//! Text position utilities for byte offsets, lines and columns.
//!
//! ## Coordinate Conventions
//!
//! - Lines are **1-indexed** (matching editor and diagnostic conventions)
//! - Columns are **0-indexed** and count bytes from the start of the line
//! - Byte offsets are **0-indexed**
//!
//! Line splitting follows the "split after each `\n`" rule: a trailing newline
//! does not start a new (empty) line, and `\r\n` terminators are stripped as a
//! unit by [`logical_lines`].

use memchr::memchr_iter;

// ============================================================================
// Line Index
// ============================================================================

/// Precomputed line-start table for repeated offset lookups.
///
/// Building the index is a single `memchr` pass; each lookup is a binary
/// search, so a tokenizer can position every token without rescanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(content: &str) -> Self {
        let bytes = content.as_bytes();
        let mut starts = Vec::with_capacity(bytes.len() / 32 + 1);
        starts.push(0);
        starts.extend(memchr_iter(b'\n', bytes).map(|i| i + 1));
        LineIndex {
            starts,
            len: bytes.len(),
        }
    }

    /// Convert a byte offset to a `(line, column)` pair.
    ///
    /// Offsets past the end clamp to the end of the content.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len);
        let line = match self.starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        (line + 1, offset - self.starts[line])
    }

    /// Byte offset where the given 1-indexed line begins.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        if line == 0 {
            return None;
        }
        self.starts.get(line - 1).copied().filter(|&s| s <= self.len)
    }

    /// Number of line starts, counting a final unterminated line.
    pub fn line_count(&self) -> usize {
        if self.len == 0 {
            0
        } else if self.starts.last() == Some(&self.len) {
            self.starts.len() - 1
        } else {
            self.starts.len()
        }
    }
}

// ============================================================================
// Line Splitting
// ============================================================================

/// Split into lines, keeping each line's terminator.
///
/// `"a\nb"` yields `["a\n", "b"]`; the empty string yields no lines.
pub fn raw_lines(content: &str) -> Vec<&str> {
    let bytes = content.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    for nl in memchr_iter(b'\n', bytes) {
        lines.push(&content[start..=nl]);
        start = nl + 1;
    }
    if start < bytes.len() {
        lines.push(&content[start..]);
    }
    lines
}

/// Split into lines with `\n` / `\r\n` terminators stripped.
pub fn logical_lines(content: &str) -> Vec<&str> {
    raw_lines(content).into_iter().map(chomp).collect()
}

/// Strip one trailing line terminator.
pub fn chomp(line: &str) -> &str {
    line.strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .unwrap_or(line)
}

// ============================================================================
// Tests
// ============================================================================
