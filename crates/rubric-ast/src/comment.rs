// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use serde::Serialize;

use crate::range::SourceRange;

/// A source comment: a `#` line comment or an `=begin`/`=end` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub text: String,
    pub range: SourceRange,
}

impl Comment {
    pub fn new(text: impl Into<String>, range: SourceRange) -> Self {
        Comment {
            text: text.into(),
            range,
        }
    }

    /// Whether this is an embedded `=begin` document.
    pub fn is_document(&self) -> bool {
        self.text.starts_with("=begin")
    }

    /// The comment body with the leading `#` and surrounding spaces removed.
    pub fn body(&self) -> &str {
        self.text.strip_prefix('#').unwrap_or(&self.text).trim()
    }

    pub fn line(&self) -> usize {
        self.range.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_comment_body() {
        let c = Comment::new("#  hello ", SourceRange::new(0, 9, 1, 0));
        assert_eq!(c.body(), "hello");
        assert!(!c.is_document());
    }

    #[test]
    fn document_comment() {
        let c = Comment::new("=begin\nx\n=end\n", SourceRange::new(0, 14, 1, 0));
        assert!(c.is_document());
    }
}
