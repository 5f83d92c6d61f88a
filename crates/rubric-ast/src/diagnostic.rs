// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Parser-reported diagnostics.

use std::cmp::{max, min};

use serde::Serialize;

use crate::range::SourceRange;

/// Severity of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Note,
    Warning,
    Error,
    Fatal,
}

impl DiagnosticLevel {
    /// `error` and `fatal` make a source syntactically invalid.
    pub fn is_error(self) -> bool {
        matches!(self, DiagnosticLevel::Error | DiagnosticLevel::Fatal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticLevel::Note => "note",
            DiagnosticLevel::Warning => "warning",
            DiagnosticLevel::Error => "error",
            DiagnosticLevel::Fatal => "fatal",
        }
    }
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured issue reported by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub location: SourceRange,
}

impl Diagnostic {
    pub fn new(level: DiagnosticLevel, message: impl Into<String>, location: SourceRange) -> Self {
        Diagnostic {
            level,
            message: message.into(),
            location,
        }
    }

    pub fn error(message: impl Into<String>, location: SourceRange) -> Self {
        Self::new(DiagnosticLevel::Error, message, location)
    }

    pub fn fatal(message: impl Into<String>, location: SourceRange) -> Self {
        Self::new(DiagnosticLevel::Fatal, message, location)
    }

    pub fn warning(message: impl Into<String>, location: SourceRange) -> Self {
        Self::new(DiagnosticLevel::Warning, message, location)
    }

    pub fn is_error(&self) -> bool {
        self.level.is_error()
    }

    /// Format this diagnostic with the surrounding source lines.
    ///
    /// `label` names the source (usually its path). Output is plain text so
    /// it can be written to logs or compared in tests.
    pub fn render(&self, source: &str, label: &str) -> String {
        use annotate_snippets::{Level, Renderer, Snippet};

        let level = match self.level {
            DiagnosticLevel::Note => Level::Note,
            DiagnosticLevel::Warning => Level::Warning,
            DiagnosticLevel::Error | DiagnosticLevel::Fatal => Level::Error,
        };

        let context = 1;
        let line_start = max(1, self.location.line.saturating_sub(context));
        let start_offset = bol_offset(source, line_start);
        let end_offset = bol_offset(source, self.location.line + context + 1);
        let snippet_text = &source[start_offset..end_offset];

        let begin = self.location.begin_pos.clamp(start_offset, end_offset) - start_offset;
        let end = self.location.end_pos.clamp(start_offset, end_offset) - start_offset;
        let end = if begin == end {
            min(end + 1, snippet_text.len() + 1)
        } else {
            end
        };
        let begin = min(begin, end);

        Renderer::plain()
            .render(
                level.title(&self.message).snippet(
                    Snippet::source(snippet_text)
                        .origin(label)
                        .line_start(line_start)
                        .fold(false)
                        .annotation(level.span(begin..end).label(self.level.as_str())),
                ),
            )
            .to_string()
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.location, self.level, self.message)
    }
}

/// Returns the byte offset of the beginning of line `n` (1-indexed).
fn bol_offset(source: &str, n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    source
        .match_indices('\n')
        .nth(n - 2)
        .map(|(index, _)| index + 1)
        .unwrap_or(source.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_levels() {
        assert!(!DiagnosticLevel::Note.is_error());
        assert!(!DiagnosticLevel::Warning.is_error());
        assert!(DiagnosticLevel::Error.is_error());
        assert!(DiagnosticLevel::Fatal.is_error());
    }

    #[test]
    fn display_includes_position() {
        let d = Diagnostic::error("unexpected token", SourceRange::new(6, 7, 2, 2));
        assert_eq!(d.to_string(), "2:3: error: unexpected token");
    }

    #[test]
    fn render_points_at_location() {
        let source = "x = 1\ny = )\nz = 3\n";
        let d = Diagnostic::error("unexpected token tRPAREN", SourceRange::new(10, 11, 2, 4));
        let rendered = d.render(source, "bad.rb");
        assert!(rendered.contains("error: unexpected token tRPAREN"));
        assert!(rendered.contains("bad.rb"));
        assert!(rendered.contains("y = )"));
    }

    #[test]
    fn render_handles_end_of_input() {
        let source = "\"abc";
        let d = Diagnostic::fatal("unterminated string meets end of file", SourceRange::new(4, 4, 1, 4));
        let rendered = d.render(source, "(string)");
        assert!(rendered.contains("unterminated string"));
    }

    #[test]
    fn serializes_level_lowercase() {
        let d = Diagnostic::warning("ambiguous first argument", SourceRange::new(0, 1, 1, 0));
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["level"], "warning");
        assert_eq!(json["message"], "ambiguous first argument");
    }
}
