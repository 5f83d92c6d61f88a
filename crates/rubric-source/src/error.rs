//! Error types for source ingestion.
//!
//! [`SourceError`] is a caller mistake and is returned as `Err`.
//! [`ParseError`] describes the source text itself and is stored as data on
//! [`ProcessedSource`](crate::ProcessedSource), never returned.

use std::io;

use rubric_ast::{RubyVersion, SyntaxAbort};
use thiserror::Error;

// ============================================================================
// Caller errors
// ============================================================================

/// Errors raised to the caller before any source is parsed.
#[derive(Debug, Error)]
pub enum SourceError {
    /// No grammar is registered for the requested version.
    #[error("unsupported Ruby version {version} (supported: {supported})")]
    UnsupportedVersion { version: RubyVersion, supported: String },

    /// Reading a file for [`ProcessedSource::from_file`](crate::ProcessedSource::from_file) failed.
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl SourceError {
    pub(crate) fn unsupported(version: RubyVersion, supported: &[RubyVersion]) -> Self {
        let supported = if supported.is_empty() {
            "none".to_string()
        } else {
            supported
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        SourceError::UnsupportedVersion { version, supported }
    }
}

/// Result type for source ingestion setup.
pub type SourceResult<T> = Result<T, SourceError>;

// ============================================================================
// Per-source failures
// ============================================================================

/// Why a source produced no tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The bytes are not valid in the assumed or declared encoding.
    #[error("{message}")]
    Encoding { encoding: String, message: String },

    /// The grammar gave up; details are in the diagnostics.
    #[error(transparent)]
    Syntax(#[from] SyntaxAbort),
}

impl ParseError {
    pub fn is_encoding(&self) -> bool {
        matches!(self, ParseError::Encoding { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_version_lists_choices() {
        let err = SourceError::unsupported(RubyVersion::new(1, 9), &[RubyVersion::V2_7, RubyVersion::V3_0]);
        assert_eq!(err.to_string(), "unsupported Ruby version 1.9 (supported: 2.7, 3.0)");
        let none = SourceError::unsupported(RubyVersion::V3_0, &[]);
        assert_eq!(none.to_string(), "unsupported Ruby version 3.0 (supported: none)");
    }

    #[test]
    fn syntax_error_displays_abort_message() {
        let err = ParseError::from(SyntaxAbort::new("unexpected token $end", None));
        assert_eq!(err.to_string(), "unexpected token $end");
        assert!(!err.is_encoding());
    }
}
