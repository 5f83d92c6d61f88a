// Copyright (c) rubric contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Ruby version abstraction for version-aware parsing.
//!
//! This module provides [`RubyVersion`] and [`ParseOptions`]. A grammar
//! backend consults the version's feature queries to reject syntax the
//! target version does not have (numbered block parameters before 2.7,
//! endless method definitions before 3.0, ...).

use std::str::FromStr;

use thiserror::Error;

/// Target Ruby language version for parsing.
///
/// # Example
///
/// ```
/// use rubric_ast::RubyVersion;
///
/// let v: RubyVersion = "3.1".parse().unwrap();
/// assert_eq!(v, RubyVersion::V3_1);
/// assert!(v.has_endless_method_definitions());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RubyVersion {
    pub major: u8,
    pub minor: u8,
}

impl RubyVersion {
    pub const V2_0: Self = Self::new(2, 0);
    pub const V2_1: Self = Self::new(2, 1);
    pub const V2_2: Self = Self::new(2, 2);
    pub const V2_3: Self = Self::new(2, 3);
    pub const V2_4: Self = Self::new(2, 4);
    pub const V2_5: Self = Self::new(2, 5);
    pub const V2_6: Self = Self::new(2, 6);
    /// Ruby 2.7 - pattern matching (experimental), numbered block parameters.
    pub const V2_7: Self = Self::new(2, 7);
    /// Ruby 3.0 - endless methods, rightward pattern assignment.
    pub const V3_0: Self = Self::new(3, 0);
    pub const V3_1: Self = Self::new(3, 1);
    pub const V3_2: Self = Self::new(3, 2);
    pub const V3_3: Self = Self::new(3, 3);
    pub const V3_4: Self = Self::new(3, 4);

    /// Every version constant defined above, oldest first.
    pub const KNOWN: &'static [RubyVersion] = &[
        Self::V2_0,
        Self::V2_1,
        Self::V2_2,
        Self::V2_3,
        Self::V2_4,
        Self::V2_5,
        Self::V2_6,
        Self::V2_7,
        Self::V3_0,
        Self::V3_1,
        Self::V3_2,
        Self::V3_3,
        Self::V3_4,
    ];

    pub const fn new(major: u8, minor: u8) -> Self {
        RubyVersion { major, minor }
    }

    fn at_least(self, major: u8, minor: u8) -> bool {
        (self.major, self.minor) >= (major, minor)
    }

    /// `_1`..`_9` implicit block parameters.
    #[must_use]
    pub fn has_numbered_parameters(self) -> bool {
        self.at_least(2, 7)
    }

    /// `def m(...)` / `m(...)`.
    #[must_use]
    pub fn has_argument_forwarding(self) -> bool {
        self.at_least(2, 7)
    }

    /// `case ... in` pattern matching.
    #[must_use]
    pub fn has_pattern_matching(self) -> bool {
        self.at_least(2, 7)
    }

    /// `(..x)` ranges without a lower bound.
    #[must_use]
    pub fn has_beginless_ranges(self) -> bool {
        self.at_least(2, 7)
    }

    /// `(x..)` ranges without an upper bound.
    #[must_use]
    pub fn has_endless_ranges(self) -> bool {
        self.at_least(2, 6)
    }

    /// `def m = expr`.
    #[must_use]
    pub fn has_endless_method_definitions(self) -> bool {
        self.at_least(3, 0)
    }

    /// `expr => pattern`.
    #[must_use]
    pub fn has_rightward_assignment(self) -> bool {
        self.at_least(3, 0)
    }

    /// Anonymous `&` block parameter forwarding.
    #[must_use]
    pub fn has_anonymous_block_forwarding(self) -> bool {
        self.at_least(3, 1)
    }

    #[must_use]
    pub fn version_tuple(self) -> (u8, u8) {
        (self.major, self.minor)
    }
}

impl Default for RubyVersion {
    /// The newest known version.
    fn default() -> Self {
        Self::V3_4
    }
}

impl std::fmt::Display for RubyVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A version selector string that is not `major.minor[.patch]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid Ruby version `{0}`: expected MAJOR.MINOR")]
pub struct VersionParseError(pub String);

impl FromStr for RubyVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || VersionParseError(s.to_string());
        let mut parts = s.trim().split('.');
        let major = parts.next().ok_or_else(err)?.parse::<u8>().map_err(|_| err())?;
        let minor = parts.next().ok_or_else(err)?.parse::<u8>().map_err(|_| err())?;
        if let Some(patch) = parts.next() {
            patch.parse::<u16>().map_err(|_| err())?;
        }
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(RubyVersion::new(major, minor))
    }
}

/// Configuration options for parsing Ruby source code.
///
/// # Example
///
/// ```
/// use rubric_ast::{ParseOptions, RubyVersion};
///
/// let options = ParseOptions::new(RubyVersion::V2_7)
///     .with_encoding("utf-8")
///     .with_path("lib/foo.rb");
/// assert_eq!(options.encoding_str(), Some("utf-8"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Target Ruby version for parsing.
    pub version: RubyVersion,

    /// Encoding to assume when the source has no magic comment.
    ///
    /// If not specified, UTF-8 is assumed. An in-source magic comment
    /// (`# encoding: ascii-8bit`) always takes precedence.
    pub encoding: Option<String>,

    /// Path used for diagnostics; `None` means an anonymous string.
    pub path: Option<String>,
}

impl ParseOptions {
    #[must_use]
    pub fn new(version: RubyVersion) -> Self {
        Self {
            version,
            encoding: None,
            path: None,
        }
    }

    #[must_use]
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn encoding_str(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    #[must_use]
    pub fn path_str(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constants_ordered() {
        let known = RubyVersion::KNOWN;
        assert_eq!(known.first(), Some(&RubyVersion::V2_0));
        assert_eq!(known.last(), Some(&RubyVersion::V3_4));
        assert!(known.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_version_feature_queries() {
        assert!(!RubyVersion::V2_6.has_numbered_parameters());
        assert!(RubyVersion::V2_7.has_numbered_parameters());
        assert!(RubyVersion::V2_7.has_pattern_matching());
        assert!(!RubyVersion::V2_7.has_endless_method_definitions());
        assert!(RubyVersion::V3_0.has_endless_method_definitions());
        assert!(RubyVersion::V3_0.has_rightward_assignment());
        assert!(!RubyVersion::V2_5.has_endless_ranges());
        assert!(RubyVersion::V2_6.has_endless_ranges());
        assert!(!RubyVersion::V3_0.has_anonymous_block_forwarding());
    }

    #[test]
    fn test_version_display() {
        assert_eq!(RubyVersion::V2_7.to_string(), "2.7");
        assert_eq!(RubyVersion::V3_4.to_string(), "3.4");
    }

    #[test]
    fn test_version_parse() {
        assert_eq!("3.1".parse::<RubyVersion>(), Ok(RubyVersion::V3_1));
        assert_eq!("2.7.8".parse::<RubyVersion>(), Ok(RubyVersion::V2_7));
        assert_eq!(" 3.0 ".parse::<RubyVersion>(), Ok(RubyVersion::V3_0));
        assert!("3".parse::<RubyVersion>().is_err());
        assert!("3.x".parse::<RubyVersion>().is_err());
        assert!("3.1.4.1".parse::<RubyVersion>().is_err());
    }

    #[test]
    fn test_version_default_is_newest() {
        assert_eq!(RubyVersion::default(), RubyVersion::V3_4);
    }

    #[test]
    fn test_parse_options_builders() {
        let options = ParseOptions::new(RubyVersion::V3_2)
            .with_encoding("binary")
            .with_path("a.rb");
        assert_eq!(options.version, RubyVersion::V3_2);
        assert_eq!(options.encoding_str(), Some("binary"));
        assert_eq!(options.path_str(), Some("a.rb"));
        assert_eq!(ParseOptions::default().encoding, None);
    }
}
