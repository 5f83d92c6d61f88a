//! Comment-based suppression of rules.
//!
//! A [`DisabledRangeResolver`] looks at the comments and lines of a source
//! and says on which lines each rule is switched off. [`CommentConfig`] is
//! the default resolver, understanding `rubocop:disable` / `rubocop:enable`
//! directives.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

use regex::Regex;
use rubric_ast::Comment;

/// Rule identifier (or `"all"`) to the 1-based line ranges where it is off.
pub type DisabledLineRanges = BTreeMap<String, Vec<RangeInclusive<usize>>>;

/// Identifier that stands for every rule.
pub const ALL_RULES: &str = "all";

/// What a resolver may read.
pub trait CommentSource {
    /// Comments in source order.
    fn comments(&self) -> &[Comment];
    /// Logical lines, terminators stripped.
    fn lines(&self) -> &[String];
}

pub trait DisabledRangeResolver {
    fn disabled_line_ranges(&self, source: &dyn CommentSource) -> DisabledLineRanges;
}

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#\s*rubocop\s*:\s*(disable|enable)\b\s*([\w/]+(?:\s*,\s*[\w/]+)*)")
        .expect("directive pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
struct Directive {
    enable: bool,
    rules: Vec<String>,
    line: usize,
    /// The comment is the only thing on its line.
    own_line: bool,
}

fn parse_directive(comment: &Comment, lines: &[String]) -> Option<Directive> {
    let captures = DIRECTIVE.captures(&comment.text)?;
    let enable = captures.get(1)?.as_str() == "enable";
    let rules = captures
        .get(2)?
        .as_str()
        .split(',')
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect();
    let line = comment.line();
    let own_line = line
        .checked_sub(1)
        .and_then(|index| lines.get(index))
        .and_then(|text| text.get(..comment.range.column))
        .is_none_or(|before| before.trim().is_empty());
    Some(Directive {
        enable,
        rules,
        line,
        own_line,
    })
}

/// The default resolver for `# rubocop:disable` comments.
///
/// - `# rubocop:disable A, B` on its own line switches the rules off until a
///   later `# rubocop:enable A` (inclusive), or to the end of the file.
/// - The same directive after code on a line switches them off for that line.
/// - `all` names every rule; `# rubocop:enable all` closes every open range.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentConfig;

impl DisabledRangeResolver for CommentConfig {
    fn disabled_line_ranges(&self, source: &dyn CommentSource) -> DisabledLineRanges {
        let lines = source.lines();
        let last_line = lines.len().max(1);
        let mut ranges = DisabledLineRanges::new();
        let mut open: BTreeMap<String, usize> = BTreeMap::new();

        for directive in source.comments().iter().filter_map(|c| parse_directive(c, lines)) {
            if directive.enable {
                let closing: Vec<String> = if directive.rules.iter().any(|r| r == ALL_RULES) {
                    open.keys().cloned().collect()
                } else {
                    directive.rules
                };
                for rule in closing {
                    if let Some(start) = open.remove(&rule) {
                        ranges.entry(rule).or_default().push(start..=directive.line);
                    }
                }
            } else if directive.own_line {
                for rule in directive.rules {
                    open.entry(rule).or_insert(directive.line);
                }
            } else {
                for rule in directive.rules {
                    ranges.entry(rule).or_default().push(directive.line..=directive.line);
                }
            }
        }

        for (rule, start) in open {
            ranges.entry(rule).or_default().push(start..=last_line.max(start));
        }
        for spans in ranges.values_mut() {
            spans.sort_by_key(|r| *r.start());
        }
        ranges
    }
}
