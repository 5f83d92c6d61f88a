//! Convergence of repeated rewriting passes.
//!
//! A consumer that autocorrects a file re-parses it after every pass and
//! feeds each new [`ProcessedSource`] to a [`Convergence`]. The verdict says
//! whether to run another pass, stop, or give up on a correction loop.

use std::collections::HashSet;

use rubric_core::ContentHash;

use crate::processed_source::ProcessedSource;

/// Outcome of one observed pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassVerdict {
    /// The content changed; another pass may change it further.
    Progress,
    /// Unchanged, nothing claimed, no diagnostics: done.
    FixedPoint,
    /// Unchanged and nothing claimed, but diagnostics remain.
    Stalled,
    /// A pass claimed a change yet produced identical content, or the
    /// content returned to an earlier state. Fatal for the pass.
    CorrectionLoop,
}

impl PassVerdict {
    /// Whether the consumer should stop iterating.
    pub fn is_terminal(self) -> bool {
        !matches!(self, PassVerdict::Progress)
    }
}

/// Checksum history of one file across passes.
#[derive(Debug, Clone, Default)]
pub struct Convergence {
    last: Option<ContentHash>,
    earlier: HashSet<ContentHash>,
    passes: usize,
}

impl Convergence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of passes observed so far.
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Record the source produced by a pass.
    ///
    /// `claimed_change` is whether the pass reported rewriting anything. The
    /// first observation is the starting point and is always
    /// [`PassVerdict::Progress`].
    pub fn observe(&mut self, source: &ProcessedSource, claimed_change: bool) -> PassVerdict {
        let current = source.checksum().clone();
        self.passes += 1;

        let verdict = match &self.last {
            Some(last) if *last == current => {
                if claimed_change {
                    PassVerdict::CorrectionLoop
                } else if source.diagnostics().is_empty() {
                    PassVerdict::FixedPoint
                } else {
                    PassVerdict::Stalled
                }
            }
            _ if self.earlier.contains(&current) => PassVerdict::CorrectionLoop,
            _ => PassVerdict::Progress,
        };

        tracing::debug!(
            path = source.path(),
            pass = self.passes,
            checksum = current.short(12),
            ?verdict,
            "observed pass"
        );

        if let Some(previous) = self.last.replace(current) {
            self.earlier.insert(previous);
        }
        verdict
    }
}

#[cfg(test)]
mod tests {
    use rubric_ast::RubyVersion;

    use super::*;

    fn pass(source: &str) -> ProcessedSource {
        ProcessedSource::new(source, RubyVersion::V3_3, Some("fix.rb")).unwrap()
    }

    #[test]
    fn identical_passes_reach_fixed_point() {
        let mut convergence = Convergence::new();
        assert_eq!(convergence.observe(&pass("x = 1\n"), false), PassVerdict::Progress);
        assert_eq!(convergence.observe(&pass("x = 1\n"), false), PassVerdict::FixedPoint);
        assert_eq!(convergence.passes(), 2);
    }

    #[test]
    fn changed_content_is_progress() {
        let mut convergence = Convergence::new();
        convergence.observe(&pass("x=1\n"), false);
        assert_eq!(convergence.observe(&pass("x = 1\n"), true), PassVerdict::Progress);
    }

    #[test]
    fn claimed_change_without_difference_is_a_loop() {
        let mut convergence = Convergence::new();
        convergence.observe(&pass("x = 1\n"), true);
        let verdict = convergence.observe(&pass("x = 1\n"), true);
        assert_eq!(verdict, PassVerdict::CorrectionLoop);
        assert!(verdict.is_terminal());
    }

    #[test]
    fn oscillation_is_a_loop() {
        let mut convergence = Convergence::new();
        convergence.observe(&pass("a\n"), false);
        convergence.observe(&pass("b\n"), true);
        assert_eq!(convergence.observe(&pass("a\n"), true), PassVerdict::CorrectionLoop);
    }

    #[test]
    fn lingering_diagnostics_stall() {
        let mut convergence = Convergence::new();
        convergence.observe(&pass("if a = 1\nend\n"), false);
        assert_eq!(convergence.observe(&pass("if a = 1\nend\n"), false), PassVerdict::Stalled);
    }
}
