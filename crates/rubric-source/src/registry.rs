//! Version to grammar mapping.
//!
//! Which grammar parses which Ruby version is configuration, not code: a
//! [`GrammarRegistry`] is built by the caller (or taken from
//! [`GrammarRegistry::builtin`]) and handed to the adapter.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rubric_ast::{Grammar, RubyVersion};
use rubric_parser::RubyGrammar;

use crate::error::{SourceError, SourceResult};

/// Grammar backends keyed by the version they parse.
#[derive(Clone, Default)]
pub struct GrammarRegistry {
    grammars: BTreeMap<RubyVersion, Arc<dyn Grammar>>,
}

impl GrammarRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The bundled grammar for every known version.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for &version in RubyVersion::KNOWN {
            registry.register(Arc::new(RubyGrammar::new(version)));
        }
        registry
    }

    /// Register `grammar` under its own version, replacing any earlier one.
    pub fn register(&mut self, grammar: Arc<dyn Grammar>) -> &mut Self {
        let version = grammar.version();
        tracing::debug!(%version, "registering grammar");
        self.grammars.insert(version, grammar);
        self
    }

    pub fn get(&self, version: RubyVersion) -> Option<Arc<dyn Grammar>> {
        self.grammars.get(&version).cloned()
    }

    /// Like [`get`](Self::get), but an unknown version is an error naming
    /// the registered ones.
    pub fn resolve(&self, version: RubyVersion) -> SourceResult<Arc<dyn Grammar>> {
        self.get(version)
            .ok_or_else(|| SourceError::unsupported(version, &self.versions()))
    }

    /// Registered versions, oldest first.
    pub fn versions(&self) -> Vec<RubyVersion> {
        self.grammars.keys().copied().collect()
    }

    pub fn contains(&self, version: RubyVersion) -> bool {
        self.grammars.contains_key(&version)
    }

    pub fn len(&self) -> usize {
        self.grammars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grammars.is_empty()
    }
}

impl fmt::Debug for GrammarRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrammarRegistry")
            .field("versions", &self.versions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rubric_ast::{DiagnosticSink, ParseOutput, SourceBuffer, SyntaxAbort};

    use super::*;

    struct Refusing(RubyVersion);

    impl Grammar for Refusing {
        fn version(&self) -> RubyVersion {
            self.0
        }

        fn tokenize(&self, _: &SourceBuffer, _: &mut dyn DiagnosticSink) -> Result<ParseOutput, SyntaxAbort> {
            Err(SyntaxAbort::new("refused", None))
        }
    }

    #[test]
    fn builtin_covers_known_versions() {
        let registry = GrammarRegistry::builtin();
        assert_eq!(registry.versions(), RubyVersion::KNOWN.to_vec());
        assert!(registry.contains(RubyVersion::V2_0));
        assert!(!registry.contains(RubyVersion::new(1, 9)));
    }

    #[test]
    fn register_replaces_by_version() {
        let mut registry = GrammarRegistry::builtin();
        let before = registry.len();
        registry.register(Arc::new(Refusing(RubyVersion::V3_0)));
        assert_eq!(registry.len(), before);
        let grammar = registry.get(RubyVersion::V3_0).unwrap();
        let mut sink = Vec::new();
        let result = grammar.tokenize(&SourceBuffer::new("(string)", "1"), &mut sink);
        assert_eq!(result.unwrap_err().message, "refused");
    }

    #[test]
    fn new_versions_are_added_without_code_changes() {
        let future = RubyVersion::new(4, 0);
        let mut registry = GrammarRegistry::new();
        assert!(registry.is_empty());
        registry.register(Arc::new(Refusing(future)));
        assert_eq!(registry.versions(), vec![future]);
    }

    #[test]
    fn resolve_reports_unsupported() {
        let registry = GrammarRegistry::new();
        let err = registry.resolve(RubyVersion::V2_7).err().unwrap();
        assert!(matches!(err, SourceError::UnsupportedVersion { .. }));
    }
}
