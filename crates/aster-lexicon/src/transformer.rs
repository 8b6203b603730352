//! The named transformer registry.
//!
//! Plugin providers may contribute syntax-transformer factories under
//! unique names (`SPEC_FULL.md` §4.1). A transformer is modeled uniformly as
//! `fn(&str) -> String`, whether it originates from a provider's Rust code
//! or is synthesized from an inline regex rule in a lexicon's JSON.

use crate::canon_config::{RegexRule, TransformerRef};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub type TransformerFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Process-wide registry of named transformer handlers.
///
/// Registration is additive and name-checked: a provider registering a name
/// already owned by a *different* provider fails discovery for that
/// provider (`SPEC_FULL.md` §4.1); re-registering under the same provider is
/// not modeled here since providers are not currently tracked per-name —
/// callers that need that guarantee should check [`Self::contains`] first.
#[derive(Default)]
pub struct TransformerRegistry {
    handlers: RwLock<HashMap<String, TransformerFn>>,
}

impl TransformerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, handler: TransformerFn) -> Result<(), String> {
        let name = name.into();
        let mut handlers = self.handlers.write().expect("transformer registry lock poisoned");
        if handlers.contains_key(&name) {
            return Err(format!("duplicate transformer name '{name}'"));
        }
        handlers.insert(name, handler);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.read().expect("transformer registry lock poisoned").contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<TransformerFn> {
        self.handlers.read().expect("transformer registry lock poisoned").get(name).cloned()
    }

    pub fn reset(&self) {
        self.handlers.write().expect("transformer registry lock poisoned").clear();
    }
}

/// Resolves a [`TransformerRef`] to a callable, either by looking up a named
/// handler in `registry` or by compiling the inline regex rule on the spot.
///
/// # Panics
///
/// Panics if a `Named` reference is not found in `registry`, or an `Inline`
/// rule's pattern fails to compile — both indicate a lexicon that was
/// registered without validation (validation checks both ahead of time).
pub fn resolve(registry: &TransformerRegistry, transformer: &TransformerRef) -> TransformerFn {
    match transformer {
        TransformerRef::Named(name) => registry
            .get(name)
            .unwrap_or_else(|| panic!("transformer '{name}' is not registered")),
        TransformerRef::Inline(rule) => Arc::new(inline_regex_handler(rule.clone())),
    }
}

fn inline_regex_handler(rule: RegexRule) -> impl Fn(&str) -> String + Send + Sync {
    move |input: &str| {
        let re = regex::Regex::new(&rule.pattern)
            .unwrap_or_else(|e| panic!("inline rule '{}' failed to compile: {e}", rule.name));
        re.replace_all(input, rule.replacement.as_str()).into_owned()
    }
}

/// Checks that every named reference in `refs` exists in `registry` and
/// every inline rule's pattern compiles, without constructing handlers.
pub fn validate_chain(registry: &TransformerRegistry, refs: &[TransformerRef]) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    for r in refs {
        match r {
            TransformerRef::Named(name) if !registry.contains(name) => {
                errors.push(format!("transformer '{name}' is not registered"));
            }
            TransformerRef::Named(_) => {}
            TransformerRef::Inline(rule) => {
                if let Err(e) = regex::Regex::new(&rule.pattern) {
                    errors.push(format!("inline rule '{}' failed to compile: {e}", rule.name));
                }
            }
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_get_round_trips() {
        let registry = TransformerRegistry::new();
        registry.register("upper", Arc::new(|s: &str| s.to_uppercase())).unwrap();
        let handler = registry.get("upper").unwrap();
        assert_eq!(handler("abc"), "ABC");
    }

    #[test]
    fn duplicate_name_fails() {
        let registry = TransformerRegistry::new();
        registry.register("upper", Arc::new(|s: &str| s.to_uppercase())).unwrap();
        let result = registry.register("upper", Arc::new(|s: &str| s.to_lowercase()));
        assert!(result.is_err());
    }

    #[test]
    fn resolve_inline_rule_rewrites_text() {
        let registry = TransformerRegistry::new();
        let rule = TransformerRef::Inline(RegexRule {
            name: "strip-spaces".into(),
            pattern: r"\s+".into(),
            replacement: "".into(),
        });
        let handler = resolve(&registry, &rule);
        assert_eq!(handler("a b  c"), "abc");
    }

    #[test]
    fn validate_chain_flags_missing_named_transformer() {
        let registry = TransformerRegistry::new();
        let refs = vec![TransformerRef::Named("missing".into())];
        assert!(validate_chain(&registry, &refs).is_err());
    }

    #[test]
    fn validate_chain_passes_for_registered_name() {
        let registry = TransformerRegistry::new();
        registry.register("noop", Arc::new(|s: &str| s.to_string())).unwrap();
        let refs = vec![TransformerRef::Named("noop".into())];
        assert!(validate_chain(&registry, &refs).is_ok());
    }
}
