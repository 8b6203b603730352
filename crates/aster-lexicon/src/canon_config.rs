//! Canonicalization configuration: the per-locale knobs the canonicalizer
//! (`aster-canon`) reads to drive its thirteen-pass rewrite.

use crate::kind::SemanticKind;
use regex::Regex;
use std::sync::OnceLock;

/// How internal whitespace is collapsed (`SPEC_FULL.md` §4.2 pass 12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WhitespaceMode {
    English,
    Chinese,
    Mixed,
}

/// A single named, idempotent regex rewrite.
///
/// Used both as a `customRules` entry and as the inline variant of a
/// transformer chain entry (`SPEC_FULL.md` §4.2/§9: "plugin-provided
/// transformer functions... inline regex rules are a concrete variant of
/// the same interface").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RegexRule {
    pub name: String,
    pub pattern: String,
    pub replacement: String,
}

/// A step in a pre- or post-translation transformer chain: either a
/// reference to a named handler registered in the transformer registry, or
/// an inline regex rule.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum TransformerRef {
    Named(String),
    Inline(RegexRule),
}

/// How a compound keyword pattern's contextual span is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloserMode {
    Dedent,
    Newline,
}

/// A multi-token compound pattern: an opener kind, a run of contextual
/// kinds, and a closing discipline. Used for constructs like `as one of …`
/// where the grammar needs to recognize a bounded run rather than a single
/// keyword.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CompoundPattern {
    pub name: String,
    pub opener: SemanticKind,
    #[serde(rename = "contextualKeywords")]
    pub contextual_keywords: Vec<SemanticKind>,
    pub closer: CloserMode,
}

/// The full set of canonicalization knobs for one locale.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct CanonConfig {
    pub full_width_to_half: bool,
    pub whitespace_mode: WhitespaceMode,
    pub remove_articles: bool,
    #[serde(default)]
    pub articles: Vec<String>,
    #[serde(default)]
    pub custom_rules: Vec<RegexRule>,
    #[serde(default)]
    pub allowed_duplicates: Vec<Vec<SemanticKind>>,
    #[serde(default)]
    pub compound_patterns: Vec<CompoundPattern>,
    #[serde(default)]
    pub pre_translation_transformers: Vec<TransformerRef>,
    #[serde(default)]
    pub post_translation_transformers: Vec<TransformerRef>,

    /// Compiled `custom_rules`, populated once by [`Self::compiled_rules`].
    /// Regex compilation happens once at lexicon-load time per
    /// `SPEC_FULL.md` §4.2; a failure here after validation indicates a
    /// corrupt runtime state.
    #[serde(skip)]
    pub(crate) compiled: OnceLock<Vec<Regex>>,
}

impl CanonConfig {
    /// Compiles (once) and returns `custom_rules` in declaration order.
    ///
    /// # Panics
    ///
    /// Panics if a rule's pattern fails to compile. Rules are validated at
    /// lexicon registration time ([`crate::Lexicon::validate`]); reaching
    /// this panic means that validation was skipped or the runtime state is
    /// corrupt.
    pub fn compiled_rules(&self) -> &[Regex] {
        self.compiled.get_or_init(|| {
            self.custom_rules
                .iter()
                .map(|rule| {
                    Regex::new(&rule.pattern).unwrap_or_else(|e| {
                        panic!("custom rule '{}' failed to compile: {e}", rule.name)
                    })
                })
                .collect()
        })
    }

    /// Validates that every custom rule's pattern compiles, without
    /// panicking — used at registration time so a bad regex fails
    /// registration instead of panicking deep inside canonicalization.
    pub fn validate_custom_rules(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        for rule in &self.custom_rules {
            if let Err(e) = Regex::new(&rule.pattern) {
                errors.push(format!("rule '{}' failed to compile: {e}", rule.name));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Clone for CanonConfig {
    /// Clones the declared configuration; the compiled-regex cache is not
    /// copied and is instead recomputed lazily by the clone on first use.
    fn clone(&self) -> Self {
        Self {
            full_width_to_half: self.full_width_to_half,
            whitespace_mode: self.whitespace_mode,
            remove_articles: self.remove_articles,
            articles: self.articles.clone(),
            custom_rules: self.custom_rules.clone(),
            allowed_duplicates: self.allowed_duplicates.clone(),
            compound_patterns: self.compound_patterns.clone(),
            pre_translation_transformers: self.pre_translation_transformers.clone(),
            post_translation_transformers: self.post_translation_transformers.clone(),
            compiled: OnceLock::new(),
        }
    }
}

impl PartialEq for CanonConfig {
    fn eq(&self, other: &Self) -> bool {
        self.full_width_to_half == other.full_width_to_half
            && self.whitespace_mode == other.whitespace_mode
            && self.remove_articles == other.remove_articles
            && self.articles == other.articles
            && self.custom_rules.len() == other.custom_rules.len()
            && self
                .custom_rules
                .iter()
                .zip(&other.custom_rules)
                .all(|(a, b)| a.name == b.name && a.pattern == b.pattern && a.replacement == b.replacement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiled_rules_match_declared_count() {
        let config = CanonConfig {
            full_width_to_half: false,
            whitespace_mode: WhitespaceMode::English,
            remove_articles: false,
            articles: vec![],
            custom_rules: vec![RegexRule {
                name: "drop-trailing-space".into(),
                pattern: r"\s+$".into(),
                replacement: "".into(),
            }],
            allowed_duplicates: vec![],
            compound_patterns: vec![],
            pre_translation_transformers: vec![],
            post_translation_transformers: vec![],
            compiled: OnceLock::new(),
        };
        assert_eq!(config.compiled_rules().len(), 1);
    }

    #[test]
    fn validate_custom_rules_rejects_bad_pattern() {
        let config = CanonConfig {
            full_width_to_half: false,
            whitespace_mode: WhitespaceMode::English,
            remove_articles: false,
            articles: vec![],
            custom_rules: vec![RegexRule {
                name: "broken".into(),
                pattern: "(unclosed".into(),
                replacement: "".into(),
            }],
            allowed_duplicates: vec![],
            compound_patterns: vec![],
            pre_translation_transformers: vec![],
            post_translation_transformers: vec![],
            compiled: OnceLock::new(),
        };
        assert!(config.validate_custom_rules().is_err());
    }
}
