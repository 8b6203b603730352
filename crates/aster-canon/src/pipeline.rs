//! The thirteen-step canonicalization pipeline (`spec.md` §4.2).
//!
//! `canonicalize` is idempotent: running it twice over its own output is a
//! no-op. Each step below is written to hold that property on its own —
//! whitespace collapse, synonym unification, and identifier translation are
//! all fixed points once their target form is reached.

use crate::protect;
use aster_base::{Result, Symbol};
use aster_lexicon::{DomainVocabulary, IdentifierIndex, Lexicon, SemanticKind, TransformerRef, TransformerRegistry};
use regex::Regex;

/// Canonicalizes `source`, written in the locale described by `lexicon`,
/// into canonical English-keyword ASCII form.
///
/// `vocab_index`, if given, additionally rewrites domain identifiers (step
/// 9). `transformers` resolves any named (non-inline) entries in the
/// lexicon's pre/post-translation transformer chains.
pub fn canonicalize(
    source: &str,
    file: Symbol,
    lexicon: &Lexicon,
    vocab_index: Option<&IdentifierIndex>,
    transformers: &TransformerRegistry,
) -> Result<String> {
    let text = unify_newlines(source);
    let text = tabs_to_spaces(&text);
    let text = strip_bom(&text);

    let protected = protect::protect(&text, lexicon, file)?;
    let mut text = protected.text;

    text = apply_chain(&text, &lexicon.canonicalization().pre_translation_transformers, transformers);

    if lexicon.canonicalization().remove_articles {
        text = remove_articles(&text, &lexicon.canonicalization().articles);
    }

    text = normalize_multiword_keywords(&text, lexicon);

    if let Some(index) = vocab_index {
        text = translate_identifiers(&text, index);
    }

    text = apply_chain(&text, &lexicon.canonicalization().post_translation_transformers, transformers);

    text = unify_comparison_synonyms(&text);

    text = collapse_whitespace(&text);

    text = protect::restore(&text, &protected.strings, lexicon);

    Ok(text)
}

/// Convenience overload for callers that have already resolved a
/// [`DomainVocabulary`] but not yet built its [`IdentifierIndex`].
pub fn canonicalize_with_vocabulary(
    source: &str,
    file: Symbol,
    lexicon: &Lexicon,
    vocabulary: Option<&DomainVocabulary>,
    transformers: &TransformerRegistry,
) -> Result<String> {
    let index = vocabulary.map(DomainVocabulary::index);
    canonicalize(source, file, lexicon, index.as_ref(), transformers)
}

fn unify_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

fn tabs_to_spaces(s: &str) -> String {
    s.replace('\t', "  ")
}

fn strip_bom(s: &str) -> String {
    s.strip_prefix('\u{FEFF}').unwrap_or(s).to_string()
}

fn apply_chain(text: &str, chain: &[TransformerRef], registry: &TransformerRegistry) -> String {
    let mut current = text.to_string();
    for transformer in chain {
        let handler = aster_lexicon::resolve(registry, transformer);
        current = handler(&current);
    }
    current
}

fn remove_articles(text: &str, articles: &[String]) -> String {
    if articles.is_empty() {
        return text.to_string();
    }
    let alternation = articles
        .iter()
        .map(|a| regex::escape(a))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"(?i)\b(?:{alternation})\b\s+");
    let re = Regex::new(&pattern).expect("article pattern is built from escaped literals");
    re.replace_all(text, "").into_owned()
}

/// Step 8: rewrite each locale's multi-word (and single-word) keyword
/// surface form to the canonical English surface for the same
/// [`SemanticKind`], longest surface first so `as one of` is not shadowed by
/// `one of`.
fn normalize_multiword_keywords(text: &str, lexicon: &Lexicon) -> String {
    if lexicon.id() == "en" {
        return text.to_string();
    }
    let english = Lexicon::english();
    let mut current = text.to_string();
    let mut entries: Vec<(SemanticKind, &str)> = lexicon
        .keywords()
        .iter()
        .map(|(k, s)| (*k, s.as_str()))
        .collect();
    entries.sort_by(|a, b| b.1.chars().count().cmp(&a.1.chars().count()));

    for (kind, surface) in entries {
        let Some(target) = english.surface(kind) else { continue };
        if surface == target {
            continue;
        }
        let pattern = format!(r"(?i){}", regex::escape(surface));
        let re = Regex::new(&pattern).expect("keyword surface pattern is built from escaped literals");
        current = re.replace_all(&current, regex::NoExpand(target)).into_owned();
    }
    current
}

/// Step 9: scan maximal runs of identifier characters (Unicode letters,
/// digits, underscore) and rewrite any run found in the vocabulary index's
/// localized→canonical map. A run is only considered if its neighboring
/// characters are not themselves identifier characters, so a compound
/// identifier like `若何` is never fractured by a single-character keyword
/// match such as `若`.
fn translate_identifiers(text: &str, index: &IdentifierIndex) -> String {
    let re = Regex::new(r"[\p{L}\p{N}_]+").expect("identifier-run pattern is a fixed literal");
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in re.find_iter(text) {
        out.push_str(&text[last..m.start()]);
        match index.canonical_for(m.as_str()) {
            Some(canonical) => out.push_str(canonical),
            None => out.push_str(m.as_str()),
        }
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Step 11: `under` / `less than` → `<`; `over` / `greater than` / `more
/// than` → `>`. Runs after keyword normalization so every locale's synonyms
/// have already collapsed to these English surface forms.
fn unify_comparison_synonyms(text: &str) -> String {
    let lt = Regex::new(r"(?i)\b(?:less than|under)\b").expect("fixed literal pattern");
    let gt = Regex::new(r"(?i)\b(?:greater than|more than|over)\b").expect("fixed literal pattern");
    let text = lt.replace_all(text, "<");
    let text = gt.replace_all(&text, ">");
    text.into_owned()
}

/// Step 12: collapse runs of internal spaces/tabs to a single space on each
/// line, preserving leading indentation exactly, and trim spaces before
/// `, . : ;`.
fn collapse_whitespace(text: &str) -> String {
    let internal_run = Regex::new(r"[ \t]{2,}").expect("fixed literal pattern");
    let before_punct = Regex::new(r"[ \t]+([,.:;])").expect("fixed literal pattern");

    text.split('\n')
        .map(|line| {
            let indent_len = line.len() - line.trim_start_matches([' ', '\t']).len();
            let (indent, rest) = line.split_at(indent_len);
            let collapsed = internal_run.replace_all(rest, " ");
            let trimmed = before_punct.replace_all(&collapsed, "$1");
            format!("{indent}{trimmed}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use aster_base::Interner;
    use aster_lexicon::{IdentifierKind, IdentifierMapping};

    fn file() -> Symbol {
        Interner::new().intern("test.cnl")
    }

    #[test]
    fn s1_english_greeting_is_already_canonical() {
        let source = "Module app.\nRule helloMessage produce Text:\n  Return \"Hello, world!\".";
        let lexicon = Lexicon::english();
        let registry = TransformerRegistry::new();
        let out = canonicalize(source, file(), &lexicon, None, &registry).unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn s3_possessive_preserved_inside_string() {
        let lexicon = Lexicon::english();
        let registry = TransformerRegistry::new();
        let out = canonicalize(r#"print "driver's license""#, file(), &lexicon, None, &registry).unwrap();
        assert!(out.contains("driver's license"));
    }

    #[test]
    fn possessive_outside_string_is_rewritten() {
        let lexicon = Lexicon::english();
        let registry = TransformerRegistry::new();
        let out = canonicalize("Return Driver's age.", file(), &lexicon, None, &registry).unwrap();
        assert!(out.contains("Driver.age"));
    }

    #[test]
    fn under_and_less_than_unify_to_angle_bracket() {
        let lexicon = Lexicon::english();
        let registry = TransformerRegistry::new();
        let out = canonicalize("If age less than 18, Return false.", file(), &lexicon, None, &registry).unwrap();
        assert!(out.contains("age < 18"));
    }

    #[test]
    fn s2_chinese_with_domain_translation() {
        let lexicon = Lexicon::chinese();
        let registry = TransformerRegistry::new();
        let vocab = DomainVocabulary {
            id: "insurance.auto".into(),
            name: "Auto".into(),
            locale: "zh-cn".into(),
            version: "1.0.0".into(),
            structs: vec![IdentifierMapping {
                canonical: "Driver".into(),
                localized: "驾驶员".into(),
                kind: IdentifierKind::Struct,
                parent: None,
                description: None,
                aliases: vec![],
            }],
            fields: vec![IdentifierMapping {
                canonical: "age".into(),
                localized: "年龄".into(),
                kind: IdentifierKind::Field,
                parent: Some("Driver".into()),
                description: None,
                aliases: vec![],
            }],
            functions: vec![],
            enum_values: vec![],
            metadata: None,
        };
        let out =
            canonicalize_with_vocabulary("如果 驾驶员 的 年龄 大于 18，返回 真。", file(), &lexicon, Some(&vocab), &registry)
                .unwrap();
        assert!(out.contains("If"));
        assert!(out.contains("Driver.age"));
        assert!(out.contains("> 18"));
        assert!(out.contains("Return true"));
    }

    #[test]
    fn canonicalizer_is_idempotent_for_english() {
        let lexicon = Lexicon::english();
        let registry = TransformerRegistry::new();
        let source = "Let  x   be 1.\nReturn Driver's age.";
        let once = canonicalize(source, file(), &lexicon, None, &registry).unwrap();
        let twice = canonicalize(&once, file(), &lexicon, None, &registry).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn canonicalizer_is_idempotent_for_chinese() {
        let lexicon = Lexicon::chinese();
        let registry = TransformerRegistry::new();
        let source = "如果 年龄 大于 18，返回 真。";
        let once = canonicalize(source, file(), &lexicon, None, &registry).unwrap();
        let twice = canonicalize(&once, file(), &lexicon, None, &registry).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn longest_match_first_prevents_shadowing() {
        // Chinese "设置" (SET) contains "设" (LET) as a character prefix; CJK
        // keyword matching has no word boundaries to fall back on, so the
        // longer surface must be rewritten before the shorter one is even
        // considered, or "设置" would be corrupted into "Let置".
        let lexicon = Lexicon::chinese();
        let out = normalize_multiword_keywords("设置 x 为 1", &lexicon);
        assert!(out.starts_with("Set"), "expected Set-prefixed output, got {out:?}");
    }

    #[test]
    fn unterminated_string_propagates_as_error() {
        let lexicon = Lexicon::english();
        let registry = TransformerRegistry::new();
        let err = canonicalize("print \"oops", file(), &lexicon, None, &registry).unwrap_err();
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn whitespace_collapse_preserves_indentation() {
        let collapsed = collapse_whitespace("  Let   x   be  1.");
        assert_eq!(collapsed, "  Let x be 1.");
    }

    #[test]
    fn whitespace_collapse_trims_before_punctuation() {
        let collapsed = collapse_whitespace("Return x .");
        assert_eq!(collapsed, "Return x.");
    }
}
