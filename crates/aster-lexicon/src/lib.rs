//! # aster-lexicon
//!
//! Lexicon and vocabulary registries: the language-skin data (keywords,
//! punctuation, canonicalization rules) and domain identifier maps that let
//! the rest of the `aster` pipeline stay locale-neutral. Downstream crates
//! (`aster-canon`, `aster-lexer`, `aster-parser`) consume a [`Lexicon`]
//! resolved once at session start; everything after canonicalization sees
//! only English surface forms.
//!
//! Key exports:
//! - [`SemanticKind`] / [`Category`] — the closed, locale-neutral keyword taxonomy.
//! - [`Lexicon`] — per-locale keyword/punctuation/canonicalization data.
//! - [`CanonConfig`] — canonicalizer knobs for one locale.
//! - [`DomainVocabulary`] / [`IdentifierIndex`] — domain identifier maps.
//! - [`LexiconRegistry`] / [`VocabularyRegistry`] — process-wide singletons.
//! - [`TransformerRegistry`] — named syntax-transformer handlers.
//! - [`Provider`] / [`discover`] — atomic, diagnostic-aware plugin registration.
//! - [`json`] — deterministic JSON import/export with checksums.

mod canon_config;
mod json;
mod kind;
mod lexicon;
mod punctuation;
mod registry;
mod transformer;
mod vocabulary;

pub use canon_config::{CanonConfig, CloserMode, CompoundPattern, RegexRule, TransformerRef, WhitespaceMode};
pub use json::{export_lexicons, export_vocabularies, import_lexicons, import_vocabularies};
pub use kind::{Category, SemanticKind};
pub use lexicon::{normalize_id, Lexicon, MessageTemplates};
pub use punctuation::{Direction, Punctuation};
pub use registry::{discover, InvalidConfiguration, LexiconRegistry, Provider, VocabularyRegistry};
pub use transformer::{resolve, validate_chain, TransformerFn, TransformerRegistry};
pub use vocabulary::{DomainVocabulary, IdentifierIndex, IdentifierKind, IdentifierMapping, VocabularyMetadata};
