//! Process-wide lexicon and vocabulary registries.
//!
//! Both registries are `once_cell::sync::Lazy<RwLock<...>>` singletons
//! (`SPEC_FULL.md` §2/§9: "singletons & module-global registries... model as
//! process-wide state with an explicit initialization step and a reset
//! entry point for tests"). Registration validates before mutating state —
//! a failed `register` call never partially updates the maps.

use crate::lexicon::{normalize_id, Lexicon};
use crate::transformer::{TransformerFn, TransformerRegistry};
use crate::vocabulary::DomainVocabulary;
use aster_diagnostics::{DiagnosticBuilder, ErrorCode};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::RwLock;

/// Registration or lookup failed because the value did not pass validation.
#[derive(Debug, Clone)]
pub struct InvalidConfiguration(pub Vec<String>);

impl std::fmt::Display for InvalidConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid configuration: {}", self.0.join("; "))
    }
}

impl std::error::Error for InvalidConfiguration {}

static LEXICONS: Lazy<RwLock<HashMap<String, Lexicon>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Process-wide store of registered [`Lexicon`]s, keyed by normalized id.
///
/// A zero-sized handle type; all state lives in the process-wide `static`.
/// `SPEC_FULL.md` §5 describes entries as immutable once registered via
/// [`discover`]; this implementation still keeps every read behind a
/// short-lived read-lock for simplicity and relies on `RwLock` allowing
/// unbounded concurrent readers rather than a lock-free path.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexiconRegistry;

impl LexiconRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Validates `lexicon`, then registers it under its normalized id,
    /// replacing any existing entry with the same id (last writer wins).
    /// On validation failure, the store is not mutated.
    pub fn register(&self, lexicon: Lexicon) -> Result<(), InvalidConfiguration> {
        lexicon.validate().map_err(InvalidConfiguration)?;
        let mut lexicons = LEXICONS.write().expect("lexicon registry lock poisoned");
        lexicons.insert(lexicon.id().to_string(), lexicon);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Lexicon> {
        let id = normalize_id(id);
        LEXICONS.read().expect("lexicon registry lock poisoned").get(&id).cloned()
    }

    /// Registered lexicon ids, sorted — listing must be deterministic
    /// regardless of registration order (`SPEC_FULL.md` §4.1).
    pub fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> =
            LEXICONS.read().expect("lexicon registry lock poisoned").keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Clears all registered lexicons. For tests only.
    pub fn reset(&self) {
        LEXICONS.write().expect("lexicon registry lock poisoned").clear();
    }

    /// Registers the built-in English, Chinese, and German lexicons.
    /// Idempotent: calling twice just re-registers the same entries.
    pub fn bootstrap(&self) {
        for lexicon in [Lexicon::english(), Lexicon::chinese(), Lexicon::german()] {
            self.register(lexicon).expect("built-in lexicon failed validation");
        }
    }
}

fn vocab_key(tenant: Option<&str>, id: &str, locale: &str) -> String {
    match tenant {
        Some(tenant) => format!("{tenant}::{id}::{}", locale.to_lowercase()),
        None => format!("::{id}::{}", locale.to_lowercase()),
    }
}

static VOCABULARIES: Lazy<RwLock<HashMap<String, DomainVocabulary>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Process-wide store of registered [`DomainVocabulary`] values, keyed by
/// `(tenant, id, locale)`. Built-in (non-tenant) entries are queried with
/// tenant precedence: a tenant-scoped vocabulary, if present, shadows the
/// built-in entry of the same `(id, locale)` (`SPEC_FULL.md` §5).
#[derive(Debug, Default, Clone, Copy)]
pub struct VocabularyRegistry;

impl VocabularyRegistry {
    pub fn new() -> Self {
        Self
    }

    pub fn register(&self, vocabulary: DomainVocabulary) -> Result<(), InvalidConfiguration> {
        self.register_for_tenant(None, vocabulary)
    }

    pub fn register_for_tenant(
        &self,
        tenant: Option<&str>,
        vocabulary: DomainVocabulary,
    ) -> Result<(), InvalidConfiguration> {
        vocabulary.validate().map_err(InvalidConfiguration)?;
        let key = vocab_key(tenant, &vocabulary.id, &vocabulary.locale);
        let mut vocabularies = VOCABULARIES.write().expect("vocabulary registry lock poisoned");
        vocabularies.insert(key, vocabulary);
        Ok(())
    }

    /// Looks up `(id, locale)`, preferring `tenant`'s own entry if present
    /// and falling back to the shared (no-tenant) entry.
    pub fn get(&self, tenant: Option<&str>, id: &str, locale: &str) -> Option<DomainVocabulary> {
        let vocabularies = VOCABULARIES.read().expect("vocabulary registry lock poisoned");
        if let Some(tenant) = tenant {
            if let Some(v) = vocabularies.get(&vocab_key(Some(tenant), id, locale)) {
                return Some(v.clone());
            }
        }
        vocabularies.get(&vocab_key(None, id, locale)).cloned()
    }

    pub fn list_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> =
            VOCABULARIES.read().expect("vocabulary registry lock poisoned").keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn reset(&self) {
        VOCABULARIES.write().expect("vocabulary registry lock poisoned").clear();
    }
}

/// A bundle of language-skin data a plugin contributes in one atomic unit:
/// an optional lexicon, an optional vocabulary, and zero or more named
/// transformer factories (`SPEC_FULL.md` §5, "Registries"). [`discover`]
/// registers all of it or none of it.
#[derive(Default)]
pub struct Provider {
    pub lexicon: Option<Lexicon>,
    pub vocabulary: Option<DomainVocabulary>,
    pub transformers: Vec<(String, TransformerFn)>,
}

/// Registers one provider's lexicon, vocabulary, and transformer factories
/// as a single atomic unit (`SPEC_FULL.md` §5). Discovery is idempotent and
/// additive: running it twice with the same provider just re-registers the
/// same entries.
///
/// A transformer name already owned by a different provider fails the
/// whole provider before anything is registered, raising
/// [`aster_diagnostics::ErrorCode::DuplicateTransformer`] -- no lexicon,
/// vocabulary, or other transformer from this provider is registered
/// either. A lexicon or vocabulary entry that overwrites an existing
/// `(id, locale)` still registers (last writer wins, matching
/// [`LexiconRegistry::register`]'s existing contract), but raises a
/// [`aster_diagnostics::ErrorCode::RegistryOverwrite`] warning rather than
/// silently replacing it.
pub fn discover(
    provider: &Provider,
    lexicons: &LexiconRegistry,
    vocabularies: &VocabularyRegistry,
    transformers: &TransformerRegistry,
    diagnostics: &mut DiagnosticBuilder,
) -> Result<(), InvalidConfiguration> {
    if let Some(lexicon) = &provider.lexicon {
        lexicon.validate().map_err(InvalidConfiguration)?;
    }
    if let Some(vocabulary) = &provider.vocabulary {
        vocabulary.validate().map_err(InvalidConfiguration)?;
    }
    for (name, _) in &provider.transformers {
        if transformers.contains(name) {
            diagnostics.raise_unspanned(ErrorCode::DuplicateTransformer, &[("name", name.clone())]);
            return Err(InvalidConfiguration(vec![format!(
                "duplicate transformer name '{name}' registered by the same provider"
            )]));
        }
    }

    for (name, handler) in &provider.transformers {
        transformers
            .register(name.clone(), handler.clone())
            .expect("collision already ruled out above");
    }
    if let Some(lexicon) = &provider.lexicon {
        let id = lexicon.id().to_string();
        if lexicons.get(&id).is_some() {
            diagnostics.raise_unspanned(
                ErrorCode::RegistryOverwrite,
                &[("id", id.clone()), ("locale", id.clone())],
            );
        }
        lexicons.register(lexicon.clone())?;
    }
    if let Some(vocabulary) = &provider.vocabulary {
        let already_present = vocabularies.get(None, &vocabulary.id, &vocabulary.locale).is_some();
        if already_present {
            diagnostics.raise_unspanned(
                ErrorCode::RegistryOverwrite,
                &[("id", vocabulary.id.clone()), ("locale", vocabulary.locale.clone())],
            );
        }
        vocabularies.register(vocabulary.clone())?;
    }
    Ok(())
}
