//! # aster
//!
//! The top-level pipeline facade: wires the five compiler stages
//! (canonicalize -> lex -> parse -> lower -> type-check) behind one
//! `compile_module` entry point, after the teacher's `Session` (
//! `crates/logicaffeine_language/src/session.rs`) owning the interner and
//! driving a pipeline stage per call rather than exposing each stage's
//! plumbing to callers.
//!
//! Unlike the teacher's `Session`, nothing here needs to persist AST/IR
//! across calls, so each [`compile_module`] call opens its own arenas on the
//! stack and returns only owned data (diagnostics, canonical source) --
//! no `Box::leak` is needed outside test harnesses that must hand back
//! borrowed AST/IR for inspection.

use aster_base::{Arena, Interner};
use aster_diagnostics::Diagnostic;
use aster_lexicon::{DomainVocabulary, IdentifierIndex, Lexicon, TransformerRegistry};

/// Inputs threaded through one `compile_module` call beyond the source text
/// itself -- the locale lexicon and, optionally, a resolved domain
/// vocabulary for identifier translation (`spec.md` §4.1-4.2).
#[derive(Default)]
pub struct CompileConfig<'a> {
    pub vocabulary: Option<&'a DomainVocabulary>,
    pub transformers: TransformerRegistry,
}

/// The outcome of running the full pipeline over one module's source text.
/// `canonical_source` is exposed mainly for debugging/golden-file tests --
/// downstream stages never hand the caller anything borrowed from it.
#[derive(Debug, Clone)]
pub struct CompileOutcome {
    pub canonical_source: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutcome {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == aster_diagnostics::Severity::Error)
    }
}

/// Runs the full pipeline (`spec.md` §1/§2) over `source`, named `module_name`
/// and attributed to `file_name` in diagnostics, written in `lexicon`'s
/// locale. Returns as soon as a stage that cannot continue (canonicalization
/// failure, e.g. an unterminated string) fails; otherwise carries every
/// stage's diagnostics through to the type checker's.
pub fn compile_module(
    source: &str,
    file_name: &str,
    module_name: &str,
    lexicon: &Lexicon,
    config: &CompileConfig<'_>,
) -> CompileOutcome {
    let mut interner = Interner::new();
    let file = interner.intern(file_name);
    let module_sym = interner.intern(module_name);

    let index: Option<IdentifierIndex> = config.vocabulary.map(DomainVocabulary::index);
    let canonical = match aster_canon::canonicalize(
        source,
        file,
        lexicon,
        index.as_ref(),
        &config.transformers,
    ) {
        Ok(text) => text,
        Err(err) => {
            return CompileOutcome {
                canonical_source: source.to_string(),
                diagnostics: vec![canonicalization_failure_diagnostic(err)],
            };
        }
    };

    let (tokens, lex_diagnostics) = aster_lexer::tokenize(&canonical, file, lexicon, &mut interner);
    let mut all_diagnostics = lex_diagnostics.into_diagnostics();

    let decls = Arena::new();
    let stmts = Arena::new();
    let exprs = Arena::new();
    let patterns = Arena::new();
    let types = Arena::new();
    let params = Arena::new();
    let arms = Arena::new();
    let ast_ctx = aster_parser::AstContext::new(&decls, &stmts, &exprs, &patterns, &types, &params, &arms);

    let (module, parse_diagnostics) =
        aster_parser::parse_module(&tokens, file, module_sym, &ast_ctx, &mut interner);
    all_diagnostics.extend(parse_diagnostics.into_diagnostics());

    let ir_decls = Arena::new();
    let ir_stmts = Arena::new();
    let ir_exprs = Arena::new();
    let ir_arms = Arena::new();
    let ir_ctx = aster_ir::IrContext::new(&ir_decls, &ir_stmts, &ir_exprs, &ir_arms, &types, &params);
    let ir_module = aster_ir::lower_module(&module, &ir_ctx, &mut interner);

    let checker = aster_typeck::TypeChecker::new(&mut interner);
    let check_diagnostics = checker.check_module(&ir_module);
    all_diagnostics.extend(check_diagnostics.into_diagnostics());

    CompileOutcome {
        canonical_source: canonical,
        diagnostics: all_diagnostics,
    }
}

fn canonicalization_failure_diagnostic(err: aster_base::SpannedError) -> Diagnostic {
    use aster_diagnostics::ErrorCode;
    let mut diagnostics = aster_diagnostics::DiagnosticBuilder::new();
    diagnostics.raise(ErrorCode::UnterminatedString, Some(err.span), &[]);
    diagnostics.into_diagnostics().remove(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// End-to-end scenario coverage lives in `tests/scenarios.rs`; this is
    /// just a smoke test that the facade wires all five stages together.
    #[test]
    fn compiles_a_trivial_module_with_no_diagnostics() {
        let lexicon = Lexicon::english();
        let config = CompileConfig::default();
        let outcome = compile_module(
            "Module app.\nRule helloMessage produce Text:\n  Return \"Hello, world!\".\n",
            "test.cnl",
            "test",
            &lexicon,
            &config,
        );
        assert!(!outcome.has_errors(), "{:?}", outcome.diagnostics);
    }
}
