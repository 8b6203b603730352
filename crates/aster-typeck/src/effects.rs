//! Effect lattice `pure ⊑ cpu ⊑ io ⊑ async` (`spec.md` §4.6.3). Call-site
//! effect is inferred from a configurable set of qualified-name prefixes,
//! loaded from `ASTER_EFFECT_CONFIG` with a built-in fallback, in the same
//! env-var-config-with-defaults style the teacher's transformer registry
//! uses (`aster-lexicon`'s `ASTER_LEXICON_PATH` loading).

pub use aster_parser::EffectTag;
use aster_base::Interner;
use aster_base::Span;
use aster_diagnostics::{DiagnosticBuilder, ErrorCode};

fn rank(tag: EffectTag) -> u8 {
    match tag {
        EffectTag::Pure => 0,
        EffectTag::Cpu => 1,
        EffectTag::Io => 2,
        EffectTag::Async => 3,
    }
}

/// Lattice join: the more demanding of the two tags.
pub fn join(a: EffectTag, b: EffectTag) -> EffectTag {
    if rank(a) >= rank(b) {
        a
    } else {
        b
    }
}

pub fn join_all(tags: impl IntoIterator<Item = EffectTag>) -> EffectTag {
    tags.into_iter().fold(EffectTag::Pure, join)
}

/// `true` if `declared` is at least as demanding as `inferred` — i.e. the
/// function's header doesn't understate what its body actually does.
pub fn dominates(declared: EffectTag, inferred: EffectTag) -> bool {
    rank(declared) >= rank(inferred)
}

#[derive(Debug, Clone, serde::Deserialize)]
struct EffectPatterns {
    #[serde(default)]
    io: Vec<String>,
    #[serde(default)]
    cpu: Vec<String>,
    #[serde(default)]
    ai: Vec<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct EffectConfigFile {
    patterns: EffectPatterns,
}

/// Qualified-name prefix lists driving [`infer_call_effect`]. Loaded once
/// per `TypeChecker` from `ASTER_EFFECT_CONFIG` (a JSON file path); falls
/// back to built-in defaults silently if the env var is unset, the file is
/// missing, or it fails to parse.
#[derive(Debug, Clone)]
pub struct EffectConfig {
    io_prefixes: Vec<String>,
    cpu_prefixes: Vec<String>,
    ai_prefixes: Vec<String>,
}

impl EffectConfig {
    pub fn load_from_env() -> Self {
        if let Ok(path) = std::env::var("ASTER_EFFECT_CONFIG") {
            if let Ok(text) = std::fs::read_to_string(&path) {
                if let Ok(parsed) = serde_json::from_str::<EffectConfigFile>(&text) {
                    return EffectConfig {
                        io_prefixes: parsed.patterns.io,
                        cpu_prefixes: parsed.patterns.cpu,
                        ai_prefixes: parsed.patterns.ai,
                    };
                }
            }
        }
        Self::defaults()
    }

    pub fn defaults() -> Self {
        EffectConfig {
            io_prefixes: vec![
                "Http.".into(),
                "Sql.".into(),
                "Files.".into(),
                "Secrets.".into(),
                "Time.".into(),
            ],
            cpu_prefixes: vec!["Math.".into(), "Crypto.".into()],
            ai_prefixes: vec!["AiModel.".into(), "Ai.".into()],
        }
    }

    /// Effect implied by calling `qualified_name` (e.g. `"Http.get"`), or
    /// `None` if it matches no configured prefix (the caller should then
    /// fall back to the callee's own declared/inferred effect).
    pub fn infer_call_effect(&self, qualified_name: &str) -> Option<EffectTag> {
        if self.io_prefixes.iter().any(|p| qualified_name.starts_with(p.as_str()))
            || self.ai_prefixes.iter().any(|p| qualified_name.starts_with(p.as_str()))
        {
            return Some(EffectTag::Io);
        }
        if self.cpu_prefixes.iter().any(|p| qualified_name.starts_with(p.as_str())) {
            return Some(EffectTag::Cpu);
        }
        None
    }
}

/// Resolves a `Name`/`FieldAccess` callee expression back into a dotted
/// qualified-name string for prefix matching, e.g. `Http.get`.
pub fn qualified_name_of(expr: &aster_ir::IrExpr<'_>, interner: &Interner) -> Option<String> {
    match expr {
        aster_ir::IrExpr::Name(sym, _, _) => Some(interner.resolve(*sym).to_string()),
        aster_ir::IrExpr::FieldAccess { base, field, .. } => {
            qualified_name_of(base, interner).map(|b| format!("{b}.{}", interner.resolve(*field)))
        }
        _ => None,
    }
}

/// Checks a function's declared effect header against its inferred body
/// effect, raising the appropriate `EFFECT_*` diagnostic on mismatch
/// (`spec.md` §4.6.3, testable property 8).
pub fn check_effect_dominance(
    name: &str,
    declared: EffectTag,
    inferred: EffectTag,
    span: Span,
    diagnostics: &mut DiagnosticBuilder,
) {
    use EffectTag::*;
    if rank(declared) < rank(inferred) {
        let code = match inferred {
            Io | Async => ErrorCode::EffectMissingIo,
            Cpu => ErrorCode::EffectMissingCpu,
            Pure => unreachable!("inferred effect can't be less demanding than a non-Pure declared one"),
        };
        diagnostics.raise(code, Some(span), &[("name", name.to_string())]);
    } else if rank(declared) > rank(inferred) {
        let code = match (declared, inferred) {
            (Io, Cpu) | (Async, Cpu) => ErrorCode::EffectRedundantCpuWithIo,
            (Io, _) | (Async, _) => ErrorCode::EffectRedundantIo,
            (Cpu, Pure) => ErrorCode::EffectRedundantCpu,
            _ => return,
        };
        diagnostics.raise(code, Some(span), &[("name", name.to_string())]);
    }
}
