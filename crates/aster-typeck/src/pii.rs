//! PII sensitivity lattice `L1 < L2 < L3` (`spec.md` §4.6.4). The whole
//! checker is gated behind `ENFORCE_PII`/`ASTER_ENFORCE_PII` — when neither
//! is set, callers should skip invoking it entirely rather than pay for
//! level tracking that nothing downstream asked for.

use aster_base::Span;
use aster_diagnostics::{DiagnosticBuilder, ErrorCode};

/// `true` if either `ENFORCE_PII` or `ASTER_ENFORCE_PII` is set to a
/// non-empty, non-`"0"`/`"false"` value.
pub fn is_enforced() -> bool {
    for var in ["ENFORCE_PII", "ASTER_ENFORCE_PII"] {
        if let Ok(value) = std::env::var(var) {
            let value = value.trim().to_ascii_lowercase();
            if !value.is_empty() && value != "0" && value != "false" {
                return true;
            }
        }
    }
    false
}

/// Branch merges (`if`/`match`) take the lattice max of their arms'
/// sensitivity levels (`spec.md` §4.6.4).
pub fn merge(a: u8, b: u8) -> u8 {
    a.max(b)
}

/// Assigning a more sensitive value into a binding already declared at a
/// lower level is an error (data can't become *less* sensitive by fiat);
/// the inverse — binding a less-sensitive value where a more-sensitive one
/// was declared — is only a warning, since it's locally safe but usually a
/// sign the declared level was wrong.
pub fn check_assignment(
    name: &str,
    declared_level: u8,
    value_level: u8,
    span: Span,
    diagnostics: &mut DiagnosticBuilder,
) {
    if value_level > declared_level {
        diagnostics.raise(
            ErrorCode::PiiAssignDowngrade,
            Some(span),
            &[
                ("name", name.to_string()),
                ("from", value_level.to_string()),
                ("to", declared_level.to_string()),
            ],
        );
    } else if value_level < declared_level {
        diagnostics.raise(
            ErrorCode::PiiImplicitUplevel,
            Some(span),
            &[
                ("from", value_level.to_string()),
                ("to", declared_level.to_string()),
            ],
        );
    }
}

/// A value flows into a sink (a capability-tagged call, e.g. `Http.post`)
/// at `value_level` without the sink declaring it tolerates that level.
pub fn check_sink(
    sink_name: &str,
    sink_tolerance: u8,
    value_level: u8,
    span: Span,
    diagnostics: &mut DiagnosticBuilder,
) {
    if value_level > sink_tolerance {
        diagnostics.raise(
            ErrorCode::PiiSinkUnsanitized,
            Some(span),
            &[
                ("sink", sink_name.to_string()),
                ("level", value_level.to_string()),
            ],
        );
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
struct PiiSinkConfigFile {
    #[serde(default)]
    sinks: Vec<String>,
}

/// Qualified sink-function names a PII value must not reach unsanitized
/// (`spec.md` §4.6.4, §6: "implementers should expose it as a configurable
/// list"). Loaded once per `TypeChecker` from `ASTER_PII_SINK_CONFIG` (a
/// JSON file path, `{"sinks": [...]}`), in the same env-var-config-with-
/// defaults style as `EffectConfig::load_from_env`; falls back to built-in
/// defaults silently if the env var is unset, the file is missing, or it
/// fails to parse.
#[derive(Debug, Clone)]
pub struct PiiSinkConfig {
    sinks: Vec<String>,
}

impl PiiSinkConfig {
    pub fn load_from_env() -> Self {
        if let Ok(path) = std::env::var("ASTER_PII_SINK_CONFIG") {
            if let Ok(text) = std::fs::read_to_string(&path) {
                if let Ok(parsed) = serde_json::from_str::<PiiSinkConfigFile>(&text) {
                    return PiiSinkConfig { sinks: parsed.sinks };
                }
            }
        }
        Self::defaults()
    }

    pub fn defaults() -> Self {
        PiiSinkConfig {
            sinks: vec![
                "IO.print".into(),
                "Log.info".into(),
                "Log.warn".into(),
                "Log.error".into(),
            ],
        }
    }

    /// Sinks tolerate no sensitivity (`spec.md` §4.6.4: "a sink call...
    /// applied to a PII value" is unconditionally unsanitized).
    pub fn is_sink(&self, qualified_name: &str) -> bool {
        self.sinks.iter().any(|s| s == qualified_name)
    }
}

/// A call argument's sensitivity level exceeds what the callee's
/// corresponding parameter declared it would accept.
pub fn check_argument(
    _func_name: &str,
    param_name: &str,
    param_level: u8,
    arg_level: u8,
    span: Span,
    diagnostics: &mut DiagnosticBuilder,
) {
    if arg_level > param_level {
        diagnostics.raise(
            ErrorCode::PiiArgViolation,
            Some(span),
            &[
                ("name", param_name.to_string()),
                ("found", arg_level.to_string()),
                ("expected", param_level.to_string()),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn merge_takes_the_higher_level() {
        assert_eq!(merge(1, 3), 3);
        assert_eq!(merge(2, 2), 2);
    }

    #[test]
    fn downgrade_assignment_is_an_error() {
        let mut diagnostics = DiagnosticBuilder::new();
        let mut interner = aster_base::Interner::new();
        let file = interner.intern("t.cnl");
        let span = aster_base::Span::point(file, 0, 1, 1);
        check_assignment("ssn", 1, 3, span, &mut diagnostics);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn uplevel_assignment_is_a_warning_not_an_error() {
        let mut diagnostics = DiagnosticBuilder::new();
        let mut interner = aster_base::Interner::new();
        let file = interner.intern("t.cnl");
        let span = aster_base::Span::point(file, 0, 1, 1);
        check_assignment("ssn", 3, 1, span, &mut diagnostics);
        assert!(!diagnostics.has_errors());
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    #[serial]
    fn enforcement_flag_recognizes_either_env_var() {
        std::env::remove_var("ENFORCE_PII");
        std::env::remove_var("ASTER_ENFORCE_PII");
        assert!(!is_enforced());
        std::env::set_var("ASTER_ENFORCE_PII", "1");
        assert!(is_enforced());
        std::env::remove_var("ASTER_ENFORCE_PII");
        std::env::set_var("ENFORCE_PII", "false");
        assert!(!is_enforced());
        std::env::remove_var("ENFORCE_PII");
    }
}
