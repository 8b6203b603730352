//! Capability tags (`spec.md` §4.6.4): inferred per call from the same
//! qualified-name prefix matching [`crate::effects`] uses, then checked
//! against a function's declared capability list and an optional
//! allow/deny manifest loaded from `ASTER_MANIFEST_PATH`.

use aster_base::Span;
use aster_diagnostics::{DiagnosticBuilder, ErrorCode};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Http,
    Sql,
    Time,
    Files,
    Secrets,
    AiModel,
    Cpu,
    Payment,
    Inventory,
}

impl Capability {
    pub fn name(self) -> &'static str {
        match self {
            Capability::Http => "Http",
            Capability::Sql => "Sql",
            Capability::Time => "Time",
            Capability::Files => "Files",
            Capability::Secrets => "Secrets",
            Capability::AiModel => "AiModel",
            Capability::Cpu => "Cpu",
            Capability::Payment => "Payment",
            Capability::Inventory => "Inventory",
        }
    }

    pub fn from_name(name: &str) -> Option<Capability> {
        match name {
            "Http" => Some(Capability::Http),
            "Sql" => Some(Capability::Sql),
            "Time" => Some(Capability::Time),
            "Files" => Some(Capability::Files),
            "Secrets" => Some(Capability::Secrets),
            "AiModel" => Some(Capability::AiModel),
            "Cpu" => Some(Capability::Cpu),
            "Payment" => Some(Capability::Payment),
            "Inventory" => Some(Capability::Inventory),
            _ => None,
        }
    }
}

/// Infers the capability a qualified call name requires, by namespace
/// prefix — `"Http.get"` -> [`Capability::Http`], `"Payment.charge"` ->
/// [`Capability::Payment`], etc. Returns `None` for calls to user-defined
/// or operator functions, which carry no capability of their own.
pub fn infer_call_capability(qualified_name: &str) -> Option<Capability> {
    let namespace = qualified_name.split('.').next().unwrap_or(qualified_name);
    Capability::from_name(namespace)
}

#[derive(Debug, Clone, serde::Deserialize)]
struct ManifestFile {
    #[serde(default)]
    allowed: Vec<String>,
    #[serde(default)]
    denied: Vec<String>,
}

/// The workflow/manifest-level allow/deny policy loaded once per
/// `TypeChecker` from `ASTER_MANIFEST_PATH`. Absent a manifest, every
/// capability is allowed and none is denied.
#[derive(Debug, Clone, Default)]
pub struct CapabilityManifest {
    allowed: Option<HashSet<String>>,
    denied: HashSet<String>,
}

impl CapabilityManifest {
    pub fn load_from_env() -> Self {
        if let Ok(path) = std::env::var("ASTER_MANIFEST_PATH") {
            if let Ok(text) = std::fs::read_to_string(&path) {
                if let Ok(parsed) = serde_json::from_str::<ManifestFile>(&text) {
                    return CapabilityManifest {
                        allowed: if parsed.allowed.is_empty() {
                            None
                        } else {
                            Some(parsed.allowed.into_iter().collect())
                        },
                        denied: parsed.denied.into_iter().collect(),
                    };
                }
            }
        }
        Self::default()
    }

    pub fn is_allowed(&self, capability: Capability) -> bool {
        let name = capability.name();
        if self.denied.contains(name) {
            return false;
        }
        match &self.allowed {
            Some(allowed) => allowed.contains(name),
            None => true,
        }
    }
}

/// Checks a function's declared capability set against what its body
/// actually calls (`spec.md` §4.6.4). `required` is the set inferred from
/// call sites in the body; `declared` is the function header's list.
pub fn check_capabilities(
    name: &str,
    declared: &[Capability],
    required: &HashSet<Capability>,
    manifest: &CapabilityManifest,
    span: Span,
    diagnostics: &mut DiagnosticBuilder,
) {
    let declared_set: HashSet<Capability> = declared.iter().copied().collect();

    for cap in required {
        if !declared_set.contains(cap) {
            diagnostics.raise(
                ErrorCode::CapabilityMissing,
                Some(span),
                &[("name", name.to_string()), ("capability", cap.name().to_string())],
            );
        }
        if !manifest.is_allowed(*cap) {
            diagnostics.raise(
                ErrorCode::CapabilityNotAllowed,
                Some(span),
                &[("name", name.to_string()), ("capability", cap.name().to_string())],
            );
        }
    }

    for cap in &declared_set {
        if !required.contains(cap) {
            diagnostics.raise(
                ErrorCode::CapabilitySuperfluous,
                Some(span),
                &[("name", name.to_string()), ("capability", cap.name().to_string())],
            );
        }
    }
}

/// A `Step`'s `Compensate` block introducing a capability the step body
/// itself never used (`spec.md` §4.6.4's workflow rules) -- compensation
/// logic is expected to undo, not to reach for new external systems.
pub fn check_compensate_capabilities(
    step_name: &str,
    step_required: &HashSet<Capability>,
    compensate_required: &HashSet<Capability>,
    span: Span,
    diagnostics: &mut DiagnosticBuilder,
) {
    for cap in compensate_required {
        if !step_required.contains(cap) {
            diagnostics.raise(
                ErrorCode::CompensateNewCapability,
                Some(span),
                &[("step", step_name.to_string()), ("capability", cap.name().to_string())],
            );
        }
    }
}

/// A workflow step using a capability the enclosing function never
/// declared (`spec.md` §4.6.4's workflow rules).
pub fn check_workflow_step_capabilities(
    function_name: &str,
    step_name: &str,
    declared: &HashSet<Capability>,
    required: &HashSet<Capability>,
    span: Span,
    diagnostics: &mut DiagnosticBuilder,
) {
    for cap in required {
        if !declared.contains(cap) {
            diagnostics.raise(
                ErrorCode::WorkflowUndeclaredCapability,
                Some(span),
                &[
                    ("step", step_name.to_string()),
                    ("capability", cap.name().to_string()),
                    ("function", function_name.to_string()),
                ],
            );
        }
    }
}

/// A function whose body contains a `Workflow` block but whose header
/// doesn't declare the `io` effect -- workflows orchestrate steps that are
/// expected to reach outside the process.
pub fn check_workflow_declares_io(
    function_name: &str,
    declared_io: bool,
    span: Span,
    diagnostics: &mut DiagnosticBuilder,
) {
    if !declared_io {
        diagnostics.raise(
            ErrorCode::WorkflowMissingIo,
            Some(span),
            &[("name", function_name.to_string())],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_capability_from_namespace_prefix() {
        assert_eq!(infer_call_capability("Http.get"), Some(Capability::Http));
        assert_eq!(infer_call_capability("Payment.charge"), Some(Capability::Payment));
        assert_eq!(infer_call_capability("plus"), None);
    }

    #[test]
    fn empty_manifest_allows_everything() {
        let manifest = CapabilityManifest::default();
        assert!(manifest.is_allowed(Capability::Http));
    }

    #[test]
    fn denied_capability_is_rejected_even_without_allowlist() {
        let manifest = CapabilityManifest {
            allowed: None,
            denied: ["Payment".to_string()].into_iter().collect(),
        };
        assert!(!manifest.is_allowed(Capability::Payment));
        assert!(manifest.is_allowed(Capability::Http));
    }

    #[test]
    fn allowlist_excludes_anything_not_listed() {
        let manifest = CapabilityManifest {
            allowed: Some(["Http".to_string()].into_iter().collect()),
            denied: HashSet::new(),
        };
        assert!(manifest.is_allowed(Capability::Http));
        assert!(!manifest.is_allowed(Capability::Sql));
    }

    #[test]
    fn missing_declared_capability_raises_diagnostic() {
        let mut diagnostics = DiagnosticBuilder::new();
        let mut interner = aster_base::Interner::new();
        let file = interner.intern("t.cnl");
        let span = aster_base::Span::point(file, 0, 1, 1);
        let required: HashSet<Capability> = [Capability::Http].into_iter().collect();
        check_capabilities("f", &[], &required, &CapabilityManifest::default(), span, &mut diagnostics);
        assert!(!diagnostics.is_empty());
    }
}
