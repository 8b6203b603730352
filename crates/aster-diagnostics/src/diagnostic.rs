//! A single emitted diagnostic, with its message template already filled in.

use crate::code::{ErrorCode, Severity};
use aster_base::Span;
use std::collections::HashMap;

/// One diagnostic produced by a pipeline stage.
///
/// `seq` is assigned by [`crate::DiagnosticBuilder`] in strictly increasing
/// emission order, so diagnostics can be sorted back into the order they
/// were raised even after being collected into a `Vec` or re-grouped by
/// severity.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub seq: u64,
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,
    pub span: Option<Span>,
    pub help: Option<String>,
}

impl Diagnostic {
    /// Fills `code`'s message template with `params`, substituting each
    /// `{name}` placeholder with its value. A list value (comma-joined by
    /// the caller before insertion) is simply a string like any other.
    /// A placeholder with no matching key is left in the output verbatim,
    /// so a missing parameter is visible in the rendered message rather
    /// than silently dropped.
    pub(crate) fn render(
        seq: u64,
        code: ErrorCode,
        span: Option<Span>,
        params: &HashMap<&str, String>,
    ) -> Diagnostic {
        let info = code.info();
        Diagnostic {
            seq,
            code,
            severity: info.severity,
            message: substitute(&info.message, params),
            span,
            help: info.help.clone(),
        }
    }
}

fn substitute(template: &str, params: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(end) = template[i + 1..].find('}') {
                let key = &template[i + 1..i + 1 + end];
                if let Some(value) = params.get(key) {
                    out.push_str(value);
                } else {
                    out.push_str(&template[i..i + 1 + end + 1]);
                }
                i += end + 2;
                continue;
            }
        }
        let ch = template[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
        if let Some(span) = &self.span {
            write!(f, " at {}:{}", span.start_line, span.start_col)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitute_fills_known_placeholders() {
        let mut params = HashMap::new();
        params.insert("name", "x".to_string());
        let rendered = substitute("undefined variable '{name}'", &params);
        assert_eq!(rendered, "undefined variable 'x'");
    }

    #[test]
    fn substitute_leaves_unknown_placeholders_intact() {
        let params = HashMap::new();
        let rendered = substitute("expected {expected}, found {found}", &params);
        assert_eq!(rendered, "expected {expected}, found {found}");
    }

    #[test]
    fn substitute_handles_list_values_as_plain_strings() {
        let mut params = HashMap::new();
        params.insert("expected", "int, string, bool".to_string());
        let rendered = substitute("expected one of: {expected}", &params);
        assert_eq!(rendered, "expected one of: int, string, bool");
    }
}
