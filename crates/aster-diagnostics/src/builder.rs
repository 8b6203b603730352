//! Accumulates diagnostics in emission order.
//!
//! Grounded on `jade-codes-syster-base`'s `SyntaxErrorBuilder`: a single
//! mutable accumulator threaded through a pipeline stage, with one method
//! per severity rather than a severity parameter, so call sites read as
//! `builder.error(...)` instead of `builder.push(Severity::Error, ...)`.

use crate::code::ErrorCode;
use crate::diagnostic::Diagnostic;
use aster_base::Span;
use std::collections::HashMap;

/// Collects diagnostics raised during one pipeline stage (canonicalization,
/// lexing, parsing or type checking), tagging each with a strictly
/// increasing sequence number as it is raised.
#[derive(Debug, Default)]
pub struct DiagnosticBuilder {
    diagnostics: Vec<Diagnostic>,
    next_seq: u64,
}

impl DiagnosticBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic for `code`, using that code's own table severity
    /// (which may be `WARNING` or `INFO`, not necessarily `ERROR` — e.g.
    /// [`ErrorCode::EffectRedundantCpuWithIo`] is informational).
    pub fn raise(
        &mut self,
        code: ErrorCode,
        span: Option<Span>,
        params: &[(&str, String)],
    ) -> &Diagnostic {
        let map: HashMap<&str, String> = params.iter().map(|(k, v)| (*k, v.clone())).collect();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.diagnostics.push(Diagnostic::render(seq, code, span, &map));
        self.diagnostics.last().unwrap()
    }

    /// Convenience wrapper for [`Self::raise`] with no span.
    pub fn raise_unspanned(&mut self, code: ErrorCode, params: &[(&str, String)]) -> &Diagnostic {
        self.raise(code, None, params)
    }

    /// `true` if any accumulated diagnostic is `ERROR` severity.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == crate::code::Severity::Error)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Diagnostics in emission order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consumes the builder, returning its diagnostics in emission order.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Merges another builder's diagnostics in, re-numbering them to keep
    /// this builder's sequence strictly increasing. Used when a stage
    /// delegates to a sub-checker with its own builder (e.g. the type
    /// checker facade's five cooperating checkers).
    pub fn absorb(&mut self, other: DiagnosticBuilder) {
        for mut d in other.diagnostics {
            d.seq = self.next_seq;
            self.next_seq += 1;
            self.diagnostics.push(d);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aster_base::Interner;

    #[test]
    fn sequence_numbers_increase_monotonically() {
        let mut builder = DiagnosticBuilder::new();
        builder.raise_unspanned(ErrorCode::UndefinedVariable, &[("name", "x".into())]);
        builder.raise_unspanned(ErrorCode::UndefinedVariable, &[("name", "y".into())]);
        let seqs: Vec<u64> = builder.diagnostics().iter().map(|d| d.seq).collect();
        assert_eq!(seqs, vec![0, 1]);
    }

    #[test]
    fn has_errors_false_for_warning_only_codes() {
        let mut builder = DiagnosticBuilder::new();
        builder.raise_unspanned(ErrorCode::EffectRedundantIo, &[("name", "f".into())]);
        assert!(!builder.has_errors());
    }

    #[test]
    fn has_errors_true_after_error_code() {
        let mut builder = DiagnosticBuilder::new();
        builder.raise_unspanned(ErrorCode::UndefinedVariable, &[("name", "x".into())]);
        assert!(builder.has_errors());
    }

    #[test]
    fn raise_fills_span_and_message() {
        let mut interner = Interner::new();
        let file = interner.intern("a.cnl");
        let mut builder = DiagnosticBuilder::new();
        let span = Span::point(file, 0, 1, 1);
        let d = builder.raise(ErrorCode::UndefinedVariable, Some(span), &[("name", "x".into())]);
        assert_eq!(d.message, "undefined variable 'x'");
        assert!(d.span.is_some());
    }

    #[test]
    fn absorb_renumbers_sequences() {
        let mut builder = DiagnosticBuilder::new();
        builder.raise_unspanned(ErrorCode::UndefinedVariable, &[("name", "a".into())]);

        let mut sub = DiagnosticBuilder::new();
        sub.raise_unspanned(ErrorCode::TypeMismatch, &[("expected", "int".into()), ("found", "string".into())]);
        sub.raise_unspanned(ErrorCode::UnknownType, &[("name", "Foo".into())]);

        builder.absorb(sub);
        let seqs: Vec<u64> = builder.diagnostics().iter().map(|d| d.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }
}
