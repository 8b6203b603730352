//! Punctuation tables and text direction for a [`crate::Lexicon`].

/// Reading direction of a locale's surface text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

/// Structural punctuation marks for one locale.
///
/// `enumSeparator` and `listSeparator` are permitted to be the same string
/// (`SPEC_FULL.md` §3 resolves the open question in spec.md §9: identity is
/// allowed, not just "not forbidden").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Punctuation {
    pub statement_end: String,
    pub list_separator: String,
    pub enum_separator: String,
    pub block_start: String,
    pub string_quote_open: String,
    pub string_quote_close: String,
    pub marker_open: Option<String>,
    pub marker_close: Option<String>,
}

impl Punctuation {
    /// Checks invariants (iii) and (iv) from `SPEC_FULL.md` §3: quote open/close
    /// both present, and marker open/close paired (both present or both absent).
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.string_quote_open.is_empty() || self.string_quote_close.is_empty() {
            errors.push("string quote open and close must both be non-empty".to_string());
        }
        if self.marker_open.is_some() != self.marker_close.is_some() {
            errors.push("marker open and close must both be present or both be absent".to_string());
        }
        if self.statement_end.is_empty() {
            errors.push("statementEnd must be non-empty".to_string());
        }
        if self.block_start.is_empty() {
            errors.push("blockStart must be non-empty".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
