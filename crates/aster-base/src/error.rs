//! Error types with source location tracking.
//!
//! All fallible operations below the diagnostics layer carry a [`Span`]
//! indicating where in the source text the error occurred.
//!
//! # Example
//!
//! ```
//! use aster_base::{Interner, SpannedError, Span, Result};
//!
//! fn parse_number(s: &str, file: aster_base::Symbol) -> Result<i32> {
//!     s.parse().map_err(|_| SpannedError::new(
//!         format!("invalid number: '{}'", s),
//!         Span::point(file, 0, 1, 1),
//!     ))
//! }
//!
//! let mut interner = Interner::new();
//! let file = interner.intern("test.cnl");
//! let err = parse_number("abc", file).unwrap_err();
//! assert!(err.to_string().contains("invalid number"));
//! ```

use crate::span::Span;
use std::fmt;

/// An error annotated with its source location.
///
/// Implements [`std::error::Error`] and [`fmt::Display`]. The display format
/// is `{message} at {start_line}:{start_col}`.
#[derive(Debug, Clone)]
pub struct SpannedError {
    /// Human-readable error description.
    pub message: String,
    /// Location in source where the error occurred.
    pub span: Span,
}

impl SpannedError {
    /// Creates an error with the given message and source location.
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for SpannedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.message, self.span.start_line, self.span.start_col
        )
    }
}

impl std::error::Error for SpannedError {}

/// Alias for `std::result::Result<T, SpannedError>`.
///
/// Use this as the return type for fallible operations that do not need a
/// richer, category-tagged diagnostic (see `aster_diagnostics::Diagnostic`
/// for those).
pub type Result<T> = std::result::Result<T, SpannedError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::Interner;

    #[test]
    fn spanned_error_display() {
        let mut interner = Interner::new();
        let file = interner.intern("test.cnl");
        let err = SpannedError::new("test error", Span::new(file, 5, 10, 3, 1, 3, 6));
        let display = format!("{}", err);
        assert!(display.contains("test error"));
        assert!(display.contains("3:1"));
    }
}
