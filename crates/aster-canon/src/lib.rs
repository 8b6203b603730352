//! # aster-canon
//!
//! The canonicalization pipeline: rewrites locale-specific CNL source into a
//! single canonical ASCII form the indentation lexer and grammar accept.
//! Idempotent — `canonicalize(canonicalize(x)) == canonicalize(x)`.
//!
//! [`canonicalize`] runs the thirteen ordered passes from `spec.md` §4.2:
//! newline/tab/BOM normalization, string and comment protection, the
//! lexicon's transformer chains, article removal, keyword normalization,
//! domain-identifier translation, comparison-synonym unification, and
//! whitespace collapse, restoring protected strings last.

mod pipeline;
mod protect;

pub use pipeline::{canonicalize, canonicalize_with_vocabulary};
