//! # aster-lexer
//!
//! The indentation-sensitive lexer (`spec.md` §4.3): turns already-canonical
//! CNL source into a finite token stream terminated by `Eof`.
//!
//! Consumes an indent-width stack (`W` must be even; `InvalidIndentation` and
//! `InconsistentDedent` otherwise), decodes string/number literals, and
//! classifies bare words as keywords, booleans/null, or `Ident`/`TypeIdent`
//! by the case of their first code point.

mod lexer;
mod token;

pub use lexer::tokenize;
pub use token::{OperatorKind, Token, TokenKind};
