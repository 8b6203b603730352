//! Token kinds produced by the indentation lexer (`spec.md` §4.3).

use aster_base::{Span, Symbol};
use aster_lexicon::SemanticKind;

/// A symbolic operator. Canonicalization only folds comparison synonyms
/// into `<`/`>`; a CNL source is free to spell arithmetic and comparison
/// either as words (`plus`, `less than`, tokenized as [`TokenKind::Keyword`])
/// or as these bare symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Plus,
    Minus,
    Star,
    Slash,
    Assign,
    Lt,
    Gt,
    Le,
    Ge,
    Ne,
    Bang,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// One of the ~75 [`SemanticKind`] roles, other than `True`/`False`/`Null`
    /// which are tokenized as literals instead (see [`Self::Bool`]/[`Self::Null`]).
    Keyword(SemanticKind),
    Ident(Symbol),
    TypeIdent(Symbol),
    Int(i64),
    Long(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    Operator(OperatorKind),
    Dot,
    Colon,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Newline,
    Indent,
    Dedent,
    Comment { text: String, standalone: bool },
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}
