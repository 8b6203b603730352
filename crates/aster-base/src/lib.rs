//! # aster-base
//!
//! Foundational, vocabulary-agnostic types shared by every stage of the
//! `aster` CNL compiler pipeline:
//!
//! - [`Arena`] — bump allocation for stable AST/IR references
//! - [`Interner`]/[`Symbol`] — string interning for O(1) equality
//! - [`Span`] — source location tracking (file, byte range, line/col)
//! - [`SpannedError`]/[`Result`] — errors carrying a source location
//!
//! This crate has **no knowledge of any particular locale, lexicon, or
//! grammar**. It provides only generic infrastructure that the canonicalizer,
//! lexer, parser, IR lowerer, and type checker all build upon.
//!
//! # Example
//!
//! ```
//! use aster_base::{Arena, Interner, Span};
//!
//! let arena: Arena<&str> = Arena::new();
//! let mut interner = Interner::new();
//! let file = interner.intern("module.cnl");
//!
//! let hello = interner.intern("hello");
//! let span = Span::new(file, 0, 5, 1, 1, 1, 6);
//!
//! let allocated = arena.alloc("hello");
//! assert_eq!(*allocated, "hello");
//! ```

pub mod arena;
pub mod intern;
pub mod span;
pub mod error;

pub use arena::Arena;
pub use intern::{Interner, Symbol, SymbolEq};
pub use span::Span;
pub use error::{SpannedError, Result};
