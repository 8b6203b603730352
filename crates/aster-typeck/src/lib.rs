//! # aster-typeck
//!
//! The two-pass type checker (`spec.md` §4.6): base Hindley-Milner-ish
//! typing and generic/alias resolution in [`rtype`] and [`unify`], effect
//! lattice checking in [`effects`], capability tag checking in
//! [`capability`], PII sensitivity tracking in [`pii`], and the async
//! `Start`/`Wait` discipline in [`async_check`] -- five independent
//! collaborators driven by one [`checker::TypeChecker`] entry point, after
//! the teacher's `compile.rs` split of discovery/registry/dependency-graph
//! passes into separate modules over one shared pipeline stage.

pub mod async_check;
pub mod capability;
mod checker;
pub mod effects;
pub mod pii;
pub mod rtype;
pub mod symbol;
pub mod unify;

pub use checker::TypeChecker;
pub use rtype::RType;
