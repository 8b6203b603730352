//! Resolved types (`spec.md` §4.6.1-2): an owned counterpart to
//! [`aster_parser::Type`] the checkers can synthesize (inferred types have
//! no arena-allocated source node) and unify without touching the AST/IR
//! arenas.

use aster_base::Symbol;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum RType {
    Named(Symbol),
    Var(Symbol),
    App(Symbol, Vec<RType>),
    Maybe(Box<RType>),
    Option(Box<RType>),
    Result(Box<RType>, Box<RType>),
    List(Box<RType>),
    Map(Box<RType>, Box<RType>),
    Func(Vec<RType>, Box<RType>),
    Pii(u8, Box<RType>),
    /// The inference placeholder; matches anything when `strict == false`.
    Unknown,
}

impl RType {
    pub fn from_ast(ty: &aster_parser::Type<'_>, interner: &aster_base::Interner) -> RType {
        use aster_parser::Type as T;
        match ty {
            T::TypeName(sym, _) => RType::Named(*sym),
            T::TypeVar(sym, _) => RType::Var(*sym),
            T::TypeApp { base, args, .. } => RType::App(
                *base,
                args.iter().map(|a| RType::from_ast(a, interner)).collect(),
            ),
            T::Maybe(inner, _) => RType::Maybe(Box::new(RType::from_ast(inner, interner))),
            T::Option(inner, _) => RType::Option(Box::new(RType::from_ast(inner, interner))),
            T::Result { ok, err, .. } => RType::Result(
                Box::new(RType::from_ast(ok, interner)),
                Box::new(RType::from_ast(err, interner)),
            ),
            T::ListT(inner, _) => RType::List(Box::new(RType::from_ast(inner, interner))),
            T::MapT { key, value, .. } => RType::Map(
                Box::new(RType::from_ast(key, interner)),
                Box::new(RType::from_ast(value, interner)),
            ),
            T::FuncType { params, ret, .. } => RType::Func(
                params.iter().map(|p| RType::from_ast(p, interner)).collect(),
                Box::new(RType::from_ast(ret, interner)),
            ),
            T::PiiType { level, base, .. } => {
                RType::Pii(*level, Box::new(RType::from_ast(base, interner)))
            }
        }
    }

    /// Extracts the PII sensitivity level wrapped by `RType::Pii`, or `0`
    /// for a type carrying no sensitivity annotation (`spec.md` §4.6.4).
    pub fn pii_level(&self) -> u8 {
        match self {
            RType::Pii(level, _) => *level,
            _ => 0,
        }
    }

    /// Resolves a type alias chain, substituting through `aliases` until a
    /// non-alias type is reached. `visited` breaks cycles by returning the
    /// original type unchanged once a name repeats (`spec.md` §4.6.2).
    pub fn resolve_alias(
        &self,
        aliases: &HashMap<Symbol, RType>,
        visited: &mut Vec<Symbol>,
    ) -> RType {
        if let RType::Named(sym) = self {
            if visited.contains(sym) {
                return self.clone();
            }
            if let Some(target) = aliases.get(sym) {
                visited.push(*sym);
                return target.resolve_alias(aliases, visited);
            }
        }
        self.clone()
    }
}

/// Structural type equality with `Maybe<T> <-> Option<T>` and covariant
/// `Result` subtyping (`spec.md` §4.6.1). `strict == false` lets [`RType::Unknown`]
/// match anything, which is how inference leaves placeholders unresolved
/// until a later pass fills them in.
pub fn equals(a: &RType, b: &RType, strict: bool) -> bool {
    if !strict && (matches!(a, RType::Unknown) || matches!(b, RType::Unknown)) {
        return true;
    }
    match (a, b) {
        (RType::Named(x), RType::Named(y)) => x == y,
        (RType::Var(x), RType::Var(y)) => x == y,
        (RType::App(bx, ax), RType::App(by, ay)) => {
            bx == by && ax.len() == ay.len() && ax.iter().zip(ay).all(|(l, r)| equals(l, r, strict))
        }
        (RType::Maybe(x), RType::Maybe(y))
        | (RType::Maybe(x), RType::Option(y))
        | (RType::Option(x), RType::Maybe(y))
        | (RType::Option(x), RType::Option(y))
        | (RType::List(x), RType::List(y)) => equals(x, y, strict),
        (RType::Result(ox, ex), RType::Result(oy, ey)) => {
            equals(ox, oy, strict) && equals(ex, ey, strict)
        }
        (RType::Map(kx, vx), RType::Map(ky, vy)) => equals(kx, ky, strict) && equals(vx, vy, strict),
        (RType::Func(px, rx), RType::Func(py, ry)) => {
            px.len() == py.len() && px.iter().zip(py).all(|(l, r)| equals(l, r, strict)) && equals(rx, ry, strict)
        }
        // PII unwraps to its base unless both sides are PII (spec.md §4.6.1).
        (RType::Pii(lx, x), RType::Pii(ly, y)) => lx == ly && equals(x, y, strict),
        (RType::Pii(_, x), y) => equals(x, y, strict),
        (x, RType::Pii(_, y)) => equals(x, y, strict),
        _ => false,
    }
}
