//! Hindley-Milner-style unification over call argument types against a
//! generic function signature `forall. (P1..Pn) -> R` (`spec.md` §4.6.2).

use crate::rtype::{equals, RType};
use aster_base::Symbol;
use std::collections::HashMap;

#[derive(Debug, PartialEq)]
pub enum UnifyError {
    /// A type variable was bound to two different types across the call:
    /// the variable, its first binding, and the conflicting one.
    Inconsistent(Symbol, RType, RType),
    Arity,
}

/// Binds each `TypeVar` appearing in `params` to the corresponding `args`
/// entry, substituting the result into `ret`. Two occurrences of the same
/// variable binding to structurally different types is
/// [`UnifyError::Inconsistent`] (`TYPEVAR_INCONSISTENT`).
pub fn unify_call(params: &[RType], args: &[RType], ret: &RType) -> Result<RType, UnifyError> {
    if params.len() != args.len() {
        return Err(UnifyError::Arity);
    }
    let mut bindings: HashMap<Symbol, RType> = HashMap::new();
    for (p, a) in params.iter().zip(args) {
        bind(p, a, &mut bindings)?;
    }
    Ok(substitute(ret, &bindings))
}

fn bind(param: &RType, arg: &RType, bindings: &mut HashMap<Symbol, RType>) -> Result<(), UnifyError> {
    match param {
        RType::Var(sym) => {
            if let Some(existing) = bindings.get(sym) {
                if !equals(existing, arg, false) {
                    return Err(UnifyError::Inconsistent(*sym, existing.clone(), arg.clone()));
                }
            } else {
                bindings.insert(*sym, arg.clone());
            }
            Ok(())
        }
        RType::App(base, p_args) => {
            if let RType::App(abase, a_args) = arg {
                if base != abase || p_args.len() != a_args.len() {
                    return Ok(()); // mismatch surfaces via the caller's equals() check
                }
                for (p, a) in p_args.iter().zip(a_args) {
                    bind(p, a, bindings)?;
                }
            }
            Ok(())
        }
        RType::List(p) => {
            if let RType::List(a) = arg {
                bind(p, a, bindings)?;
            }
            Ok(())
        }
        RType::Maybe(p) | RType::Option(p) => {
            if let RType::Maybe(a) | RType::Option(a) = arg {
                bind(p, a, bindings)?;
            }
            Ok(())
        }
        RType::Result(po, pe) => {
            if let RType::Result(ao, ae) = arg {
                bind(po, ao, bindings)?;
                bind(pe, ae, bindings)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn substitute(ty: &RType, bindings: &HashMap<Symbol, RType>) -> RType {
    match ty {
        RType::Var(sym) => bindings.get(sym).cloned().unwrap_or_else(|| ty.clone()),
        RType::App(base, args) => RType::App(
            *base,
            args.iter().map(|a| substitute(a, bindings)).collect(),
        ),
        RType::Maybe(inner) => RType::Maybe(Box::new(substitute(inner, bindings))),
        RType::Option(inner) => RType::Option(Box::new(substitute(inner, bindings))),
        RType::List(inner) => RType::List(Box::new(substitute(inner, bindings))),
        RType::Result(ok, err) => RType::Result(
            Box::new(substitute(ok, bindings)),
            Box::new(substitute(err, bindings)),
        ),
        RType::Map(k, v) => RType::Map(Box::new(substitute(k, bindings)), Box::new(substitute(v, bindings))),
        RType::Func(params, ret) => RType::Func(
            params.iter().map(|p| substitute(p, bindings)).collect(),
            Box::new(substitute(ret, bindings)),
        ),
        RType::Pii(level, inner) => RType::Pii(*level, Box::new(substitute(inner, bindings))),
        RType::Named(_) | RType::Unknown => ty.clone(),
    }
}

/// Arity each type-constructor keyword requires (`spec.md` §4.6.2):
/// `List`:1, `Map`:2, `Result`:2, `Maybe`:1, `Option`:1.
pub fn expected_arity(ctor: &str) -> Option<usize> {
    match ctor {
        "List" => Some(1),
        "Map" => Some(2),
        "Result" => Some(2),
        "Maybe" => Some(1),
        "Option" => Some(1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aster_base::Interner;

    #[test]
    fn binds_type_var_and_substitutes_into_return() {
        let mut interner = Interner::new();
        let t = interner.intern("T");
        let int_sym = interner.intern("Int");
        let params = vec![RType::Var(t)];
        let args = vec![RType::Named(int_sym)];
        let ret = unify_call(&params, &args, &RType::Var(t)).unwrap();
        assert_eq!(ret, RType::Named(int_sym));
    }

    #[test]
    fn inconsistent_bindings_are_rejected() {
        let mut interner = Interner::new();
        let t = interner.intern("T");
        let int_sym = interner.intern("Int");
        let text_sym = interner.intern("Text");
        let params = vec![RType::Var(t), RType::Var(t)];
        let args = vec![RType::Named(int_sym), RType::Named(text_sym)];
        let err = unify_call(&params, &args, &RType::Var(t)).unwrap_err();
        assert_eq!(err, UnifyError::Inconsistent(t, RType::Named(int_sym), RType::Named(text_sym)));
    }

    #[test]
    fn arity_table_matches_spec() {
        assert_eq!(expected_arity("List"), Some(1));
        assert_eq!(expected_arity("Map"), Some(2));
        assert_eq!(expected_arity("Result"), Some(2));
        assert_eq!(expected_arity("Maybe"), Some(1));
        assert_eq!(expected_arity("Option"), Some(1));
        assert_eq!(expected_arity("Whatever"), None);
    }
}
