//! # aster-ir
//!
//! The core IR (`spec.md` §4.5): a structural lowering of `aster-parser`'s
//! AST that normalizes operator expressions into `Call`s and assigns every
//! node a [`ir::NodeId`] for the type checker's side tables.

pub mod ir;
mod lower;

pub use ir::{
    IrBlock, IrContext, IrDataDecl, IrDecl, IrExpr, IrFuncDecl, IrMatchArm, IrModule, IrStmt,
    NodeId,
};
pub use lower::lower_module;

#[cfg(test)]
mod tests {
    use super::*;
    use aster_base::{Arena, Interner};
    use aster_lexicon::Lexicon;
    use aster_parser::AstContext;

    fn lower(source: &str) -> IrModule<'static> {
        let mut interner = Interner::new();
        let file = interner.intern("test.cnl");
        let lexicon = Lexicon::english();
        let (tokens, lex_diags) = aster_lexer::tokenize(source, file, &lexicon, &mut interner);
        assert!(lex_diags.is_empty());

        let decls = Box::leak(Box::new(Arena::new()));
        let stmts = Box::leak(Box::new(Arena::new()));
        let exprs = Box::leak(Box::new(Arena::new()));
        let patterns = Box::leak(Box::new(Arena::new()));
        let types: &'static Arena<aster_parser::Type<'static>> = Box::leak(Box::new(Arena::new()));
        let params: &'static Arena<aster_parser::Param<'static>> = Box::leak(Box::new(Arena::new()));
        let arms = Box::leak(Box::new(Arena::new()));
        let ast_ctx: &'static AstContext<'static> = Box::leak(Box::new(AstContext::new(
            decls, stmts, exprs, patterns, types, params, arms,
        )));
        let name = interner.intern("test");
        let leaked_interner: &'static mut Interner = Box::leak(Box::new(interner));
        let leaked_tokens: &'static [aster_lexer::Token] = tokens.leak();
        let (module, parse_diags) =
            aster_parser::parse_module(leaked_tokens, file, name, ast_ctx, leaked_interner);
        assert!(parse_diags.is_empty(), "{:?}", parse_diags.diagnostics());
        let module: &'static aster_parser::Module<'static> = Box::leak(Box::new(module));

        let ir_decls = Box::leak(Box::new(Arena::new()));
        let ir_stmts = Box::leak(Box::new(Arena::new()));
        let ir_exprs = Box::leak(Box::new(Arena::new()));
        let ir_arms = Box::leak(Box::new(Arena::new()));
        let ir_ctx: &'static IrContext<'static> =
            Box::leak(Box::new(IrContext::new(ir_decls, ir_stmts, ir_exprs, ir_arms, types, params)));
        lower_module(module, ir_ctx, leaked_interner)
    }

    #[test]
    fn binary_op_desugars_to_call() {
        let module = lower("Function f produce Int:\n  Return a plus b.\n");
        let IrDecl::Func(f) = &module.decls[0] else { panic!("expected func") };
        let IrStmt::Return { value: Some(IrExpr::Call { callee, args, .. }), .. } = &f.body[0] else {
            panic!("expected call")
        };
        assert!(matches!(**callee, IrExpr::Name(_, _, _)));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn every_node_gets_a_distinct_id() {
        let module = lower("Function f produce Int:\n  Return a plus b times c.\n");
        let IrDecl::Func(f) = &module.decls[0] else { panic!("expected func") };
        let IrStmt::Return { value: Some(expr), .. } = &f.body[0] else { panic!("expected return") };
        // top call, its callee Name, two args (one of which is itself a Call) -- ids must differ
        let IrExpr::Call { id: top_id, callee, args, .. } = expr else { panic!("expected call") };
        assert_ne!(*top_id, callee.id());
        assert_ne!(args[0].id(), args[1].id());
    }

    #[test]
    fn param_without_type_infers_from_name_suffix() {
        let module = lower("Function f with customerId produce Int:\n  Return 1.\n");
        let IrDecl::Func(f) = &module.decls[0] else { panic!("expected func") };
        assert!(f.params[0].ty.is_some());
    }

    #[test]
    fn calculate_prefixed_function_infers_int_return() {
        let module = lower("Function calculateTotal with a: Int:\n  Return a.\n");
        let IrDecl::Func(f) = &module.decls[0] else { panic!("expected func") };
        assert!(f.return_type.is_some());
    }
}
