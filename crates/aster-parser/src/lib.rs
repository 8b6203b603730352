//! # aster-parser
//!
//! Recursive-descent parser (`spec.md` §4.4) turning a canonical token
//! stream into an arena-allocated AST (`spec.md` §3). AST node types are
//! bundled per kind under [`ast::AstContext`], following the teacher's
//! multi-arena `AstContext` pattern (`arena_ctx.rs`), generalized from its
//! logic/imperative node set to this grammar's Decl/Stmt/Expr/Pattern/Type
//! shape.

pub mod ast;
mod parser;

pub use ast::{
    block_span, AstContext, BinaryOpKind, Block, DataDecl, Decl, EffectTag, EnumDecl, Expr,
    FuncDecl, ImportDecl, MatchArm, Module, Param, Pattern, Stmt, Type, TypeAliasDecl,
};
pub use parser::parse_module;

#[cfg(test)]
mod tests {
    use super::*;
    use aster_base::{Arena, Interner};
    use aster_lexicon::Lexicon;

    fn parse(source: &str) -> (Module<'static>, aster_diagnostics::DiagnosticBuilder) {
        let mut interner = Interner::new();
        let file = interner.intern("test.cnl");
        let lexicon = Lexicon::english();
        let (tokens, lex_diags) = aster_lexer::tokenize(source, file, &lexicon, &mut interner);
        assert!(lex_diags.is_empty(), "lexer diagnostics: {:?}", lex_diags.diagnostics());

        let decls: &'static Arena<Decl<'static>> = Box::leak(Box::new(Arena::new()));
        let stmts: &'static Arena<crate::ast::Stmt<'static>> = Box::leak(Box::new(Arena::new()));
        let exprs: &'static Arena<Expr<'static>> = Box::leak(Box::new(Arena::new()));
        let patterns: &'static Arena<Pattern<'static>> = Box::leak(Box::new(Arena::new()));
        let types: &'static Arena<Type<'static>> = Box::leak(Box::new(Arena::new()));
        let params: &'static Arena<Param<'static>> = Box::leak(Box::new(Arena::new()));
        let arms: &'static Arena<MatchArm<'static>> = Box::leak(Box::new(Arena::new()));
        let ctx: &'static AstContext<'static> = Box::leak(Box::new(AstContext::new(
            decls, stmts, exprs, patterns, types, params, arms,
        )));
        let name = interner.intern("test");
        let leaked_interner: &'static mut Interner = Box::leak(Box::new(interner));
        let leaked_tokens: &'static [aster_lexer::Token] = tokens.leak();
        parse_module(leaked_tokens, file, name, ctx, leaked_interner)
    }

    #[test]
    fn parses_empty_module() {
        let (module, diags) = parse("");
        assert!(diags.is_empty());
        assert!(module.decls.is_empty());
    }

    #[test]
    fn parses_data_declaration() {
        let src = "Data Customer has name: Text, age: Int.\n";
        let (module, diags) = parse(src);
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        assert_eq!(module.decls.len(), 1);
        match &module.decls[0] {
            Decl::Data(d) => assert_eq!(d.fields.len(), 2),
            other => panic!("expected Data decl, got {:?}", other),
        }
    }

    #[test]
    fn parses_enum_declaration() {
        let src = "Enum Status has Active, Inactive, Pending.\n";
        let (module, diags) = parse(src);
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        match &module.decls[0] {
            Decl::Enum(e) => assert_eq!(e.variants.len(), 3),
            other => panic!("expected Enum decl, got {:?}", other),
        }
    }

    #[test]
    fn parses_function_with_params_and_body() {
        let src = "Function add with a: Int, b: Int produce Int:\n  Return a plus b.\n";
        let (module, diags) = parse(src);
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        match &module.decls[0] {
            Decl::Func(f) => {
                assert_eq!(f.params.len(), 2);
                assert_eq!(f.body.len(), 1);
            }
            other => panic!("expected Func decl, got {:?}", other),
        }
    }

    #[test]
    fn expression_precedence_times_before_plus() {
        let src = "Function f produce Int:\n  Return a plus b times c.\n";
        let (module, diags) = parse(src);
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        let Decl::Func(f) = &module.decls[0] else { panic!("expected func") };
        let Stmt::Return { value: Some(expr), .. } = &f.body[0] else {
            panic!("expected return")
        };
        match expr {
            Expr::BinaryOp { op: BinaryOpKind::Add, right, .. } => {
                assert!(matches!(right, Expr::BinaryOp { op: BinaryOpKind::Mul, .. }));
            }
            other => panic!("expected top-level Add, got {:?}", other),
        }
    }

    #[test]
    fn block_span_covers_only_statements_not_indent_dedent() {
        let src = "Function f produce Int:\n  Let x be 1.\n  Return x.\n";
        let (module, diags) = parse(src);
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        let Decl::Func(f) = &module.decls[0] else { panic!("expected func") };
        let expected = crate::ast::block_span(f.body);
        assert_eq!(f.body[0].span().merge(f.body[1].span()), expected);
    }

    #[test]
    fn parses_if_otherwise() {
        let src = "Function f produce Int:\n  If x less than 0:\n    Return 0.\n  Otherwise:\n    Return x.\n";
        let (module, diags) = parse(src);
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        let Decl::Func(f) = &module.decls[0] else { panic!("expected func") };
        assert!(matches!(f.body[0], Stmt::If { else_block: Some(_), .. }));
    }

    #[test]
    fn parses_match_with_case_arms() {
        let src =
            "Function f produce Int:\n  Match x:\n    Case 0:\n      Return 1.\n    Case y:\n      Return y.\n";
        let (module, diags) = parse(src);
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        let Decl::Func(f) = &module.decls[0] else { panic!("expected func") };
        let Stmt::Match { arms, .. } = &f.body[0] else { panic!("expected match") };
        assert_eq!(arms.len(), 2);
    }

    #[test]
    fn parses_start_and_wait() {
        let src = "Function f produce Int:\n  Start job as fetch(url).\n  Wait for job.\n  Return job.\n";
        let (module, diags) = parse(src);
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        let Decl::Func(f) = &module.decls[0] else { panic!("expected func") };
        assert!(matches!(f.body[0], Stmt::Start { .. }));
        assert!(matches!(f.body[1], Stmt::Wait { .. }));
    }

    #[test]
    fn parses_list_literal_and_call() {
        let src = "Function f produce Int:\n  Return length([1, 2, 3]).\n";
        let (module, diags) = parse(src);
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        let Decl::Func(f) = &module.decls[0] else { panic!("expected func") };
        let Stmt::Return { value: Some(Expr::Call { args, .. }), .. } = &f.body[0] else {
            panic!("expected call")
        };
        assert!(matches!(args[0], Expr::ListLiteral(_, _)));
    }

    #[test]
    fn parses_ok_err_some_none_constructors() {
        let src = "Function f produce Int:\n  Let a be Ok(1).\n  Let b be Err(2).\n  Let c be Some(3).\n  Let d be None().\n";
        let (module, diags) = parse(src);
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        let Decl::Func(f) = &module.decls[0] else { panic!("expected func") };
        assert!(matches!(
            f.body[0],
            Stmt::Let { value: Expr::Ok(_, _), .. }
        ));
        assert!(matches!(
            f.body[3],
            Stmt::Let { value: Expr::None(_), .. }
        ));
    }

    #[test]
    fn parses_prefix_operator_call() {
        let src = "Function f produce Bool:\n  Return <(a, b).\n";
        let (module, diags) = parse(src);
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        let Decl::Func(f) = &module.decls[0] else { panic!("expected func") };
        let Stmt::Return { value: Some(Expr::Call { args, .. }), .. } = &f.body[0] else {
            panic!("expected call")
        };
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn parses_workflow_with_step_and_compensate() {
        let src = "Function f produce Int:\n  Workflow checkout:\n    Step charge:\n      Return 1.\n    Compensate:\n      Return 0.\n  Return 1.\n";
        let (module, diags) = parse(src);
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        let Decl::Func(f) = &module.decls[0] else { panic!("expected func") };
        let Stmt::Workflow { steps, .. } = &f.body[0] else { panic!("expected workflow") };
        assert!(matches!(steps[0], Stmt::Step { compensate: Some(_), .. }));
    }

    #[test]
    fn reports_unexpected_token_with_code() {
        let src = "Data .\n";
        let (_module, diags) = parse(src);
        assert!(diags.has_errors());
    }
}
