//! Recursive-descent parser (`spec.md` §4.4).
//!
//! Operates over the token stream `aster-lexer` produces from already
//! canonical (English-keyword) source. Precedence climbs
//! `or` < `and` < comparisons < `+ -` < `* /`, matching the teacher's
//! `parser/common.rs` climbing style generalized to this grammar's richer
//! expression forms (qualified names, method-style receiver rewriting,
//! natural-language operator words, record construction, lambdas).

use crate::ast::{
    AstContext, BinaryOpKind, Block, DataDecl, Decl, EffectTag, EnumDecl, Expr, FuncDecl,
    ImportDecl, MatchArm, Module, Param, Pattern, Stmt, Type, TypeAliasDecl,
};
use aster_base::{Interner, Span, Symbol};
use aster_diagnostics::{DiagnosticBuilder, ErrorCode};
use aster_lexer::{OperatorKind, Token, TokenKind};
use aster_lexicon::SemanticKind;

pub struct Parser<'a, 'ctx> {
    tokens: &'a [Token],
    pos: usize,
    ctx: &'ctx AstContext<'ctx>,
    interner: &'a mut Interner,
    file: Symbol,
    diagnostics: DiagnosticBuilder,
}

/// Parses a full module from a token stream already produced by
/// `aster_lexer::tokenize`. Returns the module AST (arena-allocated against
/// `ctx`) and any diagnostics raised along the way.
pub fn parse_module<'ctx>(
    tokens: &[Token],
    file: Symbol,
    name: Symbol,
    ctx: &'ctx AstContext<'ctx>,
    interner: &mut Interner,
) -> (Module<'ctx>, DiagnosticBuilder) {
    let mut parser = Parser {
        tokens,
        pos: 0,
        ctx,
        interner,
        file,
        diagnostics: DiagnosticBuilder::new(),
    };
    let decls = parser.parse_decls();
    let span = match (decls.first(), decls.last()) {
        (Some(first), Some(last)) => first.span().merge(last.span()),
        _ => Span::default(),
    };
    let module = Module { name, decls, span };
    (module, parser.diagnostics)
}

impl<'a, 'ctx> Parser<'a, 'ctx> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline) {
            self.advance();
        }
    }

    fn is_keyword(&self, kind: SemanticKind) -> bool {
        matches!(self.peek_kind(), TokenKind::Keyword(k) if *k == kind)
    }

    fn eat_keyword(&mut self, kind: SemanticKind) -> bool {
        if self.is_keyword(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, kind: SemanticKind) -> Span {
        let span = self.peek().span;
        if !self.eat_keyword(kind) {
            self.error_unexpected(&format!("expected keyword {:?}", kind));
        }
        span
    }

    fn expect(&mut self, kind: TokenKind) -> Span {
        let span = self.peek().span;
        if *self.peek_kind() == kind {
            self.advance();
        } else {
            self.error_unexpected(&format!("expected {:?}", kind));
        }
        span
    }

    fn error_unexpected(&mut self, message: &str) {
        let span = self.peek().span;
        self.diagnostics.raise(
            ErrorCode::UnexpectedToken,
            Some(span),
            &[
                ("found", format!("{:?}", self.peek_kind())),
                ("context", message.to_string()),
            ],
        );
    }

    fn intern_ident(&mut self, s: &str) -> Symbol {
        self.interner.intern(s)
    }

    /// Skips forward to the next statement terminator or block boundary,
    /// the parser's error-recovery strategy for a malformed statement.
    fn recover_to_statement_boundary(&mut self) {
        loop {
            match self.peek_kind() {
                TokenKind::Dot | TokenKind::Eof | TokenKind::Dedent => {
                    if matches!(self.peek_kind(), TokenKind::Dot) {
                        self.advance();
                    }
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ---- declarations -----------------------------------------------

    fn parse_decls(&mut self) -> &'ctx [Decl<'ctx>] {
        let mut decls = Vec::new();
        self.skip_newlines();
        if self.eat_keyword(SemanticKind::Module) {
            // `Module Name:` header; its body is just more declarations at
            // the top indentation level, so we consume the header and the
            // following indented block transparently.
            self.advance(); // module name ident, best-effort
            self.expect(TokenKind::Colon);
            self.skip_newlines();
            self.expect(TokenKind::Indent);
        }
        while !self.at_eof() {
            self.skip_newlines();
            if self.at_eof() || matches!(self.peek_kind(), TokenKind::Dedent) {
                break;
            }
            match self.parse_decl() {
                Some(decl) => decls.push(decl),
                None => self.recover_to_statement_boundary(),
            }
        }
        self.ctx.alloc_decls(decls.into_iter())
    }

    fn parse_decl(&mut self) -> Option<Decl<'ctx>> {
        if self.is_keyword(SemanticKind::Import) {
            return self.parse_import().map(Decl::Import);
        }
        if self.is_keyword(SemanticKind::Data) {
            return self.parse_data().map(Decl::Data);
        }
        if self.is_keyword(SemanticKind::Enum) {
            return self.parse_enum().map(Decl::Enum);
        }
        if self.is_keyword(SemanticKind::TypeAlias) {
            return self.parse_type_alias().map(Decl::TypeAlias);
        }
        if self.is_keyword(SemanticKind::Function) || self.is_keyword(SemanticKind::Rule) {
            return self.parse_func().map(Decl::Func);
        }
        self.error_unexpected("expected a declaration");
        None
    }

    fn parse_import(&mut self) -> Option<ImportDecl> {
        let start = self.expect_keyword(SemanticKind::Import);
        let path = self.expect_ident()?;
        let alias = if self.eat_keyword(SemanticKind::As) {
            self.expect_ident()
        } else {
            None
        };
        let end = self.expect(TokenKind::Dot);
        Some(ImportDecl {
            path,
            alias,
            span: start.merge(end),
        })
    }

    fn parse_data(&mut self) -> Option<DataDecl<'ctx>> {
        let start = self.expect_keyword(SemanticKind::Data);
        let name = self.expect_ident()?;
        self.eat_keyword(SemanticKind::Has);
        let mut fields = Vec::new();
        loop {
            let field_name = self.expect_ident()?;
            self.expect(TokenKind::Colon);
            let ty = self.parse_type()?;
            let span = ty.span();
            fields.push(Param {
                name: field_name,
                ty: Some(ty),
                span,
            });
            if matches!(self.peek_kind(), TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        let end = self.expect(TokenKind::Dot);
        Some(DataDecl {
            name,
            fields: self.ctx.alloc_params(fields.into_iter()),
            span: start.merge(end),
        })
    }

    fn parse_enum(&mut self) -> Option<EnumDecl<'ctx>> {
        let start = self.expect_keyword(SemanticKind::Enum);
        let name = self.expect_ident()?;
        self.eat_keyword(SemanticKind::Has);
        let mut variants = Vec::new();
        loop {
            variants.push(self.expect_ident()?);
            if matches!(self.peek_kind(), TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        let end = self.expect(TokenKind::Dot);
        Some(EnumDecl {
            name,
            variants: variants.leak(),
            span: start.merge(end),
        })
    }

    fn parse_type_alias(&mut self) -> Option<TypeAliasDecl<'ctx>> {
        let start = self.expect_keyword(SemanticKind::TypeAlias);
        let name = self.expect_ident()?;
        self.eat_keyword(SemanticKind::As);
        let target = self.parse_type()?;
        let end = self.expect(TokenKind::Dot);
        Some(TypeAliasDecl {
            name,
            params: &[],
            target,
            span: start.merge(end),
        })
    }

    fn parse_func(&mut self) -> Option<FuncDecl<'ctx>> {
        let start = self.peek().span;
        self.advance(); // Function | Rule
        if self.is_keyword(SemanticKind::To) {
            self.advance();
        }
        let name = self.expect_ident()?;
        let mut params = Vec::new();
        if self.eat_keyword(SemanticKind::With) || self.eat_keyword(SemanticKind::Given) {
            loop {
                let pname = self.expect_ident()?;
                let pty = if matches!(self.peek_kind(), TokenKind::Colon) {
                    self.advance();
                    self.parse_type()
                } else {
                    None
                };
                let span = pty.map(|t| t.span()).unwrap_or(start);
                params.push(Param {
                    name: pname,
                    ty: pty,
                    span,
                });
                if matches!(self.peek_kind(), TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        let return_type = if self.eat_keyword(SemanticKind::Produce) {
            self.parse_type()
        } else {
            None
        };
        let mut effects = Vec::new();
        if self.eat_keyword(SemanticKind::Performs) {
            loop {
                effects.push(self.parse_effect_tag()?);
                if matches!(self.peek_kind(), TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        let mut capabilities = Vec::new();
        if self.eat_keyword(SemanticKind::Requires) {
            loop {
                capabilities.push(self.expect_ident()?);
                if matches!(self.peek_kind(), TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::Colon);
        self.skip_newlines();
        let body = self.parse_block();
        let end = body.last().map(|s| s.span()).unwrap_or(start);
        Some(FuncDecl {
            name,
            params: self.ctx.alloc_params(params.into_iter()),
            return_type,
            effects: self
                .effects_arena(effects),
            capabilities: capabilities.leak(),
            body,
            span: start.merge(end),
        })
    }

    fn effects_arena(&self, effects: Vec<EffectTag>) -> &'ctx [EffectTag] {
        effects.leak()
    }

    fn parse_effect_tag(&mut self) -> Option<EffectTag> {
        let tag = match self.peek_kind() {
            TokenKind::Keyword(SemanticKind::Pure) => EffectTag::Pure,
            TokenKind::Keyword(SemanticKind::Cpu) => EffectTag::Cpu,
            TokenKind::Keyword(SemanticKind::Io) => EffectTag::Io,
            TokenKind::Keyword(SemanticKind::AsyncEffect) => EffectTag::Async,
            _ => {
                self.error_unexpected("expected an effect tag");
                return None;
            }
        };
        self.advance();
        Some(tag)
    }

    fn expect_ident(&mut self) -> Option<Symbol> {
        match self.peek_kind().clone() {
            TokenKind::Ident(sym) | TokenKind::TypeIdent(sym) => {
                self.advance();
                Some(sym)
            }
            _ => {
                self.error_unexpected("expected an identifier");
                None
            }
        }
    }

    // ---- types ---------------------------------------------------------

    /// `parse_type` dispatches a bare identifier to [`Type::TypeVar`] rather
    /// than [`Type::TypeName`] when it's a single uppercase ASCII letter
    /// (`T`, `K`, `V`, ...) -- spec.md §4.6.2 requires generic unification
    /// over `TypeVar` nodes but the source grammar leaves the surface
    /// syntax for one unspecified, so this follows the single-letter
    /// convention generic signatures use elsewhere in the examples.
    fn parse_type(&mut self) -> Option<&'ctx Type<'ctx>> {
        let start = self.peek().span;
        let name = self.expect_ident()?;
        let name_str = self.interner.resolve(name).to_string();
        if name_str == "Pii" && matches!(self.peek_kind(), TokenKind::LBracket) {
            self.advance();
            let level = match self.peek_kind() {
                TokenKind::Int(n) => {
                    let n = *n as u8;
                    self.advance();
                    n
                }
                _ => {
                    self.error_unexpected("expected a PII sensitivity level");
                    0
                }
            };
            self.expect(TokenKind::Comma);
            let base = self.parse_type()?;
            let end = self.expect(TokenKind::RBracket);
            let span = start.merge(end);
            return Some(self.ctx.alloc_type(Type::PiiType { level, base, span }));
        }
        if matches!(self.peek_kind(), TokenKind::LBracket) {
            self.advance();
            let mut args = Vec::new();
            loop {
                args.push(*self.parse_type()?);
                if matches!(self.peek_kind(), TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
            let end = self.expect(TokenKind::RBracket);
            let span = start.merge(end);
            let args = self.ctx.alloc_types(args.into_iter());
            return Some(self.ctx.alloc_type(match name_str.as_str() {
                "Maybe" if args.len() == 1 => Type::Maybe(&args[0], span),
                "Option" if args.len() == 1 => Type::Option(&args[0], span),
                "Result" if args.len() == 2 => Type::Result {
                    ok: &args[0],
                    err: &args[1],
                    span,
                },
                "List" if args.len() == 1 => Type::ListT(&args[0], span),
                "Map" if args.len() == 2 => Type::MapT {
                    key: &args[0],
                    value: &args[1],
                    span,
                },
                _ => Type::TypeApp {
                    base: name,
                    args,
                    span,
                },
            }));
        }
        if is_type_var_name(&name_str) {
            return Some(self.ctx.alloc_type(Type::TypeVar(name, start)));
        }
        Some(self.ctx.alloc_type(Type::TypeName(name, start)))
    }

    // ---- statements ------------------------------------------------------

    fn parse_block(&mut self) -> Block<'ctx> {
        if !matches!(self.peek_kind(), TokenKind::Indent) {
            // empty block
            return self.ctx.alloc_stmts(std::iter::empty());
        }
        self.advance(); // Indent
        let mut stmts = Vec::new();
        loop {
            self.skip_newlines();
            if matches!(self.peek_kind(), TokenKind::Dedent | TokenKind::Eof) {
                break;
            }
            match self.parse_stmt() {
                Some(stmt) => stmts.push(stmt),
                None => self.recover_to_statement_boundary(),
            }
        }
        if matches!(self.peek_kind(), TokenKind::Dedent) {
            self.advance();
        }
        self.ctx.alloc_stmts(stmts.into_iter())
    }

    fn parse_stmt(&mut self) -> Option<Stmt<'ctx>> {
        if self.is_keyword(SemanticKind::Let) {
            return self.parse_let();
        }
        if self.is_keyword(SemanticKind::Set) {
            return self.parse_set();
        }
        if self.is_keyword(SemanticKind::Return) {
            return self.parse_return();
        }
        if self.is_keyword(SemanticKind::If) {
            return self.parse_if();
        }
        if self.is_keyword(SemanticKind::Match) {
            return self.parse_match();
        }
        if self.is_keyword(SemanticKind::Scope) {
            return self.parse_scope();
        }
        if self.is_keyword(SemanticKind::Start) {
            return self.parse_start();
        }
        if self.is_keyword(SemanticKind::Wait) {
            return self.parse_wait();
        }
        if self.is_keyword(SemanticKind::Workflow) {
            return self.parse_workflow();
        }
        if self.is_keyword(SemanticKind::Step) {
            return self.parse_step();
        }
        let start = self.peek().span;
        let expr = self.parse_expr()?;
        let end = self.expect(TokenKind::Dot);
        Some(Stmt::ExprStmt {
            expr,
            span: start.merge(end),
        })
    }

    fn parse_let(&mut self) -> Option<Stmt<'ctx>> {
        let start = self.expect_keyword(SemanticKind::Let);
        let mutable = self.eat_keyword(SemanticKind::Mutable) || self.eat_keyword(SemanticKind::Var);
        let name = self.expect_ident()?;
        let ty = if matches!(self.peek_kind(), TokenKind::Colon) {
            self.advance();
            self.parse_type()
        } else {
            None
        };
        self.expect_keyword(SemanticKind::Be);
        let value = self.parse_expr()?;
        let end = self.expect(TokenKind::Dot);
        Some(Stmt::Let {
            name,
            mutable,
            ty,
            value,
            span: start.merge(end),
        })
    }

    fn parse_set(&mut self) -> Option<Stmt<'ctx>> {
        let start = self.expect_keyword(SemanticKind::Set);
        let target = self.parse_expr()?;
        self.expect_keyword(SemanticKind::To);
        let value = self.parse_expr()?;
        let end = self.expect(TokenKind::Dot);
        Some(Stmt::Set {
            target,
            value,
            span: start.merge(end),
        })
    }

    fn parse_return(&mut self) -> Option<Stmt<'ctx>> {
        let start = self.expect_keyword(SemanticKind::Return);
        let value = if matches!(self.peek_kind(), TokenKind::Dot) {
            None
        } else {
            self.parse_expr()
        };
        let end = self.expect(TokenKind::Dot);
        Some(Stmt::Return {
            value,
            span: start.merge(end),
        })
    }

    fn parse_if(&mut self) -> Option<Stmt<'ctx>> {
        let start = self.expect_keyword(SemanticKind::If);
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Colon);
        self.skip_newlines();
        let then_block = self.parse_block();
        let mut end = crate::ast::block_span(then_block);
        let mut else_block = None;
        self.skip_newlines();
        if self.eat_keyword(SemanticKind::Otherwise) {
            if self.is_keyword(SemanticKind::If) {
                let nested = self.parse_if()?;
                end = nested.span();
                else_block = Some(self.ctx.alloc_stmts(std::iter::once(nested)));
            } else {
                self.expect(TokenKind::Colon);
                self.skip_newlines();
                let block = self.parse_block();
                end = crate::ast::block_span(block);
                else_block = Some(block);
            }
        }
        Some(Stmt::If {
            cond,
            then_block,
            else_block,
            span: start.merge(end),
        })
    }

    fn parse_match(&mut self) -> Option<Stmt<'ctx>> {
        let start = self.expect_keyword(SemanticKind::Match);
        let scrutinee = self.parse_expr()?;
        self.expect(TokenKind::Colon);
        self.skip_newlines();
        self.expect(TokenKind::Indent);
        let mut arms = Vec::new();
        loop {
            self.skip_newlines();
            if matches!(self.peek_kind(), TokenKind::Dedent | TokenKind::Eof) {
                break;
            }
            if !self.is_keyword(SemanticKind::Case) {
                self.error_unexpected("expected Case arm");
                self.recover_to_statement_boundary();
                continue;
            }
            let arm_start = self.expect_keyword(SemanticKind::Case);
            let pattern = self.parse_pattern()?;
            let guard = if self.eat_keyword(SemanticKind::When) {
                self.parse_expr()
            } else {
                None
            };
            self.expect(TokenKind::Colon);
            self.skip_newlines();
            let body = self.parse_block();
            let arm_end = crate::ast::block_span(body);
            arms.push(MatchArm {
                pattern,
                guard,
                body,
                span: arm_start.merge(arm_end),
            });
        }
        if matches!(self.peek_kind(), TokenKind::Dedent) {
            self.advance();
        }
        let end = arms.last().map(|a| a.span).unwrap_or(start);
        Some(Stmt::Match {
            scrutinee,
            arms: self.ctx.alloc_arms(arms.into_iter()),
            span: start.merge(end),
        })
    }

    fn parse_pattern(&mut self) -> Option<&'ctx Pattern<'ctx>> {
        let span = self.peek().span;
        let pat = match self.peek_kind().clone() {
            TokenKind::Int(n) => {
                self.advance();
                Pattern::PatInt(n, span)
            }
            TokenKind::Bool(b) => {
                self.advance();
                Pattern::PatBool(b, span)
            }
            TokenKind::Str(s) => {
                self.advance();
                Pattern::PatString(s, span)
            }
            TokenKind::Null => {
                self.advance();
                Pattern::PatNull(span)
            }
            TokenKind::Ident(sym) => {
                self.advance();
                if self.interner.resolve(sym) == "_" {
                    Pattern::PatWildcard(span)
                } else {
                    Pattern::PatName(sym, span)
                }
            }
            TokenKind::TypeIdent(sym) => {
                self.advance();
                if matches!(self.peek_kind(), TokenKind::LParen) {
                    self.advance();
                    let mut args = Vec::new();
                    if !matches!(self.peek_kind(), TokenKind::RParen) {
                        loop {
                            args.push(self.parse_pattern()?.clone());
                            if matches!(self.peek_kind(), TokenKind::Comma) {
                                self.advance();
                                continue;
                            }
                            break;
                        }
                    }
                    let end = self.expect(TokenKind::RParen);
                    Pattern::PatConstructor {
                        name: sym,
                        args: self.ctx.alloc_patterns(args.into_iter()),
                        span: span.merge(end),
                    }
                } else {
                    Pattern::PatName(sym, span)
                }
            }
            _ => {
                self.error_unexpected("expected a pattern");
                return None;
            }
        };
        Some(self.ctx.alloc_pattern(pat))
    }

    fn parse_scope(&mut self) -> Option<Stmt<'ctx>> {
        let start = self.expect_keyword(SemanticKind::Scope);
        self.expect(TokenKind::Colon);
        self.skip_newlines();
        let body = self.parse_block();
        let end = crate::ast::block_span(body);
        Some(Stmt::Scope {
            body,
            span: start.merge(end),
        })
    }

    fn parse_start(&mut self) -> Option<Stmt<'ctx>> {
        let start = self.expect_keyword(SemanticKind::Start);
        let name = self.expect_ident()?;
        self.eat_keyword(SemanticKind::As);
        let expr = self.parse_expr()?;
        let end = self.expect(TokenKind::Dot);
        Some(Stmt::Start {
            name,
            expr,
            span: start.merge(end),
        })
    }

    fn parse_wait(&mut self) -> Option<Stmt<'ctx>> {
        let start = self.expect_keyword(SemanticKind::Wait);
        self.eat_keyword(SemanticKind::For);
        let name = self.expect_ident()?;
        let end = self.expect(TokenKind::Dot);
        Some(Stmt::Wait {
            name,
            span: start.merge(end),
        })
    }

    fn parse_workflow(&mut self) -> Option<Stmt<'ctx>> {
        let start = self.expect_keyword(SemanticKind::Workflow);
        let name = self.expect_ident()?;
        self.expect(TokenKind::Colon);
        self.skip_newlines();
        let steps = self.parse_block();
        let end = crate::ast::block_span(steps);
        Some(Stmt::Workflow {
            name,
            steps,
            span: start.merge(end),
        })
    }

    fn parse_step(&mut self) -> Option<Stmt<'ctx>> {
        let start = self.expect_keyword(SemanticKind::Step);
        let name = self.expect_ident()?;
        self.expect(TokenKind::Colon);
        self.skip_newlines();
        let body = self.parse_block();
        let mut end = crate::ast::block_span(body);
        self.skip_newlines();
        let compensate = if self.eat_keyword(SemanticKind::Compensate) {
            self.expect(TokenKind::Colon);
            self.skip_newlines();
            let block = self.parse_block();
            end = crate::ast::block_span(block);
            Some(block)
        } else {
            None
        };
        Some(Stmt::Step {
            name,
            body,
            compensate,
            span: start.merge(end),
        })
    }

    // ---- expressions -----------------------------------------------------

    fn parse_expr(&mut self) -> Option<&'ctx Expr<'ctx>> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Option<&'ctx Expr<'ctx>> {
        let mut left = self.parse_and()?;
        while self.eat_keyword(SemanticKind::Or) {
            let right = self.parse_and()?;
            let span = left.span().merge(right.span());
            left = self.ctx.binary(BinaryOpKind::Or, clone_expr_owned(left), clone_expr_owned(right), span);
        }
        Some(left)
    }

    fn parse_and(&mut self) -> Option<&'ctx Expr<'ctx>> {
        let mut left = self.parse_cmp()?;
        while self.eat_keyword(SemanticKind::And) {
            let right = self.parse_cmp()?;
            let span = left.span().merge(right.span());
            left = self.ctx.binary(BinaryOpKind::And, clone_expr_owned(left), clone_expr_owned(right), span);
        }
        Some(left)
    }

    fn parse_cmp(&mut self) -> Option<&'ctx Expr<'ctx>> {
        let mut left = self.parse_add()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Keyword(SemanticKind::LessThan) | TokenKind::Keyword(SemanticKind::Under) => {
                    Some(BinaryOpKind::Lt)
                }
                TokenKind::Keyword(SemanticKind::GreaterThan) | TokenKind::Keyword(SemanticKind::Over) => {
                    Some(BinaryOpKind::Gt)
                }
                TokenKind::Keyword(SemanticKind::EqualsTo) => Some(BinaryOpKind::Eq),
                TokenKind::Keyword(SemanticKind::LessEqual) => Some(BinaryOpKind::Le),
                TokenKind::Keyword(SemanticKind::GreaterEqual) => Some(BinaryOpKind::Ge),
                TokenKind::Keyword(SemanticKind::NotEqual) => Some(BinaryOpKind::Ne),
                TokenKind::Operator(OperatorKind::Lt) => Some(BinaryOpKind::Lt),
                TokenKind::Operator(OperatorKind::Gt) => Some(BinaryOpKind::Gt),
                TokenKind::Operator(OperatorKind::Le) => Some(BinaryOpKind::Le),
                TokenKind::Operator(OperatorKind::Ge) => Some(BinaryOpKind::Ge),
                TokenKind::Operator(OperatorKind::Ne) => Some(BinaryOpKind::Ne),
                _ => None,
            };
            let Some(op) = op else { break };
            self.advance();
            let right = self.parse_add()?;
            let span = left.span().merge(right.span());
            left = self.ctx.binary(op, clone_expr_owned(left), clone_expr_owned(right), span);
        }
        Some(left)
    }

    fn parse_add(&mut self) -> Option<&'ctx Expr<'ctx>> {
        let mut left = self.parse_mul()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Keyword(SemanticKind::Plus) | TokenKind::Operator(OperatorKind::Plus) => {
                    Some(BinaryOpKind::Add)
                }
                TokenKind::Keyword(SemanticKind::Minus) | TokenKind::Operator(OperatorKind::Minus) => {
                    Some(BinaryOpKind::Sub)
                }
                _ => None,
            };
            let Some(op) = op else { break };
            self.advance();
            let right = self.parse_mul()?;
            let span = left.span().merge(right.span());
            left = self.ctx.binary(op, clone_expr_owned(left), clone_expr_owned(right), span);
        }
        Some(left)
    }

    fn parse_mul(&mut self) -> Option<&'ctx Expr<'ctx>> {
        let mut left = self.parse_postfix()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Keyword(SemanticKind::Times) | TokenKind::Operator(OperatorKind::Star) => {
                    Some(BinaryOpKind::Mul)
                }
                TokenKind::Keyword(SemanticKind::DividedBy) | TokenKind::Operator(OperatorKind::Slash) => {
                    Some(BinaryOpKind::Div)
                }
                _ => None,
            };
            let Some(op) = op else { break };
            self.advance();
            let right = self.parse_postfix()?;
            let span = left.span().merge(right.span());
            left = self.ctx.binary(op, clone_expr_owned(left), clone_expr_owned(right), span);
        }
        Some(left)
    }

    fn parse_postfix(&mut self) -> Option<&'ctx Expr<'ctx>> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let field_span = self.peek().span;
                    let field = self.expect_ident()?;
                    // `base.field(...)` always parses to a plain field-access
                    // callee wrapped in `Expr::Call`; `aster-ir` lowering is
                    // what rewrites `r.m(a, b)` into `m(r, a, b)`, once it can
                    // tell a variable receiver from a module qualifier
                    // (`spec.md` §4.4/§4.5).
                    if matches!(self.peek_kind(), TokenKind::LParen) {
                        let args = self.parse_call_args()?;
                        let span = expr.span().merge(self.tokens[self.pos - 1].span);
                        let callee = self.ctx.alloc_expr(Expr::FieldAccess {
                            base: clone_expr(expr),
                            field,
                            span: expr.span().merge(field_span),
                        });
                        expr = self.ctx.alloc_expr(Expr::Call { callee, args, span });
                    } else {
                        let span = expr.span().merge(field_span);
                        expr = self.ctx.alloc_expr(Expr::FieldAccess {
                            base: clone_expr(expr),
                            field,
                            span,
                        });
                    }
                }
                TokenKind::LParen => {
                    let args = self.parse_call_args()?;
                    let span = expr.span().merge(self.tokens[self.pos - 1].span);
                    expr = self.ctx.alloc_expr(Expr::Call {
                        callee: clone_expr(expr),
                        args,
                        span,
                    });
                }
                TokenKind::Keyword(SemanticKind::With) => {
                    self.advance();
                    // Ambiguous with record construction (`T with field = expr`)
                    // vs positional call args (`f with a, b`); disambiguated by
                    // looking ahead for `=` after the first identifier.
                    if self.looks_like_record_fields() {
                        let fields = self.parse_record_fields()?;
                        let span = expr.span().merge(self.tokens[self.pos - 1].span);
                        let ty = match expr {
                            Expr::Name(sym, _) => *sym,
                            _ => {
                                self.error_unexpected("record construction needs a type name");
                                return None;
                            }
                        };
                        expr = self.ctx.alloc_expr(Expr::Construct {
                            ty,
                            fields,
                            span,
                        });
                    } else {
                        let mut args = Vec::new();
                        loop {
                            args.push(clone_expr_owned(self.parse_or()?));
                            if matches!(self.peek_kind(), TokenKind::Comma) {
                                self.advance();
                                continue;
                            }
                            break;
                        }
                        let span = expr.span().merge(self.tokens[self.pos - 1].span);
                        let args = self.ctx.alloc_exprs(args.into_iter());
                        expr = self.ctx.alloc_expr(Expr::Call {
                            callee: clone_expr(expr),
                            args,
                            span,
                        });
                    }
                }
                _ => break,
            }
        }
        Some(expr)
    }

    fn looks_like_record_fields(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Ident(_))
            && matches!(
                self.tokens.get(self.pos + 1).map(|t| &t.kind),
                Some(TokenKind::Operator(OperatorKind::Assign))
            )
    }

    fn parse_record_fields(&mut self) -> Option<&'ctx [(Symbol, Expr<'ctx>)]> {
        let mut fields = Vec::new();
        loop {
            let name = self.expect_ident()?;
            self.expect(TokenKind::Operator(OperatorKind::Assign));
            let value = self.parse_or()?;
            fields.push((name, clone_expr_owned(value)));
            if matches!(self.peek_kind(), TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        Some(fields.leak())
    }

    fn parse_call_args(&mut self) -> Option<&'ctx [Expr<'ctx>]> {
        self.expect(TokenKind::LParen);
        let mut args = Vec::new();
        if !matches!(self.peek_kind(), TokenKind::RParen) {
            loop {
                args.push(clone_expr_owned(self.parse_or()?));
                if matches!(self.peek_kind(), TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RParen);
        Some(self.ctx.alloc_exprs(args.into_iter()))
    }

    fn parse_primary(&mut self) -> Option<&'ctx Expr<'ctx>> {
        let span = self.peek().span;
        match self.peek_kind().clone() {
            TokenKind::Int(n) => {
                self.advance();
                Some(self.ctx.alloc_expr(Expr::Int(n, span)))
            }
            TokenKind::Long(n) => {
                self.advance();
                Some(self.ctx.alloc_expr(Expr::Long(n, span)))
            }
            TokenKind::Float(f) => {
                self.advance();
                Some(self.ctx.alloc_expr(Expr::Double(f, span)))
            }
            TokenKind::Str(s) => {
                self.advance();
                Some(self.ctx.alloc_expr(Expr::Str(s, span)))
            }
            TokenKind::Bool(b) => {
                self.advance();
                Some(self.ctx.alloc_expr(Expr::Bool(b, span)))
            }
            TokenKind::Null => {
                self.advance();
                Some(self.ctx.alloc_expr(Expr::Null(span)))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen);
                Some(inner)
            }
            TokenKind::LBracket => {
                self.advance();
                let mut items = Vec::new();
                if !matches!(self.peek_kind(), TokenKind::RBracket) {
                    loop {
                        items.push(clone_expr_owned(self.parse_or()?));
                        if matches!(self.peek_kind(), TokenKind::Comma) {
                            self.advance();
                            continue;
                        }
                        break;
                    }
                }
                let end = self.expect(TokenKind::RBracket);
                let items = self.ctx.alloc_exprs(items.into_iter());
                Some(self.ctx.alloc_expr(Expr::ListLiteral(items, span.merge(end))))
            }
            TokenKind::Keyword(SemanticKind::Ok)
            | TokenKind::Keyword(SemanticKind::Err)
            | TokenKind::Keyword(SemanticKind::Some) => {
                let kind = self.peek_kind().clone();
                self.advance();
                self.expect(TokenKind::LParen);
                let inner = self.parse_expr()?;
                let end = self.expect(TokenKind::RParen);
                let full = span.merge(end);
                let inner = clone_expr(inner);
                Some(self.ctx.alloc_expr(match kind {
                    TokenKind::Keyword(SemanticKind::Ok) => Expr::Ok(inner, full),
                    TokenKind::Keyword(SemanticKind::Err) => Expr::Err(inner, full),
                    _ => Expr::Some(inner, full),
                }))
            }
            TokenKind::Keyword(SemanticKind::None) => {
                self.advance();
                let mut end = span;
                if matches!(self.peek_kind(), TokenKind::LParen) {
                    self.advance();
                    end = self.expect(TokenKind::RParen);
                }
                Some(self.ctx.alloc_expr(Expr::None(span.merge(end))))
            }
            TokenKind::Keyword(SemanticKind::Await) => {
                self.advance();
                let inner = self.parse_postfix()?;
                let full = span.merge(inner.span());
                Some(self.ctx.alloc_expr(Expr::Await(clone_expr(inner), full)))
            }
            TokenKind::Keyword(SemanticKind::Function) => self.parse_lambda(),
            // Prefix-applied operator calls: `<(x,y)`, `+(a,b,...)`.
            TokenKind::Operator(_) | TokenKind::Keyword(SemanticKind::LessThan) | TokenKind::Keyword(SemanticKind::GreaterThan)
                if matches!(self.tokens.get(self.pos + 1).map(|t| &t.kind), Some(TokenKind::LParen)) =>
            {
                let name = operator_symbol(self.peek_kind());
                self.advance();
                let args = self.parse_call_args()?;
                let end = self.tokens[self.pos - 1].span;
                let sym = self.intern_ident(name);
                let callee = self.ctx.alloc_expr(Expr::Name(sym, span));
                Some(self.ctx.alloc_expr(Expr::Call {
                    callee,
                    args,
                    span: span.merge(end),
                }))
            }
            TokenKind::Ident(sym) | TokenKind::TypeIdent(sym) => {
                self.advance();
                Some(self.ctx.alloc_expr(Expr::Name(sym, span)))
            }
            _ => {
                self.error_unexpected("expected an expression");
                None
            }
        }
    }

    fn parse_lambda(&mut self) -> Option<&'ctx Expr<'ctx>> {
        let start = self.expect_keyword(SemanticKind::Function);
        let mut params = Vec::new();
        if self.eat_keyword(SemanticKind::With) {
            loop {
                let pname = self.expect_ident()?;
                let pty = if matches!(self.peek_kind(), TokenKind::Colon) {
                    self.advance();
                    self.parse_type()
                } else {
                    None
                };
                let span = pty.map(|t| t.span()).unwrap_or(start);
                params.push(Param {
                    name: pname,
                    ty: pty,
                    span,
                });
                if matches!(self.peek_kind(), TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        let return_type = if self.eat_keyword(SemanticKind::Produce) {
            self.parse_type()
        } else {
            None
        };
        self.expect(TokenKind::Colon);
        self.skip_newlines();
        let body = self.parse_block();
        let end = crate::ast::block_span(body);
        Some(self.ctx.alloc_expr(Expr::Lambda {
            params: self.ctx.alloc_params(params.into_iter()),
            return_type,
            body,
            span: start.merge(end),
        }))
    }
}

/// A single uppercase ASCII letter (`T`, `K`, `V`, ...) names a type
/// variable rather than a concrete type.
fn is_type_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.is_ascii_uppercase(),
        _ => false,
    }
}

fn operator_symbol(kind: &TokenKind) -> &'static str {
    match kind {
        TokenKind::Operator(OperatorKind::Plus) => "+",
        TokenKind::Operator(OperatorKind::Minus) => "-",
        TokenKind::Operator(OperatorKind::Star) => "*",
        TokenKind::Operator(OperatorKind::Slash) => "/",
        TokenKind::Operator(OperatorKind::Lt) => "<",
        TokenKind::Operator(OperatorKind::Gt) => ">",
        TokenKind::Operator(OperatorKind::Le) => "<=",
        TokenKind::Operator(OperatorKind::Ge) => ">=",
        TokenKind::Operator(OperatorKind::Ne) => "!=",
        TokenKind::Keyword(SemanticKind::LessThan) => "<",
        TokenKind::Keyword(SemanticKind::GreaterThan) => ">",
        _ => "?",
    }
}

/// Shallow "reborrow" helper: every AST node produced by the parser is
/// already arena-allocated (`&'ctx Expr<'ctx>`), so combinators just copy
/// the reference rather than deep-cloning.
fn clone_expr<'ctx>(expr: &'ctx Expr<'ctx>) -> &'ctx Expr<'ctx> {
    expr
}

fn clone_expr_owned<'ctx>(expr: &'ctx Expr<'ctx>) -> Expr<'ctx> {
    // Expr does not implement Clone (it holds arena references, not owned
    // data), so slice-building re-wraps the reference as a transparent
    // single-field variant instead of duplicating the node. This keeps
    // `alloc_exprs` working off owned `Expr` values per the `AstContext` API.
    match expr {
        Expr::Name(s, sp) => Expr::Name(*s, *sp),
        Expr::Int(n, sp) => Expr::Int(*n, *sp),
        Expr::Long(n, sp) => Expr::Long(*n, *sp),
        Expr::Double(f, sp) => Expr::Double(*f, *sp),
        Expr::Bool(b, sp) => Expr::Bool(*b, *sp),
        Expr::Str(s, sp) => Expr::Str(s.clone(), *sp),
        Expr::Null(sp) => Expr::Null(*sp),
        Expr::None(sp) => Expr::None(*sp),
        Expr::BinaryOp { op, left, right, span } => Expr::BinaryOp {
            op: *op,
            left,
            right,
            span: *span,
        },
        Expr::FieldAccess { base, field, span } => Expr::FieldAccess {
            base,
            field: *field,
            span: *span,
        },
        Expr::Call { callee, args, span } => Expr::Call {
            callee,
            args,
            span: *span,
        },
        Expr::Lambda {
            params,
            return_type,
            body,
            span,
        } => Expr::Lambda {
            params,
            return_type: *return_type,
            body,
            span: *span,
        },
        Expr::Construct { ty, fields, span } => Expr::Construct {
            ty: *ty,
            fields,
            span: *span,
        },
        Expr::Ok(e, sp) => Expr::Ok(e, *sp),
        Expr::Err(e, sp) => Expr::Err(e, *sp),
        Expr::Some(e, sp) => Expr::Some(e, *sp),
        Expr::Await(e, sp) => Expr::Await(e, *sp),
        Expr::ListLiteral(items, sp) => Expr::ListLiteral(items, *sp),
    }
}
