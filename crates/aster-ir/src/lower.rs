//! Structural lowering from `aster-parser`'s AST into the IR (`spec.md` §4.5).

use crate::ir::{
    IrBlock, IrContext, IrDataDecl, IrDecl, IrExpr, IrFuncDecl, IrMatchArm, IrModule, IrStmt,
    NodeId,
};
use aster_base::{Interner, Span, Symbol};
use aster_parser::{self as ast, BinaryOpKind, Param, Type};

pub struct Lowerer<'p, 'a> {
    ctx: &'a IrContext<'a>,
    interner: &'p mut Interner,
    next_id: u32,
}

pub fn lower_module<'a>(
    module: &ast::Module<'a>,
    ctx: &'a IrContext<'a>,
    interner: &mut Interner,
) -> IrModule<'a> {
    let mut lowerer = Lowerer {
        ctx,
        interner,
        next_id: 0,
    };
    let decls = lowerer.lower_decls(module.decls);
    IrModule {
        name: module.name,
        decls,
        span: module.span,
    }
}

impl<'p, 'a> Lowerer<'p, 'a> {
    fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn is_method_receiver_name(&self, sym: Symbol) -> bool {
        self.interner
            .resolve(sym)
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase())
    }

    fn lower_decls(&mut self, decls: &[ast::Decl<'a>]) -> &'a [IrDecl<'a>] {
        let lowered: Vec<IrDecl<'a>> = decls.iter().map(|d| self.lower_decl(d)).collect();
        self.ctx.alloc_decls(lowered.into_iter())
    }

    fn lower_decl(&mut self, decl: &ast::Decl<'a>) -> IrDecl<'a> {
        match decl {
            ast::Decl::Func(f) => IrDecl::Func(self.lower_func(f)),
            ast::Decl::Data(d) => IrDecl::Data(self.lower_data(d)),
            ast::Decl::Enum(e) => IrDecl::Enum(ast::EnumDecl {
                name: e.name,
                variants: self.leak_copy(e.variants),
                span: e.span,
            }),
            ast::Decl::Import(i) => IrDecl::Import(ast::ImportDecl {
                path: i.path,
                alias: i.alias,
                span: i.span,
            }),
            ast::Decl::TypeAlias(t) => IrDecl::TypeAlias(ast::TypeAliasDecl {
                name: t.name,
                params: self.leak_copy(t.params),
                target: t.target,
                span: t.span,
            }),
        }
    }

    fn leak_copy<T: Copy>(&self, items: &[T]) -> &'a [T] {
        items.to_vec().leak()
    }

    fn lower_func(&mut self, f: &ast::FuncDecl<'a>) -> IrFuncDecl<'a> {
        let id = self.fresh_id();
        let params = self.lower_params(f.params);
        let return_type = f.return_type.or_else(|| self.infer_return_type(f.name));
        let body = self.lower_block(f.body);
        IrFuncDecl {
            id,
            name: f.name,
            params,
            return_type,
            effects: self.leak_copy(f.effects),
            capabilities: self.leak_copy(f.capabilities),
            body,
            span: f.span,
        }
    }

    fn lower_data(&mut self, d: &ast::DataDecl<'a>) -> IrDataDecl<'a> {
        IrDataDecl {
            name: d.name,
            fields: self.lower_params(d.fields),
            span: d.span,
        }
    }

    /// Applies the identifier-typed inference heuristics from `spec.md`
    /// §4.4 (suffix `Id`→Text, `Age`→Int, `At`→DateTime, `Amount`→Float;
    /// prefix `is`→Bool) to any parameter left without an explicit type.
    fn lower_params(&mut self, params: &[Param<'a>]) -> &'a [Param<'a>] {
        let lowered: Vec<Param<'a>> = params
            .iter()
            .map(|p| {
                let ty = p.ty.or_else(|| {
                    let name = self.interner.resolve(p.name).to_string();
                    infer_identifier_type(&name).map(|prim| {
                        let sym = self.interner.intern(prim);
                        self.ctx.alloc_type(Type::TypeName(sym, p.span))
                    })
                });
                Param {
                    name: p.name,
                    ty,
                    span: p.span,
                }
            })
            .collect();
        self.ctx.alloc_params(lowered.into_iter())
    }

    fn infer_return_type(&mut self, fn_name: Symbol) -> Option<&'a Type<'a>> {
        let name = self.interner.resolve(fn_name).to_string();
        let prim = if name.starts_with("calculate") {
            Some("Int")
        } else if name.starts_with("check") || name.starts_with("validate") {
            Some("Bool")
        } else {
            // `generate...` keeps whatever datum type the declaration names;
            // no override.
            None
        }?;
        let sym = self.interner.intern(prim);
        Some(self.ctx.alloc_type(Type::TypeName(sym, Span::default())))
    }

    fn lower_block(&mut self, block: ast::Block<'a>) -> IrBlock<'a> {
        let lowered: Vec<IrStmt<'a>> = block.iter().map(|s| self.lower_stmt(s)).collect();
        self.ctx.alloc_stmts(lowered.into_iter())
    }

    fn lower_stmt(&mut self, stmt: &ast::Stmt<'a>) -> IrStmt<'a> {
        match stmt {
            ast::Stmt::Let {
                name,
                mutable,
                ty,
                value,
                span,
            } => {
                let id = self.fresh_id();
                let ty = ty.or_else(|| {
                    let n = self.interner.resolve(*name).to_string();
                    infer_identifier_type(&n).map(|prim| {
                        let sym = self.interner.intern(prim);
                        self.ctx.alloc_type(Type::TypeName(sym, *span))
                    })
                });
                IrStmt::Let {
                    id,
                    name: *name,
                    mutable: *mutable,
                    ty,
                    value: self.lower_expr(value),
                    span: *span,
                }
            }
            ast::Stmt::Set { target, value, span } => IrStmt::Set {
                target: self.lower_expr(target),
                value: self.lower_expr(value),
                span: *span,
            },
            ast::Stmt::Return { value, span } => IrStmt::Return {
                value: value.as_ref().map(|v| self.lower_expr(v)),
                span: *span,
            },
            ast::Stmt::If {
                cond,
                then_block,
                else_block,
                span,
            } => IrStmt::If {
                cond: self.lower_expr(cond),
                then_block: self.lower_block(then_block),
                else_block: else_block.map(|b| self.lower_block(b)),
                span: *span,
            },
            ast::Stmt::Match {
                scrutinee,
                arms,
                span,
            } => {
                let scrutinee = self.lower_expr(scrutinee);
                let arms: Vec<IrMatchArm<'a>> = arms
                    .iter()
                    .map(|a| IrMatchArm {
                        pattern: a.pattern,
                        guard: a.guard.map(|g| self.lower_expr(g)),
                        body: self.lower_block(a.body),
                        span: a.span,
                    })
                    .collect();
                IrStmt::Match {
                    scrutinee,
                    arms: self.ctx.alloc_arms(arms.into_iter()),
                    span: *span,
                }
            }
            ast::Stmt::Case { body, span, .. } => {
                // Bare `Case` arms never survive parsing outside a `Match`
                // body; treat a stray one as an anonymous scope.
                IrStmt::Scope {
                    body: self.lower_block(body),
                    span: *span,
                }
            }
            ast::Stmt::Block(body) => IrStmt::Scope {
                body: self.lower_block(body),
                span: ast::block_span(body),
            },
            ast::Stmt::Scope { body, span } => IrStmt::Scope {
                body: self.lower_block(body),
                span: *span,
            },
            ast::Stmt::Start { name, expr, span } => IrStmt::Start {
                name: *name,
                expr: self.lower_expr(expr),
                span: *span,
            },
            ast::Stmt::Wait { name, span } => IrStmt::Wait {
                name: *name,
                span: *span,
            },
            ast::Stmt::ExprStmt { expr, span } => IrStmt::ExprStmt {
                expr: self.lower_expr(expr),
                span: *span,
            },
            ast::Stmt::Workflow { name, steps, span } => IrStmt::Workflow {
                name: *name,
                steps: self.lower_block(steps),
                span: *span,
            },
            ast::Stmt::Step {
                name,
                body,
                compensate,
                span,
            } => IrStmt::Step {
                name: *name,
                body: self.lower_block(body),
                compensate: compensate.map(|b| self.lower_block(b)),
                span: *span,
            },
        }
    }

    fn lower_expr(&mut self, expr: &ast::Expr<'a>) -> &'a IrExpr<'a> {
        let node = match expr {
            ast::Expr::Name(sym, span) => IrExpr::Name(*sym, self.fresh_id(), *span),
            ast::Expr::Int(n, span) => IrExpr::Int(*n, self.fresh_id(), *span),
            ast::Expr::Long(n, span) => IrExpr::Long(*n, self.fresh_id(), *span),
            ast::Expr::Double(f, span) => IrExpr::Double(*f, self.fresh_id(), *span),
            ast::Expr::Bool(b, span) => IrExpr::Bool(*b, self.fresh_id(), *span),
            ast::Expr::Str(s, span) => IrExpr::Str(s.clone(), self.fresh_id(), *span),
            ast::Expr::Null(span) => IrExpr::Null(self.fresh_id(), *span),
            ast::Expr::BinaryOp {
                op,
                left,
                right,
                span,
            } => {
                let l = self.lower_expr(left);
                let r = self.lower_expr(right);
                let callee_sym = self.interner.intern(operator_name(*op));
                let callee = self.ctx.alloc_expr(IrExpr::Name(callee_sym, self.fresh_id(), *span));
                let args = self
                    .ctx
                    .alloc_exprs(vec![ir_expr_owned(l), ir_expr_owned(r)].into_iter());
                IrExpr::Call {
                    callee,
                    args,
                    id: self.fresh_id(),
                    span: *span,
                }
            }
            ast::Expr::FieldAccess { base, field, span } => IrExpr::FieldAccess {
                base: self.lower_expr(base),
                field: *field,
                id: self.fresh_id(),
                span: *span,
            },
            ast::Expr::Call { callee, args, span } => {
                // `r.m(a, b)` parses to `Call { callee: FieldAccess { base: r,
                // field: m }, args: [a, b] }`, indistinguishable at parse time
                // from a qualified call like `Http.get(url)`. Here, where the
                // receiver is resolved, a lowercase-initial name base (the
                // CNL convention for local variables; capability/effect
                // namespaces are always capitalized, `Capability::from_name`/
                // `EffectConfig`'s prefixes) is a method-sugar receiver rather
                // than a module qualifier, and gets rewritten to `m(r, a, b)`
                // (`spec.md` §4.4/§4.5).
                let method_receiver = match callee {
                    ast::Expr::FieldAccess { base, field, .. } => match base {
                        ast::Expr::Name(sym, ..) if self.is_method_receiver_name(*sym) => {
                            Some((base, *field))
                        }
                        _ => None,
                    },
                    _ => None,
                };
                let (callee, args): (&'a IrExpr<'a>, Vec<IrExpr<'a>>) = match method_receiver {
                    Some((base, field)) => {
                        let receiver = ir_expr_owned(self.lower_expr(base));
                        let method_callee =
                            self.ctx.alloc_expr(IrExpr::Name(field, self.fresh_id(), base.span()));
                        let mut all_args = Vec::with_capacity(args.len() + 1);
                        all_args.push(receiver);
                        all_args.extend(args.iter().map(|a| ir_expr_owned(self.lower_expr(a))));
                        (method_callee, all_args)
                    }
                    None => {
                        let callee = self.lower_expr(callee);
                        let args = args.iter().map(|a| ir_expr_owned(self.lower_expr(a))).collect();
                        (callee, args)
                    }
                };
                IrExpr::Call {
                    callee,
                    args: self.ctx.alloc_exprs(args.into_iter()),
                    id: self.fresh_id(),
                    span: *span,
                }
            }
            ast::Expr::Lambda {
                params,
                return_type,
                body,
                span,
            } => IrExpr::Lambda {
                params: self.lower_params(params),
                return_type: *return_type,
                body: self.lower_block(body),
                id: self.fresh_id(),
                span: *span,
            },
            ast::Expr::Construct { ty, fields, span } => {
                let fields: Vec<(Symbol, IrExpr<'a>)> = fields
                    .iter()
                    .map(|(name, e)| (*name, ir_expr_owned(self.lower_expr(e))))
                    .collect();
                IrExpr::Construct {
                    ty: *ty,
                    fields: fields.leak(),
                    id: self.fresh_id(),
                    span: *span,
                }
            }
            ast::Expr::Ok(inner, span) => IrExpr::Ok(self.lower_expr(inner), self.fresh_id(), *span),
            ast::Expr::Err(inner, span) => IrExpr::Err(self.lower_expr(inner), self.fresh_id(), *span),
            ast::Expr::Some(inner, span) => {
                IrExpr::Some(self.lower_expr(inner), self.fresh_id(), *span)
            }
            ast::Expr::None(span) => IrExpr::None(self.fresh_id(), *span),
            ast::Expr::Await(inner, span) => {
                IrExpr::Await(self.lower_expr(inner), self.fresh_id(), *span)
            }
            ast::Expr::ListLiteral(items, span) => {
                let items: Vec<IrExpr<'a>> = items
                    .iter()
                    .map(|e| ir_expr_owned(self.lower_expr(e)))
                    .collect();
                IrExpr::ListLiteral(self.ctx.alloc_exprs(items.into_iter()), self.fresh_id(), *span)
            }
        };
        self.ctx.alloc_expr(node)
    }
}

fn operator_name(op: BinaryOpKind) -> &'static str {
    match op {
        BinaryOpKind::Add => "+",
        BinaryOpKind::Sub => "-",
        BinaryOpKind::Mul => "*",
        BinaryOpKind::Div => "/",
        BinaryOpKind::Lt => "<",
        BinaryOpKind::Gt => ">",
        BinaryOpKind::Le => "<=",
        BinaryOpKind::Ge => ">=",
        BinaryOpKind::Eq => "equals_to",
        BinaryOpKind::Ne => "!=",
        BinaryOpKind::And => "and",
        BinaryOpKind::Or => "or",
    }
}

fn infer_identifier_type(name: &str) -> Option<&'static str> {
    if name.starts_with("is") && name.len() > 2 {
        return Some("Bool");
    }
    if name.ends_with("Id") {
        Some("Text")
    } else if name.ends_with("Age") {
        Some("Int")
    } else if name.ends_with("At") {
        Some("DateTime")
    } else if name.ends_with("Amount") {
        Some("Float")
    } else {
        None
    }
}

fn ir_expr_owned<'a>(expr: &'a IrExpr<'a>) -> IrExpr<'a> {
    match expr {
        IrExpr::Name(s, id, sp) => IrExpr::Name(*s, *id, *sp),
        IrExpr::Int(n, id, sp) => IrExpr::Int(*n, *id, *sp),
        IrExpr::Long(n, id, sp) => IrExpr::Long(*n, *id, *sp),
        IrExpr::Double(f, id, sp) => IrExpr::Double(*f, *id, *sp),
        IrExpr::Bool(b, id, sp) => IrExpr::Bool(*b, *id, *sp),
        IrExpr::Str(s, id, sp) => IrExpr::Str(s.clone(), *id, *sp),
        IrExpr::Null(id, sp) => IrExpr::Null(*id, *sp),
        IrExpr::None(id, sp) => IrExpr::None(*id, *sp),
        IrExpr::Call {
            callee,
            args,
            id,
            span,
        } => IrExpr::Call {
            callee,
            args,
            id: *id,
            span: *span,
        },
        IrExpr::FieldAccess {
            base,
            field,
            id,
            span,
        } => IrExpr::FieldAccess {
            base,
            field: *field,
            id: *id,
            span: *span,
        },
        IrExpr::Lambda {
            params,
            return_type,
            body,
            id,
            span,
        } => IrExpr::Lambda {
            params,
            return_type: *return_type,
            body,
            id: *id,
            span: *span,
        },
        IrExpr::Construct { ty, fields, id, span } => IrExpr::Construct {
            ty: *ty,
            fields,
            id: *id,
            span: *span,
        },
        IrExpr::Ok(e, id, sp) => IrExpr::Ok(e, *id, *sp),
        IrExpr::Err(e, id, sp) => IrExpr::Err(e, *id, *sp),
        IrExpr::Some(e, id, sp) => IrExpr::Some(e, *id, *sp),
        IrExpr::Await(e, id, sp) => IrExpr::Await(e, *id, *sp),
        IrExpr::ListLiteral(items, id, sp) => IrExpr::ListLiteral(items, *id, *sp),
    }
}
