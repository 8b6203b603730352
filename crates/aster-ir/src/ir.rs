//! The typed intermediate representation (`spec.md` §4.5).
//!
//! Reuses [`aster_parser::Type`], [`aster_parser::Pattern`] and
//! [`aster_parser::Param`] verbatim — none of them reference `Expr`, so the
//! lowering pass has nothing structural to change about them. `Decl`/`Stmt`/
//! `Expr` get IR-local counterparts because lowering *does* change their
//! shape: every node gains a [`NodeId`] the type checker uses as a lookup
//! key (`aster-typeck` keeps resolved types in a side table keyed by
//! `NodeId` rather than mutating arena nodes in place), and operator
//! expressions desugar to a `Call` against an operator `Name`.

use aster_base::{Arena, Span, Symbol};
pub use aster_parser::{EffectTag, Param, Pattern, Type};

/// Identifies an IR node for the type checker's side tables. Assigned
/// sequentially by the [`crate::lower::Lowerer`] during the structural walk;
/// stable for the lifetime of one lowered module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

pub type IrBlock<'a> = &'a [IrStmt<'a>];

pub struct IrModule<'a> {
    pub name: Symbol,
    pub decls: &'a [IrDecl<'a>],
    pub span: Span,
}

#[derive(Debug)]
pub enum IrDecl<'a> {
    Func(IrFuncDecl<'a>),
    Data(IrDataDecl<'a>),
    Enum(aster_parser::EnumDecl<'a>),
    Import(aster_parser::ImportDecl),
    TypeAlias(aster_parser::TypeAliasDecl<'a>),
}

impl<'a> IrDecl<'a> {
    pub fn span(&self) -> Span {
        match self {
            IrDecl::Func(d) => d.span,
            IrDecl::Data(d) => d.span,
            IrDecl::Enum(d) => d.span,
            IrDecl::Import(d) => d.span,
            IrDecl::TypeAlias(d) => d.span,
        }
    }
}

#[derive(Debug)]
pub struct IrFuncDecl<'a> {
    pub id: NodeId,
    pub name: Symbol,
    pub params: &'a [Param<'a>],
    pub return_type: Option<&'a Type<'a>>,
    pub effects: &'a [EffectTag],
    pub capabilities: &'a [Symbol],
    pub body: IrBlock<'a>,
    pub span: Span,
}

#[derive(Debug)]
pub struct IrDataDecl<'a> {
    pub name: Symbol,
    pub fields: &'a [Param<'a>],
    pub span: Span,
}

#[derive(Debug)]
pub struct IrMatchArm<'a> {
    pub pattern: &'a Pattern<'a>,
    pub guard: Option<&'a IrExpr<'a>>,
    pub body: IrBlock<'a>,
    pub span: Span,
}

#[derive(Debug)]
pub enum IrStmt<'a> {
    Let {
        id: NodeId,
        name: Symbol,
        mutable: bool,
        ty: Option<&'a Type<'a>>,
        value: &'a IrExpr<'a>,
        span: Span,
    },
    Set {
        target: &'a IrExpr<'a>,
        value: &'a IrExpr<'a>,
        span: Span,
    },
    Return {
        value: Option<&'a IrExpr<'a>>,
        span: Span,
    },
    If {
        cond: &'a IrExpr<'a>,
        then_block: IrBlock<'a>,
        else_block: Option<IrBlock<'a>>,
        span: Span,
    },
    Match {
        scrutinee: &'a IrExpr<'a>,
        arms: &'a [IrMatchArm<'a>],
        span: Span,
    },
    Scope {
        body: IrBlock<'a>,
        span: Span,
    },
    Start {
        name: Symbol,
        expr: &'a IrExpr<'a>,
        span: Span,
    },
    Wait {
        name: Symbol,
        span: Span,
    },
    ExprStmt {
        expr: &'a IrExpr<'a>,
        span: Span,
    },
    Workflow {
        name: Symbol,
        steps: IrBlock<'a>,
        span: Span,
    },
    Step {
        name: Symbol,
        body: IrBlock<'a>,
        compensate: Option<IrBlock<'a>>,
        span: Span,
    },
}

impl<'a> IrStmt<'a> {
    pub fn span(&self) -> Span {
        match self {
            IrStmt::Let { span, .. }
            | IrStmt::Set { span, .. }
            | IrStmt::Return { span, .. }
            | IrStmt::If { span, .. }
            | IrStmt::Match { span, .. }
            | IrStmt::Scope { span, .. }
            | IrStmt::Start { span, .. }
            | IrStmt::Wait { span, .. }
            | IrStmt::ExprStmt { span, .. }
            | IrStmt::Workflow { span, .. }
            | IrStmt::Step { span, .. } => *span,
        }
    }
}

pub fn ir_block_span(stmts: &[IrStmt<'_>]) -> Span {
    match (stmts.first(), stmts.last()) {
        (Some(first), Some(last)) => first.span().merge(last.span()),
        _ => Span::default(),
    }
}

#[derive(Debug)]
pub enum IrExpr<'a> {
    Name(Symbol, NodeId, Span),
    Int(i64, NodeId, Span),
    Long(i64, NodeId, Span),
    Double(f64, NodeId, Span),
    Bool(bool, NodeId, Span),
    Str(String, NodeId, Span),
    Null(NodeId, Span),
    /// Every arithmetic/comparison/boolean operator from the source AST,
    /// normalized to a call against a `Name` target (`"+"`, `"<"`, `"and"`,
    /// …) — `spec.md` §4.5's "operator expressions become Call nodes".
    Call {
        callee: &'a IrExpr<'a>,
        args: &'a [IrExpr<'a>],
        id: NodeId,
        span: Span,
    },
    FieldAccess {
        base: &'a IrExpr<'a>,
        field: Symbol,
        id: NodeId,
        span: Span,
    },
    Lambda {
        params: &'a [Param<'a>],
        return_type: Option<&'a Type<'a>>,
        body: IrBlock<'a>,
        id: NodeId,
        span: Span,
    },
    Construct {
        ty: Symbol,
        fields: &'a [(Symbol, IrExpr<'a>)],
        id: NodeId,
        span: Span,
    },
    Ok(&'a IrExpr<'a>, NodeId, Span),
    Err(&'a IrExpr<'a>, NodeId, Span),
    Some(&'a IrExpr<'a>, NodeId, Span),
    None(NodeId, Span),
    Await(&'a IrExpr<'a>, NodeId, Span),
    ListLiteral(&'a [IrExpr<'a>], NodeId, Span),
}

impl<'a> IrExpr<'a> {
    pub fn id(&self) -> NodeId {
        match self {
            IrExpr::Name(_, id, _)
            | IrExpr::Int(_, id, _)
            | IrExpr::Long(_, id, _)
            | IrExpr::Double(_, id, _)
            | IrExpr::Bool(_, id, _)
            | IrExpr::Str(_, id, _)
            | IrExpr::Null(id, _)
            | IrExpr::None(id, _)
            | IrExpr::Ok(_, id, _)
            | IrExpr::Err(_, id, _)
            | IrExpr::Some(_, id, _)
            | IrExpr::Await(_, id, _)
            | IrExpr::ListLiteral(_, id, _) => *id,
            IrExpr::Call { id, .. }
            | IrExpr::FieldAccess { id, .. }
            | IrExpr::Lambda { id, .. }
            | IrExpr::Construct { id, .. } => *id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            IrExpr::Name(_, _, s)
            | IrExpr::Int(_, _, s)
            | IrExpr::Long(_, _, s)
            | IrExpr::Double(_, _, s)
            | IrExpr::Bool(_, _, s)
            | IrExpr::Str(_, _, s)
            | IrExpr::Null(_, s)
            | IrExpr::None(_, s)
            | IrExpr::ListLiteral(_, _, s) => *s,
            IrExpr::Call { span, .. }
            | IrExpr::FieldAccess { span, .. }
            | IrExpr::Lambda { span, .. }
            | IrExpr::Construct { span, .. } => *span,
            IrExpr::Ok(_, _, s) | IrExpr::Err(_, _, s) | IrExpr::Some(_, _, s) | IrExpr::Await(_, _, s) => *s,
        }
    }
}

/// Bundles one [`Arena`] per IR node type, after the same `AstContext`
/// pattern `aster-parser` uses.
pub struct IrContext<'a> {
    decls: &'a Arena<IrDecl<'a>>,
    stmts: &'a Arena<IrStmt<'a>>,
    exprs: &'a Arena<IrExpr<'a>>,
    arms: &'a Arena<IrMatchArm<'a>>,
    types: &'a Arena<Type<'a>>,
    params: &'a Arena<Param<'a>>,
}

impl<'a> IrContext<'a> {
    pub fn new(
        decls: &'a Arena<IrDecl<'a>>,
        stmts: &'a Arena<IrStmt<'a>>,
        exprs: &'a Arena<IrExpr<'a>>,
        arms: &'a Arena<IrMatchArm<'a>>,
        types: &'a Arena<Type<'a>>,
        params: &'a Arena<Param<'a>>,
    ) -> Self {
        Self {
            decls,
            stmts,
            exprs,
            arms,
            types,
            params,
        }
    }

    pub fn alloc_type(&self, t: Type<'a>) -> &'a Type<'a> {
        self.types.alloc(t)
    }

    pub fn alloc_params<I: ExactSizeIterator<Item = Param<'a>>>(&self, items: I) -> &'a [Param<'a>] {
        self.params.alloc_slice(items)
    }

    pub fn alloc_decls<I: ExactSizeIterator<Item = IrDecl<'a>>>(&self, items: I) -> &'a [IrDecl<'a>] {
        self.decls.alloc_slice(items)
    }

    pub fn alloc_stmt(&self, s: IrStmt<'a>) -> &'a IrStmt<'a> {
        self.stmts.alloc(s)
    }

    pub fn alloc_stmts<I: ExactSizeIterator<Item = IrStmt<'a>>>(&self, items: I) -> IrBlock<'a> {
        self.stmts.alloc_slice(items)
    }

    pub fn alloc_expr(&self, e: IrExpr<'a>) -> &'a IrExpr<'a> {
        self.exprs.alloc(e)
    }

    pub fn alloc_exprs<I: ExactSizeIterator<Item = IrExpr<'a>>>(&self, items: I) -> &'a [IrExpr<'a>] {
        self.exprs.alloc_slice(items)
    }

    pub fn alloc_arms<I: ExactSizeIterator<Item = IrMatchArm<'a>>>(
        &self,
        items: I,
    ) -> &'a [IrMatchArm<'a>] {
        self.arms.alloc_slice(items)
    }
}
