//! Arena-allocated AST (`spec.md` §3, §4.4).
//!
//! Shaped after the teacher's `Stmt<'a>`/`Expr<'a>`/`Literal`/`BinaryOpKind`
//! split (`ast/stmt.rs`), generalized from its logic/imperative pair into the
//! richer Decl/Stmt/Expr/Pattern/Type set this grammar needs. Every node is
//! built from an [`AstContext`] bundling one [`Arena`] per node type, mirroring
//! the teacher's `AstContext` in `arena_ctx.rs`.

use aster_base::{Arena, Span, Symbol};

pub type Block<'a> = &'a [Stmt<'a>];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTag {
    Pure,
    Cpu,
    Io,
    Async,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

#[derive(Debug)]
pub struct Module<'a> {
    pub name: Symbol,
    pub decls: &'a [Decl<'a>],
    pub span: Span,
}

#[derive(Debug)]
pub enum Decl<'a> {
    Func(FuncDecl<'a>),
    Data(DataDecl<'a>),
    Enum(EnumDecl<'a>),
    Import(ImportDecl),
    TypeAlias(TypeAliasDecl<'a>),
}

impl<'a> Decl<'a> {
    pub fn span(&self) -> Span {
        match self {
            Decl::Func(d) => d.span,
            Decl::Data(d) => d.span,
            Decl::Enum(d) => d.span,
            Decl::Import(d) => d.span,
            Decl::TypeAlias(d) => d.span,
        }
    }
}

#[derive(Debug)]
pub struct Param<'a> {
    pub name: Symbol,
    pub ty: Option<&'a Type<'a>>,
    pub span: Span,
}

#[derive(Debug)]
pub struct FuncDecl<'a> {
    pub name: Symbol,
    pub params: &'a [Param<'a>],
    pub return_type: Option<&'a Type<'a>>,
    /// Header effect tags (`spec.md` §4.6.3); the lattice join of these is
    /// the function's *declared* effect, checked against its *inferred* one.
    pub effects: &'a [EffectTag],
    pub capabilities: &'a [Symbol],
    pub body: Block<'a>,
    pub span: Span,
}

#[derive(Debug)]
pub struct DataDecl<'a> {
    pub name: Symbol,
    pub fields: &'a [Param<'a>],
    pub span: Span,
}

#[derive(Debug)]
pub struct EnumDecl<'a> {
    pub name: Symbol,
    pub variants: &'a [Symbol],
    pub span: Span,
}

#[derive(Debug)]
pub struct ImportDecl {
    pub path: Symbol,
    pub alias: Option<Symbol>,
    pub span: Span,
}

#[derive(Debug)]
pub struct TypeAliasDecl<'a> {
    pub name: Symbol,
    pub params: &'a [Symbol],
    pub target: &'a Type<'a>,
    pub span: Span,
}

#[derive(Debug)]
pub struct MatchArm<'a> {
    pub pattern: &'a Pattern<'a>,
    pub guard: Option<&'a Expr<'a>>,
    pub body: Block<'a>,
    pub span: Span,
}

#[derive(Debug)]
pub enum Stmt<'a> {
    Let {
        name: Symbol,
        mutable: bool,
        ty: Option<&'a Type<'a>>,
        value: &'a Expr<'a>,
        span: Span,
    },
    Set {
        target: &'a Expr<'a>,
        value: &'a Expr<'a>,
        span: Span,
    },
    Return {
        value: Option<&'a Expr<'a>>,
        span: Span,
    },
    If {
        cond: &'a Expr<'a>,
        then_block: Block<'a>,
        else_block: Option<Block<'a>>,
        span: Span,
    },
    Match {
        scrutinee: &'a Expr<'a>,
        arms: &'a [MatchArm<'a>],
        span: Span,
    },
    /// A single `Case` arm, only meaningful nested inside a [`Stmt::Match`]
    /// body produced transiently during parsing; lowering flattens these
    /// into [`MatchArm`]s and this variant never reaches `aster-ir`.
    Case {
        pattern: &'a Pattern<'a>,
        body: Block<'a>,
        span: Span,
    },
    /// A bare indented block used as a statement, with no new lexical
    /// scope of its own (unlike [`Stmt::Scope`]).
    Block(Block<'a>),
    /// An indented block that introduces a fresh `BLOCK` symbol-table scope.
    Scope {
        body: Block<'a>,
        span: Span,
    },
    Start {
        name: Symbol,
        expr: &'a Expr<'a>,
        span: Span,
    },
    Wait {
        name: Symbol,
        span: Span,
    },
    ExprStmt {
        expr: &'a Expr<'a>,
        span: Span,
    },
    Workflow {
        name: Symbol,
        steps: &'a [Stmt<'a>],
        span: Span,
    },
    Step {
        name: Symbol,
        body: Block<'a>,
        compensate: Option<Block<'a>>,
        span: Span,
    },
}

impl<'a> Stmt<'a> {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Let { span, .. }
            | Stmt::Set { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::If { span, .. }
            | Stmt::Match { span, .. }
            | Stmt::Case { span, .. }
            | Stmt::Scope { span, .. }
            | Stmt::Start { span, .. }
            | Stmt::Wait { span, .. }
            | Stmt::ExprStmt { span, .. }
            | Stmt::Workflow { span, .. }
            | Stmt::Step { span, .. } => *span,
            Stmt::Block(stmts) => block_span(stmts),
        }
    }
}

/// A block's span runs from its first statement through its last — the
/// `INDENT`/`DEDENT` tokens that delimit it contribute nothing (`spec.md`
/// §3, testable property 4).
pub fn block_span(stmts: &[Stmt<'_>]) -> Span {
    match (stmts.first(), stmts.last()) {
        (Some(first), Some(last)) => first.span().merge(last.span()),
        _ => Span::default(),
    }
}

#[derive(Debug)]
pub enum Expr<'a> {
    Name(Symbol, Span),
    Int(i64, Span),
    Long(i64, Span),
    Double(f64, Span),
    Bool(bool, Span),
    Str(String, Span),
    Null(Span),
    BinaryOp {
        op: BinaryOpKind,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
        span: Span,
    },
    /// Field or qualified-name access (`Http.get`); also the parse of a
    /// method-style call's callee (`r.m(a,b)` parses to `Call { callee:
    /// FieldAccess { base: r, field: m }, args: [a,b] }` like any other
    /// `base.field(args)` call) -- `aster-ir` lowering is what tells `r`'s
    /// local-variable receiver apart from a module qualifier and rewrites
    /// to `m(r, a, b)` (`spec.md` §4.4).
    FieldAccess {
        base: &'a Expr<'a>,
        field: Symbol,
        span: Span,
    },
    Call {
        callee: &'a Expr<'a>,
        args: &'a [Expr<'a>],
        span: Span,
    },
    Lambda {
        params: &'a [Param<'a>],
        return_type: Option<&'a Type<'a>>,
        body: Block<'a>,
        span: Span,
    },
    Construct {
        ty: Symbol,
        fields: &'a [(Symbol, Expr<'a>)],
        span: Span,
    },
    Ok(&'a Expr<'a>, Span),
    Err(&'a Expr<'a>, Span),
    Some(&'a Expr<'a>, Span),
    None(Span),
    Await(&'a Expr<'a>, Span),
    ListLiteral(&'a [Expr<'a>], Span),
}

impl<'a> Expr<'a> {
    pub fn span(&self) -> Span {
        match self {
            Expr::Name(_, s)
            | Expr::Int(_, s)
            | Expr::Long(_, s)
            | Expr::Double(_, s)
            | Expr::Bool(_, s)
            | Expr::Str(_, s)
            | Expr::Null(s)
            | Expr::None(s)
            | Expr::ListLiteral(_, s) => *s,
            Expr::BinaryOp { span, .. }
            | Expr::FieldAccess { span, .. }
            | Expr::Call { span, .. }
            | Expr::Lambda { span, .. }
            | Expr::Construct { span, .. } => *span,
            Expr::Ok(_, s) | Expr::Err(_, s) | Expr::Some(_, s) | Expr::Await(_, s) => *s,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Pattern<'a> {
    PatInt(i64, Span),
    PatBool(bool, Span),
    PatString(String, Span),
    PatNull(Span),
    PatName(Symbol, Span),
    PatWildcard(Span),
    PatConstructor {
        name: Symbol,
        args: &'a [Pattern<'a>],
        span: Span,
    },
}

impl<'a> Pattern<'a> {
    pub fn span(&self) -> Span {
        match self {
            Pattern::PatInt(_, s)
            | Pattern::PatBool(_, s)
            | Pattern::PatString(_, s)
            | Pattern::PatNull(s)
            | Pattern::PatName(_, s)
            | Pattern::PatWildcard(s)
            | Pattern::PatConstructor { span: s, .. } => *s,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Type<'a> {
    TypeName(Symbol, Span),
    TypeVar(Symbol, Span),
    TypeApp {
        base: Symbol,
        args: &'a [Type<'a>],
        span: Span,
    },
    Maybe(&'a Type<'a>, Span),
    Option(&'a Type<'a>, Span),
    Result {
        ok: &'a Type<'a>,
        err: &'a Type<'a>,
        span: Span,
    },
    ListT(&'a Type<'a>, Span),
    MapT {
        key: &'a Type<'a>,
        value: &'a Type<'a>,
        span: Span,
    },
    FuncType {
        params: &'a [Type<'a>],
        ret: &'a Type<'a>,
        span: Span,
    },
    PiiType {
        level: u8,
        base: &'a Type<'a>,
        span: Span,
    },
}

impl<'a> Type<'a> {
    pub fn span(&self) -> Span {
        match self {
            Type::TypeName(_, s) | Type::TypeVar(_, s) => *s,
            Type::TypeApp { span, .. } => *span,
            Type::Maybe(_, s) | Type::Option(_, s) | Type::ListT(_, s) => *s,
            Type::Result { span, .. }
            | Type::MapT { span, .. }
            | Type::FuncType { span, .. }
            | Type::PiiType { span, .. } => *span,
        }
    }
}

/// Bundles one [`Arena`] per AST node type, after the teacher's
/// `AstContext` (`arena_ctx.rs`). The parser allocates every node through
/// this context rather than owning arenas itself, so a whole module's tree
/// can be torn down (or, via [`AstContext::reset`], reused across repeated
/// parses in a test) in one place.
pub struct AstContext<'a> {
    decls: &'a Arena<Decl<'a>>,
    stmts: &'a Arena<Stmt<'a>>,
    exprs: &'a Arena<Expr<'a>>,
    patterns: &'a Arena<Pattern<'a>>,
    types: &'a Arena<Type<'a>>,
    params: &'a Arena<Param<'a>>,
    arms: &'a Arena<MatchArm<'a>>,
}

impl<'a> AstContext<'a> {
    pub fn new(
        decls: &'a Arena<Decl<'a>>,
        stmts: &'a Arena<Stmt<'a>>,
        exprs: &'a Arena<Expr<'a>>,
        patterns: &'a Arena<Pattern<'a>>,
        types: &'a Arena<Type<'a>>,
        params: &'a Arena<Param<'a>>,
        arms: &'a Arena<MatchArm<'a>>,
    ) -> Self {
        Self {
            decls,
            stmts,
            exprs,
            patterns,
            types,
            params,
            arms,
        }
    }

    pub fn alloc_decl(&self, d: Decl<'a>) -> &'a Decl<'a> {
        self.decls.alloc(d)
    }

    pub fn alloc_decls<I: ExactSizeIterator<Item = Decl<'a>>>(&self, items: I) -> &'a [Decl<'a>] {
        self.decls.alloc_slice(items)
    }

    pub fn alloc_stmt(&self, s: Stmt<'a>) -> &'a Stmt<'a> {
        self.stmts.alloc(s)
    }

    pub fn alloc_stmts<I: ExactSizeIterator<Item = Stmt<'a>>>(&self, items: I) -> Block<'a> {
        self.stmts.alloc_slice(items)
    }

    pub fn alloc_expr(&self, e: Expr<'a>) -> &'a Expr<'a> {
        self.exprs.alloc(e)
    }

    pub fn alloc_exprs<I: ExactSizeIterator<Item = Expr<'a>>>(&self, items: I) -> &'a [Expr<'a>] {
        self.exprs.alloc_slice(items)
    }

    pub fn alloc_pattern(&self, p: Pattern<'a>) -> &'a Pattern<'a> {
        self.patterns.alloc(p)
    }

    pub fn alloc_patterns<I: ExactSizeIterator<Item = Pattern<'a>>>(
        &self,
        items: I,
    ) -> &'a [Pattern<'a>] {
        self.patterns.alloc_slice(items)
    }

    pub fn alloc_type(&self, t: Type<'a>) -> &'a Type<'a> {
        self.types.alloc(t)
    }

    pub fn alloc_types<I: ExactSizeIterator<Item = Type<'a>>>(&self, items: I) -> &'a [Type<'a>] {
        self.types.alloc_slice(items)
    }

    pub fn alloc_param(&self, p: Param<'a>) -> &'a Param<'a> {
        self.params.alloc(p)
    }

    pub fn alloc_params<I: ExactSizeIterator<Item = Param<'a>>>(
        &self,
        items: I,
    ) -> &'a [Param<'a>] {
        self.params.alloc_slice(items)
    }

    pub fn alloc_arm(&self, a: MatchArm<'a>) -> &'a MatchArm<'a> {
        self.arms.alloc(a)
    }

    pub fn alloc_arms<I: ExactSizeIterator<Item = MatchArm<'a>>>(
        &self,
        items: I,
    ) -> &'a [MatchArm<'a>] {
        self.arms.alloc_slice(items)
    }

    /// Builds a binary-operator [`Expr`] in one call, the way the teacher's
    /// `AstContext::binary` composes allocation with construction.
    pub fn binary(
        &self,
        op: BinaryOpKind,
        left: Expr<'a>,
        right: Expr<'a>,
        span: Span,
    ) -> &'a Expr<'a> {
        let left = self.alloc_expr(left);
        let right = self.alloc_expr(right);
        self.alloc_expr(Expr::BinaryOp {
            op,
            left,
            right,
            span,
        })
    }

    pub fn call(&self, callee: Expr<'a>, args: &'a [Expr<'a>], span: Span) -> &'a Expr<'a> {
        let callee = self.alloc_expr(callee);
        self.alloc_expr(Expr::Call { callee, args, span })
    }
}
