//! Syntax tree for the analyzed language.
//!
//! Expressions, identifiers, and type expressions carry a `NodeId`; the type
//! checker keys its side tables (object resolution, expression types) on
//! those ids so the tree itself stays immutable after parsing.

use crate::frontend::source::Span;
use std::path::PathBuf;

pub type NodeId = u32;

#[derive(Debug, Clone)]
pub struct Ident {
    pub id: NodeId,
    pub name: String,
    pub span: Span,
}

#[derive(Debug)]
pub struct File {
    pub name: PathBuf,
    pub package: Ident,
    pub imports: Vec<ImportDecl>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

#[derive(Debug)]
pub struct ImportDecl {
    pub alias: Option<Ident>,
    pub path: String,
    pub span: Span,
}

#[derive(Debug)]
pub enum Decl {
    Type(TypeDecl),
    Func(FuncDecl),
}

#[derive(Debug)]
pub struct TypeDecl {
    pub name: Ident,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug)]
pub struct FuncDecl {
    pub name: Ident,
    pub recv: Option<Param>,
    pub params: Vec<Param>,
    pub results: Vec<TypeExpr>,
    pub body: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: Option<Ident>,
    pub ty: TypeExpr,
    pub variadic: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub id: NodeId,
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TypeExprKind {
    Name(Ident),
    Qualified(Ident, Ident),
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array(u64, Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    Func(Vec<Param>, Vec<TypeExpr>),
    Struct(Vec<FieldDecl>),
    Interface(Vec<InterfaceElem>),
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// Empty for an embedded field.
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum InterfaceElem {
    Method {
        name: Ident,
        params: Vec<Param>,
        results: Vec<TypeExpr>,
        span: Span,
    },
    Embedded(TypeExpr),
}

#[derive(Debug)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug)]
pub enum Stmt {
    Expr(Expr),
    Var(VarStmt),
    Assign(AssignStmt),
    IncDec { expr: Expr, span: Span },
    If(IfStmt),
    For(ForStmt),
    Return { exprs: Vec<Expr>, span: Span },
    Go { call: Expr, span: Span },
    Defer { call: Expr, span: Span },
    Block(Block),
    Break(Span),
    Continue(Span),
}

#[derive(Debug)]
pub struct VarStmt {
    pub name: Ident,
    pub ty: Option<TypeExpr>,
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug)]
pub struct AssignStmt {
    pub lhs: Vec<Expr>,
    pub rhs: Vec<Expr>,
    /// `:=` rather than `=`.
    pub define: bool,
    pub span: Span,
}

#[derive(Debug)]
pub struct IfStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Expr,
    pub then: Block,
    pub els: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub post: Option<Box<Stmt>>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug)]
pub enum ExprKind {
    Name(Ident),
    IntLit(String),
    FloatLit(String),
    StrLit(String),
    Selector {
        x: Box<Expr>,
        sel: Ident,
    },
    Call {
        fun: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnOp,
        x: Box<Expr>,
    },
    Binary {
        op: BinOp,
        x: Box<Expr>,
        y: Box<Expr>,
    },
    Index {
        x: Box<Expr>,
        index: Box<Expr>,
    },
    Composite {
        ty: TypeExpr,
        elems: Vec<CompositeElem>,
    },
    FuncLit {
        params: Vec<Param>,
        results: Vec<TypeExpr>,
        body: Block,
    },
    Paren(Box<Expr>),
}

#[derive(Debug)]
pub enum CompositeElem {
    KeyValue { key: Expr, value: Expr },
    Value(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    Addr,
    Deref,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    LAnd,
    LOr,
}

/// Pre/post-order traversal hooks.
///
/// Returning `false` from an `enter_*` hook prunes the subtree: neither the
/// children nor the matching `leave_*` hook are visited. The analyzer relies
/// on this to skip functions whose signatures are pinned by an interface.
pub trait Visitor {
    fn enter_func_decl(&mut self, f: &FuncDecl) -> bool {
        let _ = f;
        true
    }
    fn leave_func_decl(&mut self, f: &FuncDecl) {
        let _ = f;
    }
    fn enter_stmt(&mut self, s: &Stmt) -> bool {
        let _ = s;
        true
    }
    fn leave_stmt(&mut self, s: &Stmt) {
        let _ = s;
    }
    fn enter_expr(&mut self, e: &Expr) -> bool {
        let _ = e;
        true
    }
    fn leave_expr(&mut self, e: &Expr) {
        let _ = e;
    }
}

pub fn walk_file<V: Visitor>(v: &mut V, file: &File) {
    for decl in &file.decls {
        if let Decl::Func(f) = decl {
            walk_func_decl(v, f);
        }
    }
}

pub fn walk_func_decl<V: Visitor>(v: &mut V, f: &FuncDecl) {
    if !v.enter_func_decl(f) {
        return;
    }
    if let Some(body) = &f.body {
        walk_block(v, body);
    }
    v.leave_func_decl(f);
}

pub fn walk_block<V: Visitor>(v: &mut V, block: &Block) {
    for stmt in &block.stmts {
        walk_stmt(v, stmt);
    }
}

pub fn walk_stmt<V: Visitor>(v: &mut V, stmt: &Stmt) {
    if !v.enter_stmt(stmt) {
        return;
    }
    match stmt {
        Stmt::Expr(e) => walk_expr(v, e),
        Stmt::Var(vs) => {
            if let Some(value) = &vs.value {
                walk_expr(v, value);
            }
        }
        Stmt::Assign(a) => {
            for e in &a.lhs {
                walk_expr(v, e);
            }
            for e in &a.rhs {
                walk_expr(v, e);
            }
        }
        Stmt::IncDec { expr, .. } => walk_expr(v, expr),
        Stmt::If(i) => {
            if let Some(init) = &i.init {
                walk_stmt(v, init);
            }
            walk_expr(v, &i.cond);
            walk_block(v, &i.then);
            if let Some(els) = &i.els {
                walk_stmt(v, els);
            }
        }
        Stmt::For(f) => {
            if let Some(init) = &f.init {
                walk_stmt(v, init);
            }
            if let Some(cond) = &f.cond {
                walk_expr(v, cond);
            }
            if let Some(post) = &f.post {
                walk_stmt(v, post);
            }
            walk_block(v, &f.body);
        }
        Stmt::Return { exprs, .. } => {
            for e in exprs {
                walk_expr(v, e);
            }
        }
        Stmt::Go { call, .. } | Stmt::Defer { call, .. } => walk_expr(v, call),
        Stmt::Block(b) => walk_block(v, b),
        Stmt::Break(_) | Stmt::Continue(_) => {}
    }
    v.leave_stmt(stmt);
}

pub fn walk_expr<V: Visitor>(v: &mut V, expr: &Expr) {
    if !v.enter_expr(expr) {
        return;
    }
    match &expr.kind {
        ExprKind::Name(_)
        | ExprKind::IntLit(_)
        | ExprKind::FloatLit(_)
        | ExprKind::StrLit(_) => {}
        ExprKind::Selector { x, .. } => walk_expr(v, x),
        ExprKind::Call { fun, args } => {
            walk_expr(v, fun);
            for a in args {
                walk_expr(v, a);
            }
        }
        ExprKind::Unary { x, .. } | ExprKind::Paren(x) => walk_expr(v, x),
        ExprKind::Binary { x, y, .. } => {
            walk_expr(v, x);
            walk_expr(v, y);
        }
        ExprKind::Index { x, index } => {
            walk_expr(v, x);
            walk_expr(v, index);
        }
        ExprKind::Composite { elems, .. } => {
            for elem in elems {
                match elem {
                    CompositeElem::KeyValue { key, value } => {
                        walk_expr(v, key);
                        walk_expr(v, value);
                    }
                    CompositeElem::Value(e) => walk_expr(v, e),
                }
            }
        }
        ExprKind::FuncLit { body, .. } => walk_block(v, body),
    }
    v.leave_expr(expr);
}
