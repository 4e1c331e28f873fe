//! Recursive-descent parser with single-token lookahead.
//!
//! Statement headers (`if`, `for`) parse their condition with composite
//! literals disabled so `if m != mint(3) {` reads the brace as the block, the
//! same restriction the analyzed language itself imposes.

use crate::frontend::ast::*;
use crate::frontend::lexer::{Lexer, Token, TokenKind};
use crate::frontend::source::{Diagnostic, Span};
use std::path::PathBuf;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Token,
    next_id: NodeId,
    composite_ok: bool,
}

/// Parses one source file. `base` offsets all spans into the global file set;
/// `id_base` keeps node ids disjoint between the files of a package.
pub fn parse_file(
    name: PathBuf,
    src: &str,
    base: usize,
    id_base: NodeId,
) -> Result<File, Diagnostic> {
    let mut p = Parser::new(src, base, id_base)?;
    p.parse_file(name)
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str, base: usize, id_base: NodeId) -> Result<Self, Diagnostic> {
        let mut lexer = Lexer::new(src, base);
        let lookahead = lexer.next_token()?;
        Ok(Self {
            lexer,
            lookahead,
            next_id: id_base,
            composite_ok: true,
        })
    }

    fn id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn bump(&mut self) -> Result<Token, Diagnostic> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.lookahead, next))
    }

    fn at(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.lookahead.kind) == std::mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> Result<bool, Diagnostic> {
        if self.at(kind) {
            self.bump()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token, Diagnostic> {
        if self.at(kind) {
            return self.bump();
        }
        Err(self.error_here(format!(
            "expected {:?}, found {:?}",
            kind, self.lookahead.kind
        )))
    }

    fn error_here(&self, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(message, self.lookahead.span)
    }

    fn expect_ident(&mut self) -> Result<Ident, Diagnostic> {
        match &self.lookahead.kind {
            TokenKind::Ident(_) => {
                let tok = self.bump()?;
                let TokenKind::Ident(name) = tok.kind else {
                    unreachable!()
                };
                Ok(Ident {
                    id: self.id(),
                    name,
                    span: tok.span,
                })
            }
            other => Err(self.error_here(format!("expected identifier, found {other:?}"))),
        }
    }

    /// Consumes statement terminators; a closing brace also terminates.
    fn expect_semi(&mut self) -> Result<(), Diagnostic> {
        if self.at(&TokenKind::Semi) {
            self.bump()?;
            return Ok(());
        }
        if self.at(&TokenKind::RBrace) || self.at(&TokenKind::RParen) || self.at(&TokenKind::Eof) {
            return Ok(());
        }
        Err(self.error_here(format!(
            "expected end of statement, found {:?}",
            self.lookahead.kind
        )))
    }

    fn skip_semis(&mut self) -> Result<(), Diagnostic> {
        while self.at(&TokenKind::Semi) {
            self.bump()?;
        }
        Ok(())
    }

    // ---- file level ----

    fn parse_file(&mut self, name: PathBuf) -> Result<File, Diagnostic> {
        let start = self.lookahead.span.start;
        self.skip_semis()?;
        self.expect(&TokenKind::KwPackage)?;
        let package = self.expect_ident()?;
        self.expect_semi()?;
        self.skip_semis()?;

        let mut imports = Vec::new();
        while self.at(&TokenKind::KwImport) {
            self.parse_import(&mut imports)?;
            self.skip_semis()?;
        }

        let mut decls = Vec::new();
        loop {
            self.skip_semis()?;
            match &self.lookahead.kind {
                TokenKind::Eof => break,
                TokenKind::KwType => decls.push(Decl::Type(self.parse_type_decl()?)),
                TokenKind::KwFunc => decls.push(Decl::Func(self.parse_func_decl()?)),
                other => {
                    return Err(self.error_here(format!(
                        "expected top-level declaration, found {other:?}"
                    )))
                }
            }
        }
        let end = self.lookahead.span.end;
        Ok(File {
            name,
            package,
            imports,
            decls,
            span: Span::new(start, end),
        })
    }

    fn parse_import(&mut self, out: &mut Vec<ImportDecl>) -> Result<(), Diagnostic> {
        self.expect(&TokenKind::KwImport)?;
        if self.eat(&TokenKind::LParen)? {
            loop {
                self.skip_semis()?;
                if self.eat(&TokenKind::RParen)? {
                    break;
                }
                out.push(self.parse_import_spec()?);
                self.expect_semi()?;
            }
        } else {
            out.push(self.parse_import_spec()?);
            self.expect_semi()?;
        }
        Ok(())
    }

    fn parse_import_spec(&mut self) -> Result<ImportDecl, Diagnostic> {
        let start = self.lookahead.span.start;
        let alias = if matches!(self.lookahead.kind, TokenKind::Ident(_)) {
            Some(self.expect_ident()?)
        } else {
            None
        };
        match &self.lookahead.kind {
            TokenKind::Str(_) => {
                let tok = self.bump()?;
                let TokenKind::Str(path) = tok.kind else {
                    unreachable!()
                };
                Ok(ImportDecl {
                    alias,
                    path,
                    span: Span::new(start, tok.span.end),
                })
            }
            other => Err(self.error_here(format!("expected import path, found {other:?}"))),
        }
    }

    fn parse_type_decl(&mut self) -> Result<TypeDecl, Diagnostic> {
        let start = self.expect(&TokenKind::KwType)?.span.start;
        let name = self.expect_ident()?;
        let ty = self.parse_type()?;
        let span = Span::new(start, ty.span.end);
        self.expect_semi()?;
        Ok(TypeDecl { name, ty, span })
    }

    fn parse_func_decl(&mut self) -> Result<FuncDecl, Diagnostic> {
        let start = self.expect(&TokenKind::KwFunc)?.span.start;
        let recv = if self.at(&TokenKind::LParen) {
            // Receiver: `(name Type)`.
            self.bump()?;
            let rname = self.expect_ident()?;
            let rty = self.parse_type()?;
            let rspan = Span::new(rname.span.start, rty.span.end);
            self.expect(&TokenKind::RParen)?;
            Some(Param {
                name: Some(rname),
                ty: rty,
                variadic: false,
                span: rspan,
            })
        } else {
            None
        };
        let name = self.expect_ident()?;
        let params = self.parse_param_clause()?;
        let results = self.parse_results()?;
        let body = if self.at(&TokenKind::LBrace) {
            Some(self.parse_block()?)
        } else {
            None
        };
        let end = body
            .as_ref()
            .map(|b| b.span.end)
            .unwrap_or(self.lookahead.span.start);
        self.expect_semi()?;
        Ok(FuncDecl {
            name,
            recv,
            params,
            results,
            body,
            span: Span::new(start, end),
        })
    }

    // ---- types ----

    fn parse_type(&mut self) -> Result<TypeExpr, Diagnostic> {
        let start = self.lookahead.span.start;
        match &self.lookahead.kind {
            TokenKind::Ident(_) => {
                let first = self.expect_ident()?;
                if self.eat(&TokenKind::Dot)? {
                    let sel = self.expect_ident()?;
                    let span = Span::new(start, sel.span.end);
                    Ok(TypeExpr {
                        id: self.id(),
                        kind: TypeExprKind::Qualified(first, sel),
                        span,
                    })
                } else {
                    let span = first.span;
                    Ok(TypeExpr {
                        id: self.id(),
                        kind: TypeExprKind::Name(first),
                        span,
                    })
                }
            }
            TokenKind::Star => {
                self.bump()?;
                let inner = self.parse_type()?;
                let span = Span::new(start, inner.span.end);
                Ok(TypeExpr {
                    id: self.id(),
                    kind: TypeExprKind::Pointer(Box::new(inner)),
                    span,
                })
            }
            TokenKind::LBracket => {
                self.bump()?;
                if self.eat(&TokenKind::RBracket)? {
                    let inner = self.parse_type()?;
                    let span = Span::new(start, inner.span.end);
                    return Ok(TypeExpr {
                        id: self.id(),
                        kind: TypeExprKind::Slice(Box::new(inner)),
                        span,
                    });
                }
                let len_tok = self.bump()?;
                let TokenKind::Int(text) = len_tok.kind else {
                    return Err(Diagnostic::new("expected array length", len_tok.span));
                };
                let len: u64 = text
                    .parse()
                    .map_err(|_| Diagnostic::new("invalid array length", len_tok.span))?;
                self.expect(&TokenKind::RBracket)?;
                let inner = self.parse_type()?;
                let span = Span::new(start, inner.span.end);
                Ok(TypeExpr {
                    id: self.id(),
                    kind: TypeExprKind::Array(len, Box::new(inner)),
                    span,
                })
            }
            TokenKind::KwMap => {
                self.bump()?;
                self.expect(&TokenKind::LBracket)?;
                let key = self.parse_type()?;
                self.expect(&TokenKind::RBracket)?;
                let value = self.parse_type()?;
                let span = Span::new(start, value.span.end);
                Ok(TypeExpr {
                    id: self.id(),
                    kind: TypeExprKind::Map(Box::new(key), Box::new(value)),
                    span,
                })
            }
            TokenKind::KwFunc => {
                self.bump()?;
                let params = self.parse_param_clause()?;
                let results = self.parse_results()?;
                let span = Span::new(start, self.lookahead.span.start);
                Ok(TypeExpr {
                    id: self.id(),
                    kind: TypeExprKind::Func(params, results),
                    span,
                })
            }
            TokenKind::KwStruct => self.parse_struct_type(),
            TokenKind::KwInterface => self.parse_interface_type(),
            TokenKind::LParen => {
                self.bump()?;
                let inner = self.parse_type()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            other => Err(self.error_here(format!("expected type, found {other:?}"))),
        }
    }

    fn type_starts_here(&self) -> bool {
        matches!(
            self.lookahead.kind,
            TokenKind::Ident(_)
                | TokenKind::Star
                | TokenKind::LBracket
                | TokenKind::KwMap
                | TokenKind::KwFunc
                | TokenKind::KwStruct
                | TokenKind::KwInterface
                | TokenKind::LParen
                | TokenKind::DotDotDot
        )
    }

    fn parse_struct_type(&mut self) -> Result<TypeExpr, Diagnostic> {
        let start = self.expect(&TokenKind::KwStruct)?.span.start;
        self.expect(&TokenKind::LBrace)?;
        let mut fields = Vec::new();
        loop {
            self.skip_semis()?;
            if self.at(&TokenKind::RBrace) {
                break;
            }
            fields.push(self.parse_field_decl()?);
            self.expect_semi()?;
        }
        let end = self.expect(&TokenKind::RBrace)?.span.end;
        Ok(TypeExpr {
            id: self.id(),
            kind: TypeExprKind::Struct(fields),
            span: Span::new(start, end),
        })
    }

    /// One struct field line: `a, b T`, `f T`, or an embedded `T` / `*T`.
    fn parse_field_decl(&mut self) -> Result<FieldDecl, Diagnostic> {
        let start = self.lookahead.span.start;
        if matches!(self.lookahead.kind, TokenKind::Ident(_)) {
            let first = self.expect_ident()?;
            if self.at(&TokenKind::Comma) {
                let mut names = vec![first];
                while self.eat(&TokenKind::Comma)? {
                    names.push(self.expect_ident()?);
                }
                let ty = self.parse_type()?;
                let span = Span::new(start, ty.span.end);
                return Ok(FieldDecl { names, ty, span });
            }
            if self.at(&TokenKind::Dot) {
                // Embedded qualified type.
                self.bump()?;
                let sel = self.expect_ident()?;
                let span = Span::new(start, sel.span.end);
                let ty = TypeExpr {
                    id: self.id(),
                    kind: TypeExprKind::Qualified(first, sel),
                    span,
                };
                return Ok(FieldDecl {
                    names: Vec::new(),
                    ty,
                    span,
                });
            }
            if self.type_starts_here() {
                let ty = self.parse_type()?;
                let span = Span::new(start, ty.span.end);
                return Ok(FieldDecl {
                    names: vec![first],
                    ty,
                    span,
                });
            }
            // Embedded plain name.
            let span = first.span;
            let ty = TypeExpr {
                id: self.id(),
                kind: TypeExprKind::Name(first),
                span,
            };
            return Ok(FieldDecl {
                names: Vec::new(),
                ty,
                span,
            });
        }
        // Embedded pointer or other type form.
        let ty = self.parse_type()?;
        let span = ty.span;
        Ok(FieldDecl {
            names: Vec::new(),
            ty,
            span,
        })
    }

    fn parse_interface_type(&mut self) -> Result<TypeExpr, Diagnostic> {
        let start = self.expect(&TokenKind::KwInterface)?.span.start;
        self.expect(&TokenKind::LBrace)?;
        let mut elems = Vec::new();
        loop {
            self.skip_semis()?;
            if self.at(&TokenKind::RBrace) {
                break;
            }
            let first = self.expect_ident()?;
            if self.at(&TokenKind::LParen) {
                let mstart = first.span.start;
                let params = self.parse_param_clause()?;
                let results = self.parse_results()?;
                let span = Span::new(mstart, self.lookahead.span.start);
                elems.push(InterfaceElem::Method {
                    name: first,
                    params,
                    results,
                    span,
                });
            } else if self.eat(&TokenKind::Dot)? {
                let sel = self.expect_ident()?;
                let span = Span::new(first.span.start, sel.span.end);
                elems.push(InterfaceElem::Embedded(TypeExpr {
                    id: self.id(),
                    kind: TypeExprKind::Qualified(first, sel),
                    span,
                }));
            } else {
                let span = first.span;
                elems.push(InterfaceElem::Embedded(TypeExpr {
                    id: self.id(),
                    kind: TypeExprKind::Name(first),
                    span,
                }));
            }
            self.expect_semi()?;
        }
        let end = self.expect(&TokenKind::RBrace)?.span.end;
        Ok(TypeExpr {
            id: self.id(),
            kind: TypeExprKind::Interface(elems),
            span: Span::new(start, end),
        })
    }

    /// Parenthesized parameter list, names optional. Handles grouped names
    /// (`a, b T`), anonymous lists (`(A, B)`), and a variadic tail.
    fn parse_param_clause(&mut self) -> Result<Vec<Param>, Diagnostic> {
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        if self.eat(&TokenKind::RParen)? {
            return Ok(params);
        }
        let raw = self.parse_raw_param_list()?;
        self.expect(&TokenKind::RParen)?;
        self.resolve_raw_params(raw)
    }

    fn parse_results(&mut self) -> Result<Vec<TypeExpr>, Diagnostic> {
        if self.at(&TokenKind::LParen) {
            self.bump()?;
            if self.eat(&TokenKind::RParen)? {
                return Ok(Vec::new());
            }
            let raw = self.parse_raw_param_list()?;
            self.expect(&TokenKind::RParen)?;
            let params = self.resolve_raw_params(raw)?;
            return Ok(params.into_iter().map(|p| p.ty).collect());
        }
        if self.type_starts_here()
            && !self.at(&TokenKind::LParen)
            && !matches!(self.lookahead.kind, TokenKind::DotDotDot)
        {
            return Ok(vec![self.parse_type()?]);
        }
        Ok(Vec::new())
    }

    fn parse_raw_param_list(&mut self) -> Result<Vec<RawParam>, Diagnostic> {
        let mut raw = Vec::new();
        loop {
            raw.push(self.parse_raw_param()?);
            if !self.eat(&TokenKind::Comma)? {
                break;
            }
        }
        Ok(raw)
    }

    /// One comma-separated element, which is either a bare type or a
    /// `name type` pair; the caller resolves the ambiguity over the whole
    /// list once it is complete.
    fn parse_raw_param(&mut self) -> Result<RawParam, Diagnostic> {
        let start = self.lookahead.span.start;
        if matches!(self.lookahead.kind, TokenKind::DotDotDot) {
            self.bump()?;
            let ty = self.parse_type()?;
            let span = Span::new(start, ty.span.end);
            return Ok(RawParam {
                head: ty,
                ty: None,
                variadic: true,
                span,
            });
        }
        let head = self.parse_type()?;
        if matches!(self.lookahead.kind, TokenKind::DotDotDot) {
            self.bump()?;
            let ty = self.parse_type()?;
            let span = Span::new(start, ty.span.end);
            return Ok(RawParam {
                head,
                ty: Some(ty),
                variadic: true,
                span,
            });
        }
        if self.type_starts_here() {
            let ty = self.parse_type()?;
            let span = Span::new(start, ty.span.end);
            return Ok(RawParam {
                head,
                ty: Some(ty),
                variadic: false,
                span,
            });
        }
        let span = head.span;
        Ok(RawParam {
            head,
            ty: None,
            variadic: false,
            span,
        })
    }

    fn resolve_raw_params(&mut self, raw: Vec<RawParam>) -> Result<Vec<Param>, Diagnostic> {
        let named_mode = raw.iter().any(|r| r.ty.is_some());
        let mut out = Vec::new();
        if !named_mode {
            for r in raw {
                out.push(Param {
                    name: None,
                    ty: r.head,
                    variadic: r.variadic,
                    span: r.span,
                });
            }
            return Ok(out);
        }
        // Named mode: bare elements are names sharing the type of the next
        // element that carries one.
        let mut pending: Vec<Ident> = Vec::new();
        for r in raw {
            let name = match r.head.kind {
                TypeExprKind::Name(id) => id,
                _ => {
                    return Err(Diagnostic::new(
                        "mixed named and unnamed parameters",
                        r.span,
                    ))
                }
            };
            match r.ty {
                None if !r.variadic => pending.push(name),
                None => {
                    return Err(Diagnostic::new("variadic parameter needs a type", r.span))
                }
                Some(ty) => {
                    for earlier in pending.drain(..) {
                        let span = earlier.span;
                        out.push(Param {
                            name: Some(earlier),
                            ty: self.clone_type(&ty),
                            variadic: false,
                            span,
                        });
                    }
                    let span = r.span;
                    out.push(Param {
                        name: Some(name),
                        ty,
                        variadic: r.variadic,
                        span,
                    });
                }
            }
        }
        if let Some(stray) = pending.first() {
            return Err(Diagnostic::new("parameter is missing a type", stray.span));
        }
        Ok(out)
    }

    /// Structural clone for a shared group type (`a, b T`); node ids stay the
    /// same, which is harmless since all copies resolve identically.
    fn clone_type(&mut self, ty: &TypeExpr) -> TypeExpr {
        ty.clone()
    }

    // ---- statements ----

    fn parse_block(&mut self) -> Result<Block, Diagnostic> {
        let start = self.expect(&TokenKind::LBrace)?.span.start;
        let saved = self.composite_ok;
        self.composite_ok = true;
        let mut stmts = Vec::new();
        loop {
            self.skip_semis()?;
            if self.at(&TokenKind::RBrace) {
                break;
            }
            stmts.push(self.parse_stmt()?);
        }
        let end = self.expect(&TokenKind::RBrace)?.span.end;
        self.composite_ok = saved;
        Ok(Block {
            stmts,
            span: Span::new(start, end),
        })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, Diagnostic> {
        match &self.lookahead.kind {
            TokenKind::KwVar => self.parse_var_stmt(),
            TokenKind::KwIf => self.parse_if_stmt(),
            TokenKind::KwFor => self.parse_for_stmt(),
            TokenKind::KwReturn => {
                let start = self.bump()?.span.start;
                let mut exprs = Vec::new();
                if !self.at(&TokenKind::Semi) && !self.at(&TokenKind::RBrace) {
                    exprs.push(self.parse_expr()?);
                    while self.eat(&TokenKind::Comma)? {
                        exprs.push(self.parse_expr()?);
                    }
                }
                let span = Span::new(start, self.lookahead.span.start);
                self.expect_semi()?;
                Ok(Stmt::Return { exprs, span })
            }
            TokenKind::KwGo => {
                let start = self.bump()?.span.start;
                let call = self.parse_expr()?;
                let span = Span::new(start, call.span.end);
                self.expect_semi()?;
                Ok(Stmt::Go { call, span })
            }
            TokenKind::KwDefer => {
                let start = self.bump()?.span.start;
                let call = self.parse_expr()?;
                let span = Span::new(start, call.span.end);
                self.expect_semi()?;
                Ok(Stmt::Defer { call, span })
            }
            TokenKind::KwBreak => {
                let span = self.bump()?.span;
                self.expect_semi()?;
                Ok(Stmt::Break(span))
            }
            TokenKind::KwContinue => {
                let span = self.bump()?.span;
                self.expect_semi()?;
                Ok(Stmt::Continue(span))
            }
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            _ => {
                let stmt = self.parse_simple_stmt()?;
                self.expect_semi()?;
                Ok(stmt)
            }
        }
    }

    fn parse_var_stmt(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.expect(&TokenKind::KwVar)?.span.start;
        let name = self.expect_ident()?;
        let ty = if self.type_starts_here() && !self.at(&TokenKind::Assign) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let value = if self.eat(&TokenKind::Assign)? {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let end = value
            .as_ref()
            .map(|e| e.span.end)
            .or(ty.as_ref().map(|t| t.span.end))
            .unwrap_or(name.span.end);
        let span = Span::new(start, end);
        self.expect_semi()?;
        Ok(Stmt::Var(VarStmt {
            name,
            ty,
            value,
            span,
        }))
    }

    /// Assignment, short declaration, inc/dec, or expression statement.
    fn parse_simple_stmt(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.lookahead.span.start;
        let mut lhs = vec![self.parse_expr()?];
        while self.eat(&TokenKind::Comma)? {
            lhs.push(self.parse_expr()?);
        }
        match &self.lookahead.kind {
            TokenKind::Assign | TokenKind::Define => {
                let define = matches!(self.lookahead.kind, TokenKind::Define);
                self.bump()?;
                let mut rhs = vec![self.parse_expr()?];
                while self.eat(&TokenKind::Comma)? {
                    rhs.push(self.parse_expr()?);
                }
                let end = rhs.last().map(|e| e.span.end).unwrap_or(start);
                Ok(Stmt::Assign(AssignStmt {
                    lhs,
                    rhs,
                    define,
                    span: Span::new(start, end),
                }))
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let tok = self.bump()?;
                if lhs.len() != 1 {
                    return Err(Diagnostic::new("cannot increment a list", tok.span));
                }
                let expr = lhs.pop().expect("length checked above");
                Ok(Stmt::IncDec {
                    expr,
                    span: Span::new(start, tok.span.end),
                })
            }
            _ => {
                if lhs.len() != 1 {
                    return Err(self.error_here("expected assignment after expression list"));
                }
                Ok(Stmt::Expr(lhs.pop().expect("length checked above")))
            }
        }
    }

    fn parse_if_stmt(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.expect(&TokenKind::KwIf)?.span.start;
        let saved = self.composite_ok;
        self.composite_ok = false;
        let first = self.parse_simple_stmt()?;
        let (init, cond) = if self.eat(&TokenKind::Semi)? {
            let cond_stmt = self.parse_simple_stmt()?;
            let cond = match cond_stmt {
                Stmt::Expr(e) => e,
                _ => {
                    self.composite_ok = saved;
                    return Err(self.error_here("expected condition expression"));
                }
            };
            (Some(Box::new(first)), cond)
        } else {
            match first {
                Stmt::Expr(e) => (None, e),
                _ => {
                    self.composite_ok = saved;
                    return Err(self.error_here("expected condition expression"));
                }
            }
        };
        self.composite_ok = saved;
        let then = self.parse_block()?;
        let els = if self.eat(&TokenKind::KwElse)? {
            if self.at(&TokenKind::KwIf) {
                Some(Box::new(self.parse_if_stmt()?))
            } else {
                Some(Box::new(Stmt::Block(self.parse_block()?)))
            }
        } else {
            None
        };
        let end = els
            .as_ref()
            .map(|s| stmt_end(s))
            .unwrap_or(then.span.end);
        Ok(Stmt::If(IfStmt {
            init,
            cond,
            then,
            els,
            span: Span::new(start, end),
        }))
    }

    fn parse_for_stmt(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.expect(&TokenKind::KwFor)?.span.start;
        let saved = self.composite_ok;
        self.composite_ok = false;
        let mut init = None;
        let mut cond = None;
        let mut post = None;
        if !self.at(&TokenKind::LBrace) {
            if self.at(&TokenKind::Semi) {
                self.bump()?;
            } else {
                let first = self.parse_simple_stmt()?;
                if self.at(&TokenKind::LBrace) {
                    match first {
                        Stmt::Expr(e) => cond = Some(e),
                        _ => {
                            self.composite_ok = saved;
                            return Err(self.error_here("expected loop condition"));
                        }
                    }
                } else {
                    init = Some(Box::new(first));
                    self.expect(&TokenKind::Semi)?;
                }
            }
            if cond.is_none() && !self.at(&TokenKind::LBrace) {
                if !self.at(&TokenKind::Semi) {
                    let c = self.parse_simple_stmt()?;
                    match c {
                        Stmt::Expr(e) => cond = Some(e),
                        _ => {
                            self.composite_ok = saved;
                            return Err(self.error_here("expected loop condition"));
                        }
                    }
                }
                if init.is_some() || self.at(&TokenKind::Semi) {
                    self.expect(&TokenKind::Semi)?;
                    if !self.at(&TokenKind::LBrace) {
                        post = Some(Box::new(self.parse_simple_stmt()?));
                    }
                }
            }
        }
        self.composite_ok = saved;
        let body = self.parse_block()?;
        let span = Span::new(start, body.span.end);
        Ok(Stmt::For(ForStmt {
            init,
            cond,
            post,
            body,
            span,
        }))
    }

    // ---- expressions ----

    pub fn parse_expr(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_binary(1)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, Diagnostic> {
        let mut lhs = self.parse_unary()?;
        loop {
            let Some((op, prec)) = binary_op(&self.lookahead.kind) else {
                return Ok(lhs);
            };
            if prec < min_prec {
                return Ok(lhs);
            }
            self.bump()?;
            let rhs = self.parse_binary(prec + 1)?;
            let span = Span::new(lhs.span.start, rhs.span.end);
            lhs = Expr {
                id: self.id(),
                kind: ExprKind::Binary {
                    op,
                    x: Box::new(lhs),
                    y: Box::new(rhs),
                },
                span,
            };
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, Diagnostic> {
        let op = match self.lookahead.kind {
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Not => Some(UnOp::Not),
            TokenKind::Amp => Some(UnOp::Addr),
            TokenKind::Star => Some(UnOp::Deref),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.bump()?.span.start;
            let x = self.parse_unary()?;
            let span = Span::new(start, x.span.end);
            return Ok(Expr {
                id: self.id(),
                kind: ExprKind::Unary { op, x: Box::new(x) },
                span,
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_operand()?;
        loop {
            match &self.lookahead.kind {
                TokenKind::Dot => {
                    self.bump()?;
                    let sel = self.expect_ident()?;
                    let span = Span::new(expr.span.start, sel.span.end);
                    expr = Expr {
                        id: self.id(),
                        kind: ExprKind::Selector {
                            x: Box::new(expr),
                            sel,
                        },
                        span,
                    };
                }
                TokenKind::LParen => {
                    self.bump()?;
                    let mut args = Vec::new();
                    if !self.at(&TokenKind::RParen) {
                        args.push(self.parse_expr()?);
                        while self.eat(&TokenKind::Comma)? {
                            if self.at(&TokenKind::RParen) {
                                break;
                            }
                            args.push(self.parse_expr()?);
                        }
                    }
                    let end = self.expect(&TokenKind::RParen)?.span.end;
                    let span = Span::new(expr.span.start, end);
                    expr = Expr {
                        id: self.id(),
                        kind: ExprKind::Call {
                            fun: Box::new(expr),
                            args,
                        },
                        span,
                    };
                }
                TokenKind::LBracket => {
                    self.bump()?;
                    let index = self.parse_expr()?;
                    let end = self.expect(&TokenKind::RBracket)?.span.end;
                    let span = Span::new(expr.span.start, end);
                    expr = Expr {
                        id: self.id(),
                        kind: ExprKind::Index {
                            x: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    };
                }
                TokenKind::LBrace if self.composite_ok => {
                    let Some(ty) = self.expr_as_type(&expr) else {
                        return Ok(expr);
                    };
                    let elems = self.parse_composite_body()?;
                    let span = Span::new(expr.span.start, self.prev_end());
                    expr = Expr {
                        id: self.id(),
                        kind: ExprKind::Composite { ty, elems },
                        span,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn prev_end(&self) -> usize {
        self.lookahead.span.start
    }

    /// Reinterprets a parsed operand as the type of a composite literal.
    fn expr_as_type(&mut self, expr: &Expr) -> Option<TypeExpr> {
        match &expr.kind {
            ExprKind::Name(id) => Some(TypeExpr {
                id: self.id(),
                kind: TypeExprKind::Name(id.clone()),
                span: expr.span,
            }),
            ExprKind::Selector { x, sel } => match &x.kind {
                ExprKind::Name(pkg) => Some(TypeExpr {
                    id: self.id(),
                    kind: TypeExprKind::Qualified(pkg.clone(), sel.clone()),
                    span: expr.span,
                }),
                _ => None,
            },
            _ => None,
        }
    }

    fn parse_composite_body(&mut self) -> Result<Vec<CompositeElem>, Diagnostic> {
        self.expect(&TokenKind::LBrace)?;
        let saved = self.composite_ok;
        self.composite_ok = true;
        let mut elems = Vec::new();
        loop {
            self.skip_semis()?;
            if self.at(&TokenKind::RBrace) {
                break;
            }
            let first = self.parse_expr()?;
            if self.eat(&TokenKind::Colon)? {
                let value = self.parse_expr()?;
                elems.push(CompositeElem::KeyValue { key: first, value });
            } else {
                elems.push(CompositeElem::Value(first));
            }
            if !self.eat(&TokenKind::Comma)? {
                self.skip_semis()?;
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        self.composite_ok = saved;
        Ok(elems)
    }

    fn parse_operand(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.lookahead.span.start;
        match &self.lookahead.kind {
            TokenKind::Ident(_) => {
                let id = self.expect_ident()?;
                let span = id.span;
                Ok(Expr {
                    id: self.id(),
                    kind: ExprKind::Name(id),
                    span,
                })
            }
            TokenKind::Int(_) => {
                let tok = self.bump()?;
                let TokenKind::Int(text) = tok.kind else {
                    unreachable!()
                };
                Ok(Expr {
                    id: self.id(),
                    kind: ExprKind::IntLit(text),
                    span: tok.span,
                })
            }
            TokenKind::Float(_) => {
                let tok = self.bump()?;
                let TokenKind::Float(text) = tok.kind else {
                    unreachable!()
                };
                Ok(Expr {
                    id: self.id(),
                    kind: ExprKind::FloatLit(text),
                    span: tok.span,
                })
            }
            TokenKind::Str(_) => {
                let tok = self.bump()?;
                let TokenKind::Str(text) = tok.kind else {
                    unreachable!()
                };
                Ok(Expr {
                    id: self.id(),
                    kind: ExprKind::StrLit(text),
                    span: tok.span,
                })
            }
            TokenKind::LParen => {
                self.bump()?;
                let saved = self.composite_ok;
                self.composite_ok = true;
                let inner = self.parse_expr()?;
                self.composite_ok = saved;
                let end = self.expect(&TokenKind::RParen)?.span.end;
                Ok(Expr {
                    id: self.id(),
                    kind: ExprKind::Paren(Box::new(inner)),
                    span: Span::new(start, end),
                })
            }
            TokenKind::KwFunc => {
                self.bump()?;
                let params = self.parse_param_clause()?;
                let results = self.parse_results()?;
                let body = self.parse_block()?;
                let span = Span::new(start, body.span.end);
                Ok(Expr {
                    id: self.id(),
                    kind: ExprKind::FuncLit {
                        params,
                        results,
                        body,
                    },
                    span,
                })
            }
            // Type-led composite literals: `[]T{...}`, `[N]T{...}`,
            // `map[K]V{...}`, `struct{...}{...}`.
            TokenKind::LBracket | TokenKind::KwMap | TokenKind::KwStruct => {
                let ty = self.parse_type()?;
                let elems = self.parse_composite_body()?;
                let span = Span::new(start, self.prev_end());
                Ok(Expr {
                    id: self.id(),
                    kind: ExprKind::Composite { ty, elems },
                    span,
                })
            }
            other => Err(self.error_here(format!("expected expression, found {other:?}"))),
        }
    }
}

struct RawParam {
    head: TypeExpr,
    ty: Option<TypeExpr>,
    variadic: bool,
    span: Span,
}

fn binary_op(kind: &TokenKind) -> Option<(BinOp, u8)> {
    Some(match kind {
        TokenKind::OrOr => (BinOp::LOr, 1),
        TokenKind::AndAnd => (BinOp::LAnd, 2),
        TokenKind::Eq => (BinOp::Eq, 3),
        TokenKind::NotEq => (BinOp::NotEq, 3),
        TokenKind::Lt => (BinOp::Lt, 3),
        TokenKind::Gt => (BinOp::Gt, 3),
        TokenKind::Le => (BinOp::Le, 3),
        TokenKind::Ge => (BinOp::Ge, 3),
        TokenKind::Plus => (BinOp::Add, 4),
        TokenKind::Minus => (BinOp::Sub, 4),
        TokenKind::Star => (BinOp::Mul, 5),
        TokenKind::Slash => (BinOp::Div, 5),
        TokenKind::Percent => (BinOp::Rem, 5),
        _ => return None,
    })
}

fn stmt_end(s: &Stmt) -> usize {
    match s {
        Stmt::Expr(e) => e.span.end,
        Stmt::Var(v) => v.span.end,
        Stmt::Assign(a) => a.span.end,
        Stmt::IncDec { span, .. } => span.end,
        Stmt::If(i) => i.span.end,
        Stmt::For(f) => f.span.end,
        Stmt::Return { span, .. } => span.end,
        Stmt::Go { span, .. } => span.end,
        Stmt::Defer { span, .. } => span.end,
        Stmt::Block(b) => b.span.end,
        Stmt::Break(s) | Stmt::Continue(s) => s.end,
    }
}
