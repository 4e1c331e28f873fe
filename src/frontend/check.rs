//! Name resolution and type checking.
//!
//! Two passes per package: declaration collection (named types, methods,
//! function signatures), then body checking. The output is the typed-program
//! contract the analyzer consumes: per-identifier object resolution, per-
//! expression types, and the package's top-level scope.
//!
//! This is a linter front-end, not a compiler: it resolves names and computes
//! types, but does not verify assignability. Anything it cannot make sense of
//! becomes a load error for the package.

use crate::frontend::ast::*;
use crate::frontend::source::Diagnostic;
use crate::frontend::types::*;
use std::collections::HashMap;

/// Exported view of a loaded package, used to resolve qualified names from
/// importing packages.
#[derive(Debug, Clone)]
pub struct PkgExport {
    pub name: String,
    pub objects: HashMap<String, ObjId>,
}

/// A fully checked package: syntax plus the semantic side tables.
pub struct PackageInfo {
    pub path: String,
    pub name: String,
    pub files: Vec<File>,
    /// Identifier node -> object it refers to.
    pub uses: HashMap<NodeId, ObjId>,
    /// Identifier node -> object it declares.
    pub defs: HashMap<NodeId, ObjId>,
    /// Expression / type-expression node -> its type.
    pub expr_types: HashMap<NodeId, TypeId>,
    /// Import paths this package depends on.
    pub imports: Vec<String>,
    /// Package-level objects, for catalog construction.
    pub scope: Vec<ObjId>,
}

pub fn check_package(
    table: &mut TypeTable,
    pkg_scopes: &HashMap<String, PkgExport>,
    path: &str,
    files: Vec<File>,
) -> Result<PackageInfo, Diagnostic> {
    let name = files
        .first()
        .map(|f| f.package.name.clone())
        .ok_or_else(|| Diagnostic::new("package has no source files", Default::default()))?;
    for f in &files {
        if f.package.name != name {
            return Err(Diagnostic::new(
                format!(
                    "found packages {} and {} in the same directory",
                    name, f.package.name
                ),
                f.package.span,
            ));
        }
    }

    let universe = table.universe().clone();
    let mut c = Checker {
        table,
        pkg_scopes,
        path: path.to_string(),
        uses: HashMap::new(),
        defs: HashMap::new(),
        expr_types: HashMap::new(),
        scopes: vec![universe, HashMap::new()],
        diags: Vec::new(),
    };

    c.collect_decls(&files);
    c.resolve_underlyings(&files);
    c.resolve_signatures(&files);
    c.check_bodies(&files);

    if let Some(d) = c.diags.into_iter().next() {
        return Err(d);
    }

    let scope = {
        let mut objs: Vec<(String, ObjId)> = c.scopes[1]
            .iter()
            .map(|(n, &o)| (n.clone(), o))
            .collect();
        objs.sort();
        objs.into_iter().map(|(_, o)| o).collect()
    };
    let mut imports: Vec<String> = files
        .iter()
        .flat_map(|f| f.imports.iter().map(|i| i.path.clone()))
        .collect();
    imports.sort();
    imports.dedup();

    Ok(PackageInfo {
        path: path.to_string(),
        name,
        files,
        uses: c.uses,
        defs: c.defs,
        expr_types: c.expr_types,
        imports,
        scope,
    })
}

struct Checker<'a> {
    table: &'a mut TypeTable,
    pkg_scopes: &'a HashMap<String, PkgExport>,
    path: String,
    uses: HashMap<NodeId, ObjId>,
    defs: HashMap<NodeId, ObjId>,
    expr_types: HashMap<NodeId, TypeId>,
    /// Innermost last; [0] is the universe, [1] the package scope.
    scopes: Vec<HashMap<String, ObjId>>,
    diags: Vec<Diagnostic>,
}

impl<'a> Checker<'a> {
    fn error(&mut self, message: impl Into<String>, span: crate::frontend::source::Span) {
        self.diags.push(Diagnostic::new(message, span));
    }

    fn lookup(&self, name: &str) -> Option<ObjId> {
        for scope in self.scopes.iter().rev() {
            if let Some(&obj) = scope.get(name) {
                return Some(obj);
            }
        }
        None
    }

    fn declare_pkg(&mut self, ident: &Ident, obj: ObjId) {
        self.defs.insert(ident.id, obj);
        if self.scopes[1].insert(ident.name.clone(), obj).is_some() {
            self.error(format!("{} redeclared in this package", ident.name), ident.span);
        }
    }

    fn declare_local(&mut self, ident: &Ident, ty: TypeId) -> ObjId {
        let obj = self.table.alloc_obj(Object {
            name: ident.name.clone(),
            kind: ObjKind::Var,
            ty,
            span: ident.span,
            pkg: self.path.clone(),
        });
        self.defs.insert(ident.id, obj);
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .insert(ident.name.clone(), obj);
        obj
    }

    // ---- declaration collection ----

    fn collect_decls(&mut self, files: &[File]) {
        for file in files {
            for decl in &file.decls {
                match decl {
                    Decl::Type(td) => {
                        let invalid = self.table.t_invalid;
                        let named = self.table.alloc(Type::Named(NamedType {
                            pkg: self.path.clone(),
                            name: td.name.name.clone(),
                            underlying: invalid,
                            methods: Vec::new(),
                        }));
                        let obj = self.table.alloc_obj(Object {
                            name: td.name.name.clone(),
                            kind: ObjKind::TypeName,
                            ty: named,
                            span: td.name.span,
                            pkg: self.path.clone(),
                        });
                        self.declare_pkg(&td.name, obj);
                    }
                    Decl::Func(fd) if fd.recv.is_none() => {
                        let invalid = self.table.t_invalid;
                        let obj = self.table.alloc_obj(Object {
                            name: fd.name.name.clone(),
                            kind: ObjKind::Func,
                            ty: invalid,
                            span: fd.name.span,
                            pkg: self.path.clone(),
                        });
                        self.declare_pkg(&fd.name, obj);
                    }
                    Decl::Func(_) => {}
                }
            }
        }
    }

    fn file_scope(&mut self, file: &File) -> HashMap<String, ObjId> {
        let mut scope = HashMap::new();
        for imp in &file.imports {
            let local = imp
                .alias
                .as_ref()
                .map(|a| a.name.clone())
                .unwrap_or_else(|| {
                    imp.path
                        .rsplit('/')
                        .next()
                        .unwrap_or(imp.path.as_str())
                        .to_string()
                });
            let invalid = self.table.t_invalid;
            let obj = self.table.alloc_obj(Object {
                name: local.clone(),
                kind: ObjKind::PkgName(imp.path.clone()),
                ty: invalid,
                span: imp.span,
                pkg: self.path.clone(),
            });
            scope.insert(local, obj);
        }
        scope
    }

    fn resolve_underlyings(&mut self, files: &[File]) {
        for file in files {
            let scope = self.file_scope(file);
            self.scopes.push(scope);
            for decl in &file.decls {
                if let Decl::Type(td) = decl {
                    let Some(&obj) = self.defs.get(&td.name.id) else {
                        continue;
                    };
                    let named = self.table.obj(obj).ty;
                    let under = self.resolve_type(&td.ty);
                    self.table.set_underlying(named, under);
                }
            }
            self.scopes.pop();
        }
    }

    fn resolve_signatures(&mut self, files: &[File]) {
        for file in files {
            let scope = self.file_scope(file);
            self.scopes.push(scope);
            for decl in &file.decls {
                let Decl::Func(fd) = decl else { continue };
                let sig = self.resolve_sig(&fd.params, &fd.results);
                let fty = self.table.alloc(Type::Func(sig.clone()));
                match &fd.recv {
                    None => {
                        if let Some(&obj) = self.defs.get(&fd.name.id) {
                            self.table.set_obj_ty(obj, fty);
                        }
                    }
                    Some(recv) => {
                        let obj = self.table.alloc_obj(Object {
                            name: fd.name.name.clone(),
                            kind: ObjKind::Func,
                            ty: fty,
                            span: fd.name.span,
                            pkg: self.path.clone(),
                        });
                        self.defs.insert(fd.name.id, obj);
                        match self.receiver_base(&recv.ty) {
                            Some(named) => self.table.add_named_method(
                                named,
                                Method {
                                    name: fd.name.name.clone(),
                                    sig,
                                },
                            ),
                            None => self.error("invalid receiver type", recv.span),
                        }
                    }
                }
            }
            self.scopes.pop();
        }
    }

    /// The named type a method receiver attaches to, unwrapping a pointer.
    fn receiver_base(&mut self, te: &TypeExpr) -> Option<TypeId> {
        let name = match &te.kind {
            TypeExprKind::Name(id) => id,
            TypeExprKind::Pointer(inner) => match &inner.kind {
                TypeExprKind::Name(id) => id,
                _ => return None,
            },
            _ => return None,
        };
        let obj = *self.scopes[1].get(&name.name)?;
        self.uses.insert(name.id, obj);
        let o = self.table.obj(obj);
        if o.kind == ObjKind::TypeName {
            Some(o.ty)
        } else {
            None
        }
    }

    // ---- type resolution ----

    fn resolve_type(&mut self, te: &TypeExpr) -> TypeId {
        let ty = self.resolve_type_inner(te);
        self.expr_types.insert(te.id, ty);
        ty
    }

    fn resolve_type_inner(&mut self, te: &TypeExpr) -> TypeId {
        match &te.kind {
            TypeExprKind::Name(id) => match self.lookup(&id.name) {
                Some(obj) => {
                    self.uses.insert(id.id, obj);
                    let o = self.table.obj(obj);
                    if o.kind == ObjKind::TypeName {
                        o.ty
                    } else {
                        self.error(format!("{} is not a type", id.name), id.span);
                        self.table.t_invalid
                    }
                }
                None => {
                    self.error(format!("undefined: {}", id.name), id.span);
                    self.table.t_invalid
                }
            },
            TypeExprKind::Qualified(pkg, name) => self.resolve_qualified(pkg, name, true),
            TypeExprKind::Pointer(inner) => {
                let elem = self.resolve_type(inner);
                self.table.alloc(Type::Pointer(elem))
            }
            TypeExprKind::Slice(inner) => {
                let elem = self.resolve_type(inner);
                self.table.alloc(Type::Slice(elem))
            }
            TypeExprKind::Array(len, inner) => {
                let elem = self.resolve_type(inner);
                self.table.alloc(Type::Array(*len, elem))
            }
            TypeExprKind::Map(key, value) => {
                let k = self.resolve_type(key);
                let v = self.resolve_type(value);
                self.table.alloc(Type::Map(k, v))
            }
            TypeExprKind::Func(params, results) => {
                let sig = self.resolve_sig(params, results);
                self.table.alloc(Type::Func(sig))
            }
            TypeExprKind::Struct(fields) => {
                let mut infos = Vec::new();
                for field in fields {
                    let ty = self.resolve_type(&field.ty);
                    if field.names.is_empty() {
                        let name = embedded_field_name(&field.ty).unwrap_or_default();
                        if name.is_empty() {
                            self.error("invalid embedded field", field.span);
                        }
                        infos.push(FieldInfo {
                            name,
                            ty,
                            embedded: true,
                        });
                    } else {
                        for n in &field.names {
                            infos.push(FieldInfo {
                                name: n.name.clone(),
                                ty,
                                embedded: false,
                            });
                        }
                    }
                }
                self.table.alloc(Type::Struct(StructType { fields: infos }))
            }
            TypeExprKind::Interface(elems) => {
                let mut methods = Vec::new();
                let mut embeddeds = Vec::new();
                for elem in elems {
                    match elem {
                        InterfaceElem::Method {
                            name,
                            params,
                            results,
                            ..
                        } => {
                            let sig = self.resolve_sig(params, results);
                            methods.push(Method {
                                name: name.name.clone(),
                                sig,
                            });
                        }
                        InterfaceElem::Embedded(te) => {
                            let t = self.resolve_type(te);
                            embeddeds.push(t);
                        }
                    }
                }
                self.table
                    .alloc(Type::Interface(InterfaceType { methods, embeddeds }))
            }
        }
    }

    fn resolve_qualified(&mut self, pkg: &Ident, name: &Ident, want_type: bool) -> TypeId {
        let Some(pkg_obj) = self.lookup(&pkg.name) else {
            self.error(format!("undefined: {}", pkg.name), pkg.span);
            return self.table.t_invalid;
        };
        let ObjKind::PkgName(path) = self.table.obj(pkg_obj).kind.clone() else {
            self.error(format!("{} is not a package", pkg.name), pkg.span);
            return self.table.t_invalid;
        };
        self.uses.insert(pkg.id, pkg_obj);
        let Some(export) = self.pkg_scopes.get(&path) else {
            self.error(format!("package {path} not loaded"), pkg.span);
            return self.table.t_invalid;
        };
        let obj = export
            .objects
            .get(&name.name)
            .copied()
            .filter(|_| is_exported(&name.name));
        let Some(obj) = obj else {
            self.error(format!("undefined: {}.{}", pkg.name, name.name), name.span);
            return self.table.t_invalid;
        };
        self.uses.insert(name.id, obj);
        let (is_type, ty) = {
            let o = self.table.obj(obj);
            (o.kind == ObjKind::TypeName, o.ty)
        };
        if want_type && !is_type {
            self.error(
                format!("{}.{} is not a type", pkg.name, name.name),
                name.span,
            );
            return self.table.t_invalid;
        }
        ty
    }

    fn resolve_sig(&mut self, params: &[Param], results: &[TypeExpr]) -> Signature {
        let mut ptypes = Vec::new();
        let mut variadic = false;
        for p in params {
            let t = self.resolve_type(&p.ty);
            if p.variadic {
                variadic = true;
                let slice = self.table.alloc(Type::Slice(t));
                ptypes.push(slice);
            } else {
                ptypes.push(t);
            }
        }
        let rtypes = results.iter().map(|r| self.resolve_type(r)).collect();
        Signature {
            params: ptypes,
            results: rtypes,
            variadic,
        }
    }

    // ---- body checking ----

    fn check_bodies(&mut self, files: &[File]) {
        for file in files {
            let scope = self.file_scope(file);
            self.scopes.push(scope);
            for decl in &file.decls {
                let Decl::Func(fd) = decl else { continue };
                let Some(body) = &fd.body else { continue };
                self.scopes.push(HashMap::new());
                if let Some(recv) = &fd.recv {
                    self.declare_param(recv);
                }
                for p in &fd.params {
                    self.declare_param(p);
                }
                self.check_block(body);
                self.scopes.pop();
            }
            self.scopes.pop();
        }
    }

    fn declare_param(&mut self, p: &Param) {
        let mut ty = self.resolve_type(&p.ty);
        if p.variadic {
            ty = self.table.alloc(Type::Slice(ty));
        }
        if let Some(name) = &p.name {
            if name.name != "_" {
                self.declare_local(name, ty);
            }
        }
    }

    fn check_block(&mut self, block: &Block) {
        self.scopes.push(HashMap::new());
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
        self.scopes.pop();
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(e) => {
                self.check_expr(e);
            }
            Stmt::Var(vs) => {
                let ann = vs.ty.as_ref().map(|te| self.resolve_type(te));
                let vt = vs.value.as_ref().map(|e| self.check_expr(e));
                let ty = ann
                    .or_else(|| vt.map(|t| self.default_type(t)))
                    .unwrap_or(self.table.t_invalid);
                if vs.name.name != "_" {
                    self.declare_local(&vs.name, ty);
                }
            }
            Stmt::Assign(a) => self.check_assign(a),
            Stmt::IncDec { expr, .. } => {
                self.check_expr(expr);
            }
            Stmt::If(i) => {
                self.scopes.push(HashMap::new());
                if let Some(init) = &i.init {
                    self.check_stmt(init);
                }
                self.check_expr(&i.cond);
                self.check_block(&i.then);
                if let Some(els) = &i.els {
                    self.check_stmt(els);
                }
                self.scopes.pop();
            }
            Stmt::For(f) => {
                self.scopes.push(HashMap::new());
                if let Some(init) = &f.init {
                    self.check_stmt(init);
                }
                if let Some(cond) = &f.cond {
                    self.check_expr(cond);
                }
                if let Some(post) = &f.post {
                    self.check_stmt(post);
                }
                self.check_block(&f.body);
                self.scopes.pop();
            }
            Stmt::Return { exprs, .. } => {
                for e in exprs {
                    self.check_expr(e);
                }
            }
            Stmt::Go { call, .. } | Stmt::Defer { call, .. } => {
                self.check_expr(call);
            }
            Stmt::Block(b) => self.check_block(b),
            Stmt::Break(_) | Stmt::Continue(_) => {}
        }
    }

    fn check_assign(&mut self, a: &AssignStmt) {
        let rhs_types: Vec<TypeId> = a.rhs.iter().map(|e| self.check_expr(e)).collect();
        if !a.define {
            for l in &a.lhs {
                self.check_expr(l);
            }
            return;
        }
        // Short declaration: every plain name on the left declares a new
        // variable unless it already exists in the innermost scope.
        let spread: Option<Vec<TypeId>> = if a.rhs.len() == 1 && a.lhs.len() > 1 {
            match self.table.ty(rhs_types[0]) {
                Type::Tuple(ts) => Some(ts.clone()),
                _ => None,
            }
        } else {
            None
        };
        for (i, l) in a.lhs.iter().enumerate() {
            let ExprKind::Name(ident) = &l.kind else {
                self.error("cannot declare into a non-identifier", l.span);
                continue;
            };
            if ident.name == "_" {
                let invalid = self.table.t_invalid;
                self.expr_types.insert(l.id, invalid);
                continue;
            }
            let raw = spread
                .as_ref()
                .and_then(|ts| ts.get(i).copied())
                .or_else(|| rhs_types.get(i).copied())
                .unwrap_or(self.table.t_invalid);
            let ty = self.default_type(raw);
            let existing = self
                .scopes
                .last()
                .and_then(|s| s.get(&ident.name).copied());
            match existing {
                Some(obj) => {
                    self.uses.insert(ident.id, obj);
                    self.expr_types.insert(l.id, self.table.obj(obj).ty);
                }
                None => {
                    self.declare_local(ident, ty);
                    self.expr_types.insert(l.id, ty);
                }
            }
        }
    }

    fn default_type(&self, t: TypeId) -> TypeId {
        match self.table.ty(t) {
            Type::Basic(BasicKind::UntypedInt) => self.table.basic(BasicKind::Int),
            Type::Basic(BasicKind::UntypedFloat) => self.table.basic(BasicKind::Float64),
            Type::Basic(BasicKind::UntypedString) => self.table.basic(BasicKind::String),
            Type::Basic(BasicKind::UntypedBool) => self.table.basic(BasicKind::Bool),
            Type::Basic(BasicKind::UntypedNil) => self.table.t_invalid,
            _ => t,
        }
    }

    /// If `fun` names a type, this call is a conversion; resolves and
    /// records the callee and returns the target type.
    fn conversion_target(&mut self, fun: &Expr) -> Option<TypeId> {
        match &fun.kind {
            ExprKind::Name(id) => {
                let obj = self.lookup(&id.name)?;
                if self.table.obj(obj).kind != ObjKind::TypeName {
                    return None;
                }
                self.uses.insert(id.id, obj);
                let ty = self.table.obj(obj).ty;
                self.expr_types.insert(fun.id, ty);
                Some(ty)
            }
            ExprKind::Selector { x, sel } => {
                let ExprKind::Name(pkg) = &x.kind else {
                    return None;
                };
                let pkg_obj = self.lookup(&pkg.name)?;
                let ObjKind::PkgName(path) = self.table.obj(pkg_obj).kind.clone() else {
                    return None;
                };
                let export = self.pkg_scopes.get(&path)?;
                let obj = export.objects.get(&sel.name).copied()?;
                if self.table.obj(obj).kind != ObjKind::TypeName || !is_exported(&sel.name) {
                    return None;
                }
                self.uses.insert(pkg.id, pkg_obj);
                self.uses.insert(sel.id, obj);
                let ty = self.table.obj(obj).ty;
                let invalid = self.table.t_invalid;
                self.expr_types.insert(x.id, invalid);
                self.expr_types.insert(fun.id, ty);
                Some(ty)
            }
            ExprKind::Paren(inner) => self.conversion_target(inner),
            _ => None,
        }
    }

    fn check_expr(&mut self, e: &Expr) -> TypeId {
        let t = self.check_expr_inner(e);
        self.expr_types.insert(e.id, t);
        t
    }

    fn check_expr_inner(&mut self, e: &Expr) -> TypeId {
        match &e.kind {
            ExprKind::Name(ident) => {
                if ident.name == "_" {
                    return self.table.t_invalid;
                }
                match self.lookup(&ident.name) {
                    Some(obj) => {
                        self.uses.insert(ident.id, obj);
                        self.table.obj(obj).ty
                    }
                    None => {
                        self.error(format!("undefined: {}", ident.name), ident.span);
                        self.table.t_invalid
                    }
                }
            }
            ExprKind::IntLit(_) => self.table.basic(BasicKind::UntypedInt),
            ExprKind::FloatLit(_) => self.table.basic(BasicKind::UntypedFloat),
            ExprKind::StrLit(_) => self.table.basic(BasicKind::UntypedString),
            ExprKind::Selector { x, sel } => self.check_selector(x, sel),
            ExprKind::Call { fun, args } => self.check_call(fun, args),
            ExprKind::Unary { op, x } => {
                let xt = self.check_expr(x);
                match op {
                    UnOp::Not => self.table.basic(BasicKind::Bool),
                    UnOp::Neg => xt,
                    UnOp::Addr => self.table.alloc(Type::Pointer(xt)),
                    UnOp::Deref => match self.table.ty(self.table.underlying(xt)) {
                        Type::Pointer(elem) => *elem,
                        _ => self.table.t_invalid,
                    },
                }
            }
            ExprKind::Binary { op, x, y } => {
                let xt = self.check_expr(x);
                let yt = self.check_expr(y);
                match op {
                    BinOp::Eq
                    | BinOp::NotEq
                    | BinOp::Lt
                    | BinOp::Gt
                    | BinOp::Le
                    | BinOp::Ge
                    | BinOp::LAnd
                    | BinOp::LOr => self.table.basic(BasicKind::Bool),
                    _ => {
                        if self.is_untyped(xt) {
                            yt
                        } else {
                            xt
                        }
                    }
                }
            }
            ExprKind::Index { x, index } => {
                self.check_expr(index);
                let xt = self.check_expr(x);
                match self.table.ty(self.table.underlying(xt)) {
                    Type::Slice(elem) | Type::Array(_, elem) => *elem,
                    Type::Map(_, value) => *value,
                    Type::Basic(BasicKind::String) | Type::Basic(BasicKind::UntypedString) => {
                        self.table.basic(BasicKind::Uint8)
                    }
                    _ => self.table.t_invalid,
                }
            }
            ExprKind::Composite { ty, elems } => {
                let t = self.resolve_type(ty);
                self.check_composite_elems(t, elems);
                t
            }
            ExprKind::FuncLit {
                params,
                results,
                body,
            } => {
                let sig = self.resolve_sig(params, results);
                self.scopes.push(HashMap::new());
                for p in params {
                    self.declare_param(p);
                }
                self.check_block(body);
                self.scopes.pop();
                self.table.alloc(Type::Func(sig))
            }
            ExprKind::Paren(inner) => self.check_expr(inner),
        }
    }

    fn check_selector(&mut self, x: &Expr, sel: &Ident) -> TypeId {
        // Package-qualified reference.
        if let ExprKind::Name(pkg) = &x.kind {
            if let Some(pkg_obj) = self.lookup(&pkg.name) {
                if let ObjKind::PkgName(path) = self.table.obj(pkg_obj).kind.clone() {
                    self.uses.insert(pkg.id, pkg_obj);
                    let invalid = self.table.t_invalid;
                    self.expr_types.insert(x.id, invalid);
                    let obj = self
                        .pkg_scopes
                        .get(&path)
                        .and_then(|e| e.objects.get(&sel.name).copied())
                        .filter(|_| is_exported(&sel.name));
                    return match obj {
                        Some(o) => {
                            self.uses.insert(sel.id, o);
                            self.table.obj(o).ty
                        }
                        None => {
                            self.error(
                                format!("undefined: {}.{}", pkg.name, sel.name),
                                sel.span,
                            );
                            self.table.t_invalid
                        }
                    };
                }
            }
        }

        let xt = self.check_expr(x);
        if matches!(self.table.ty(xt), Type::Invalid) {
            return self.table.t_invalid;
        }
        if let Some(sig) = self.table.methods_of(xt).get(&sel.name) {
            let sig = sig.clone();
            return self.table.alloc(Type::Func(sig));
        }
        if let Some(ft) = self.table.field_of(xt, &sel.name) {
            return ft;
        }
        self.error(format!("no field or method {}", sel.name), sel.span);
        self.table.t_invalid
    }

    fn check_call(&mut self, fun: &Expr, args: &[Expr]) -> TypeId {
        if let Some(target) = self.conversion_target(fun) {
            for a in args {
                self.check_expr(a);
            }
            return target;
        }
        let ft = self.check_expr(fun);
        for a in args {
            self.check_expr(a);
        }
        if let ExprKind::Name(id) = &fun.kind {
            if let Some(&obj) = self.uses.get(&id.id) {
                if let ObjKind::Builtin(b) = self.table.obj(obj).kind {
                    return match b {
                        Builtin::Len => self.table.basic(BasicKind::Int),
                        Builtin::Println | Builtin::Print => self.table.t_invalid,
                    };
                }
            }
        }
        let under = self.table.ty(self.table.underlying(ft)).clone();
        match under {
            Type::Func(sig) => match sig.results.len() {
                0 => self.table.t_invalid,
                1 => sig.results[0],
                _ => self.table.alloc(Type::Tuple(sig.results)),
            },
            Type::Invalid => self.table.t_invalid,
            _ => {
                self.error("cannot call non-function value", fun.span);
                self.table.t_invalid
            }
        }
    }

    fn check_composite_elems(&mut self, t: TypeId, elems: &[CompositeElem]) {
        let under = self.table.ty(self.table.underlying(t)).clone();
        match under {
            Type::Struct(s) => {
                for elem in elems {
                    match elem {
                        CompositeElem::KeyValue { key, value } => {
                            // Struct keys are field names, not expressions.
                            if let ExprKind::Name(ident) = &key.kind {
                                let ft = s
                                    .fields
                                    .iter()
                                    .find(|f| f.name == ident.name)
                                    .map(|f| f.ty)
                                    .unwrap_or(self.table.t_invalid);
                                self.expr_types.insert(key.id, ft);
                            } else {
                                self.check_expr(key);
                            }
                            self.check_expr(value);
                        }
                        CompositeElem::Value(v) => {
                            self.check_expr(v);
                        }
                    }
                }
            }
            _ => {
                for elem in elems {
                    match elem {
                        CompositeElem::KeyValue { key, value } => {
                            self.check_expr(key);
                            self.check_expr(value);
                        }
                        CompositeElem::Value(v) => {
                            self.check_expr(v);
                        }
                    }
                }
            }
        }
    }

    fn is_untyped(&self, t: TypeId) -> bool {
        matches!(
            self.table.ty(t),
            Type::Basic(
                BasicKind::UntypedInt
                    | BasicKind::UntypedFloat
                    | BasicKind::UntypedString
                    | BasicKind::UntypedBool
                    | BasicKind::UntypedNil
            )
        )
    }
}

fn embedded_field_name(te: &TypeExpr) -> Option<String> {
    match &te.kind {
        TypeExprKind::Name(id) => Some(id.name.clone()),
        TypeExprKind::Qualified(_, name) => Some(name.name.clone()),
        TypeExprKind::Pointer(inner) => embedded_field_name(inner),
        _ => None,
    }
}
