//! The analyzer driver: loads the requested packages, owns the per-function
//! usage lifecycles, and emits warnings in deterministic order.
//!
//! Packages are analyzed sequentially in lexicographic import-path order.
//! Within a package, files are walked in load order with an explicit
//! enter/leave visitor; a frame is pushed per function declaration or
//! literal, all nesting levels share the outermost frame's usage map, and
//! decisions are taken when the outermost frame closes.

use crate::analysis::decider;
use crate::analysis::usage::UsageMap;
use crate::canon;
use crate::catalog::{self, Catalog};
use crate::core::{sort_by_offset, Warn};
use crate::errors::Error;
use crate::frontend::ast::{
    self, BinOp, CompositeElem, Expr, ExprKind, FuncDecl, NodeId, Param, Stmt, UnOp, Visitor,
};
use crate::frontend::check::PackageInfo;
use crate::frontend::loader::{Loader, Program};
use crate::frontend::source::FileSet;
use crate::frontend::types::{ObjId, ObjKind, Signature, Type, TypeId, TypeTable};
use crate::io::output::{TextWriter, WarnWriter};
use crate::io::walker::{self, Target};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One top-level invocation of the tool: an immutable catalog plus the
/// loaded program. Analysis state lives per [`Linter::check`] call, so
/// independent source trees can be analyzed from independent values.
pub struct Linter {
    program: Program,
    catalog: Catalog,
    analyzed: Vec<String>,
    load_errors: Vec<Error>,
    wd: PathBuf,
}

impl std::fmt::Debug for Linter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Linter")
            .field("analyzed", &self.analyzed)
            .field("load_errors", &self.load_errors)
            .field("wd", &self.wd)
            .finish()
    }
}

impl Linter {
    /// Expands arguments, loads every requested package and its transitive
    /// imports, and builds the catalog. Argument problems fail immediately;
    /// packages that fail to load are recorded and skipped.
    pub fn from_args(args: &[String]) -> Result<Self, Error> {
        let wd = std::env::current_dir()?;
        let targets = walker::expand(args)?;
        let mut loader = Loader::new()?;
        let mut analyzed = Vec::new();
        let mut load_errors = Vec::new();
        for target in &targets {
            let res = match target {
                Target::Files(files) => loader.load_files(files),
                Target::Dir { import_path, dir } => loader.load_dir(dir, import_path),
            };
            match res {
                Ok(path) => analyzed.push(path),
                Err(e @ Error::Usage(_)) | Err(e @ Error::MissingWorkspace(_)) => return Err(e),
                Err(e) => load_errors.push(e.relativize(&wd)),
            }
        }
        analyzed.sort();
        analyzed.dedup();
        let program = loader.finish();
        let catalog = catalog::build(&program, &analyzed);
        debug!(
            packages = analyzed.len(),
            interfaces = catalog.iface_count(),
            "linter ready"
        );
        Ok(Self {
            program,
            catalog,
            analyzed,
            load_errors,
            wd,
        })
    }

    /// Packages that could not be loaded, paths already relative to the
    /// working directory.
    pub fn load_errors(&self) -> &[Error] {
        &self.load_errors
    }

    pub fn take_load_errors(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.load_errors)
    }

    /// Analyzes every loaded package, calling `on_pkg` with each package's
    /// import path and its warnings, in lexicographic package order.
    pub fn check<F>(&self, mut on_pkg: F) -> std::io::Result<()>
    where
        F: FnMut(&str, &[Warn]) -> std::io::Result<()>,
    {
        for path in &self.analyzed {
            let Some(pkg) = self.program.package(path) else {
                continue;
            };
            let warns = PkgChecker::new(self, pkg).run();
            on_pkg(path, &warns)?;
        }
        Ok(())
    }
}

/// Checks the packages named by `args` and returns all warnings. The first
/// load error, if any, fails the call.
pub fn check_args_list(args: &[String]) -> Result<Vec<Warn>, Error> {
    let mut linter = Linter::from_args(args)?;
    if let Some(e) = linter.take_load_errors().into_iter().next() {
        return Err(e);
    }
    let mut all = Vec::new();
    linter.check(|_, warns| {
        all.extend_from_slice(warns);
        Ok(())
    })?;
    Ok(all)
}

/// Checks the packages named by `args`, writing human-readable warnings to
/// `out`. With `verbose`, each package path precedes its warnings.
pub fn check_args_output<W: std::io::Write>(
    args: &[String],
    out: W,
    verbose: bool,
) -> Result<(), Error> {
    let mut linter = Linter::from_args(args)?;
    if let Some(e) = linter.take_load_errors().into_iter().next() {
        return Err(e);
    }
    let mut writer = TextWriter::new(out, verbose);
    linter.check(|path, warns| writer.emit(path, warns))?;
    Ok(())
}

/// Checks one in-memory package. Intended for tests and embedding.
pub fn check_source(path: &str, files: Vec<(PathBuf, String)>) -> Result<Vec<Warn>, Error> {
    let mut loader = Loader::new()?;
    let loaded = loader.load_source(path, files)?;
    let program = loader.finish();
    let catalog = catalog::build(&program, std::slice::from_ref(&loaded));
    let linter = Linter {
        program,
        catalog,
        analyzed: vec![loaded],
        load_errors: Vec::new(),
        wd: std::env::current_dir()?,
    };
    let mut out = Vec::new();
    linter.check(|_, warns| {
        out.extend_from_slice(warns);
        Ok(())
    })?;
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FuncKey {
    Decl(ObjId),
    Lit(NodeId),
}

struct FuncRecord {
    key: FuncKey,
    name: String,
    params: Vec<ObjId>,
}

/// Per-package walk state.
struct PkgChecker<'a> {
    table: &'a TypeTable,
    fset: &'a FileSet,
    catalog: &'a Catalog,
    info: &'a PackageInfo,
    wd: &'a Path,
    /// Aliased imports of the file currently being walked.
    imp_aliases: BTreeMap<String, String>,
    /// Open frame depth; zero means between top-level functions.
    depth: usize,
    /// Functions of the current outermost tree, in source order.
    tree_funcs: Vec<FuncRecord>,
    usages: UsageMap,
    /// Functions whose value escaped; their signatures are spoken for.
    pinned_funcs: HashSet<ObjId>,
    pinned_lits: HashSet<NodeId>,
    func_warns: Vec<(FuncKey, Vec<Warn>)>,
}

impl<'a> PkgChecker<'a> {
    fn new(linter: &'a Linter, info: &'a PackageInfo) -> Self {
        Self {
            table: linter.program.table(),
            fset: linter.program.fset(),
            catalog: &linter.catalog,
            info,
            wd: &linter.wd,
            imp_aliases: BTreeMap::new(),
            depth: 0,
            tree_funcs: Vec::new(),
            usages: UsageMap::new(),
            pinned_funcs: HashSet::new(),
            pinned_lits: HashSet::new(),
            func_warns: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Warn> {
        let info = self.info;
        for file in &info.files {
            self.imp_aliases = file
                .imports
                .iter()
                .filter_map(|imp| {
                    imp.alias
                        .as_ref()
                        .map(|a| (imp.path.clone(), a.name.clone()))
                })
                .collect();
            ast::walk_file(&mut self, file);
        }
        let mut all = Vec::new();
        for (key, warns) in std::mem::take(&mut self.func_warns) {
            let pinned = match key {
                FuncKey::Decl(obj) => self.pinned_funcs.contains(&obj),
                FuncKey::Lit(node) => self.pinned_lits.contains(&node),
            };
            if !pinned {
                all.extend(warns);
            }
        }
        sort_by_offset(&mut all);
        all
    }

    fn param_objs(&self, params: &[Param]) -> Vec<ObjId> {
        params
            .iter()
            .filter_map(|p| p.name.as_ref())
            .filter_map(|n| self.info.defs.get(&n.id).copied())
            .collect()
    }

    /// Decides every parameter of the finished outermost tree and tears the
    /// frame state down.
    fn close_tree(&mut self) {
        let funcs = std::mem::take(&mut self.tree_funcs);
        for f in funcs {
            let mut warns = Vec::new();
            for &pobj in &f.params {
                let Some(uid) = self.usages.get(pobj) else {
                    continue;
                };
                let obj = self.table.obj(pobj);
                let Some(new_type) = decider::param_new_type(
                    self.table,
                    self.catalog,
                    &self.usages,
                    uid,
                    obj.ty,
                    &f.name,
                    &self.info.path,
                    &self.imp_aliases,
                ) else {
                    continue;
                };
                let mut pos = self.fset.position(obj.span.start);
                if let Ok(rel) = pos.file.strip_prefix(self.wd) {
                    pos.file = rel.to_path_buf();
                }
                warns.push(Warn {
                    pos,
                    name: obj.name.clone(),
                    new_type,
                });
            }
            self.func_warns.push((f.key, warns));
        }
        self.usages.clear();
    }

    // ---- tracker ----

    /// Lazily tracks `e` if it is an identifier naming an interesting
    /// variable inside an open frame.
    fn var_usage(&mut self, e: &Expr) -> Option<usize> {
        let ExprKind::Name(id) = &e.kind else {
            return None;
        };
        if self.depth == 0 {
            return None;
        }
        // Defining occurrences (`x := ...`) resolve through defs.
        let obj = self
            .info
            .uses
            .get(&id.id)
            .or_else(|| self.info.defs.get(&id.id))
            .copied()?;
        let table = self.table;
        let o = table.obj(obj);
        if o.kind != ObjKind::Var || !self.interesting(o.ty) {
            return None;
        }
        Some(self.usages.get_or_create(obj))
    }

    /// A variable is worth tracking if its type could match an interface:
    /// named, pointer to named, or an interface itself.
    fn interesting(&self, t: TypeId) -> bool {
        match self.table.ty(t) {
            Type::Named(_) => true,
            Type::Pointer(elem) => matches!(self.table.ty(*elem), Type::Named(_)),
            _ => self.table.is_interface(t),
        }
    }

    /// Records that `e` was used as a value of type `t`: interface types
    /// contribute their method set, anything else poisons the variable.
    /// Function values used outside a call pin their declaration.
    fn add_used(&mut self, e: &Expr, as_ty: Option<TypeId>) {
        let Some(t) = as_ty else { return };
        if matches!(self.table.ty(t), Type::Invalid) {
            return;
        }
        if let Some(u) = self.var_usage(e) {
            if self.table.is_interface(t) {
                let methods: Vec<String> = self.table.methods_of(t).into_keys().collect();
                for m in methods {
                    self.usages.add_call(u, &m);
                }
            } else {
                self.usages.set_discard(u);
            }
            return;
        }
        match &e.kind {
            ExprKind::Name(id) => {
                if let Some(&obj) = self.info.uses.get(&id.id) {
                    if self.table.obj(obj).kind == ObjKind::Func {
                        self.pinned_funcs.insert(obj);
                    }
                }
            }
            ExprKind::FuncLit { .. } => {
                self.pinned_lits.insert(e.id);
            }
            _ => {}
        }
    }

    fn discard(&mut self, e: &Expr) {
        if let Some(u) = self.var_usage(e) {
            self.usages.set_discard(u);
        }
    }

    fn add_assign(&mut self, to: &Expr, from: &Expr) {
        let Some(to_u) = self.var_usage(to) else { return };
        let Some(from_u) = self.var_usage(from) else {
            return;
        };
        self.usages.add_edge(from_u, to_u);
    }

    /// Equality against a literal constant poisons; equality against `nil`
    /// counts as using an interface-typed operand as its own declared type;
    /// comparing two variables does neither.
    fn compared_with(&mut self, e: &Expr, with: &Expr) {
        if self.is_const_literal(with) {
            self.discard(e);
            return;
        }
        if self.is_nil(with) {
            let Some(&t) = self.info.expr_types.get(&e.id) else {
                return;
            };
            if self.table.is_interface(t) {
                self.add_used(e, Some(t));
            }
        }
    }

    fn is_nil(&self, e: &Expr) -> bool {
        let ExprKind::Name(id) = &e.kind else {
            return false;
        };
        self.info
            .uses
            .get(&id.id)
            .is_some_and(|&o| self.table.obj(o).kind == ObjKind::Nil)
    }

    fn is_const_literal(&self, e: &Expr) -> bool {
        match &e.kind {
            ExprKind::IntLit(_) | ExprKind::FloatLit(_) | ExprKind::StrLit(_) => true,
            ExprKind::Paren(inner) => self.is_const_literal(inner),
            ExprKind::Unary { op: UnOp::Neg, x } => self.is_const_literal(x),
            ExprKind::Call { fun, args } => {
                args.len() == 1
                    && self.conversion_target(fun).is_some()
                    && self.is_const_literal(&args[0])
            }
            _ => false,
        }
    }

    /// The type a call converts to, when the callee names a type.
    fn conversion_target(&self, fun: &Expr) -> Option<TypeId> {
        let sel_id = match &fun.kind {
            ExprKind::Name(id) => id.id,
            ExprKind::Selector { sel, .. } => sel.id,
            ExprKind::Paren(inner) => return self.conversion_target(inner),
            _ => return None,
        };
        let obj = self.info.uses.get(&sel_id).copied()?;
        let o = self.table.obj(obj);
        (o.kind == ObjKind::TypeName).then_some(o.ty)
    }

    fn param_type(&self, sig: &Signature, i: usize) -> Option<TypeId> {
        if sig.variadic && i + 1 >= sig.params.len() {
            let last = sig.params.last().copied()?;
            return match self.table.ty(last) {
                Type::Slice(elem) => Some(*elem),
                _ => Some(last),
            };
        }
        sig.params.get(i).copied()
    }

    fn on_call(&mut self, fun: &Expr, args: &[Expr]) {
        if let Some(target) = self.conversion_target(fun) {
            if args.len() == 1 {
                self.add_used(&args[0], Some(target));
            }
            return;
        }
        if let ExprKind::Name(id) = &fun.kind {
            if let Some(&obj) = self.info.uses.get(&id.id) {
                if matches!(self.table.obj(obj).kind, ObjKind::Builtin(_)) {
                    return;
                }
            }
        }
        let Some(&ft) = self.info.expr_types.get(&fun.id) else {
            return;
        };
        let Type::Func(sig) = self.table.ty(self.table.underlying(ft)) else {
            return;
        };
        let sig = sig.clone();
        for (i, arg) in args.iter().enumerate() {
            let pt = self.param_type(&sig, i);
            self.add_used(arg, pt);
        }
        if let ExprKind::Selector { x, sel } = &fun.kind {
            if let Some(u) = self.var_usage(x) {
                self.usages.add_call(u, &sel.name);
            }
        }
    }

    fn on_composite(&mut self, e: &Expr, elems: &[CompositeElem]) {
        let Some(&t) = self.info.expr_types.get(&e.id) else {
            return;
        };
        for (i, elem) in elems.iter().enumerate() {
            match elem {
                CompositeElem::KeyValue { key, value } => {
                    // Cross-use: the key is used as the value's type and the
                    // value as the key's; this covers both map literals and
                    // keyed struct fields.
                    let vt = self.info.expr_types.get(&value.id).copied();
                    self.add_used(key, vt);
                    let kt = self.info.expr_types.get(&key.id).copied();
                    self.add_used(value, kt);
                }
                CompositeElem::Value(v) => {
                    if matches!(v.kind, ExprKind::Name(_)) {
                        let et = self.table.composite_elem_type(t, i);
                        self.add_used(v, et);
                    }
                }
            }
        }
    }
}

impl<'a> Visitor for PkgChecker<'a> {
    fn enter_func_decl(&mut self, f: &FuncDecl) -> bool {
        let table = self.table;
        let Some(&obj) = self.info.defs.get(&f.name.id) else {
            return false;
        };
        let Type::Func(sig) = table.ty(table.obj(obj).ty) else {
            return false;
        };
        let sig_key = canon::sig_string(table, sig);
        if let Some(owner) = self.catalog.func_of(&sig_key) {
            debug!(func = %f.name.name, owner, "signature is pinned, skipping");
            return false;
        }
        let params = self.param_objs(&f.params);
        self.tree_funcs.push(FuncRecord {
            key: FuncKey::Decl(obj),
            name: f.name.name.clone(),
            params,
        });
        self.depth += 1;
        true
    }

    fn leave_func_decl(&mut self, _f: &FuncDecl) {
        self.depth -= 1;
        if self.depth == 0 {
            self.close_tree();
        }
    }

    fn enter_stmt(&mut self, s: &Stmt) -> bool {
        match s {
            Stmt::Var(vs) => {
                if let (Some(ty), Some(value)) = (&vs.ty, &vs.value) {
                    let t = self.info.expr_types.get(&ty.id).copied();
                    self.add_used(value, t);
                }
            }
            Stmt::Assign(a) => {
                if a.lhs.len() == a.rhs.len() {
                    for (l, r) in a.lhs.iter().zip(&a.rhs) {
                        if !a.define {
                            let t = self.info.expr_types.get(&l.id).copied();
                            self.add_used(r, t);
                        }
                        self.add_assign(l, r);
                    }
                } else if a.rhs.len() == 1 {
                    // Multi-value form: one call feeds every destination, so
                    // the single right-hand value flows into each left-hand
                    // side. Calls inside it are tracked by the normal walk.
                    let r = &a.rhs[0];
                    for l in &a.lhs {
                        if !a.define {
                            let t = self.info.expr_types.get(&l.id).copied();
                            self.add_used(r, t);
                        }
                        self.add_assign(l, r);
                    }
                }
            }
            Stmt::IncDec { expr, .. } => self.discard(expr),
            _ => {}
        }
        true
    }

    fn enter_expr(&mut self, e: &Expr) -> bool {
        if let ExprKind::FuncLit { params, .. } = &e.kind {
            let table = self.table;
            if let Some(&ft) = self.info.expr_types.get(&e.id) {
                if let Type::Func(sig) = table.ty(ft) {
                    if self.catalog.func_of(&canon::sig_string(table, sig)).is_some() {
                        return false;
                    }
                }
            }
            let params = self.param_objs(params);
            self.tree_funcs.push(FuncRecord {
                key: FuncKey::Lit(e.id),
                name: String::new(),
                params,
            });
            self.depth += 1;
            return true;
        }
        match &e.kind {
            ExprKind::Selector { x, .. } => {
                let is_func = self
                    .info
                    .expr_types
                    .get(&e.id)
                    .is_some_and(|&t| matches!(self.table.ty(t), Type::Func(_)));
                if !is_func {
                    self.discard(x);
                }
            }
            ExprKind::Unary { x, .. } => self.discard(x),
            ExprKind::Index { x, .. } => self.discard(x),
            ExprKind::Binary { op, x, y } => match op {
                BinOp::Eq | BinOp::NotEq => {
                    self.compared_with(x, y);
                    self.compared_with(y, x);
                }
                _ => {
                    self.discard(x);
                    self.discard(y);
                }
            },
            ExprKind::Call { fun, args } => self.on_call(fun, args),
            ExprKind::Composite { elems, .. } => self.on_composite(e, elems),
            _ => {}
        }
        true
    }

    fn leave_expr(&mut self, e: &Expr) {
        if matches!(e.kind, ExprKind::FuncLit { .. }) {
            self.depth -= 1;
            if self.depth == 0 {
                self.close_tree();
            }
        }
    }
}
