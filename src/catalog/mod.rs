//! The interface catalog: an immutable reverse index from canonical forms to
//! qualified names.
//!
//! Two indices are kept. `iface_of` maps a canonical method set to the name
//! of an exported interface with exactly that set; `func_of` maps a
//! canonical signature to a known free function or interface method with
//! that signature, which is how the analyzer recognizes functions whose
//! signatures are already a contract. Interface methods and named function
//! types are indexed from every package; free functions only from packages
//! outside the analyzed set — an analyzed package's own functions would pin
//! each other whenever two of them share a shape.
//!
//! Construction is first-wins: the built-in standard packages are inserted
//! before user packages, and user packages in lexicographic import-path
//! order, so the suggested name for a shared method set is deterministic.

pub mod std_prelude;

use crate::canon;
use crate::frontend::check::PackageInfo;
use crate::frontend::loader::Program;
use crate::frontend::types::{is_exported, ObjKind, Type, TypeTable};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct Catalog {
    ifaces: HashMap<String, String>,
    funcs: HashMap<String, String>,
}

impl Catalog {
    /// An exported interface whose method set exactly equals `method_set`.
    pub fn iface_of(&self, method_set: &str) -> Option<&str> {
        self.ifaces.get(method_set).map(String::as_str)
    }

    /// An exported interface method or named function type with this
    /// signature.
    pub fn func_of(&self, sig: &str) -> Option<&str> {
        self.funcs.get(sig).map(String::as_str)
    }

    pub fn iface_count(&self) -> usize {
        self.ifaces.len()
    }
}

/// Builds the catalog for a loaded program: standard packages in their fixed
/// order, then every other loaded package (the analyzed set and its
/// transitive imports) in lexicographic import-path order. `analyzed` names
/// the packages under analysis; their own free functions stay out of the
/// signature index.
pub fn build(program: &Program, analyzed: &[String]) -> Catalog {
    let mut cat = Catalog::default();
    for &(path, _) in std_prelude::PACKAGES {
        if let Some(pkg) = program.package(path) {
            let index_free_funcs = !analyzed.iter().any(|p| p == path);
            add_package(&mut cat, program.table(), pkg, index_free_funcs);
        }
    }
    let mut rest: Vec<&PackageInfo> = program
        .packages()
        .filter(|p| !std_prelude::is_std(&p.path))
        .collect();
    rest.sort_by(|a, b| a.path.cmp(&b.path));
    for pkg in rest {
        let index_free_funcs = !analyzed.iter().any(|p| p == &pkg.path);
        add_package(&mut cat, program.table(), pkg, index_free_funcs);
    }
    debug!(
        interfaces = cat.ifaces.len(),
        signatures = cat.funcs.len(),
        "catalog built"
    );
    cat
}

fn add_package(cat: &mut Catalog, table: &TypeTable, pkg: &PackageInfo, index_free_funcs: bool) {
    for &obj_id in &pkg.scope {
        let obj = table.obj(obj_id);
        if !is_exported(&obj.name) {
            continue;
        }
        let qualified = format!("{}.{}", pkg.path, obj.name);
        let t = obj.ty;
        match obj.kind {
            ObjKind::TypeName => match table.ty(table.underlying(t)) {
                Type::Interface(_) => {
                    let key = canon::method_set_of(table, t);
                    cat.ifaces.entry(key).or_insert_with(|| qualified.clone());
                    for (mname, sig) in table.methods_of(t) {
                        let sig_key = canon::sig_string(table, &sig);
                        cat.funcs
                            .entry(sig_key)
                            .or_insert_with(|| format!("{qualified}.{mname}"));
                    }
                }
                Type::Func(sig) => {
                    let sig_key = canon::sig_string(table, sig);
                    cat.funcs.entry(sig_key).or_insert(qualified);
                }
                _ => {}
            },
            ObjKind::Func if index_free_funcs => {
                if let Type::Func(sig) = table.ty(t) {
                    let sig_key = canon::sig_string(table, sig);
                    cat.funcs.entry(sig_key).or_insert(qualified);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::loader::Loader;
    use std::path::PathBuf;

    fn program_with(path: &str, src: &str) -> Program {
        let mut loader = Loader::new().expect("std prelude must load");
        loader
            .load_source(path, vec![(PathBuf::from("t.go"), src.to_string())])
            .expect("test package must load");
        loader.finish()
    }

    fn analyzed(path: &str) -> Vec<String> {
        vec![path.to_string()]
    }

    #[test]
    fn std_interfaces_are_indexed() {
        let program = program_with("p", "package p\n");
        let cat = build(&program, &analyzed("p"));
        assert_eq!(cat.iface_of("Close:()(error)"), Some("io.Closer"));
        assert_eq!(
            cat.iface_of("Close:()(error);Read:([]byte)(int,error)"),
            Some("io.ReadCloser")
        );
        assert_eq!(cat.iface_of("String:()(string)"), Some("fmt.Stringer"));
    }

    #[test]
    fn std_wins_over_user_duplicates() {
        let program = program_with(
            "p",
            "package p\n\ntype MyCloser interface {\n\tClose() error\n}\n",
        );
        let cat = build(&program, &analyzed("p"));
        assert_eq!(cat.iface_of("Close:()(error)"), Some("io.Closer"));
    }

    #[test]
    fn user_interfaces_are_qualified() {
        let program = program_with(
            "some/pkg",
            "package pkg\n\ntype Banger interface {\n\tBang()\n}\n",
        );
        let cat = build(&program, &analyzed("some/pkg"));
        assert_eq!(cat.iface_of("Bang:()()"), Some("some/pkg.Banger"));
    }

    #[test]
    fn unexported_interfaces_are_skipped() {
        let program = program_with(
            "p",
            "package p\n\ntype hidden interface {\n\tHide()\n}\n",
        );
        let cat = build(&program, &analyzed("p"));
        assert_eq!(cat.iface_of("Hide:()()"), None);
    }

    #[test]
    fn interface_methods_pin_signatures() {
        let program = program_with("p", "package p\n");
        let cat = build(&program, &analyzed("p"));
        // io.Closer.Close
        assert_eq!(cat.func_of("()(error)"), Some("io.Closer.Close"));
        // sort.Interface.Less
        assert_eq!(cat.func_of("(int,int)(bool)"), Some("sort.Interface.Less"));
    }

    #[test]
    fn named_function_types_pin_signatures() {
        let program = program_with(
            "p",
            "package p\n\ntype Visitor func(depth int) error\n",
        );
        let cat = build(&program, &analyzed("p"));
        assert_eq!(cat.func_of("(int)(error)"), Some("p.Visitor"));
    }

    #[test]
    fn standard_free_functions_pin_signatures() {
        let program = program_with("p", "package p\n");
        let cat = build(&program, &analyzed("p"));
        assert_eq!(
            cat.func_of("(io.Writer,io.Reader)(int64,error)"),
            Some("io.Copy")
        );
        assert_eq!(
            cat.func_of("(io.Reader)([]byte,error)"),
            Some("io.ReadAll")
        );
        assert_eq!(
            cat.func_of("(io.Writer,string)(int,error)"),
            Some("io.WriteString")
        );
    }

    #[test]
    fn analyzed_package_free_functions_are_not_indexed() {
        let program = program_with(
            "p",
            "package p\n\nfunc Helper(path string) error {\n\treturn nil\n}\n",
        );
        // Under analysis: two same-shaped exported functions must not pin
        // each other, so the package's own functions stay out.
        let cat = build(&program, &analyzed("p"));
        assert_eq!(cat.func_of("(string)(error)"), None);
        // Seen as a plain import, the same function is indexed.
        let cat = build(&program, &[]);
        assert_eq!(cat.func_of("(string)(error)"), Some("p.Helper"));
    }
}
