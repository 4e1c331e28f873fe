//! The demotion decision: given everything observed about a parameter,
//! either the short name of a narrower catalogued interface or nothing.
//!
//! Every bail-out here is silent. The tool is designed to under-report; any
//! condition it cannot reason about confidently skips the parameter.

use crate::canon;
use crate::catalog::Catalog;
use crate::frontend::types::{is_exported, Type, TypeId, TypeTable};
use crate::analysis::usage::{UsageId, UsageMap};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Splits a qualified name into optional `*`, package path, and simple name.
static FULL_PATH_PARTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\*)?(([^/]+/)*([^/]+\.))?([^/]+)$").expect("path regex is valid")
});

/// Runs steps 1-6 over one parameter. `func_name` is the enclosing function's
/// name (empty for a function literal); `pkg_path` and `imp_aliases` shape
/// the short rendering of the result.
#[allow(clippy::too_many_arguments)]
pub fn param_new_type(
    table: &TypeTable,
    catalog: &Catalog,
    usages: &UsageMap,
    usage: UsageId,
    param_ty: TypeId,
    func_name: &str,
    pkg_path: &str,
    imp_aliases: &BTreeMap<String, String>,
) -> Option<String> {
    if usages.is_discarded(usage) {
        return None;
    }
    if let Some(simple) = named_simple_name(table, param_ty) {
        if func_name.contains(simple) {
            return None;
        }
    }
    if !is_exported(func_name) && will_add_allocation(table, param_ty) {
        return None;
    }

    let calls = &usages.usage(usage).calls;
    if calls.is_empty() {
        return None;
    }
    let all = table.methods_of(param_ty);
    let mut called = BTreeMap::new();
    for name in calls {
        let sig = all
            .get(name)
            .map(|sig| canon::sig_string(table, sig))
            .unwrap_or_default();
        called.insert(name.clone(), sig);
    }
    let key = canon::method_set_string(&called);
    let full = catalog.iface_of(&key)?;

    // No improvement if the declared type is already exactly this interface.
    if table.is_interface(param_ty) && canon::method_set_of(table, param_ty) == key {
        return None;
    }
    Some(simple_name(full, pkg_path, imp_aliases))
}

/// Demoting a non-pointer, non-interface value to an interface boxes it.
fn will_add_allocation(table: &TypeTable, t: TypeId) -> bool {
    !matches!(
        table.ty(table.underlying(t)),
        Type::Pointer(_) | Type::Interface(_)
    )
}

/// Simple name of the declared type if it is named (through one pointer),
/// for the name-leak heuristic.
fn named_simple_name(table: &TypeTable, t: TypeId) -> Option<&str> {
    table.named_of(t).map(|n| n.name.as_str())
}

/// Renders a fully qualified name the way the reporting file would write it:
/// own-package names lose their prefix, aliased imports use the alias, and
/// anything else keeps its last path segment.
fn simple_name(full: &str, pkg_path: &str, imp_aliases: &BTreeMap<String, String>) -> String {
    let (star, rest) = match full.strip_prefix('*') {
        Some(r) => ("*", r),
        None => ("", full),
    };
    if let Some(name) = rest.strip_prefix(&format!("{pkg_path}.")) {
        if !name.contains('.') && !name.contains('/') {
            return format!("{star}{name}");
        }
    }
    let Some(caps) = FULL_PATH_PARTS.captures(full) else {
        return full.to_string();
    };
    let star = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let full_pkg = caps
        .get(2)
        .map(|m| m.as_str().trim_end_matches('.'))
        .unwrap_or("");
    let short_pkg = caps.get(4).map(|m| m.as_str()).unwrap_or("");
    let name = caps.get(5).map(|m| m.as_str()).unwrap_or(full);
    if full_pkg == pkg_path {
        return format!("{star}{name}");
    }
    if let Some(alias) = imp_aliases.get(full_pkg) {
        return format!("{star}{alias}.{name}");
    }
    format!("{star}{short_pkg}{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aliases(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|&(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn own_package_prefix_is_stripped() {
        assert_eq!(
            simple_name("some/pkg.Closer", "some/pkg", &aliases(&[])),
            "Closer"
        );
    }

    #[test]
    fn import_alias_is_substituted() {
        assert_eq!(
            simple_name("io.Closer", "p", &aliases(&[("io", "myio")])),
            "myio.Closer"
        );
    }

    #[test]
    fn long_paths_keep_the_last_segment() {
        assert_eq!(
            simple_name("a/b/pkg.Name", "other", &aliases(&[])),
            "pkg.Name"
        );
    }

    #[test]
    fn pointer_marker_is_preserved() {
        assert_eq!(
            simple_name("*io.Closer", "p", &aliases(&[])),
            "*io.Closer"
        );
    }
}
