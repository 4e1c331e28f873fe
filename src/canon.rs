//! Canonical string forms for types, signatures, and method sets.
//!
//! These strings are the hash keys the whole tool joins on: the catalog is
//! indexed by them and the demotion decision is an exact lookup of one.
//! Formal parameter names are erased; named types render fully qualified, so
//! the same interface seen through different import paths canonicalizes
//! identically.

use crate::frontend::types::{Signature, Type, TypeId, TypeTable};
use std::collections::BTreeMap;

/// Structural rendering of a type: `pkg/path.Name`, `*T`, `[]T`, `[N]T`,
/// `map[K]V`, `func(...)(...)`, `interface{...}`, `struct{...}`.
pub fn type_string(table: &TypeTable, t: TypeId) -> String {
    match table.ty(t) {
        Type::Invalid => "?".to_string(),
        Type::Basic(kind) => kind.name().to_string(),
        Type::Named(n) => {
            if n.pkg.is_empty() {
                n.name.clone()
            } else {
                format!("{}.{}", n.pkg, n.name)
            }
        }
        Type::Pointer(elem) => format!("*{}", type_string(table, *elem)),
        Type::Slice(elem) => format!("[]{}", type_string(table, *elem)),
        Type::Array(len, elem) => format!("[{}]{}", len, type_string(table, *elem)),
        Type::Map(key, value) => format!(
            "map[{}]{}",
            type_string(table, *key),
            type_string(table, *value)
        ),
        Type::Func(sig) => format!("func{}", sig_string(table, sig)),
        Type::Struct(s) => {
            let fields: Vec<String> = s
                .fields
                .iter()
                .map(|f| {
                    if f.embedded {
                        type_string(table, f.ty)
                    } else {
                        format!("{} {}", f.name, type_string(table, f.ty))
                    }
                })
                .collect();
            format!("struct{{{}}}", fields.join(";"))
        }
        Type::Interface(_) => {
            let set = method_set_of(table, t);
            format!("interface{{{set}}}")
        }
        Type::Tuple(ts) => {
            let parts: Vec<String> = ts.iter().map(|&t| type_string(table, t)).collect();
            format!("({})", parts.join(","))
        }
    }
}

/// `(T1,T2,...)(R1,...)` with the variadic last parameter rendered `...T`.
pub fn sig_string(table: &TypeTable, sig: &Signature) -> String {
    let mut params = Vec::with_capacity(sig.params.len());
    for (i, &p) in sig.params.iter().enumerate() {
        if sig.variadic && i + 1 == sig.params.len() {
            let elem = match table.ty(p) {
                Type::Slice(elem) => *elem,
                _ => p,
            };
            params.push(format!("...{}", type_string(table, elem)));
        } else {
            params.push(type_string(table, p));
        }
    }
    let results: Vec<String> = sig
        .results
        .iter()
        .map(|&r| type_string(table, r))
        .collect();
    format!("({})({})", params.join(","), results.join(","))
}

/// Serializes a `name -> canonical signature` map, sorted by name.
pub fn method_set_string(methods: &BTreeMap<String, String>) -> String {
    let parts: Vec<String> = methods
        .iter()
        .map(|(name, sig)| format!("{name}:{sig}"))
        .collect();
    parts.join(";")
}

/// Canonical method-set identity of a type: its full method set (promotion
/// included), each entry rendered `name:sig`.
pub fn method_set_of(table: &TypeTable, t: TypeId) -> String {
    let methods: BTreeMap<String, String> = table
        .methods_of(t)
        .iter()
        .map(|(name, sig)| (name.clone(), sig_string(table, sig)))
        .collect();
    method_set_string(&methods)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::types::*;

    fn table_with_closer() -> (TypeTable, TypeId) {
        let mut table = TypeTable::new();
        let error = table.t_error;
        let iface = table.alloc(Type::Interface(InterfaceType {
            methods: vec![Method {
                name: "Close".into(),
                sig: Signature {
                    params: Vec::new(),
                    results: vec![error],
                    variadic: false,
                },
            }],
            embeddeds: Vec::new(),
        }));
        let closer = table.alloc(Type::Named(NamedType {
            pkg: "io".into(),
            name: "Closer".into(),
            underlying: iface,
            methods: Vec::new(),
        }));
        (table, closer)
    }

    #[test]
    fn named_types_are_fully_qualified() {
        let (table, closer) = table_with_closer();
        assert_eq!(type_string(&table, closer), "io.Closer");
    }

    #[test]
    fn signatures_erase_parameter_names() {
        let (table, closer) = table_with_closer();
        let int = table.basic(BasicKind::Int);
        let sig = Signature {
            params: vec![int, closer],
            results: vec![table.t_error],
            variadic: false,
        };
        assert_eq!(sig_string(&table, &sig), "(int,io.Closer)(error)");
    }

    #[test]
    fn variadic_parameter_is_marked() {
        let (mut table, closer) = table_with_closer();
        let int = table.basic(BasicKind::Int);
        let slice = table.alloc(Type::Slice(closer));
        let sig = Signature {
            params: vec![int, slice],
            results: Vec::new(),
            variadic: true,
        };
        assert_eq!(sig_string(&table, &sig), "(int,...io.Closer)()");
    }

    #[test]
    fn method_sets_sort_by_name() {
        let mut methods = BTreeMap::new();
        methods.insert("Close".to_string(), "()(error)".to_string());
        methods.insert("Bang".to_string(), "()()".to_string());
        assert_eq!(
            method_set_string(&methods),
            "Bang:()();Close:()(error)"
        );
    }

    #[test]
    fn method_set_of_resolves_the_full_set() {
        let (table, closer) = table_with_closer();
        assert_eq!(method_set_of(&table, closer), "Close:()(error)");
    }

    #[test]
    fn compound_type_strings() {
        let (mut table, closer) = table_with_closer();
        let ptr = table.alloc(Type::Pointer(closer));
        let slice = table.alloc(Type::Slice(ptr));
        let string = table.basic(BasicKind::String);
        let map = table.alloc(Type::Map(string, slice));
        assert_eq!(type_string(&table, map), "map[string][]*io.Closer");
    }
}
