//! Semantic type and object model.
//!
//! Types live in a single arena shared by every loaded package; identity is
//! never compared through arena ids (two spellings of `*File` may allocate
//! twice), only through the canonical strings built on top of this table.

use crate::frontend::source::Span;
use std::collections::{BTreeMap, HashMap, HashSet};

pub type TypeId = u32;
pub type ObjId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    String,
    UntypedInt,
    UntypedFloat,
    UntypedString,
    UntypedBool,
    UntypedNil,
}

impl BasicKind {
    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::String => "string",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedNil => "untyped nil",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<TypeId>,
    pub results: Vec<TypeId>,
    pub variadic: bool,
}

#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub sig: Signature,
}

#[derive(Debug, Clone)]
pub struct NamedType {
    /// Import path of the declaring package; empty for universe types.
    pub pkg: String,
    pub name: String,
    /// May itself be another named type; `underlying` chases to the
    /// structural form.
    pub underlying: TypeId,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: String,
    pub ty: TypeId,
    pub embedded: bool,
}

#[derive(Debug, Clone)]
pub struct StructType {
    pub fields: Vec<FieldInfo>,
}

#[derive(Debug, Clone)]
pub struct InterfaceType {
    pub methods: Vec<Method>,
    pub embeddeds: Vec<TypeId>,
}

#[derive(Debug, Clone)]
pub enum Type {
    Invalid,
    Basic(BasicKind),
    Named(NamedType),
    Pointer(TypeId),
    Slice(TypeId),
    Array(u64, TypeId),
    Map(TypeId, TypeId),
    Func(Signature),
    Struct(StructType),
    Interface(InterfaceType),
    /// Result type of a multi-valued call.
    Tuple(Vec<TypeId>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjKind {
    /// Local variable or parameter.
    Var,
    Func,
    TypeName,
    /// An imported package name in a file's scope.
    PkgName(String),
    Builtin(Builtin),
    Nil,
    Const,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Println,
    Print,
    Len,
}

#[derive(Debug, Clone)]
pub struct Object {
    pub name: String,
    pub kind: ObjKind,
    pub ty: TypeId,
    pub span: Span,
    /// Import path of the declaring package; empty for universe objects.
    pub pkg: String,
}

/// Whether a name is visible outside its package.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

pub struct TypeTable {
    types: Vec<Type>,
    objects: Vec<Object>,
    basics: HashMap<BasicKind, TypeId>,
    pub t_invalid: TypeId,
    pub t_error: TypeId,
    pub nil_obj: ObjId,
    universe: HashMap<String, ObjId>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    pub fn new() -> Self {
        let mut table = Self {
            types: Vec::new(),
            objects: Vec::new(),
            basics: HashMap::new(),
            t_invalid: 0,
            t_error: 0,
            nil_obj: 0,
            universe: HashMap::new(),
        };
        table.t_invalid = table.alloc(Type::Invalid);
        for kind in [
            BasicKind::Bool,
            BasicKind::Int,
            BasicKind::Int8,
            BasicKind::Int16,
            BasicKind::Int32,
            BasicKind::Int64,
            BasicKind::Uint,
            BasicKind::Uint8,
            BasicKind::Uint16,
            BasicKind::Uint32,
            BasicKind::Uint64,
            BasicKind::Float32,
            BasicKind::Float64,
            BasicKind::String,
            BasicKind::UntypedInt,
            BasicKind::UntypedFloat,
            BasicKind::UntypedString,
            BasicKind::UntypedBool,
            BasicKind::UntypedNil,
        ] {
            let id = table.alloc(Type::Basic(kind));
            table.basics.insert(kind, id);
        }
        table.build_universe();
        table
    }

    fn build_universe(&mut self) {
        let named_basics = [
            ("bool", BasicKind::Bool),
            ("int", BasicKind::Int),
            ("int8", BasicKind::Int8),
            ("int16", BasicKind::Int16),
            ("int32", BasicKind::Int32),
            ("int64", BasicKind::Int64),
            ("uint", BasicKind::Uint),
            ("uint8", BasicKind::Uint8),
            ("uint16", BasicKind::Uint16),
            ("uint32", BasicKind::Uint32),
            ("uint64", BasicKind::Uint64),
            ("float32", BasicKind::Float32),
            ("float64", BasicKind::Float64),
            ("string", BasicKind::String),
            ("byte", BasicKind::Uint8),
            ("rune", BasicKind::Int32),
        ];
        for (name, kind) in named_basics {
            let ty = self.basic(kind);
            let obj = self.alloc_obj(Object {
                name: name.to_string(),
                kind: ObjKind::TypeName,
                ty,
                span: Span::default(),
                pkg: String::new(),
            });
            self.universe.insert(name.to_string(), obj);
        }

        // `error` is a named interface with a single method.
        let string_ty = self.basic(BasicKind::String);
        let error_iface = self.alloc(Type::Interface(InterfaceType {
            methods: vec![Method {
                name: "Error".to_string(),
                sig: Signature {
                    params: Vec::new(),
                    results: vec![string_ty],
                    variadic: false,
                },
            }],
            embeddeds: Vec::new(),
        }));
        self.t_error = self.alloc(Type::Named(NamedType {
            pkg: String::new(),
            name: "error".to_string(),
            underlying: error_iface,
            methods: Vec::new(),
        }));
        let error_obj = self.alloc_obj(Object {
            name: "error".to_string(),
            kind: ObjKind::TypeName,
            ty: self.t_error,
            span: Span::default(),
            pkg: String::new(),
        });
        self.universe.insert("error".to_string(), error_obj);

        let nil_ty = self.basic(BasicKind::UntypedNil);
        self.nil_obj = self.alloc_obj(Object {
            name: "nil".to_string(),
            kind: ObjKind::Nil,
            ty: nil_ty,
            span: Span::default(),
            pkg: String::new(),
        });
        self.universe.insert("nil".to_string(), self.nil_obj);

        let bool_ty = self.basic(BasicKind::UntypedBool);
        for name in ["true", "false"] {
            let obj = self.alloc_obj(Object {
                name: name.to_string(),
                kind: ObjKind::Const,
                ty: bool_ty,
                span: Span::default(),
                pkg: String::new(),
            });
            self.universe.insert(name.to_string(), obj);
        }

        for (name, builtin) in [
            ("println", Builtin::Println),
            ("print", Builtin::Print),
            ("len", Builtin::Len),
        ] {
            let invalid = self.t_invalid;
            let obj = self.alloc_obj(Object {
                name: name.to_string(),
                kind: ObjKind::Builtin(builtin),
                ty: invalid,
                span: Span::default(),
                pkg: String::new(),
            });
            self.universe.insert(name.to_string(), obj);
        }
    }

    pub fn universe(&self) -> &HashMap<String, ObjId> {
        &self.universe
    }

    pub fn alloc(&mut self, t: Type) -> TypeId {
        let id = self.types.len() as TypeId;
        self.types.push(t);
        id
    }

    pub fn alloc_obj(&mut self, o: Object) -> ObjId {
        let id = self.objects.len() as ObjId;
        self.objects.push(o);
        id
    }

    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id as usize]
    }

    pub fn obj(&self, id: ObjId) -> &Object {
        &self.objects[id as usize]
    }

    pub fn basic(&self, kind: BasicKind) -> TypeId {
        self.basics[&kind]
    }

    pub fn set_obj_ty(&mut self, id: ObjId, ty: TypeId) {
        self.objects[id as usize].ty = ty;
    }

    pub fn set_underlying(&mut self, named: TypeId, underlying: TypeId) {
        if let Type::Named(n) = &mut self.types[named as usize] {
            n.underlying = underlying;
        }
    }

    pub fn add_named_method(&mut self, named: TypeId, method: Method) {
        if let Type::Named(n) = &mut self.types[named as usize] {
            n.methods.push(method);
        }
    }

    /// Chases named types down to the structural form. Declaration cycles
    /// resolve to `Invalid` rather than looping.
    pub fn underlying(&self, t: TypeId) -> TypeId {
        let mut seen = HashSet::new();
        let mut cur = t;
        loop {
            match self.ty(cur) {
                Type::Named(n) => {
                    if !seen.insert(cur) {
                        return self.t_invalid;
                    }
                    cur = n.underlying;
                }
                _ => return cur,
            }
        }
    }

    pub fn is_interface(&self, t: TypeId) -> bool {
        matches!(self.ty(self.underlying(t)), Type::Interface(_))
    }

    /// Full method set of a type: declared methods plus methods promoted
    /// through embedded interfaces and embedded struct fields. The set is the
    /// same through a pointer.
    pub fn methods_of(&self, t: TypeId) -> BTreeMap<String, Signature> {
        let mut out = BTreeMap::new();
        let mut visited = HashSet::new();
        self.collect_methods(t, &mut out, &mut visited);
        out
    }

    fn collect_methods(
        &self,
        t: TypeId,
        out: &mut BTreeMap<String, Signature>,
        visited: &mut HashSet<TypeId>,
    ) {
        if !visited.insert(t) {
            return;
        }
        match self.ty(t) {
            Type::Pointer(elem) => self.collect_methods(*elem, out, visited),
            Type::Named(n) => {
                for m in &n.methods {
                    out.entry(m.name.clone()).or_insert_with(|| m.sig.clone());
                }
                let under = self.underlying(t);
                match self.ty(under) {
                    Type::Interface(_) => self.collect_methods(under, out, visited),
                    Type::Struct(s) => {
                        let embedded: Vec<TypeId> = s
                            .fields
                            .iter()
                            .filter(|f| f.embedded)
                            .map(|f| f.ty)
                            .collect();
                        for e in embedded {
                            self.collect_methods(e, out, visited);
                        }
                    }
                    _ => {}
                }
            }
            Type::Interface(i) => {
                for m in &i.methods {
                    out.entry(m.name.clone()).or_insert_with(|| m.sig.clone());
                }
                let embeddeds = i.embeddeds.clone();
                for e in embeddeds {
                    self.collect_methods(e, out, visited);
                }
            }
            _ => {}
        }
    }

    /// Looks up a struct field, following pointers, named types, and embedded
    /// fields.
    pub fn field_of(&self, t: TypeId, name: &str) -> Option<TypeId> {
        let mut visited = HashSet::new();
        self.field_of_inner(t, name, &mut visited)
    }

    fn field_of_inner(
        &self,
        t: TypeId,
        name: &str,
        visited: &mut HashSet<TypeId>,
    ) -> Option<TypeId> {
        if !visited.insert(t) {
            return None;
        }
        let base = match self.ty(t) {
            Type::Pointer(elem) => *elem,
            _ => t,
        };
        let under = self.underlying(base);
        let Type::Struct(s) = self.ty(under) else {
            return None;
        };
        for f in &s.fields {
            if f.name == name {
                return Some(f.ty);
            }
        }
        let embedded: Vec<TypeId> = s
            .fields
            .iter()
            .filter(|f| f.embedded)
            .map(|f| f.ty)
            .collect();
        for e in embedded {
            if let Some(found) = self.field_of_inner(e, name, visited) {
                return Some(found);
            }
        }
        None
    }

    /// Element type of the `i`-th position in a composite literal of type
    /// `t`: struct field, array element, or slice element.
    pub fn composite_elem_type(&self, t: TypeId, i: usize) -> Option<TypeId> {
        match self.ty(self.underlying(t)) {
            Type::Struct(s) => s.fields.get(i).map(|f| f.ty),
            Type::Array(_, elem) | Type::Slice(elem) => Some(*elem),
            _ => None,
        }
    }

    /// The named type behind `t`, unwrapping one level of pointer.
    pub fn named_of(&self, t: TypeId) -> Option<&NamedType> {
        match self.ty(t) {
            Type::Named(n) => Some(n),
            Type::Pointer(elem) => match self.ty(*elem) {
                Type::Named(n) => Some(n),
                _ => None,
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig0() -> Signature {
        Signature {
            params: Vec::new(),
            results: Vec::new(),
            variadic: false,
        }
    }

    #[test]
    fn underlying_chases_named_chains() {
        let mut table = TypeTable::new();
        let int = table.basic(BasicKind::Int);
        let mint = table.alloc(Type::Named(NamedType {
            pkg: "p".into(),
            name: "mint".into(),
            underlying: int,
            methods: Vec::new(),
        }));
        let mint2 = table.alloc(Type::Named(NamedType {
            pkg: "p".into(),
            name: "mint2".into(),
            underlying: mint,
            methods: Vec::new(),
        }));
        assert_eq!(table.underlying(mint2), int);
    }

    #[test]
    fn methods_promote_through_struct_embedding() {
        let mut table = TypeTable::new();
        let int = table.basic(BasicKind::Int);
        let base = table.alloc(Type::Named(NamedType {
            pkg: "p".into(),
            name: "Base".into(),
            underlying: int,
            methods: vec![Method {
                name: "Close".into(),
                sig: sig0(),
            }],
        }));
        let wrap_struct = table.alloc(Type::Struct(StructType {
            fields: vec![FieldInfo {
                name: "Base".into(),
                ty: base,
                embedded: true,
            }],
        }));
        let wrap = table.alloc(Type::Named(NamedType {
            pkg: "p".into(),
            name: "Wrap".into(),
            underlying: wrap_struct,
            methods: vec![Method {
                name: "Open".into(),
                sig: sig0(),
            }],
        }));
        let methods = table.methods_of(wrap);
        assert!(methods.contains_key("Close"));
        assert!(methods.contains_key("Open"));

        let ptr = table.alloc(Type::Pointer(wrap));
        assert_eq!(table.methods_of(ptr).len(), 2);
    }

    #[test]
    fn interface_embedding_merges_method_sets() {
        let mut table = TypeTable::new();
        let closer_iface = table.alloc(Type::Interface(InterfaceType {
            methods: vec![Method {
                name: "Close".into(),
                sig: sig0(),
            }],
            embeddeds: Vec::new(),
        }));
        let closer = table.alloc(Type::Named(NamedType {
            pkg: "io".into(),
            name: "Closer".into(),
            underlying: closer_iface,
            methods: Vec::new(),
        }));
        let rc_iface = table.alloc(Type::Interface(InterfaceType {
            methods: vec![Method {
                name: "Read".into(),
                sig: sig0(),
            }],
            embeddeds: vec![closer],
        }));
        let methods = table.methods_of(rc_iface);
        assert_eq!(
            methods.keys().cloned().collect::<Vec<_>>(),
            vec!["Close".to_string(), "Read".to_string()]
        );
    }

    #[test]
    fn embedding_cycles_terminate() {
        let mut table = TypeTable::new();
        let a = table.alloc(Type::Named(NamedType {
            pkg: "p".into(),
            name: "A".into(),
            underlying: 0,
            methods: Vec::new(),
        }));
        let b_struct = table.alloc(Type::Struct(StructType {
            fields: vec![FieldInfo {
                name: "A".into(),
                ty: a,
                embedded: true,
            }],
        }));
        let b = table.alloc(Type::Named(NamedType {
            pkg: "p".into(),
            name: "B".into(),
            underlying: b_struct,
            methods: Vec::new(),
        }));
        let a_struct = table.alloc(Type::Struct(StructType {
            fields: vec![FieldInfo {
                name: "B".into(),
                ty: b,
                embedded: true,
            }],
        }));
        table.set_underlying(a, a_struct);
        assert!(table.methods_of(a).is_empty());
        assert!(table.field_of(a, "missing").is_none());
    }

    #[test]
    fn exportedness_is_first_rune_case() {
        assert!(is_exported("Closer"));
        assert!(!is_exported("closer"));
        assert!(!is_exported(""));
        assert!(!is_exported("_Closer"));
    }
}
