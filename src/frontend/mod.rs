//! The bundled front-end: lexer, parser, type checker, and package loader
//! for the analyzed language.
//!
//! The analyzer consumes only the contract exposed here — typed syntax with
//! resolved objects and expression types, a method enumerator, per-file
//! imports, and a file set for positions — so a different front-end could be
//! swapped in behind the same surface.

pub mod ast;
pub mod check;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod source;
pub mod types;

pub use check::{PackageInfo, PkgExport};
pub use loader::{Loader, Program};
pub use source::{Diagnostic, FileSet, Span};
pub use types::{is_exported, ObjId, TypeId, TypeTable};
