//! # narrower
//!
//! A static linter that inspects a typed codebase and, for each function
//! parameter declared with a concrete type, suggests the narrowest known
//! interface type the parameter could be given without changing the
//! function's behavior:
//!
//! ```text
//! dir/file.go:14:17: c can be io.Closer
//! ```
//!
//! Accepting an interface widens what callers may pass while preserving
//! every method the function actually invokes. The tool only reports; it
//! never rewrites code, and it is built to under-report: any use of a
//! parameter that an interface value could not satisfy permanently
//! disqualifies it from a suggestion.
//!
//! ## How it works
//!
//! - **[`frontend`]** loads and type-checks packages, producing typed syntax
//!   with resolved objects and per-expression types.
//! - **[`catalog`]** indexes every exported interface in scope (standard
//!   packages first, then the transitive import closure) by the canonical
//!   form of its method set, built by **[`canon`]**.
//! - **[`analysis`]** walks each function, accumulates per-parameter usage
//!   (method calls, alias edges, disqualifying uses), and looks the demanded
//!   method set up in the catalog.
//! - **[`io`]** expands `path/...` arguments and renders warnings.
//!
//! ## Library usage
//!
//! ```no_run
//! let warns = narrower::check_args_list(&[".".to_string()]).unwrap();
//! for w in &warns {
//!     println!("{w}");
//! }
//! ```

pub mod analysis;
pub mod canon;
pub mod catalog;
pub mod cli;
pub mod core;
pub mod errors;
pub mod frontend;
pub mod io;
pub mod observability;

pub use crate::analysis::{check_args_list, check_args_output, check_source, Linter};
pub use crate::catalog::Catalog;
pub use crate::core::{Position, Warn};
pub use crate::errors::Error;
