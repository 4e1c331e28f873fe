//! Package loading: files on disk or in memory, through parsing and type
//! checking, into an immutable [`Program`].
//!
//! The built-in standard packages are loaded first; user imports resolve
//! against `$GOPATH/src` and are cached by import path, with a cycle check.
//! A package's files parse in parallel; everything after parsing is
//! sequential and deterministic.

use crate::catalog::std_prelude;
use crate::errors::Error;
use crate::frontend::ast::File;
use crate::frontend::check::{self, PackageInfo, PkgExport};
use crate::frontend::parser;
use crate::frontend::source::{Diagnostic, FileSet};
use crate::frontend::types::{ObjId, TypeTable};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything the analyzer consumes: the file set, the shared type table,
/// and every checked package (standard, analyzed, and transitively
/// imported).
pub struct Program {
    fset: FileSet,
    table: TypeTable,
    packages: Vec<PackageInfo>,
    index: HashMap<String, usize>,
}

impl Program {
    pub fn fset(&self) -> &FileSet {
        &self.fset
    }

    pub fn table(&self) -> &TypeTable {
        &self.table
    }

    pub fn package(&self, path: &str) -> Option<&PackageInfo> {
        self.index.get(path).map(|&i| &self.packages[i])
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageInfo> {
        self.packages.iter()
    }
}

pub struct Loader {
    fset: FileSet,
    table: TypeTable,
    exports: HashMap<String, PkgExport>,
    packages: Vec<PackageInfo>,
    index: HashMap<String, usize>,
    loading: Vec<String>,
    gopath: Option<PathBuf>,
    file_seq: u32,
}

impl Loader {
    /// Creates a loader with the standard packages already checked in.
    pub fn new() -> Result<Self, Error> {
        let mut loader = Self {
            fset: FileSet::new(),
            table: TypeTable::new(),
            exports: HashMap::new(),
            packages: Vec::new(),
            index: HashMap::new(),
            loading: Vec::new(),
            gopath: std::env::var_os("GOPATH").map(PathBuf::from),
            file_seq: 0,
        };
        for &(path, src) in std_prelude::PACKAGES {
            let name = PathBuf::from(format!("{path}.go"));
            loader.load_source(path, vec![(name, src.to_string())])?;
        }
        Ok(loader)
    }

    pub fn finish(self) -> Program {
        Program {
            fset: self.fset,
            table: self.table,
            packages: self.packages,
            index: self.index,
        }
    }

    /// Loads explicit source files as one ad-hoc package whose import path is
    /// its package name.
    pub fn load_files(&mut self, paths: &[PathBuf]) -> Result<String, Error> {
        let mut sources = Vec::new();
        for p in paths {
            let src = std::fs::read_to_string(p)
                .map_err(|e| Error::Usage(format!("cannot read {}: {e}", p.display())))?;
            sources.push((p.clone(), src));
        }
        self.load(None, sources)
    }

    /// Loads the package in `dir` under the given import path.
    pub fn load_dir(&mut self, dir: &Path, import_path: &str) -> Result<String, Error> {
        if self.index.contains_key(import_path) {
            return Ok(import_path.to_string());
        }
        let mut sources = Vec::new();
        for name in go_files_in(dir, import_path)? {
            let full = dir.join(&name);
            let src = std::fs::read_to_string(&full).map_err(|e| Error::Load {
                path: full.clone(),
                message: e.to_string(),
            })?;
            sources.push((full, src));
        }
        self.load(Some(import_path), sources)
    }

    /// Loads an in-memory package; the backbone of the standard prelude and
    /// of tests.
    pub fn load_source(
        &mut self,
        import_path: &str,
        sources: Vec<(PathBuf, String)>,
    ) -> Result<String, Error> {
        self.load(Some(import_path), sources)
    }

    fn load(
        &mut self,
        import_path: Option<&str>,
        sources: Vec<(PathBuf, String)>,
    ) -> Result<String, Error> {
        if let Some(path) = import_path {
            if self.index.contains_key(path) {
                return Ok(path.to_string());
            }
            if self.loading.iter().any(|p| p == path) {
                return Err(Error::Load {
                    path: PathBuf::from(path),
                    message: format!("import cycle through {path}"),
                });
            }
            self.loading.push(path.to_string());
        }
        let result = self.load_inner(import_path, sources);
        if import_path.is_some() {
            self.loading.pop();
        }
        result
    }

    fn load_inner(
        &mut self,
        import_path: Option<&str>,
        sources: Vec<(PathBuf, String)>,
    ) -> Result<String, Error> {
        let err_path = import_path.map(PathBuf::from);
        let mut metas = Vec::with_capacity(sources.len());
        for (name, src) in sources {
            let base = self.fset.add(name.clone(), &src);
            self.file_seq += 1;
            metas.push((name, src, base, self.file_seq << 20));
        }
        let parsed: Vec<Result<File, Diagnostic>> = metas
            .par_iter()
            .map(|(name, src, base, id_base)| parser::parse_file(name.clone(), src, *base, *id_base))
            .collect();
        let mut files = Vec::with_capacity(parsed.len());
        for r in parsed {
            match r {
                Ok(f) => files.push(f),
                Err(d) => {
                    let at = err_path
                        .clone()
                        .unwrap_or_else(|| PathBuf::from("<files>"));
                    return Err(self.load_err(at, d));
                }
            }
        }

        let path = match import_path {
            Some(p) => p.to_string(),
            None => {
                let name = files
                    .first()
                    .map(|f| f.package.name.clone())
                    .ok_or_else(|| Error::Usage("no source files given".to_string()))?;
                if self.index.contains_key(&name) {
                    return Ok(name);
                }
                name
            }
        };

        let mut imports: Vec<String> = files
            .iter()
            .flat_map(|f| f.imports.iter().map(|i| i.path.clone()))
            .collect();
        imports.sort();
        imports.dedup();
        for imp in &imports {
            self.ensure_import(imp, &path)?;
        }

        let info = check::check_package(&mut self.table, &self.exports, &path, files)
            .map_err(|d| self.load_err(PathBuf::from(&path), d))?;

        let mut objects = HashMap::new();
        for &obj in &info.scope {
            objects.insert(self.table.obj(obj).name.clone(), obj);
        }
        self.exports.insert(
            path.clone(),
            PkgExport {
                name: info.name.clone(),
                objects,
            },
        );
        self.index.insert(path.clone(), self.packages.len());
        self.packages.push(info);
        debug!(path = %path, "loaded package");
        Ok(path)
    }

    fn ensure_import(&mut self, path: &str, from: &str) -> Result<(), Error> {
        if self.index.contains_key(path) {
            return Ok(());
        }
        let Some(gopath) = self.gopath.clone() else {
            return Err(Error::Load {
                path: PathBuf::from(from),
                message: format!("cannot find package {path}: GOPATH not set"),
            });
        };
        let dir = gopath.join("src").join(path);
        self.load_dir(&dir, path)?;
        Ok(())
    }

    fn load_err(&self, path: PathBuf, d: Diagnostic) -> Error {
        let pos = self.fset.position(d.span.start);
        Error::Load {
            path,
            message: format!(
                "{}:{}:{}: {}",
                pos.file.display(),
                pos.line,
                pos.column,
                d.message
            ),
        }
    }
}

/// Eligible source files in a directory, sorted by name: `.go`, not a test
/// file, not hidden.
fn go_files_in(dir: &Path, import_path: &str) -> Result<Vec<String>, Error> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::Load {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::Load {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(".go")
            || name.ends_with("_test.go")
            || name.starts_with('_')
            || name.starts_with('.')
        {
            continue;
        }
        names.push(name);
    }
    if names.is_empty() {
        return Err(Error::Load {
            path: dir.to_path_buf(),
            message: format!("no buildable source files for {import_path}"),
        });
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src_pkg(loader: &mut Loader, path: &str, src: &str) -> String {
        loader
            .load_source(path, vec![(PathBuf::from(format!("{path}/x.go")), src.into())])
            .expect("load must succeed")
    }

    #[test]
    fn std_packages_are_preloaded() {
        let loader = Loader::new().expect("std prelude must load");
        let program = loader.finish();
        assert!(program.package("io").is_some());
        assert!(program.package("fmt").is_some());
        assert!(program.package("sort").is_some());
    }

    #[test]
    fn std_imports_resolve_without_a_workspace() {
        let mut loader = Loader::new().expect("std prelude must load");
        let path = src_pkg(
            &mut loader,
            "p",
            "package p\n\nimport \"io\"\n\nfunc F(c io.Closer) {\n\tc.Close()\n}\n",
        );
        let program = loader.finish();
        assert!(program.package(&path).is_some());
    }

    #[test]
    fn type_errors_become_load_errors() {
        let mut loader = Loader::new().expect("std prelude must load");
        let err = loader
            .load_source(
                "bad",
                vec![(
                    PathBuf::from("bad/x.go"),
                    "package bad\n\nfunc F() {\n\tmissing()\n}\n".to_string(),
                )],
            )
            .expect_err("must fail");
        match err {
            Error::Load { message, .. } => assert!(message.contains("undefined: missing")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn loading_is_cached_by_path() {
        let mut loader = Loader::new().expect("std prelude must load");
        src_pkg(&mut loader, "p", "package p\n");
        let again = loader
            .load_source("p", vec![(PathBuf::from("other.go"), "package q\n".into())])
            .expect("cache hit");
        assert_eq!(again, "p");
        let program = loader.finish();
        assert_eq!(program.package("p").map(|p| p.name.as_str()), Some("p"));
    }
}
