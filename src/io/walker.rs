//! Command-line target expansion.
//!
//! Arguments are either explicit `.go` files (which form one ad-hoc
//! package), package paths, or recursive `path/...` patterns. Recursive
//! patterns walk the directory tree, skipping `testdata`, `vendor`, and
//! underscore/dot directories; non-local paths resolve under `$GOPATH/src`.

use crate::errors::Error;
use ignore::WalkBuilder;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static SKIP_DIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(testdata|vendor|_.*|\..+)$").expect("skip regex is valid"));

/// One loadable unit derived from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Explicit source files forming one ad-hoc package.
    Files(Vec<PathBuf>),
    /// A package directory and the import path to load it under.
    Dir { import_path: String, dir: PathBuf },
}

/// Expands command-line arguments into loadable targets. No arguments means
/// the current directory; a first argument ending in `.go` switches to
/// file mode for the whole argument list.
pub fn expand(args: &[String]) -> Result<Vec<Target>, Error> {
    if args.is_empty() {
        return Ok(vec![dir_target(".")?]);
    }
    if args[0].ends_with(".go") {
        for a in args {
            if !a.ends_with(".go") {
                return Err(Error::Usage(format!(
                    "cannot mix source files with package path {a}"
                )));
            }
        }
        return Ok(vec![Target::Files(
            args.iter().map(PathBuf::from).collect(),
        )]);
    }
    let mut targets = Vec::new();
    for arg in args {
        match arg.strip_suffix("/...") {
            Some(base) => targets.extend(recurse_dirs(base)?),
            None => targets.push(dir_target(arg)?),
        }
    }
    Ok(targets)
}

fn is_local(path: &str) -> bool {
    path == "." || path.starts_with("./") || Path::new(path).is_absolute()
}

fn workspace_src(requested: &str) -> Result<PathBuf, Error> {
    match std::env::var_os("GOPATH") {
        Some(gopath) => Ok(PathBuf::from(gopath).join("src")),
        None => Err(Error::MissingWorkspace(requested.to_string())),
    }
}

fn dir_target(path: &str) -> Result<Target, Error> {
    let dir = if is_local(path) {
        PathBuf::from(path)
    } else {
        workspace_src(path)?.join(path)
    };
    if !dir.is_dir() {
        return Err(Error::Usage(format!("unknown path {path}")));
    }
    Ok(Target::Dir {
        import_path: path.to_string(),
        dir,
    })
}

/// All package directories under `base`, in sorted walk order.
fn recurse_dirs(base: &str) -> Result<Vec<Target>, Error> {
    let local = is_local(base);
    let (root, src_root) = if local {
        (PathBuf::from(base), None)
    } else {
        let src = workspace_src(base)?;
        (src.join(base), Some(src))
    };
    if !root.is_dir() {
        return Err(Error::Usage(format!("unknown path {base}")));
    }

    let walker = WalkBuilder::new(&root)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_path(|a, b| a.cmp(b))
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_some_and(|t| t.is_dir()) {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !SKIP_DIR.is_match(&name)
        })
        .build();

    let mut targets = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| Error::Usage(format!("cannot walk {base}: {e}")))?;
        if !entry.file_type().is_some_and(|t| t.is_dir()) {
            continue;
        }
        let dir = entry.path().to_path_buf();
        if !has_go_files(&dir) {
            continue;
        }
        let import_path = match &src_root {
            None => {
                let s = dir.to_string_lossy().into_owned();
                if s == "." || s.starts_with("./") || Path::new(&s).is_absolute() {
                    s
                } else {
                    format!("./{s}")
                }
            }
            Some(src) => dir
                .strip_prefix(src)
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|_| dir.to_string_lossy().into_owned()),
        };
        targets.push(Target::Dir { import_path, dir });
    }
    Ok(targets)
}

fn has_go_files(dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".go")
            && !name.ends_with("_test.go")
            && !name.starts_with('_')
            && !name.starts_with('.')
        {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, rel: &str, contents: &str) {
        let full = dir.join(rel);
        fs::create_dir_all(full.parent().expect("file has a parent")).expect("mkdir");
        fs::write(full, contents).expect("write fixture");
    }

    #[test]
    fn no_args_means_current_directory() {
        let targets = expand(&[]).expect("expand");
        assert_eq!(targets.len(), 1);
        match &targets[0] {
            Target::Dir { import_path, .. } => assert_eq!(import_path, "."),
            other => panic!("unexpected target {other:?}"),
        }
    }

    #[test]
    fn go_files_form_one_target() {
        let targets =
            expand(&["a.go".to_string(), "b.go".to_string()]).expect("expand");
        assert_eq!(
            targets,
            vec![Target::Files(vec![
                PathBuf::from("a.go"),
                PathBuf::from("b.go")
            ])]
        );
    }

    #[test]
    fn mixing_files_and_packages_is_rejected() {
        let err = expand(&["a.go".to_string(), "pkg".to_string()]).expect_err("must fail");
        assert!(matches!(err, Error::Usage(_)));
    }

    #[test]
    fn recursion_skips_testdata_and_vendor() {
        let tmp = TempDir::new().expect("tempdir");
        let root = tmp.path();
        touch(root, "a/x.go", "package a\n");
        touch(root, "a/testdata/x.go", "package ignored\n");
        touch(root, "vendor/dep/x.go", "package dep\n");
        touch(root, "_wip/x.go", "package wip\n");
        touch(root, "b/nested/x.go", "package nested\n");
        touch(root, "empty/readme.txt", "no sources\n");

        let pattern = format!("{}/...", root.display());
        let targets = expand(&[pattern]).expect("expand");
        let dirs: Vec<String> = targets
            .iter()
            .map(|t| match t {
                Target::Dir { dir, .. } => dir
                    .strip_prefix(root)
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                other => panic!("unexpected target {other:?}"),
            })
            .collect();
        assert_eq!(dirs, vec!["a".to_string(), "b/nested".to_string()]);
    }

    #[test]
    fn unknown_paths_are_usage_errors() {
        let err = expand(&["./definitely-missing-dir".to_string()]).expect_err("must fail");
        assert!(matches!(err, Error::Usage(_)));
    }
}
