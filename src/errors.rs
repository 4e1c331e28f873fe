//! Error taxonomy for the whole tool.
//!
//! Argument and workspace problems fail the run; a package that cannot be
//! loaded is reported once and skipped. Everything inside the analysis itself
//! is a silent skip, never an error: the tool under-reports, it does not
//! mis-report.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad command-line input: unknown path, malformed pattern, stray args.
    #[error("{0}")]
    Usage(String),

    /// A non-local package path was given but GOPATH is not set.
    #[error("GOPATH not set, cannot resolve {0}")]
    MissingWorkspace(String),

    /// The front-end could not produce a typed package. Reported once per
    /// package; the rest of the run continues.
    #[error("{path}: {message}", path = .path.display())]
    Load { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Rewrites absolute paths in load errors to be relative to `wd`, the way
    /// they are reported to the user.
    pub fn relativize(self, wd: &std::path::Path) -> Self {
        match self {
            Error::Load { path, message } => {
                let path = path
                    .strip_prefix(wd)
                    .map(|p| p.to_path_buf())
                    .unwrap_or(path);
                Error::Load { path, message }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn load_errors_are_relativized() {
        let err = Error::Load {
            path: PathBuf::from("/work/dir/pkg"),
            message: "bad package".to_string(),
        };
        match err.relativize(Path::new("/work/dir")) {
            Error::Load { path, .. } => assert_eq!(path, PathBuf::from("pkg")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn usage_error_displays_bare_message() {
        let err = Error::Usage("unwanted extra args".to_string());
        assert_eq!(err.to_string(), "unwanted extra args");
    }
}
