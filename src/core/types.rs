//! Shared data model: source positions and warnings.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// A resolved location in the analyzed sources.
///
/// `line` and `column` are 1-based; `column` counts bytes, matching the
/// convention of the toolchains this linter sits alongside. `offset` is the
/// global byte offset in the file set and is what warnings are ordered by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// A suggestion that a function parameter could be declared with a narrower
/// interface type without changing the function's behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warn {
    pub pos: Position,
    /// Parameter name as written in the declaration.
    pub name: String,
    /// Short rendering of the suggested interface, already adjusted for the
    /// reporting package's imports.
    pub new_type: String,
}

impl fmt::Display for Warn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} can be {}",
            self.pos.file.display(),
            self.pos.line,
            self.pos.column,
            self.name,
            self.new_type
        )
    }
}

/// Orders warnings the way they are emitted: by global source offset.
pub fn sort_by_offset(warns: &mut [Warn]) {
    warns.sort_by_key(|w| w.pos.offset);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warn(offset: usize, name: &str) -> Warn {
        Warn {
            pos: Position {
                file: PathBuf::from("a.go"),
                line: 1,
                column: offset,
                offset,
            },
            name: name.to_string(),
            new_type: "io.Closer".to_string(),
        }
    }

    #[test]
    fn display_matches_report_format() {
        let w = warn(5, "c");
        assert_eq!(w.to_string(), "a.go:1:5: c can be io.Closer");
    }

    #[test]
    fn sorting_is_by_offset() {
        let mut ws = vec![warn(30, "b"), warn(10, "a"), warn(20, "c")];
        sort_by_offset(&mut ws);
        let names: Vec<_> = ws.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, ["a", "c", "b"]);
    }
}
