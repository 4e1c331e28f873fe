//! Source spans, diagnostics, and the file set shared by every loaded package.

use crate::core::Position;
use std::path::PathBuf;

/// Half-open byte range in the global file set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A diagnostic produced by the lexer, parser, or type checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (at byte range {}..{})",
            self.message, self.span.start, self.span.end
        )
    }
}

struct SourceFile {
    name: PathBuf,
    base: usize,
    len: usize,
    /// Byte offsets, relative to `base`, at which each line starts.
    line_starts: Vec<usize>,
}

/// Maps global byte offsets back to file, line, and column.
///
/// Every file of every loaded package is registered here once, each claiming
/// a disjoint offset range, so a single `usize` identifies a source location
/// program-wide and warnings can be ordered by it.
#[derive(Default)]
pub struct FileSet {
    files: Vec<SourceFile>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a file and returns the base offset its spans start at.
    pub fn add(&mut self, name: PathBuf, src: &str) -> usize {
        let base = self
            .files
            .last()
            .map(|f| f.base + f.len + 1)
            .unwrap_or(1);
        let mut line_starts = vec![0];
        for (i, b) in src.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        self.files.push(SourceFile {
            name,
            base,
            len: src.len(),
            line_starts,
        });
        base
    }

    /// Resolves a global offset to a position. Offsets outside any file clamp
    /// to the nearest file; the analyzer only passes offsets it got from
    /// parsed spans.
    pub fn position(&self, offset: usize) -> Position {
        let idx = self
            .files
            .partition_point(|f| f.base <= offset)
            .saturating_sub(1);
        let file = &self.files[idx];
        let rel = offset.saturating_sub(file.base).min(file.len);
        let line_idx = file
            .line_starts
            .partition_point(|&s| s <= rel)
            .saturating_sub(1);
        Position {
            file: file.name.clone(),
            line: line_idx + 1,
            column: rel - file.line_starts[line_idx] + 1,
            offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_spans_lines_and_files() {
        let mut fset = FileSet::new();
        let base_a = fset.add(PathBuf::from("a.go"), "one\ntwo\n");
        let base_b = fset.add(PathBuf::from("b.go"), "x := 1\n");

        let p = fset.position(base_a);
        assert_eq!((p.line, p.column), (1, 1));
        let p = fset.position(base_a + 4);
        assert_eq!((p.line, p.column), (2, 1));
        assert_eq!(p.file, PathBuf::from("a.go"));

        let p = fset.position(base_b + 5);
        assert_eq!(p.file, PathBuf::from("b.go"));
        assert_eq!((p.line, p.column), (1, 6));
    }
}
