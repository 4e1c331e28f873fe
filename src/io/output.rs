//! Warning emission.
//!
//! The text writer prints one line per warning in the stable
//! `file:line:col: name can be Type` form; the JSON writer collects
//! everything and serializes once at the end so the output is a single
//! well-formed document.

use crate::core::Warn;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Sink for per-package warnings. `emit` is called once per analyzed
/// package, in package order; `finish` closes the document.
pub trait WarnWriter {
    fn emit(&mut self, pkg_path: &str, warns: &[Warn]) -> io::Result<()>;
    fn finish(&mut self) -> io::Result<()>;
}

pub struct TextWriter<W: Write> {
    out: W,
    verbose: bool,
}

impl<W: Write> TextWriter<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self { out, verbose }
    }
}

impl<W: Write> WarnWriter for TextWriter<W> {
    fn emit(&mut self, pkg_path: &str, warns: &[Warn]) -> io::Result<()> {
        if self.verbose {
            writeln!(self.out, "{pkg_path}")?;
        }
        for w in warns {
            writeln!(self.out, "{w}")?;
        }
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

pub struct JsonWriter<W: Write> {
    out: W,
    collected: Vec<Warn>,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            collected: Vec::new(),
        }
    }
}

impl<W: Write> WarnWriter for JsonWriter<W> {
    fn emit(&mut self, _pkg_path: &str, warns: &[Warn]) -> io::Result<()> {
        self.collected.extend_from_slice(warns);
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, &self.collected)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

pub fn create_writer(
    format: OutputFormat,
    out: Box<dyn Write>,
    verbose: bool,
) -> Box<dyn WarnWriter> {
    match format {
        OutputFormat::Text => Box::new(TextWriter::new(out, verbose)),
        OutputFormat::Json => Box::new(JsonWriter::new(out)),
    }
}
