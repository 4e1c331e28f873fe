//! Input/output: command-line target expansion and warning writers.

pub mod output;
pub mod walker;

pub use output::{create_writer, OutputFormat, WarnWriter};
pub use walker::{expand, Target};
