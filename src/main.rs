//! narrower CLI entry point.
//!
//! Exit codes: 0 on success (warnings are not errors), 1 on argument errors
//! or when any requested package failed to load.

use anyhow::Result;
use colored::Colorize;
use narrower::analysis::Linter;
use narrower::cli;
use narrower::io::output::{create_writer, WarnWriter as _};
use narrower::observability::init_tracing;
use std::io::Write;
use std::process::ExitCode;

fn main() -> ExitCode {
    init_tracing();
    let cli = cli::parse_args();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

/// Runs the lint; returns whether every requested package loaded cleanly.
fn run(cli: cli::Cli) -> Result<bool> {
    let linter = Linter::from_args(&cli.paths)?;
    for err in linter.load_errors() {
        eprintln!("{} {err}", "error:".red().bold());
    }

    let out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    };
    let mut writer = create_writer(cli.format.into(), out, cli.verbose);
    linter.check(|path, warns| writer.emit(path, warns))?;
    writer.finish()?;

    Ok(linter.load_errors().is_empty())
}
