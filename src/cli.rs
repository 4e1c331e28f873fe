use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "narrower")]
#[command(
    about = "Suggests narrower interface types for function parameters",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Source files, package paths, or recursive `path/...` patterns.
    /// Defaults to the current directory.
    pub paths: Vec<String>,

    /// Print each package path before its warnings
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: Format,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

impl From<Format> for crate::io::output::OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => crate::io::output::OutputFormat::Text,
            Format::Json => crate::io::output::OutputFormat::Json,
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["narrower"];
        full.extend(args);
        Cli::parse_from(full)
    }

    #[test]
    fn defaults() {
        let cli = parse(&[]);
        assert!(cli.paths.is_empty());
        assert!(!cli.verbose);
        assert_eq!(cli.format, Format::Text);
        assert!(cli.output.is_none());
    }

    #[test]
    fn paths_and_flags() {
        let cli = parse(&["-v", "--format", "json", "pkg/...", "other"]);
        assert!(cli.verbose);
        assert_eq!(cli.format, Format::Json);
        assert_eq!(cli.paths, vec!["pkg/...".to_string(), "other".to_string()]);
    }

    #[test]
    fn output_file_flag() {
        let cli = parse(&["-o", "warns.txt", "."]);
        assert_eq!(cli.output, Some(PathBuf::from("warns.txt")));
    }
}
