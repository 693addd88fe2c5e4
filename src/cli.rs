// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `docdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "docdag",
    version,
    about = "Generate architecture, API and README documents for a source tree.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// If omitted, `docdag.toml` in the current directory is used when it
    /// exists, otherwise built-in defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Root of the source tree to document.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Directory the generated Markdown files are written to.
    #[arg(long, value_name = "DIR", default_value = "docs")]
    pub out: PathBuf,

    /// Project name used in prompts and headings.
    ///
    /// Defaults to the name of the root directory.
    #[arg(long, value_name = "NAME")]
    pub project_name: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DOCDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Extract and partition, print the batch plan, but don't call the model.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_flags() {
        let args = CliArgs::try_parse_from(["docdag"]).unwrap();
        assert_eq!(args.root, PathBuf::from("."));
        assert_eq!(args.out, PathBuf::from("docs"));
        assert!(args.config.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn parses_every_flag() {
        let args = CliArgs::try_parse_from([
            "docdag",
            "--config",
            "cfg.toml",
            "--root",
            "src",
            "--out",
            "out",
            "--project-name",
            "demo",
            "--log-level",
            "debug",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("cfg.toml")));
        assert_eq!(args.project_name.as_deref(), Some("demo"));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert!(args.dry_run);
    }
}
