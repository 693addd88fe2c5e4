// src/logging.rs

//! Logging for `docdag`.
//!
//! `--log-level` wins when given. Otherwise `DOCDAG_LOG` is read as an
//! `EnvFilter` directive string, so `DOCDAG_LOG=docdag::dag=debug,info` scopes
//! verbose output to the scheduler. With neither, docdag logs at `info`.
//!
//! Everything goes to stderr; stdout carries the dry-run plan.

use anyhow::Result;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "DOCDAG_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let (filter, rejected) = match select_filter(cli_level, env.as_deref()) {
        Ok(filter) => (filter, None),
        Err(err) => (EnvFilter::new(DEFAULT_DIRECTIVES), Some(err)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))?;

    if let Some(err) = rejected {
        warn!(env = LOG_ENV, error = %err, "ignoring invalid log directives");
    }
    Ok(())
}

fn select_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> Result<EnvFilter, ParseError> {
    if let Some(level) = cli_level {
        return EnvFilter::try_new(level.directive());
    }
    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives),
        None => EnvFilter::try_new(DEFAULT_DIRECTIVES),
    }
}
