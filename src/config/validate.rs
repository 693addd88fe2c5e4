// src/config/validate.rs

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DocdagError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DocdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_scheduler(cfg)?;
    validate_batching(cfg)?;
    validate_extract(cfg)?;
    validate_model(cfg)?;
    Ok(())
}

fn at_least_one(section: &str, field: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(DocdagError::ConfigError(format!(
            "[{section}].{field} must be >= 1 (got 0)"
        )));
    }
    Ok(())
}

/// One week. Longer waits are almost certainly a typo.
pub const MAX_DEPENDENCY_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

fn validate_scheduler(cfg: &RawConfigFile) -> Result<()> {
    // on_failure is strongly typed and checked during deserialization.
    at_least_one("scheduler", "max_parallel", cfg.scheduler.max_parallel as u64)?;

    let timeout = cfg.scheduler.dependency_timeout_secs;
    at_least_one("scheduler", "dependency_timeout_secs", timeout)?;
    if timeout > MAX_DEPENDENCY_TIMEOUT_SECS {
        return Err(DocdagError::ConfigError(format!(
            "[scheduler].dependency_timeout_secs must be <= {MAX_DEPENDENCY_TIMEOUT_SECS} (got {timeout})"
        )));
    }
    Ok(())
}

fn validate_batching(cfg: &RawConfigFile) -> Result<()> {
    at_least_one("batching", "max_chunk_tokens", cfg.batching.max_chunk_tokens as u64)
}

fn validate_extract(cfg: &RawConfigFile) -> Result<()> {
    if cfg.extract.extensions.is_empty() {
        return Err(DocdagError::ConfigError(
            "[extract].extensions must list at least one extension".to_string(),
        ));
    }
    at_least_one("extract", "max_file_size_mb", cfg.extract.max_file_size_mb)?;
    at_least_one("extract", "preview_lines", cfg.extract.preview_lines as u64)?;

    for pattern in cfg.extract.exclude.iter() {
        Glob::new(pattern).map_err(|e| {
            DocdagError::ConfigError(format!("[extract].exclude has invalid glob '{pattern}': {e}"))
        })?;
    }
    Ok(())
}

pub const MAX_MIN_INTERVAL_MS: u64 = 60_000;

fn validate_model(cfg: &RawConfigFile) -> Result<()> {
    if cfg.model.cmd.trim().is_empty() {
        return Err(DocdagError::ConfigError(
            "[model].cmd must not be empty".to_string(),
        ));
    }
    at_least_one("model", "max_retries", u64::from(cfg.model.max_retries))?;
    if cfg.model.min_interval_ms > MAX_MIN_INTERVAL_MS {
        return Err(DocdagError::ConfigError(format!(
            "[model].min_interval_ms must be <= {MAX_MIN_INTERVAL_MS} (got {})",
            cfg.model.min_interval_ms
        )));
    }
    Ok(())
}
