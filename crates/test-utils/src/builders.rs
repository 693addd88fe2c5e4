#![allow(dead_code)]

use docdag::batch::{DocumentSummary, Extraction, ExtractionError};
use docdag::config::{ConfigFile, RawConfigFile};
use docdag::types::{FailurePolicy, TokenizerKind};

/// A successful extraction with only an identifier and one line.
pub fn summary(identifier: &str) -> Extraction {
    Ok(DocumentSummary::builder(identifier).line_count(1).build())
}

/// A failed extraction.
pub fn failed(identifier: &str) -> Extraction {
    Err(ExtractionError::new(identifier, "unreadable"))
}

/// Identifiers of a list of extractions, skipping failures.
pub fn identifiers(extractions: &[Extraction]) -> Vec<String> {
    extractions
        .iter()
        .filter_map(|e| e.as_ref().ok())
        .map(|s| s.identifier().to_string())
        .collect()
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn max_parallel(mut self, n: usize) -> Self {
        self.config.scheduler.max_parallel = n;
        self
    }

    pub fn dependency_timeout_secs(mut self, secs: u64) -> Self {
        self.config.scheduler.dependency_timeout_secs = secs;
        self
    }

    pub fn on_failure(mut self, policy: FailurePolicy) -> Self {
        self.config.scheduler.on_failure = policy;
        self
    }

    pub fn max_chunk_tokens(mut self, n: usize) -> Self {
        self.config.batching.max_chunk_tokens = n;
        self
    }

    pub fn tokenizer(mut self, kind: TokenizerKind) -> Self {
        self.config.batching.tokenizer = kind;
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config.extract.exclude.push(pattern.to_string());
        self
    }

    pub fn model_cmd(mut self, cmd: &str) -> Self {
        self.config.model.cmd = cmd.to_string();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
