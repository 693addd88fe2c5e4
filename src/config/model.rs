// src/config/model.rs

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

use crate::batch::RenderOptions;
use crate::dag::SchedulerOptions;
use crate::types::{FailurePolicy, TokenizerKind};

/// Configuration exactly as read from TOML, before validation.
///
/// ```toml
/// [scheduler]
/// max_parallel = 3
/// dependency_timeout_secs = 300
/// on_failure = "drain"
///
/// [batching]
/// max_chunk_tokens = 6000
/// tokenizer = "cl100k"
///
/// [extract]
/// extensions = [".py", ".rs"]
/// exclude = ["vendor/**"]
///
/// [model]
/// cmd = "llm"
/// ```
///
/// Every section and field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub scheduler: SchedulerSection,

    #[serde(default)]
    pub batching: BatchingSection,

    #[serde(default)]
    pub extract: ExtractSection,

    #[serde(default)]
    pub model: ModelSection,
}

/// Validated configuration. Only constructed through
/// `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub scheduler: SchedulerSection,
    pub batching: BatchingSection,
    pub extract: ExtractSection,
    pub model: ModelSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            scheduler: raw.scheduler,
            batching: raw.batching,
            extract: raw.extract,
            model: raw.model,
        }
    }

    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            max_parallel: self.scheduler.max_parallel,
            dependency_timeout: Duration::from_secs(self.scheduler.dependency_timeout_secs),
            on_failure: self.scheduler.on_failure,
        }
    }

    /// Token budget per batch. Validation guarantees it is non-zero.
    pub fn budget(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.batching.max_chunk_tokens).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            max_functions: self.batching.max_functions,
            max_types: self.batching.max_types,
        }
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.extract.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn model_min_interval(&self) -> Duration {
        Duration::from_millis(self.model.min_interval_ms)
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(RawConfigFile::default())
    }
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSection {
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    #[serde(default = "default_dependency_timeout_secs")]
    pub dependency_timeout_secs: u64,

    /// `"drain"` (default) or `"cancel"`.
    #[serde(default)]
    pub on_failure: FailurePolicy,
}

fn default_max_parallel() -> usize {
    3
}

fn default_dependency_timeout_secs() -> u64 {
    300
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            dependency_timeout_secs: default_dependency_timeout_secs(),
            on_failure: FailurePolicy::default(),
        }
    }
}

/// `[batching]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchingSection {
    #[serde(default = "default_max_chunk_tokens")]
    pub max_chunk_tokens: usize,

    #[serde(default)]
    pub tokenizer: TokenizerKind,

    /// Function names listed per summary in prompts.
    #[serde(default = "default_max_functions")]
    pub max_functions: usize,

    /// Type names listed per summary in prompts.
    #[serde(default = "default_max_types")]
    pub max_types: usize,
}

fn default_max_chunk_tokens() -> usize {
    6000
}

fn default_max_functions() -> usize {
    15
}

fn default_max_types() -> usize {
    10
}

impl Default for BatchingSection {
    fn default() -> Self {
        Self {
            max_chunk_tokens: default_max_chunk_tokens(),
            tokenizer: TokenizerKind::default(),
            max_functions: default_max_functions(),
            max_types: default_max_types(),
        }
    }
}

/// `[extract]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractSection {
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Glob patterns, relative to the source root, that are never read.
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    #[serde(default = "default_preview_lines")]
    pub preview_lines: usize,
}

fn default_extensions() -> Vec<String> {
    [
        ".py", ".js", ".ts", ".jsx", ".tsx", ".java", ".cpp", ".c", ".go", ".rs", ".html", ".css",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_file_size_mb() -> u64 {
    50
}

fn default_preview_lines() -> usize {
    30
}

impl Default for ExtractSection {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude: Vec::new(),
            max_file_size_mb: default_max_file_size_mb(),
            preview_lines: default_preview_lines(),
        }
    }
}

/// `[model]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelSection {
    /// Shell command that reads a prompt on stdin and writes the completion
    /// to stdout.
    #[serde(default = "default_model_cmd")]
    pub cmd: String,

    /// Total attempts per model call.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Minimum gap between the starts of two model calls. `0` disables it.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
}

fn default_model_cmd() -> String {
    "llm".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_min_interval_ms() -> u64 {
    100
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            cmd: default_model_cmd(),
            max_retries: default_max_retries(),
            min_interval_ms: default_min_interval_ms(),
        }
    }
}
