use std::str::FromStr;
use serde::Deserialize;

/// What happens to unrelated tasks once a stage in the run has failed.
///
/// - `Drain`: tasks already admitted keep running to completion; their results
///   are discarded because the run as a whole fails (default behaviour).
/// - `Cancel`: the concurrency gate is closed and every unfinished task is
///   aborted at its next suspension point. Aborted stages are recorded as
///   cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    Drain,
    Cancel,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Drain
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drain" => Ok(FailurePolicy::Drain),
            "cancel" => Ok(FailurePolicy::Cancel),
            other => Err(format!(
                "invalid on_failure: {other} (expected \"drain\" or \"cancel\")"
            )),
        }
    }
}

/// Tokenizer used to compute raw and prompt token costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerKind {
    /// BPE `cl100k_base` encoding.
    #[serde(alias = "cl100k_base")]
    Cl100k,
    /// Whitespace-separated word count. Cheap and deterministic.
    Whitespace,
}

impl Default for TokenizerKind {
    fn default() -> Self {
        TokenizerKind::Cl100k
    }
}

impl FromStr for TokenizerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cl100k" | "cl100k_base" => Ok(TokenizerKind::Cl100k),
            "whitespace" => Ok(TokenizerKind::Whitespace),
            other => Err(format!(
                "invalid tokenizer: {other} (expected \"cl100k\" or \"whitespace\")"
            )),
        }
    }
}
