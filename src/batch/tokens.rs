// src/batch/tokens.rs

//! Token counting.

use std::fmt;

use tiktoken_rs::{CoreBPE, cl100k_base};

use crate::errors::{DocdagError, Result};
use crate::types::TokenizerKind;

/// Maps text to an integer cost.
///
/// Implementations must be deterministic: the same text always yields the
/// same count.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

impl<T: TokenCounter + ?Sized> TokenCounter for &T {
    fn count(&self, text: &str) -> usize {
        (**self).count(text)
    }
}

impl<T: TokenCounter + ?Sized> TokenCounter for Box<T> {
    fn count(&self, text: &str) -> usize {
        (**self).count(text)
    }
}

impl<T: TokenCounter + ?Sized> TokenCounter for std::sync::Arc<T> {
    fn count(&self, text: &str) -> usize {
        (**self).count(text)
    }
}

/// BPE counter using the `cl100k_base` encoding.
pub struct TiktokenCounter {
    bpe: CoreBPE,
}

impl TiktokenCounter {
    pub fn cl100k() -> Result<Self> {
        let bpe = cl100k_base().map_err(|e| {
            DocdagError::ConfigError(format!("failed to load cl100k encoding: {e}"))
        })?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

impl fmt::Debug for TiktokenCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TiktokenCounter(cl100k_base)")
    }
}

/// Counts whitespace-separated words.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceCounter;

impl TokenCounter for WhitespaceCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// Build the counter selected in configuration.
pub fn counter_for(kind: TokenizerKind) -> Result<Box<dyn TokenCounter>> {
    Ok(match kind {
        TokenizerKind::Cl100k => Box::new(TiktokenCounter::cl100k()?),
        TokenizerKind::Whitespace => Box::new(WhitespaceCounter),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_counter_counts_words() {
        assert_eq!(WhitespaceCounter.count("fn main() {\n  run();\n}"), 5);
        assert_eq!(WhitespaceCounter.count(""), 0);
    }

    #[test]
    fn cl100k_counts_hello_world_as_two_tokens() {
        let counter = TiktokenCounter::cl100k().unwrap();
        assert_eq!(counter.count("Hello world"), 2);
        assert_eq!(counter.count(""), 0);
    }

    #[test]
    fn counter_for_selects_implementation() {
        let counter = counter_for(TokenizerKind::Whitespace).unwrap();
        assert_eq!(counter.count("a b c"), 3);
    }
}
