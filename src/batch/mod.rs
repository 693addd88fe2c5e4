// src/batch/mod.rs

//! Document summaries and token-budget batching.

pub mod partition;
pub mod render;
pub mod summary;
pub mod tokens;

pub use partition::{Batch, BatchPartitioner};
pub use render::{RenderOptions, render_summary};
pub use summary::{DocumentSummary, DocumentSummaryBuilder, Extraction, ExtractionError};
pub use tokens::{TiktokenCounter, TokenCounter, WhitespaceCounter, counter_for};
