// src/extract/mod.rs

//! Turning source documents into [`DocumentSummary`](crate::batch::DocumentSummary)
//! values.
//!
//! [`SourceExtractor`] is the filesystem implementation; the partitioner only
//! sees the resulting extractions.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::batch::summary::Extraction;

pub mod declarations;
pub mod preview;
pub mod source;

pub use declarations::{Declarations, Language};
pub use source::{SourceExtractor, SourceFilter, collect_sources};

/// Produces a summary for one document, or says why it could not.
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Extraction;
}

/// Extract every path in order. Failures are kept in place so callers can
/// report them; the partitioner skips them.
pub fn extract_all(extractor: &dyn MetadataExtractor, paths: &[PathBuf]) -> Vec<Extraction> {
    paths
        .iter()
        .map(|path| {
            let extraction = extractor.extract(path);
            if let Err(err) = &extraction {
                debug!(identifier = %err.identifier, error = %err.message, "extraction failed");
            }
            extraction
        })
        .collect()
}
