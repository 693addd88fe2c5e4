// src/extract/source.rs

//! Filesystem-backed extraction.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};

use crate::batch::summary::{DocumentSummary, Extraction, ExtractionError};
use crate::batch::tokens::TokenCounter;
use crate::extract::MetadataExtractor;
use crate::extract::declarations::{Language, scan};
use crate::extract::preview::{DEFAULT_PREVIEW_LINES, smart_preview};

/// Reads source files from disk and summarises them.
///
/// Identifiers are paths relative to `root`, with `/` separators.
pub struct SourceExtractor {
    root: PathBuf,
    counter: Arc<dyn TokenCounter>,
    preview_lines: usize,
}

impl SourceExtractor {
    pub fn new(root: impl Into<PathBuf>, counter: Arc<dyn TokenCounter>) -> Self {
        Self {
            root: root.into(),
            counter,
            preview_lines: DEFAULT_PREVIEW_LINES,
        }
    }

    pub fn with_preview_lines(mut self, preview_lines: usize) -> Self {
        self.preview_lines = preview_lines;
        self
    }

    fn identifier_for(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.to_string_lossy().replace('\\', "/")
    }

    /// Summarise already-loaded content. Invalid UTF-8 has been replaced by
    /// the caller.
    pub fn summarise(&self, identifier: &str, content: &str) -> DocumentSummary {
        let extension = Path::new(identifier)
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let declarations = scan(content, Language::from_extension(&extension));

        DocumentSummary::builder(identifier)
            .byte_size(content.len() as u64)
            .line_count(content.lines().count())
            .functions(declarations.functions)
            .types(declarations.types)
            .preview(smart_preview(content, self.preview_lines))
            .token_cost(self.counter.count(content))
            .build()
    }
}

impl MetadataExtractor for SourceExtractor {
    fn extract(&self, path: &Path) -> Extraction {
        let identifier = self.identifier_for(path);
        let bytes = fs::read(path).map_err(|e| ExtractionError::new(&identifier, e.to_string()))?;
        let content = String::from_utf8_lossy(&bytes);
        Ok(self.summarise(&identifier, &content))
    }
}

/// Which files under a root are eligible for extraction.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    extensions: Vec<String>,
    exclude: Option<GlobSet>,
    max_file_size: u64,
}

impl SourceFilter {
    /// `extensions` are matched case-insensitively, with or without the
    /// leading dot. `exclude` holds glob patterns relative to the root.
    pub fn new(extensions: &[String], exclude: &[String], max_file_size: u64) -> anyhow::Result<Self> {
        let extensions = extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();

        let exclude = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude)?)
        };

        Ok(Self {
            extensions,
            exclude,
            max_file_size,
        })
    }

    fn accepts(&self, rel_path: &str, size: u64) -> bool {
        let ext = Path::new(rel_path)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());

        let Some(ext) = ext else {
            return false;
        };
        if !self.extensions.iter().any(|e| *e == ext) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        if size > self.max_file_size {
            warn!(path = %rel_path, size, limit = self.max_file_size, "skipping oversized file");
            return false;
        }
        true
    }
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Collect every file under `root` accepted by `filter`, sorted by path.
///
/// Hidden directories (leading `.`) are not descended into.
pub fn collect_sources(root: &Path, filter: &SourceFilter) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries =
            fs::read_dir(&dir).with_context(|| format!("reading directory {}", dir.display()))?;

        for entry in entries {
            let entry = entry.with_context(|| format!("reading entry in {}", dir.display()))?;
            let path = entry.path();
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                let hidden = entry.file_name().to_string_lossy().starts_with('.');
                if !hidden {
                    stack.push(path);
                }
            } else if file_type.is_file() {
                let Ok(rel) = path.strip_prefix(root) else {
                    continue;
                };
                let rel_str = rel.to_string_lossy().replace('\\', "/");
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                if filter.accepts(&rel_str, size) {
                    files.push(path);
                }
            }
        }
    }

    files.sort();
    debug!(root = %root.display(), files = files.len(), "collected source files");
    Ok(files)
}
