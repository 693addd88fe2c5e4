// src/batch/summary.rs

//! Per-document metadata handed to the partitioner.

use thiserror::Error;

/// Metadata describing one source document.
///
/// Read-only once built. `token_cost` is the raw token count of the full
/// document content, computed once by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    identifier: String,
    name: String,
    extension: String,
    byte_size: u64,
    line_count: usize,
    function_names: Vec<String>,
    type_names: Vec<String>,
    preview: String,
    token_cost: usize,
}

impl DocumentSummary {
    pub fn builder(identifier: impl Into<String>) -> DocumentSummaryBuilder {
        DocumentSummaryBuilder::new(identifier)
    }

    /// Path relative to the collection root; unique within a run.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn function_names(&self) -> &[String] {
        &self.function_names
    }

    pub fn type_names(&self) -> &[String] {
        &self.type_names
    }

    pub fn preview(&self) -> &str {
        &self.preview
    }

    pub fn token_cost(&self) -> usize {
        self.token_cost
    }
}

/// Builder for [`DocumentSummary`].
///
/// `name` and `extension` default to the last path component of the
/// identifier and its extension.
#[derive(Debug, Clone)]
pub struct DocumentSummaryBuilder {
    identifier: String,
    name: Option<String>,
    extension: Option<String>,
    byte_size: u64,
    line_count: usize,
    function_names: Vec<String>,
    type_names: Vec<String>,
    preview: String,
    token_cost: usize,
}

impl DocumentSummaryBuilder {
    fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: None,
            extension: None,
            byte_size: 0,
            line_count: 0,
            function_names: Vec::new(),
            type_names: Vec::new(),
            preview: String::new(),
            token_cost: 0,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn byte_size(mut self, byte_size: u64) -> Self {
        self.byte_size = byte_size;
        self
    }

    pub fn line_count(mut self, line_count: usize) -> Self {
        self.line_count = line_count;
        self
    }

    pub fn function(mut self, name: impl Into<String>) -> Self {
        self.function_names.push(name.into());
        self
    }

    pub fn functions<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.function_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn type_name(mut self, name: impl Into<String>) -> Self {
        self.type_names.push(name.into());
        self
    }

    pub fn types<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.type_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = preview.into();
        self
    }

    pub fn token_cost(mut self, token_cost: usize) -> Self {
        self.token_cost = token_cost;
        self
    }

    pub fn build(self) -> DocumentSummary {
        let name = self.name.unwrap_or_else(|| {
            self.identifier
                .rsplit(['/', '\\'])
                .next()
                .unwrap_or(&self.identifier)
                .to_string()
        });
        let extension = self.extension.unwrap_or_else(|| {
            name.rsplit_once('.')
                .filter(|(stem, _)| !stem.is_empty())
                .map(|(_, ext)| format!(".{ext}"))
                .unwrap_or_default()
        });

        DocumentSummary {
            identifier: self.identifier,
            name,
            extension,
            byte_size: self.byte_size,
            line_count: self.line_count,
            function_names: self.function_names,
            type_names: self.type_names,
            preview: self.preview,
            token_cost: self.token_cost,
        }
    }
}

/// A document the extractor could not summarise.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to extract '{identifier}': {message}")]
pub struct ExtractionError {
    pub identifier: String,
    pub message: String,
}

impl ExtractionError {
    pub fn new(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            message: message.into(),
        }
    }
}

/// The extractor's per-document result.
pub type Extraction = Result<DocumentSummary, ExtractionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_derives_name_and_extension() {
        let summary = DocumentSummary::builder("src/engine/core.rs")
            .line_count(12)
            .function("step")
            .build();

        assert_eq!(summary.name(), "core.rs");
        assert_eq!(summary.extension(), ".rs");
        assert_eq!(summary.function_names(), ["step".to_string()]);
        assert!(summary.type_names().is_empty());
    }

    #[test]
    fn dotfile_has_no_extension() {
        let summary = DocumentSummary::builder(".gitignore").build();
        assert_eq!(summary.name(), ".gitignore");
        assert_eq!(summary.extension(), "");
    }
}
