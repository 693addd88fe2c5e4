// src/agents/mod.rs

//! Stage operations that call the model.
//!
//! Each agent is a [`StageOperation`](crate::dag::StageOperation) over the
//! coordinator's input and produces a [`StageOutput`]: a set of named
//! Markdown sections.

use std::collections::BTreeMap;

pub mod analysis;
pub mod api_docs;
pub mod readme;

pub use analysis::AnalysisAgent;
pub use api_docs::ApiDocsAgent;
pub use readme::ReadmeAgent;

/// Named sections produced by a stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOutput {
    sections: BTreeMap<String, String>,
}

impl StageOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.sections.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.sections.get(key).map(String::as_str)
    }

    /// Section text, or an empty string if the stage did not produce it.
    pub fn section(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.sections.keys().map(String::as_str)
    }
}

/// Who the model is asked to be for a stage.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Persona {
    pub role: &'static str,
    pub goal: &'static str,
    pub background: &'static str,
}

impl Persona {
    pub(crate) fn system_message(&self) -> String {
        format!(
            "You are a {}.\n\nGoal: {}\n\nBackground: {}\n\nProvide clear, professional, and comprehensive responses.",
            self.role, self.goal, self.background
        )
    }
}

/// Body of the first Markdown section whose header contains `header`
/// (case-insensitive), up to the next `##` header.
pub fn extract_section(text: &str, header: &str) -> String {
    let needle = header.to_uppercase();
    let mut captured: Vec<&str> = Vec::new();
    let mut capturing = false;

    for line in text.lines() {
        if capturing {
            if line.starts_with("##") {
                break;
            }
            captured.push(line);
        } else if line.to_uppercase().contains(&needle) {
            capturing = true;
        }
    }

    captured.join("\n").trim().to_string()
}
