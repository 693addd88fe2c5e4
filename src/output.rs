// src/output.rs

//! Persisting stage outputs as Markdown files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::agents::analysis::{
    ARCHITECTURE_OVERVIEW, COMPONENT_ANALYSIS, DEPENDENCIES, FILE_STRUCTURE, KEY_PATTERNS,
    TECH_STACK,
};
use crate::agents::api_docs::{API_REFERENCE, EXAMPLES, QUICK_REFERENCE};
use crate::agents::readme::{BADGES, README_CONTENT};
use crate::agents::StageOutput;
use crate::dag::{Results, StageId};
use crate::errors::Result;

pub const README_FILE: &str = "README.md";
pub const API_REFERENCE_FILE: &str = "API_REFERENCE.md";
pub const EXAMPLES_FILE: &str = "EXAMPLES.md";
pub const ARCHITECTURE_FILE: &str = "ARCHITECTURE.md";

/// Write every document that can be built from `results` into `out_dir`,
/// creating it if needed. Returns the paths written, in a stable order.
pub fn write_outputs(out_dir: &Path, project_name: &str, results: &Results<StageOutput>) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;

    let mut documents: Vec<(&str, String)> = Vec::new();

    if let Some(analysis) = results.get(&StageId::Analysis) {
        documents.push((ARCHITECTURE_FILE, architecture_document(project_name, analysis)));
    }

    if let Some(api) = results.get(&StageId::ApiDocs) {
        let mut reference = api.section(API_REFERENCE).to_string();
        let quick = api.section(QUICK_REFERENCE);
        if !quick.is_empty() {
            reference.push_str("\n\n");
            reference.push_str(quick);
        }
        documents.push((API_REFERENCE_FILE, reference));
        documents.push((EXAMPLES_FILE, api.section(EXAMPLES).to_string()));
    }

    if let Some(readme) = results.get(&StageId::Readme) {
        let badges = readme.section(BADGES);
        let content = readme.section(README_CONTENT);
        let text = if badges.is_empty() {
            content.to_string()
        } else {
            format!("{badges}\n\n{content}")
        };
        documents.push((README_FILE, text));
    }

    let mut written = Vec::with_capacity(documents.len());
    for (file, text) in documents {
        let path = out_dir.join(file);
        fs::write(&path, ensure_trailing_newline(text))?;
        info!(path = %path.display(), "wrote document");
        written.push(path);
    }

    Ok(written)
}

fn architecture_document(project_name: &str, analysis: &StageOutput) -> String {
    let sections = [
        ("Overview", ARCHITECTURE_OVERVIEW),
        ("Components", COMPONENT_ANALYSIS),
        ("Technology Stack", TECH_STACK),
        ("Dependencies", DEPENDENCIES),
        ("Design Patterns", KEY_PATTERNS),
        ("File Structure", FILE_STRUCTURE),
    ];

    let mut doc = format!("# {project_name} Architecture\n");
    for (title, key) in sections {
        let body = analysis.section(key);
        if !body.is_empty() {
            doc.push_str(&format!("\n## {title}\n\n{body}\n"));
        }
    }
    doc
}

fn ensure_trailing_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn architecture_skips_empty_sections() {
        let analysis = StageOutput::new()
            .with(ARCHITECTURE_OVERVIEW, "Layered.")
            .with(TECH_STACK, "");
        let doc = architecture_document("demo", &analysis);
        assert_eq!(doc, "# demo Architecture\n\n## Overview\n\nLayered.\n");
    }
}
