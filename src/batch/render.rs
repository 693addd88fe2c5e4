// src/batch/render.rs

//! Labelled textual form of a summary, as it appears in model prompts.

use std::fmt::Write;

use crate::batch::summary::DocumentSummary;

pub const DEFAULT_MAX_FUNCTIONS: usize = 15;
pub const DEFAULT_MAX_TYPES: usize = 10;

/// Caps on how many declarations are listed per summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub max_functions: usize,
    pub max_types: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_functions: DEFAULT_MAX_FUNCTIONS,
            max_types: DEFAULT_MAX_TYPES,
        }
    }
}

/// Render `summary` into the block that is fed to the model and whose token
/// count is the summary's prompt cost.
pub fn render_summary(summary: &DocumentSummary, options: &RenderOptions) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "## {}\n", summary.name());
    let _ = writeln!(out, "- Path: {}", summary.identifier());
    let _ = writeln!(out, "- Lines: {}", summary.line_count());
    let _ = writeln!(out, "- Size: {} bytes", summary.byte_size());

    if !summary.function_names().is_empty() {
        let listed = capped(summary.function_names(), options.max_functions);
        let _ = write!(out, "\n**Functions**: {listed}\n");
    }

    if !summary.type_names().is_empty() {
        let listed = capped(summary.type_names(), options.max_types);
        let _ = write!(out, "\n**Types**: {listed}\n");
    }

    if !summary.preview().is_empty() {
        let _ = write!(out, "\n**Code Preview**:\n```\n{}\n```\n", summary.preview());
    }

    out
}

fn capped(names: &[String], cap: usize) -> String {
    names
        .iter()
        .take(cap)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
