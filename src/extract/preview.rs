// src/extract/preview.rs

//! Bounded "smart" preview of a document.

pub const DEFAULT_PREVIEW_LINES: usize = 30;

/// Only the head of a document is searched for interesting lines.
const SCAN_LINES: usize = 100;

/// Lines kept after each interesting line, so a definition keeps its
/// docstring or first statements.
const CONTEXT_AFTER: usize = 2;

const MARKERS: &[&str] = &[
    "def ", "class ", "\"\"\"", "'''", "//", "/*", "#", "function ", "const ", "interface ",
    "fn ", "struct ", "enum ", "trait ", "impl ", "func ", "type ",
];

/// Build a preview of at most `max_lines` lines.
///
/// Lines containing a definition or comment marker (plus a little trailing
/// context) are preferred. If none are found the first lines are used. When
/// the document is longer than `max_lines`, a trailer reports how many lines
/// were left out.
pub fn smart_preview(content: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    if lines.is_empty() || max_lines == 0 {
        return String::new();
    }

    let mut picked: Vec<usize> = Vec::new();
    let scan_end = lines.len().min(SCAN_LINES);

    for i in 0..scan_end {
        if picked.len() >= max_lines {
            break;
        }
        if !MARKERS.iter().any(|m| lines[i].contains(m)) {
            continue;
        }
        let end = (i + CONTEXT_AFTER + 1).min(lines.len());
        for j in i..end {
            if picked.last().is_none_or(|&last| j > last) {
                picked.push(j);
            }
        }
    }

    if picked.is_empty() {
        picked = (0..lines.len().min(max_lines)).collect();
    }
    picked.truncate(max_lines);

    let mut preview = picked
        .iter()
        .map(|&i| lines[i])
        .collect::<Vec<_>>()
        .join("\n");

    if lines.len() > max_lines {
        preview.push_str(&format!("\n... ({} more lines)", lines.len() - max_lines));
    }

    preview
}
