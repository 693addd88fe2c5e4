// src/extract/declarations.rs

//! Line-based scanning for declared function and type names.
//!
//! This is a heuristic, not a parser: each language gets a pair of anchored
//! regexes applied line by line. Names are reported in source order with
//! duplicates removed.

use std::sync::LazyLock;

use regex::Regex;

/// Language family, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    Rust,
    Script,
    Go,
    CFamily,
    Other,
}

impl Language {
    /// `extension` may be given with or without the leading dot.
    pub fn from_extension(extension: &str) -> Self {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "py" => Language::Python,
            "rs" => Language::Rust,
            "js" | "jsx" | "ts" | "tsx" | "mjs" | "cjs" => Language::Script,
            "go" => Language::Go,
            "java" | "c" | "h" | "cpp" | "cc" | "hpp" | "cs" => Language::CFamily,
            _ => Language::Other,
        }
    }
}

/// Function and type names declared in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declarations {
    pub functions: Vec<String>,
    pub types: Vec<String>,
}

struct Patterns {
    functions: Vec<Regex>,
    types: Vec<Regex>,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    // Patterns are constants; a failure here is caught by the unit tests.
    patterns.iter().filter_map(|p| Regex::new(p).ok()).collect()
}

static PYTHON: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    functions: compile(&[r"^\s*(?:async\s+)?def\s+([A-Za-z_]\w*)"]),
    types: compile(&[r"^\s*class\s+([A-Za-z_]\w*)"]),
});

static RUST: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    functions: compile(&[
        r#"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+([A-Za-z_]\w*)"#,
    ]),
    types: compile(&[
        r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:unsafe\s+)?(?:struct|enum|trait|union|type)\s+([A-Za-z_]\w*)",
    ]),
});

static SCRIPT: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    functions: compile(&[
        r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)",
        r"^\s*(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?(?:\([^)]*\)|[A-Za-z_$][\w$]*)\s*=>",
    ]),
    types: compile(&[
        r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?(?:class|interface|type|enum)\s+([A-Za-z_$][\w$]*)",
    ]),
});

static GO: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    functions: compile(&[r"^func\s+(?:\([^)]*\)\s*)?([A-Za-z_]\w*)"]),
    types: compile(&[r"^type\s+([A-Za-z_]\w*)"]),
});

static C_FAMILY: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    functions: compile(&[r"^\s*(?:[\w:<>,\*&\[\]]+\s+)+[\*&]*([A-Za-z_]\w*)\s*\([^;]*$"]),
    types: compile(&[
        r"^\s*(?:(?:public|private|protected|abstract|final|static|sealed)\s+)*(?:class|interface|enum|struct|record)\s+([A-Za-z_]\w*)",
    ]),
});

/// Words that the C-family function pattern can mistake for a name.
const C_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "return", "else", "new", "catch", "sizeof", "delete",
];

/// Scan `content` for declarations in `language`.
pub fn scan(content: &str, language: Language) -> Declarations {
    let patterns: &Patterns = match language {
        Language::Python => &PYTHON,
        Language::Rust => &RUST,
        Language::Script => &SCRIPT,
        Language::Go => &GO,
        Language::CFamily => &C_FAMILY,
        Language::Other => return Declarations::default(),
    };

    let mut out = Declarations::default();

    for line in content.lines() {
        if let Some(name) = first_capture(&patterns.types, line) {
            push_unique(&mut out.types, name);
        } else if let Some(name) = first_capture(&patterns.functions, line) {
            if language == Language::CFamily && C_KEYWORDS.contains(&name) {
                continue;
            }
            push_unique(&mut out.functions, name);
        }
    }

    out
}

fn first_capture<'a>(regexes: &[Regex], line: &'a str) -> Option<&'a str> {
    regexes
        .iter()
        .find_map(|re| re.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str()))
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}
