// src/dag/stage.rs

//! Closed set of stage identifiers.

use std::fmt;

/// A named unit of work in the stage graph.
///
/// Stages form a small closed set, so prerequisites are referenced by value
/// and a typo is a compile error rather than a lookup miss at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageId {
    Analysis,
    ApiDocs,
    Readme,
    Architecture,
}

impl StageId {
    pub const ALL: [StageId; 4] = [
        StageId::Analysis,
        StageId::ApiDocs,
        StageId::Readme,
        StageId::Architecture,
    ];

    /// Stable string form used in logs and failure messages.
    pub fn as_str(self) -> &'static str {
        match self {
            StageId::Analysis => "analysis",
            StageId::ApiDocs => "api_documentation",
            StageId::Readme => "readme_creation",
            StageId::Architecture => "architecture_docs",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a list of stages as `a, b, c` for messages.
pub(crate) fn join_stages(stages: &[StageId]) -> String {
    stages
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
