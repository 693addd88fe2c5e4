// src/agents/readme.rs

//! Stage 2b: project README.

use std::sync::Arc;

use tracing::info;

use crate::agents::analysis::{ARCHITECTURE_OVERVIEW, COMPONENT_ANALYSIS, TECH_STACK};
use crate::agents::{Persona, StageOutput};
use crate::coordinator::CoordinatorInput;
use crate::dag::{OperationError, Results, StageFuture, StageId, StageOperation};
use crate::model::{ModelClient, ModelError};

pub const README_CONTENT: &str = "readme_content";
pub const BADGES: &str = "badges";

/// Only the head of the component breakdown is quoted in the prompt.
const COMPONENT_EXCERPT_CHARS: usize = 500;

const PERSONA: Persona = Persona {
    role: "Developer Advocate",
    goal: "Write an engaging, accurate README that gets new users productive quickly",
    background: "You have written READMEs for many popular open source projects and know what \
                 readers look for first: what it is, how to install it and how to use it.",
};

/// Keyword found in the tech stack, and the badge advertising it.
const BADGE_TABLE: &[(&str, &str)] = &[
    ("python", "![Python](https://img.shields.io/badge/python-3.9+-blue.svg)"),
    ("rust", "![Rust](https://img.shields.io/badge/rust-2024-orange.svg)"),
    ("typescript", "![TypeScript](https://img.shields.io/badge/typescript-4.0+-blue.svg)"),
    ("javascript", "![JavaScript](https://img.shields.io/badge/javascript-ES6+-yellow.svg)"),
    ("go", "![Go](https://img.shields.io/badge/go-1.20+-00ADD8.svg)"),
    ("react", "![React](https://img.shields.io/badge/react-18+-blue.svg)"),
    ("fastapi", "![FastAPI](https://img.shields.io/badge/fastapi-0.100+-green.svg)"),
    ("django", "![Django](https://img.shields.io/badge/django-4.0+-green.svg)"),
    ("postgres", "![PostgreSQL](https://img.shields.io/badge/postgresql-14+-blue.svg)"),
    ("redis", "![Redis](https://img.shields.io/badge/redis-7.0+-red.svg)"),
    ("docker", "![Docker](https://img.shields.io/badge/docker-enabled-blue.svg)"),
];

#[derive(Clone)]
pub struct ReadmeAgent {
    model: Arc<dyn ModelClient>,
}

impl ReadmeAgent {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }
}

impl StageOperation<CoordinatorInput, StageOutput> for ReadmeAgent {
    fn run(&self, input: Arc<CoordinatorInput>, results: Results<StageOutput>) -> StageFuture<StageOutput> {
        let model = Arc::clone(&self.model);
        Box::pin(async move {
            let analysis = results
                .get(&StageId::Analysis)
                .ok_or_else(|| OperationError::new("analysis result missing"))?;
            write_readme(model.as_ref(), &input.project_name, analysis)
                .await
                .map_err(OperationError::from)
        })
    }
}

async fn write_readme(
    model: &dyn ModelClient,
    project_name: &str,
    analysis: &StageOutput,
) -> Result<StageOutput, ModelError> {
    info!(project = %project_name, "creating README");

    let tech_stack = analysis.section(TECH_STACK);
    let components: String = analysis
        .section(COMPONENT_ANALYSIS)
        .chars()
        .take(COMPONENT_EXCERPT_CHARS)
        .collect();

    let prompt = format!(
        "Create a professional README.md for \"{project_name}\":\n\n\
         ## Architecture\n{overview}\n\n\
         ## Technologies\n{tech_stack}\n\n\
         ## Components\n{components}\n\n\
         Start with `# {project_name}` and a one-sentence tagline, then cover Features, \
         Quick Start (prerequisites, installation, usage), Documentation, Contributing and License.",
        overview = analysis.section(ARCHITECTURE_OVERVIEW),
    );

    let readme = model.generate(&prompt, Some(PERSONA.system_message().as_str())).await?;

    Ok(StageOutput::new()
        .with(README_CONTENT, readme)
        .with(BADGES, badges(tech_stack)))
}

/// Badges for technologies mentioned in `tech_stack`, one per line.
pub fn badges(tech_stack: &str) -> String {
    let words: Vec<String> = tech_stack
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    let mut out: Vec<&str> = BADGE_TABLE
        .iter()
        .filter(|(keyword, _)| words.iter().any(|w| mentions(w, keyword)))
        .map(|(_, badge)| *badge)
        .collect();
    out.push("![License](https://img.shields.io/badge/license-MIT-blue.svg)");
    out.join("\n")
}

/// Short keywords must match a whole word; longer ones may prefix it
/// (`postgres` in `postgresql`).
fn mentions(word: &str, keyword: &str) -> bool {
    word == keyword || (keyword.len() >= 4 && word.starts_with(keyword))
}
