// src/agents/analysis.rs

//! Stage 1: architecture analysis over every batch.

use std::fmt::Write;
use std::sync::Arc;

use tracing::info;

use crate::agents::{Persona, StageOutput, extract_section};
use crate::batch::{Batch, RenderOptions, render_summary};
use crate::coordinator::CoordinatorInput;
use crate::dag::{OperationError, Results, StageFuture, StageOperation};
use crate::model::{ModelClient, ModelError};

pub const ARCHITECTURE_OVERVIEW: &str = "architecture_overview";
pub const COMPONENT_ANALYSIS: &str = "component_analysis";
pub const TECH_STACK: &str = "tech_stack";
pub const DEPENDENCIES: &str = "dependencies";
pub const KEY_PATTERNS: &str = "key_patterns";
pub const FILE_STRUCTURE: &str = "file_structure";
/// The synthesis response as returned by the model.
pub const FULL_DOCUMENT: &str = "full_document";

const PERSONA: Persona = Persona {
    role: "Senior Code Architect & Analyst",
    goal: "Analyze code structure, identify patterns, and create a comprehensive architecture overview",
    background: "You are an experienced software architect who can quickly understand large codebases, \
                 identify architectural patterns, trace dependencies and explain complex systems in clear terms.",
};

/// Numbered synthesis headers and the output key each one fills.
const SECTIONS: &[(&str, &str)] = &[
    ("ARCHITECTURE OVERVIEW", ARCHITECTURE_OVERVIEW),
    ("COMPONENT BREAKDOWN", COMPONENT_ANALYSIS),
    ("TECHNOLOGY STACK", TECH_STACK),
    ("DEPENDENCIES", DEPENDENCIES),
    ("DESIGN PATTERNS", KEY_PATTERNS),
    ("FILE STRUCTURE", FILE_STRUCTURE),
];

/// Analyses each batch, then asks the model to synthesise one architecture
/// document from the partial analyses.
#[derive(Clone)]
pub struct AnalysisAgent {
    model: Arc<dyn ModelClient>,
}

impl AnalysisAgent {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }
}

impl StageOperation<CoordinatorInput, StageOutput> for AnalysisAgent {
    fn run(&self, input: Arc<CoordinatorInput>, _results: Results<StageOutput>) -> StageFuture<StageOutput> {
        let model = Arc::clone(&self.model);
        Box::pin(async move { analyse(model.as_ref(), &input).await.map_err(OperationError::from) })
    }
}

async fn analyse(model: &dyn ModelClient, input: &CoordinatorInput) -> Result<StageOutput, ModelError> {
    let system = PERSONA.system_message();
    let total = input.batches.len();

    let mut partials = Vec::with_capacity(total);
    for (index, batch) in input.batches.iter().enumerate() {
        info!(batch = index + 1, total, files = batch.len(), "analysing batch");
        let prompt = batch_prompt(index, batch, &input.render);
        partials.push(model.generate(&prompt, Some(system.as_str())).await?);
    }

    info!(partials = partials.len(), "synthesising architecture overview");
    let document = model
        .generate(&synthesis_prompt(&input.project_name, &partials), Some(system.as_str()))
        .await?;

    let mut output = StageOutput::new();
    for (header, key) in SECTIONS {
        output = output.with(*key, extract_section(&document, header));
    }
    Ok(output.with(FULL_DOCUMENT, document))
}

/// Prompt asking for an analysis of one batch of summaries.
pub fn batch_prompt(index: usize, batch: &Batch, render: &RenderOptions) -> String {
    let mut listing = format!("## Batch {}\n\n", index + 1);
    for summary in batch.summaries() {
        listing.push_str(&render_summary(summary, render));
        listing.push('\n');
    }

    format!(
        "Analyze this code batch:\n\n{listing}\n\
         Provide a concise analysis including:\n\
         1. Purpose of these files\n\
         2. Key components and their responsibilities\n\
         3. Technologies/frameworks used\n\
         4. Notable patterns or structures\n\n\
         Keep the response under 500 words."
    )
}

fn synthesis_prompt(project_name: &str, partials: &[String]) -> String {
    let mut combined = String::new();
    for (i, partial) in partials.iter().enumerate() {
        let _ = write!(combined, "## Analysis Part {}\n{}\n\n", i + 1, partial);
    }

    let mut headers = String::new();
    for (i, (header, _)) in SECTIONS.iter().enumerate() {
        let _ = writeln!(headers, "## {}. {}", i + 1, header);
    }

    format!(
        "Based on these code analyses for \"{project_name}\":\n\n{combined}\
         Create a comprehensive architecture document with exactly these sections:\n\n{headers}\n\
         Format in clear Markdown with proper headers."
    )
}
