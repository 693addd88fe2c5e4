// src/agents/api_docs.rs

//! Stage 2a: API reference and usage examples.

use std::sync::Arc;

use tracing::info;

use crate::agents::analysis::{ARCHITECTURE_OVERVIEW, COMPONENT_ANALYSIS};
use crate::agents::{Persona, StageOutput};
use crate::coordinator::CoordinatorInput;
use crate::dag::{OperationError, Results, StageFuture, StageId, StageOperation};
use crate::model::{ModelClient, ModelError};

pub const API_REFERENCE: &str = "api_reference";
pub const EXAMPLES: &str = "examples";
pub const QUICK_REFERENCE: &str = "quick_reference";

const PERSONA: Persona = Persona {
    role: "Technical Writer & API Documentation Specialist",
    goal: "Write precise, example-driven API documentation",
    background: "You document libraries for a living. You describe every public function and type \
                 with its parameters, return values, errors and a short example.",
};

/// Writes the API reference from the analysis, then examples from the
/// reference.
#[derive(Clone)]
pub struct ApiDocsAgent {
    model: Arc<dyn ModelClient>,
}

impl ApiDocsAgent {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }
}

impl StageOperation<CoordinatorInput, StageOutput> for ApiDocsAgent {
    fn run(&self, _input: Arc<CoordinatorInput>, results: Results<StageOutput>) -> StageFuture<StageOutput> {
        let model = Arc::clone(&self.model);
        Box::pin(async move {
            let analysis = results
                .get(&StageId::Analysis)
                .ok_or_else(|| OperationError::new("analysis result missing"))?;
            document(model.as_ref(), analysis).await.map_err(OperationError::from)
        })
    }
}

async fn document(model: &dyn ModelClient, analysis: &StageOutput) -> Result<StageOutput, ModelError> {
    let system = PERSONA.system_message();

    info!("generating API reference");
    let reference = model
        .generate(
            &reference_prompt(
                analysis.section(ARCHITECTURE_OVERVIEW),
                analysis.section(COMPONENT_ANALYSIS),
            ),
            Some(system.as_str()),
        )
        .await?;

    info!("generating usage examples");
    let examples = model.generate(&examples_prompt(&reference), Some(system.as_str())).await?;

    Ok(StageOutput::new()
        .with(QUICK_REFERENCE, quick_reference(&reference))
        .with(API_REFERENCE, reference)
        .with(EXAMPLES, examples))
}

fn reference_prompt(overview: &str, components: &str) -> String {
    format!(
        "Create comprehensive API documentation based on this analysis:\n\n\
         ## Architecture Overview\n{overview}\n\n\
         ## Components\n{components}\n\n\
         Use this layout for every function, class and method found:\n\n\
         # API Reference\n\n\
         ## [Component/Module Name]\n\n\
         ### Name\n\n\
         **Description**, **Parameters**, **Returns**, **Errors**, **Example**, **Notes**"
    )
}

fn examples_prompt(reference: &str) -> String {
    format!(
        "Based on this API documentation:\n\n{reference}\n\n\
         Write a USAGE EXAMPLES document with a quick start, three to five common use cases, \
         advanced usage and best practices. Start it with `# Usage Examples`."
    )
}

/// Cheat sheet built from the reference: every `###` heading and every
/// parameter bullet that looks like a signature.
pub fn quick_reference(reference: &str) -> String {
    let mut out = String::from("# Quick Reference\n");
    for line in reference.lines() {
        if line.starts_with("### ") {
            out.push('\n');
            out.push_str(line);
            out.push('\n');
        } else if line.starts_with("- `") && line.contains('(') {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}
