// src/coordinator.rs

//! The fixed documentation pipeline.
//!
//! Analysis runs first over every batch; API docs and the README each depend
//! on the analysis only and run side by side.

use std::sync::Arc;

use tracing::info;

use crate::agents::{AnalysisAgent, ApiDocsAgent, ReadmeAgent, StageOutput};
use crate::batch::{Batch, RenderOptions};
use crate::dag::{GraphError, Results, Scheduler, StageId, StageOperation, Task, TaskGraph};
use crate::errors::Result;
use crate::model::ModelClient;

pub const ANALYSIS_PRIORITY: i32 = 10;
pub const DOCS_PRIORITY: i32 = 5;

type StageOp = Arc<dyn StageOperation<CoordinatorInput, StageOutput>>;

/// Shared input handed to every stage.
#[derive(Debug, Clone)]
pub struct CoordinatorInput {
    pub project_name: String,
    pub batches: Vec<Batch>,
    /// How summaries are rendered into analysis prompts. Should match the
    /// options the batches were partitioned with.
    pub render: RenderOptions,
}

impl CoordinatorInput {
    pub fn new(project_name: impl Into<String>, batches: Vec<Batch>) -> Self {
        Self {
            project_name: project_name.into(),
            batches,
            render: RenderOptions::default(),
        }
    }

    pub fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }
}

pub struct Coordinator {
    scheduler: Scheduler,
    model: Arc<dyn ModelClient>,
}

impl Coordinator {
    pub fn new(scheduler: Scheduler, model: Arc<dyn ModelClient>) -> Self {
        Self { scheduler, model }
    }

    /// Declare the three-stage graph over `input`.
    pub fn graph(
        &self,
        input: CoordinatorInput,
    ) -> std::result::Result<TaskGraph<CoordinatorInput, StageOutput>, GraphError> {
        let input = Arc::new(input);

        let analysis: StageOp = Arc::new(AnalysisAgent::new(Arc::clone(&self.model)));
        let api_docs: StageOp = Arc::new(ApiDocsAgent::new(Arc::clone(&self.model)));
        let readme: StageOp = Arc::new(ReadmeAgent::new(Arc::clone(&self.model)));

        TaskGraph::new(vec![
            Task::new(StageId::Analysis, analysis, Arc::clone(&input)).priority(ANALYSIS_PRIORITY),
            Task::new(StageId::ApiDocs, api_docs, Arc::clone(&input))
                .after(StageId::Analysis)
                .priority(DOCS_PRIORITY),
            Task::new(StageId::Readme, readme, input)
                .after(StageId::Analysis)
                .priority(DOCS_PRIORITY),
        ])
    }

    /// Run the pipeline and return every stage's output.
    pub async fn run(&self, input: CoordinatorInput) -> Result<Results<StageOutput>> {
        info!(
            project = %input.project_name,
            batches = input.batches.len(),
            "starting documentation pipeline"
        );

        let graph = self.graph(input)?;
        let results = self.scheduler.run(graph).await?;

        info!(stages = results.len(), "documentation pipeline finished");
        Ok(results)
    }
}
