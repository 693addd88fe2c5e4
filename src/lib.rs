// src/lib.rs

pub mod agents;
pub mod batch;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod dag;
pub mod errors;
pub mod extract;
pub mod logging;
pub mod model;
pub mod output;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::batch::{Batch, BatchPartitioner, TokenCounter, counter_for};
use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::config::loader::load_or_default;
use crate::coordinator::{Coordinator, CoordinatorInput};
use crate::dag::Scheduler;
use crate::extract::{SourceExtractor, SourceFilter, collect_sources, extract_all};
use crate::model::{CommandModelClient, ModelClient};
use crate::output::write_outputs;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - source collection and extraction
/// - batching
/// - the stage pipeline
/// - writing the generated documents
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref())?;
    let project_name = args
        .project_name
        .clone()
        .unwrap_or_else(|| project_name_for(&args.root));

    let counter: Arc<dyn TokenCounter> = Arc::from(counter_for(cfg.batching.tokenizer)?);

    let filter = SourceFilter::new(
        &cfg.extract.extensions,
        &cfg.extract.exclude,
        cfg.max_file_size_bytes(),
    )?;
    let files = collect_sources(&args.root, &filter)?;
    info!(root = %args.root.display(), files = files.len(), "collected source files");

    let extractor = SourceExtractor::new(&args.root, Arc::clone(&counter))
        .with_preview_lines(cfg.extract.preview_lines);
    let extractions = extract_all(&extractor, &files);
    let failed = extractions.iter().filter(|e| e.is_err()).count();
    if failed > 0 {
        info!(failed, "some files could not be extracted and were skipped");
    }

    let partitioner = BatchPartitioner::new(Arc::clone(&counter), cfg.budget())
        .with_render_options(cfg.render_options());
    let batches = partitioner.partition(&extractions);

    if args.dry_run {
        print_dry_run(&cfg, &project_name, &batches);
        return Ok(());
    }

    if batches.is_empty() {
        bail!("no source files to document under {}", args.root.display());
    }

    let model: Arc<dyn ModelClient> = Arc::new(
        CommandModelClient::new(cfg.model.cmd.clone())
            .with_max_retries(cfg.model.max_retries)
            .with_min_interval(cfg.model_min_interval()),
    );
    let coordinator = Coordinator::new(Scheduler::new(cfg.scheduler_options()), model);
    let input = CoordinatorInput::new(project_name.clone(), batches)
        .with_render_options(cfg.render_options());

    let results = coordinator.run(input).await?;
    let written = write_outputs(&args.out, &project_name, &results)?;

    info!(out = %args.out.display(), documents = written.len(), "documentation written");
    Ok(())
}

/// Name of the root directory, or `Project` when it has none.
fn project_name_for(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "Project".to_string())
}

/// Print the configuration and the batch plan without calling the model.
fn print_dry_run(cfg: &ConfigFile, project_name: &str, batches: &[Batch]) {
    println!("docdag dry-run");
    println!("  project = {project_name}");
    println!("  scheduler.max_parallel = {}", cfg.scheduler.max_parallel);
    println!(
        "  scheduler.dependency_timeout_secs = {}",
        cfg.scheduler.dependency_timeout_secs
    );
    println!("  scheduler.on_failure = {:?}", cfg.scheduler.on_failure);
    println!("  batching.max_chunk_tokens = {}", cfg.batching.max_chunk_tokens);
    println!("  batching.tokenizer = {:?}", cfg.batching.tokenizer);
    println!("  model.cmd = {}", cfg.model.cmd);
    println!();

    println!("batches ({}):", batches.len());
    for (i, batch) in batches.iter().enumerate() {
        println!(
            "  - batch {} ({} files, {} tokens)",
            i + 1,
            batch.len(),
            batch.prompt_cost()
        );
        for id in batch.identifiers() {
            println!("      {id}");
        }
    }

    debug!("dry-run complete (no model calls)");
}
