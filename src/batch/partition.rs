// src/batch/partition.rs

//! Greedy, order-preserving token-budget partitioning.

use std::num::NonZeroUsize;

use tracing::{debug, warn};

use crate::batch::render::{RenderOptions, render_summary};
use crate::batch::summary::{DocumentSummary, Extraction};
use crate::batch::tokens::TokenCounter;

pub const DEFAULT_MAX_CHUNK_TOKENS: usize = 6000;

/// An ordered group of summaries sent to the model together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    summaries: Vec<DocumentSummary>,
    prompt_cost: usize,
}

impl Batch {
    pub fn summaries(&self) -> &[DocumentSummary] {
        &self.summaries
    }

    /// Sum of the prompt costs of every summary in the batch.
    pub fn prompt_cost(&self) -> usize {
        self.prompt_cost
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> + '_ {
        self.summaries.iter().map(DocumentSummary::identifier)
    }
}

/// Groups summaries into batches whose prompt cost stays within a budget.
///
/// The prompt cost of a summary is the token count of its rendered form, not
/// its raw `token_cost`. A summary whose prompt cost alone exceeds the budget
/// is placed in a batch of its own rather than dropped.
#[derive(Debug, Clone)]
pub struct BatchPartitioner<C> {
    counter: C,
    budget: NonZeroUsize,
    render: RenderOptions,
}

impl<C: TokenCounter> BatchPartitioner<C> {
    pub fn new(counter: C, budget: NonZeroUsize) -> Self {
        Self {
            counter,
            budget,
            render: RenderOptions::default(),
        }
    }

    pub fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    pub fn budget(&self) -> NonZeroUsize {
        self.budget
    }

    /// Token count of `summary` as it would appear in a prompt.
    pub fn prompt_cost(&self, summary: &DocumentSummary) -> usize {
        self.counter.count(&render_summary(summary, &self.render))
    }

    /// Partition `extractions` in input order.
    ///
    /// Failed extractions are skipped and consume no budget.
    pub fn partition(&self, extractions: &[Extraction]) -> Vec<Batch> {
        let budget = self.budget.get();
        let mut batches = Vec::new();
        let mut open: Vec<DocumentSummary> = Vec::new();
        let mut running = 0usize;

        for extraction in extractions {
            let summary = match extraction {
                Ok(summary) => summary,
                Err(err) => {
                    debug!(identifier = %err.identifier, error = %err.message, "skipping failed extraction");
                    continue;
                }
            };

            let cost = self.prompt_cost(summary);
            if cost > budget {
                warn!(
                    identifier = %summary.identifier(),
                    prompt_cost = cost,
                    budget,
                    "summary exceeds token budget; placing it in its own batch"
                );
            }

            if running + cost > budget && !open.is_empty() {
                batches.push(Batch {
                    summaries: std::mem::take(&mut open),
                    prompt_cost: running,
                });
                running = 0;
            }

            open.push(summary.clone());
            running += cost;
        }

        if !open.is_empty() {
            batches.push(Batch {
                summaries: open,
                prompt_cost: running,
            });
        }

        debug!(
            batches = batches.len(),
            budget,
            "partitioned summaries into batches"
        );

        batches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::summary::ExtractionError;
    use crate::batch::tokens::WhitespaceCounter;

    fn summary(id: &str) -> Extraction {
        Ok(DocumentSummary::builder(id).line_count(1).build())
    }

    #[test]
    fn empty_input_yields_no_batches() {
        let partitioner = BatchPartitioner::new(WhitespaceCounter, NonZeroUsize::MIN);
        assert!(partitioner.partition(&[]).is_empty());
    }

    #[test]
    fn errors_only_yields_no_batches() {
        let partitioner = BatchPartitioner::new(WhitespaceCounter, NonZeroUsize::MIN);
        let input = vec![Err(ExtractionError::new("a.py", "unreadable"))];
        assert!(partitioner.partition(&input).is_empty());
    }

    #[test]
    fn tiny_budget_puts_each_summary_alone() {
        let partitioner = BatchPartitioner::new(WhitespaceCounter, NonZeroUsize::MIN);
        let input = vec![summary("a.py"), summary("b.py"), summary("c.py")];

        let batches = partitioner.partition(&input);
        let ids: Vec<Vec<&str>> = batches.iter().map(|b| b.identifiers().collect()).collect();
        assert_eq!(ids, vec![vec!["a.py"], vec!["b.py"], vec!["c.py"]]);
    }

    #[test]
    fn batch_cost_is_sum_of_prompt_costs() {
        let partitioner = BatchPartitioner::new(WhitespaceCounter, NonZeroUsize::new(10_000).unwrap());
        let input = vec![summary("a.py"), summary("b.py")];

        let batches = partitioner.partition(&input);
        assert_eq!(batches.len(), 1);

        let expected: usize = input
            .iter()
            .map(|e| partitioner.prompt_cost(e.as_ref().unwrap()))
            .sum();
        assert_eq!(batches[0].prompt_cost(), expected);
    }
}
