use std::collections::HashMap;

use docdag::batch::TokenCounter;

/// A token counter with a fixed cost per document.
///
/// The cost is looked up by the identifier on the `- Path: ` line of the
/// rendered summary, so a test can dictate the prompt cost of each summary
/// exactly. Text without a known identifier costs `fallback`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCounter {
    costs: HashMap<String, usize>,
    fallback: usize,
}

impl ScriptedCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cost(mut self, identifier: &str, cost: usize) -> Self {
        self.costs.insert(identifier.to_string(), cost);
        self
    }

    pub fn fallback(mut self, cost: usize) -> Self {
        self.fallback = cost;
        self
    }
}

impl TokenCounter for ScriptedCounter {
    fn count(&self, text: &str) -> usize {
        text.lines()
            .find_map(|line| line.strip_prefix("- Path: "))
            .and_then(|id| self.costs.get(id.trim()).copied())
            .unwrap_or(self.fallback)
    }
}
