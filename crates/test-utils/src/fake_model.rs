use std::sync::Mutex;

use docdag::model::{ModelClient, ModelError, ModelFuture};

/// A fake model that:
/// - records every prompt it receives
/// - answers with the reply of the first rule whose needle occurs in the
///   prompt, or a default reply
/// - fails any prompt containing one of the configured failure needles.
#[derive(Debug, Default)]
pub struct FakeModelClient {
    rules: Vec<(String, String)>,
    failures: Vec<String>,
    default_reply: String,
    prompts: Mutex<Vec<String>>,
}

impl FakeModelClient {
    pub fn new() -> Self {
        Self {
            default_reply: "ok".to_string(),
            ..Self::default()
        }
    }

    pub fn reply_when(mut self, needle: &str, reply: &str) -> Self {
        self.rules.push((needle.to_string(), reply.to_string()));
        self
    }

    pub fn fail_when(mut self, needle: &str) -> Self {
        self.failures.push(needle.to_string());
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn answer(&self, prompt: &str) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if self.failures.iter().any(|n| prompt.contains(n.as_str())) {
            return Err(ModelError::Failed {
                code: Some(1),
                stderr: "scripted failure".to_string(),
            });
        }

        Ok(self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.default_reply.clone()))
    }
}

impl ModelClient for FakeModelClient {
    fn generate<'a>(&'a self, prompt: &'a str, _system: Option<&'a str>) -> ModelFuture<'a> {
        let answer = self.answer(prompt);
        Box::pin(async move {
            tokio::task::yield_now().await;
            answer
        })
    }
}
