// src/model/command.rs

//! Model client backed by a shell command.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::model::throttle::Throttle;
use crate::model::{ModelClient, ModelError, ModelFuture};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Environment variable carrying the system message to the command.
pub const SYSTEM_PROMPT_ENV: &str = "DOCDAG_SYSTEM_PROMPT";

/// Pipes each prompt into `sh -c <cmd>` and reads the completion from
/// stdout.
///
/// Failed attempts are retried with exponential backoff (`base_delay`,
/// doubled each time) up to `max_retries` attempts in total. Every attempt
/// first passes the shared [`Throttle`], so calls from concurrent stages
/// start at least `min_interval` apart.
#[derive(Debug, Clone)]
pub struct CommandModelClient {
    cmd: String,
    max_retries: u32,
    base_delay: Duration,
    throttle: Throttle,
}

impl CommandModelClient {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            throttle: Throttle::new(DEFAULT_MIN_INTERVAL),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.throttle = Throttle::new(min_interval);
        self
    }

    async fn generate_with_retries(&self, prompt: &str, system: Option<&str>) -> Result<String, ModelError> {
        let attempts = self.max_retries.max(1);
        let mut attempt = 0u32;

        loop {
            self.throttle.acquire().await;
            match self.invoke(prompt, system).await {
                Ok(text) => return Ok(text),
                Err(err) if attempt + 1 >= attempts => {
                    return Err(ModelError::Exhausted {
                        attempts,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    let delay = self.base_delay.saturating_mul(1u32 << attempt.min(16));
                    warn!(
                        cmd = %self.cmd,
                        attempt = attempt + 1,
                        error = %err,
                        retry_in = ?delay,
                        "model call failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn invoke(&self, prompt: &str, system: Option<&str>) -> Result<String, ModelError> {
        debug!(cmd = %self.cmd, prompt_bytes = prompt.len(), "invoking model command");

        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        cmd.env(SYSTEM_PROMPT_ENV, system.unwrap_or_default())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| ModelError::Spawn {
            cmd: self.cmd.clone(),
            message: e.to_string(),
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ModelError::Io("child stdin was not captured".to_string()))?;

        // Feed stdin while stdout is drained, so a command that streams its
        // output cannot block on a full pipe.
        let feed = async move {
            let res = stdin.write_all(prompt.as_bytes()).await;
            drop(stdin);
            res
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());

        let output = output.map_err(|e| ModelError::Io(e.to_string()))?;

        if !output.status.success() {
            return Err(ModelError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // A command may exit successfully without reading all of stdin.
        if let Err(e) = fed {
            debug!(cmd = %self.cmd, error = %e, "model command closed stdin early");
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(ModelError::Empty);
        }

        info!(cmd = %self.cmd, completion_bytes = text.len(), "model call succeeded");
        Ok(text)
    }
}

impl ModelClient for CommandModelClient {
    fn generate<'a>(&'a self, prompt: &'a str, system: Option<&'a str>) -> ModelFuture<'a> {
        Box::pin(self.generate_with_retries(prompt, system))
    }
}
