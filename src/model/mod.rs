// src/model/mod.rs

//! Handle to the external generative model.
//!
//! Agents receive an `Arc<dyn ModelClient>` explicitly; there is no global
//! client. Production code uses [`CommandModelClient`]; tests provide their
//! own implementation that returns canned completions.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::dag::OperationError;

pub mod command;
pub mod throttle;

pub use command::CommandModelClient;
pub use throttle::Throttle;

/// Boxed future returned by [`ModelClient::generate`].
pub type ModelFuture<'a> = Pin<Box<dyn Future<Output = Result<String, ModelError>> + Send + 'a>>;

/// Anything that can turn a prompt into a completion.
///
/// Implementations own their retry policy; callers treat an error as final.
pub trait ModelClient: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str, system: Option<&'a str>) -> ModelFuture<'a>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("failed to start model command '{cmd}': {message}")]
    Spawn { cmd: String, message: String },

    #[error("i/o error talking to model command: {0}")]
    Io(String),

    #[error("model command exited with status {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("model returned an empty completion")]
    Empty,

    #[error("model call failed after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: Box<ModelError> },
}

impl From<ModelError> for OperationError {
    fn from(err: ModelError) -> Self {
        OperationError::new(err.to_string())
    }
}
