// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::dag::{GraphError, RunFailure};

#[derive(Error, Debug)]
pub enum DocdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid stage graph: {0}")]
    Graph(#[from] GraphError),

    #[error("Run failed: {0}")]
    Run(#[from] RunFailure),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DocdagError>;
