// src/config/mod.rs

//! Configuration loading and validation for docdag.
//!
//! - [`model`] defines the TOML-backed data model.
//! - [`loader`] reads a config file from disk.
//! - [`validate`] turns a raw config into a checked [`ConfigFile`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default, parse_and_validate};
pub use model::{
    BatchingSection, ConfigFile, ExtractSection, ModelSection, RawConfigFile, SchedulerSection,
};
