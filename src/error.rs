//! Error types for the assertion migrator.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] globset::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Root directory not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Rule '{rule}' is out of order: {message}")]
    RuleOrder { rule: String, message: String },

    #[error("Unknown rule referenced by '{rule}': {missing}")]
    UnknownRule { rule: String, missing: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A specialized Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
