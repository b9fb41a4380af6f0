//! Runtime error types.

use std::path::PathBuf;

use herald_framework::RegistrationError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An activity, alias or schema was rejected while building the dispatcher.
    #[error("Failed to register activities: {0}")]
    Registration(#[from] RegistrationError),

    /// The rule file could not be read or written.
    #[error("Rule file {path}: {source}")]
    RulesIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rule file is not valid JSON of the expected shape.
    #[error("Rule file {path} is malformed: {source}")]
    RulesFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl RuntimeError {
    pub(crate) fn rules_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::RulesIo {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn rules_format(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::RulesFormat {
            path: path.into(),
            source,
        }
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
