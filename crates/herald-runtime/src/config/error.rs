use std::path::PathBuf;

use thiserror::Error;

/// Why a [`HeraldConfig`](super::HeraldConfig) could not be produced.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A file passed to `ConfigLoader::file` does not exist.
    #[error("configuration file {} does not exist", .0.display())]
    FileNotFound(PathBuf),

    /// No enabled format reads this file's extension.
    #[error("configuration file {} has no enabled format", .0.display())]
    UnsupportedFormat(PathBuf),

    /// A source is malformed or a value has the wrong type.
    #[error("cannot read configuration: {0}")]
    Extract(#[source] Box<figment::Error>),

    #[error("command prefix {0:?} must be non-empty and contain no whitespace")]
    InvalidPrefix(String),

    #[error("alias `{alias}` is unusable: {reason}")]
    InvalidAlias { alias: String, reason: &'static str },

    #[error("`{0}` must be set")]
    MissingSetting(&'static str),

    #[error("logging filter {0:?} does not name a module")]
    InvalidLogFilter(String),
}

impl ConfigError {
    pub(crate) fn invalid_alias(alias: &str, reason: &'static str) -> Self {
        Self::InvalidAlias {
            alias: alias.to_string(),
            reason,
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
