//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
///
/// ```toml
/// prefix = "t!"
/// permissions_file = "permissions.json"
///
/// [aliases]
/// flip = "coin flip"
///
/// [logging]
/// level = "debug"
/// format = "pretty"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeraldConfig {
    /// Text a message must start with to be treated as a command.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Alias route text mapped to canonical route text.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,

    /// Where the per-guild permission rules are persisted.
    #[serde(default = "default_permissions_file")]
    pub permissions_file: PathBuf,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for HeraldConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            aliases: BTreeMap::new(),
            permissions_file: default_permissions_file(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_prefix() -> String {
    "t!".to_string()
}

fn default_permissions_file() -> PathBuf {
    PathBuf::from("permissions.json")
}

// =============================================================================
// Logging
// =============================================================================

/// Severity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line format of emitted events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature.
    #[cfg(feature = "json-log")]
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Written to `file_path`.
    File,
}

/// How often the log file is rolled over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Global level, overridden by `RUST_LOG` when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,

    /// Log file used when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,

    /// Per-module levels, e.g. `herald_framework = "debug"`.
    #[serde(default)]
    pub filters: BTreeMap<String, LogLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HeraldConfig::default();
        assert_eq!(config.prefix, "t!");
        assert_eq!(config.permissions_file, PathBuf::from("permissions.json"));
        assert!(config.aliases.is_empty());
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_partial_document() {
        let config: HeraldConfig = serde_json::from_str(
            r#"{"prefix": "!", "aliases": {"flip": "coin flip"}, "logging": {"level": "warn"}}"#,
        )
        .unwrap();
        assert_eq!(config.prefix, "!");
        assert_eq!(config.aliases["flip"], "coin flip");
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.logging.output, LogOutput::Stdout);
        assert_eq!(config.permissions_file, PathBuf::from("permissions.json"));
    }

    #[test]
    fn test_rejects_unknown_level() {
        let result: Result<LoggingConfig, _> = serde_json::from_str(r#"{"level": "loud"}"#);
        assert!(result.is_err());
    }
}
