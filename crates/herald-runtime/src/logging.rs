//! Installs the global `tracing` subscriber described by [`LoggingConfig`].
//!
//! Every dispatched message runs inside a `dispatch` span, so turning on the
//! `new` and `close` span events prints one line per message plus its
//! timing. `RUST_LOG`, when set, replaces the configured level; per-module
//! `filters` and extra directives are applied on top of either.
//!
//! ```rust,ignore
//! use herald_runtime::logging::LoggingBuilder;
//!
//! LoggingBuilder::from_config(&config.logging)
//!     .directive("herald_framework::dispatcher=trace")
//!     .init();
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{
    LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, SpanEventConfig,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Installs logging for `config`. Does nothing if a subscriber is already set.
pub fn init_from_config(config: &LoggingConfig) {
    LoggingBuilder::from_config(config).init();
}

/// A [`LoggingConfig`] plus extra filter directives, ready to install.
#[derive(Debug, Clone, Default)]
pub struct LoggingBuilder {
    config: LoggingConfig,
    directives: Vec<String>,
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        Self {
            config: config.clone(),
            directives: Vec::new(),
        }
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.config.output = output;
        self
    }

    /// Writes to `path`, rolled over as `rotation` says.
    pub fn file(mut self, path: impl Into<PathBuf>, rotation: LogRotation) -> Self {
        self.config.output = LogOutput::File;
        self.config.file_path = Some(path.into());
        self.config.rotation = rotation;
        self
    }

    pub fn span_events(mut self, events: SpanEventConfig) -> Self {
        self.config.span_events = events;
        self
    }

    /// Adds a filter directive such as `herald_framework::dispatcher=trace`.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Fails if a global subscriber is already installed.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let filter = self.filter();
        tracing_subscriber::registry()
            .with(self.fmt_layer())
            .with(filter)
            .try_init()
    }

    fn directives(&self) -> impl Iterator<Item = String> + '_ {
        self.config
            .filters
            .iter()
            .map(|(module, level)| format!("{module}={level}"))
            .chain(self.directives.iter().cloned())
    }

    fn filter(&self) -> EnvFilter {
        let level = LevelFilter::from_level(self.config.level.to_tracing_level());
        let mut filter = EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy();

        for directive in self.directives() {
            match directive.parse() {
                Ok(d) => filter = filter.add_directive(d),
                Err(e) => eprintln!("herald: ignoring log directive {directive:?}: {e}"),
            }
        }
        filter
    }

    fn writer(&self) -> BoxMakeWriter {
        match (self.config.output, self.config.file_path.as_deref()) {
            (LogOutput::Stdout, _) => BoxMakeWriter::new(std::io::stdout),
            (LogOutput::Stderr, _) => BoxMakeWriter::new(std::io::stderr),
            (LogOutput::File, Some(path)) => {
                BoxMakeWriter::new(appender(path, self.config.rotation))
            }
            (LogOutput::File, None) => {
                eprintln!("herald: file logging has no file_path, writing to stderr");
                BoxMakeWriter::new(std::io::stderr)
            }
        }
    }

    fn fmt_layer(&self) -> BoxedLayer {
        let layer = fmt::layer()
            .with_writer(self.writer())
            .with_ansi(self.config.output != LogOutput::File)
            .with_span_events(fmt_span(&self.config.span_events))
            .with_thread_ids(self.config.thread_ids)
            .with_file(self.config.file_location)
            .with_line_number(self.config.file_location);

        match self.config.format {
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Full => layer.boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            #[cfg(feature = "json-log")]
            LogFormat::Json => layer.json().boxed(),
        }
    }
}

fn appender(path: &Path, rotation: LogRotation) -> RollingFileAppender {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let name = path.file_name().unwrap_or(OsStr::new("herald.log"));
    match rotation {
        LogRotation::Never => rolling::never(dir, name),
        LogRotation::Hourly => rolling::hourly(dir, name),
        LogRotation::Daily => rolling::daily(dir, name),
    }
}

fn fmt_span(events: &SpanEventConfig) -> FmtSpan {
    [
        (events.new, FmtSpan::NEW),
        (events.enter, FmtSpan::ENTER),
        (events.exit, FmtSpan::EXIT),
        (events.close, FmtSpan::CLOSE),
    ]
    .into_iter()
    .filter(|(enabled, _)| *enabled)
    .fold(FmtSpan::NONE, |span, (_, event)| span | event)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_directives_follow_config() {
        let config = LoggingConfig {
            filters: BTreeMap::from([
                ("herald_framework".to_string(), LogLevel::Trace),
                ("herald_runtime::rules_file".to_string(), LogLevel::Warn),
            ]),
            ..Default::default()
        };
        let builder = LoggingBuilder::from_config(&config).directive("console_bot=debug");

        assert_eq!(
            builder.directives().collect::<Vec<_>>(),
            [
                "herald_framework=trace",
                "herald_runtime::rules_file=warn",
                "console_bot=debug"
            ]
        );
    }

    #[test]
    fn test_bad_directive_is_skipped() {
        let filter = LoggingBuilder::new()
            .directive("herald_framework=loud")
            .directive("herald_runtime=debug")
            .filter()
            .to_string();
        assert!(filter.contains("herald_runtime=debug"));
        assert!(!filter.contains("loud"));
    }

    #[test]
    fn test_span_events() {
        assert_eq!(fmt_span(&SpanEventConfig::default()), FmtSpan::NONE);

        let lifecycle = SpanEventConfig {
            new: true,
            close: true,
            ..Default::default()
        };
        assert_eq!(fmt_span(&lifecycle), FmtSpan::NEW | FmtSpan::CLOSE);

        let all = SpanEventConfig {
            new: true,
            enter: true,
            exit: true,
            close: true,
        };
        assert_eq!(fmt_span(&all), FmtSpan::FULL);
    }

    #[test]
    fn test_file_builder() {
        let builder = LoggingBuilder::new()
            .level(LogLevel::Debug)
            .file("logs/herald.log", LogRotation::Daily);

        assert_eq!(builder.config.level, LogLevel::Debug);
        assert_eq!(builder.config.output, LogOutput::File);
        assert_eq!(builder.config.rotation, LogRotation::Daily);
        assert_eq!(
            builder.config.file_path.as_deref(),
            Some(Path::new("logs/herald.log"))
        );
    }
}
