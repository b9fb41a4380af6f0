//! Configuration for the Herald runtime.
//!
//! Settings are layered with figment (base defaults, one config file,
//! `HERALD_*` environment variables) and validated once after extraction.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use schema::{
    HeraldConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, SpanEventConfig,
};
pub use validation::validate_config;
