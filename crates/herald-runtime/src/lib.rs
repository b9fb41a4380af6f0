//! Herald Runtime - configuration, logging and rule persistence around the
//! Herald dispatcher.
//!
//! This crate provides:
//! - Layered configuration (`HeraldConfig`, `ConfigLoader`)
//! - Logging setup (`LoggingBuilder`)
//! - The JSON rule file (`RulesFile`)
//! - Runtime orchestration (`HeraldRuntime`)
//!
//! ```rust,ignore
//! use herald_runtime::{HeraldRuntime, shutdown_signal};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = HeraldRuntime::builder().activity(my_activity()).build()?;
//!
//!     // Hand `runtime.handle_message(event, bot)` to the transport...
//!
//!     runtime.run_until(shutdown_signal()).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod rules_file;
pub mod runtime;

// Re-exports
pub use config::{ConfigError, ConfigLoader, ConfigResult, HeraldConfig, LoggingConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
pub use rules_file::{RuleSnapshot, RulesFile};
pub use runtime::{HeraldRuntime, RuntimeBuilder, shutdown_signal};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, instrument, span, trace, warn};
}
