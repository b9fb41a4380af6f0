//! Runtime orchestration: configuration, rule persistence and dispatch.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use herald_runtime::HeraldRuntime;
//!
//! let runtime = HeraldRuntime::builder()
//!     .config_file("herald.toml")
//!     .activity(roll_activity()?)
//!     .build()?;
//!
//! // For every message the transport receives:
//! runtime.handle_message(event, bot).await;
//!
//! // When the transport learns about a guild:
//! runtime.guild_available(guild, bot.directory());
//!
//! runtime.shutdown()?;
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use herald_core::{BoxedBot, BoxedEvent, Directory, GuildId};
use herald_framework::request::ParserChain;
use herald_framework::{Activity, DispatchOutcome, Dispatcher, RuleStore};
use tokio::signal;
use tracing::{error, info, warn};

use crate::config::{ConfigLoader, HeraldConfig, validate_config};
use crate::error::RuntimeResult;
use crate::logging;
use crate::rules_file::RulesFile;

/// A configured dispatcher with its rule file.
///
/// Rules are loaded when the runtime is built and written back by
/// [`save`](Self::save) and [`shutdown`](Self::shutdown).
pub struct HeraldRuntime {
    config: HeraldConfig,
    dispatcher: Dispatcher,
    rules_file: RulesFile,
}

impl HeraldRuntime {
    /// Creates a runtime builder that searches the current directory for
    /// configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Builds a runtime from an already loaded configuration with the
    /// built-in commands only.
    pub fn from_config(config: HeraldConfig) -> RuntimeResult<Self> {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &HeraldConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn rules(&self) -> &Arc<RuleStore> {
        self.dispatcher.rules()
    }

    pub fn rules_path(&self) -> &Path {
        self.rules_file.path()
    }

    /// Routes one inbound message.
    pub async fn handle_message(&self, event: BoxedEvent, bot: BoxedBot) -> DispatchOutcome {
        self.dispatcher.dispatch(event, bot).await
    }

    /// Seeds the permissions of a guild the first time it is seen.
    ///
    /// Returns `true` if the guild was new.
    pub fn guild_available(&self, guild: GuildId, directory: &dyn Directory) -> bool {
        let everyone = directory.everyone_role(guild);
        self.rules().initialize_for_guild(guild, everyone)
    }

    /// Writes the current rules to the rule file.
    pub fn save(&self) -> RuntimeResult<()> {
        self.rules_file.save(self.rules())
    }

    /// Persists the rules before the process exits.
    pub fn shutdown(&self) -> RuntimeResult<()> {
        info!("Shutting down Herald runtime");
        self.save()?;
        info!(path = %self.rules_file.path().display(), "Permission rules saved");
        Ok(())
    }

    /// Waits for `shutdown` to complete, then shuts down.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        shutdown.await;
        self.shutdown()
    }

    /// Waits for Ctrl+C or SIGTERM, then shuts down.
    pub async fn run(&self) -> RuntimeResult<()> {
        info!("Herald runtime is now running. Press Ctrl+C to stop.");
        self.run_until(shutdown_signal()).await
    }
}

/// Completes on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                wait_for_ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = wait_for_ctrl_c() => {}
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`HeraldRuntime`].
///
/// ```rust,ignore
/// let runtime = HeraldRuntime::builder()
///     .config_file("deploy/herald.toml")
///     .activity(roll)
///     .restricted_activity(shutdown)
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    config: Option<HeraldConfig>,
    activities: Vec<(Activity, bool)>,
    parser_chain: Option<ParserChain>,
    init_logging: bool,
    permission_commands: bool,
    help: bool,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            config: None,
            activities: Vec::new(),
            parser_chain: None,
            init_logging: true,
            permission_commands: true,
            help: true,
        }
    }

    /// Reads this configuration file instead of searching for one.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Looks for `herald.toml` / `herald.yaml` in `dir`.
    pub fn search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_loader = self.config_loader.search_dir(dir);
        self
    }

    /// Ignores `HERALD_*` environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Base settings that files and the environment may override.
    pub fn defaults(mut self, config: HeraldConfig) -> Self {
        self.config_loader = self.config_loader.defaults(config);
        self
    }

    /// Uses `config` as is, skipping every configuration source.
    pub fn config(mut self, config: HeraldConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Adds an activity everyone may use by default.
    pub fn activity(mut self, activity: Activity) -> Self {
        self.activities.push((activity, true));
        self
    }

    /// Adds an activity denied to everyone by default.
    pub fn restricted_activity(mut self, activity: Activity) -> Self {
        self.activities.push((activity, false));
        self
    }

    pub fn parser_chain(mut self, chain: ParserChain) -> Self {
        self.parser_chain = Some(chain);
        self
    }

    /// Leaves the global tracing subscriber alone.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    /// Omits the `permissions` commands.
    pub fn without_permission_commands(mut self) -> Self {
        self.permission_commands = false;
        self
    }

    /// Omits the `help` command.
    pub fn without_help(mut self) -> Self {
        self.help = false;
        self
    }

    /// Loads configuration and rules, then builds the dispatcher.
    pub fn build(self) -> RuntimeResult<HeraldRuntime> {
        let config = match self.config {
            Some(config) => {
                validate_config(&config)?;
                config
            }
            None => self.config_loader.load()?,
        };

        if self.init_logging {
            logging::init_from_config(&config.logging);
        }

        let rules = Arc::new(RuleStore::new());
        let rules_file = RulesFile::new(&config.permissions_file);
        rules_file.load_into(&rules)?;

        let mut builder = Dispatcher::builder(config.prefix.clone())
            .rules(rules)
            .aliases(config.aliases.clone());
        for (activity, public) in self.activities {
            builder = if public {
                builder.activity(activity)
            } else {
                builder.restricted_activity(activity)
            };
        }
        if let Some(chain) = self.parser_chain {
            builder = builder.parser_chain(chain);
        }
        if self.permission_commands {
            builder = builder.with_permission_commands();
        }
        if self.help {
            builder = builder.with_help();
        }
        let dispatcher = builder.build()?;

        info!(
            prefix = %config.prefix,
            activities = dispatcher.router().activities().len(),
            aliases = dispatcher.router().aliases().len(),
            rules_file = %rules_file.path().display(),
            "Herald runtime initialized"
        );

        Ok(HeraldRuntime {
            config,
            dispatcher,
            rules_file,
        })
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
