//! Layered loading of [`HeraldConfig`].
//!
//! Sources, lowest priority first:
//!
//! 1. The base configuration: [`HeraldConfig::default`], or whatever was
//!    passed to [`ConfigLoader::defaults`]
//! 2. One config file: the file given to [`ConfigLoader::file`], or else the
//!    first `herald.toml` / `herald.yaml` / `herald.yml` found in the search
//!    directories (current directory, then `<user config dir>/herald`)
//! 3. Environment variables
//!
//! | Variable                  | Setting            |
//! |---------------------------|--------------------|
//! | `HERALD_PREFIX`           | `prefix`           |
//! | `HERALD_PERMISSIONS_FILE` | `permissions_file` |
//! | `HERALD_LOG_LEVEL`        | `logging.level`    |
//! | `HERALD_ALIAS_<NAME>`     | `aliases.<name>`   |
//!
//! File formats follow the `toml-config` and `yaml-config` features. The
//! merged configuration is validated before it is handed out.
//!
//! ```rust,ignore
//! let config = ConfigLoader::new()
//!     .defaults(HeraldConfig { prefix: "!".into(), ..Default::default() })
//!     .file("deploy/herald.toml")
//!     .load()?;
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "toml-config", feature = "yaml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info};

use super::error::{ConfigError, ConfigResult};
use super::schema::HeraldConfig;
use super::validation::validate_config;

/// Collects configuration sources and produces a validated [`HeraldConfig`].
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    base: HeraldConfig,
    file: Option<PathBuf>,
    search_dirs: Vec<PathBuf>,
    read_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            base: HeraldConfig::default(),
            file: None,
            search_dirs: Vec::new(),
            read_env: true,
        }
    }

    /// Replaces the built-in defaults. Files and the environment still win.
    pub fn defaults(mut self, config: HeraldConfig) -> Self {
        self.base = config;
        self
    }

    /// Reads this file instead of searching. It must exist.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Searches `dir` for a config file. Replaces the default directories.
    pub fn search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    /// Ignores `HERALD_*` environment variables.
    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    pub fn load(&self) -> ConfigResult<HeraldConfig> {
        let mut figment = Figment::from(Serialized::defaults(&self.base));

        match self.config_file()? {
            Some(path) => {
                info!(path = %path.display(), "Loading configuration file");
                figment = merge_file(figment, &path)?;
            }
            None => debug!("No configuration file found"),
        }
        if self.read_env {
            figment = figment.merge(env_provider());
        }

        let config: HeraldConfig = figment
            .extract()
            .map_err(|e| ConfigError::Extract(Box::new(e)))?;
        validate_config(&config)?;

        debug!(
            prefix = %config.prefix,
            aliases = config.aliases.len(),
            permissions_file = %config.permissions_file.display(),
            "Configuration loaded"
        );
        Ok(config)
    }

    fn config_file(&self) -> ConfigResult<Option<PathBuf>> {
        if let Some(path) = &self.file {
            if !path.is_file() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            return Ok(Some(path.clone()));
        }

        let dirs = if self.search_dirs.is_empty() {
            default_search_dirs()
        } else {
            self.search_dirs.clone()
        };
        let names = file_names();
        Ok(dirs
            .iter()
            .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
            .find(|path| path.is_file()))
    }
}

fn default_search_dirs() -> Vec<PathBuf> {
    std::env::current_dir()
        .ok()
        .into_iter()
        .chain(dirs::config_dir().map(|dir| dir.join("herald")))
        .collect()
}

#[allow(unused_mut)]
fn file_names() -> Vec<&'static str> {
    let mut names = Vec::new();
    #[cfg(feature = "toml-config")]
    names.push("herald.toml");
    #[cfg(feature = "yaml-config")]
    names.extend(["herald.yaml", "herald.yml"]);
    names
}

#[cfg_attr(
    not(any(feature = "toml-config", feature = "yaml-config")),
    allow(unused_variables)
)]
fn merge_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    match path.extension().and_then(OsStr::to_str) {
        #[cfg(feature = "toml-config")]
        Some("toml") => Ok(figment.merge(Toml::file_exact(path))),
        #[cfg(feature = "yaml-config")]
        Some("yaml" | "yml") => Ok(figment.merge(Yaml::file_exact(path))),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// `HERALD_*` variables, renamed to the settings they override.
fn env_provider() -> Env {
    Env::prefixed("HERALD_").map(|key| {
        let key = key.as_str().to_ascii_lowercase();
        match key.strip_prefix("alias_") {
            Some(alias) => format!("aliases.{alias}").into(),
            None if key == "log_level" => "logging.level".into(),
            None => key.into(),
        }
    })
}
